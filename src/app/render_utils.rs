use std::f32::consts::FRAC_PI_2;

use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, pos2, vec2};

const PALETTE_START: Color32 = Color32::from_rgb(72, 149, 239);
const PALETTE_MID: Color32 = Color32::from_rgb(131, 95, 220);
const PALETTE_END: Color32 = Color32::from_rgb(239, 83, 128);
const CORNER_SEGMENTS: usize = 10;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

/// Fill colour keyed on horizontal position, not category.
pub(super) fn position_color(x: f32, width: f32) -> Color32 {
    let t = if width > f32::EPSILON {
        (x / width).clamp(0.0, 1.0)
    } else {
        0.5
    };

    if t < 0.5 {
        blend_color(PALETTE_START, PALETTE_MID, t * 2.0)
    } else {
        blend_color(PALETTE_MID, PALETTE_END, (t - 0.5) * 2.0)
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(14, 17, 24));

    let step = 64.0;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 86, 40));

    let mut x = rect.left() + step;
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + step;
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Soft halo as stacked translucent rings. `intensity` 0 draws nothing.
pub(super) fn draw_glow(
    painter: &Painter,
    center: Pos2,
    radius: f32,
    color: Color32,
    layers: usize,
    spread: f32,
    intensity: f32,
) {
    if layers == 0 || intensity <= 0.0 {
        return;
    }

    for layer in (1..=layers).rev() {
        let t = layer as f32 / layers as f32;
        let alpha = (1.0 - t) * 0.35 + 0.04;
        painter.circle_filled(
            center,
            radius + spread * t,
            with_opacity(color, alpha * intensity),
        );
    }
}

/// Outline of a square of `rect` with corners rounded by `corner_radius`,
/// clockwise from the top-left arc. A radius of half the side yields a circle.
pub(super) fn rounded_rect_points(rect: Rect, corner_radius: f32) -> Vec<Pos2> {
    let radius = corner_radius.clamp(0.0, rect.width().min(rect.height()) * 0.5);
    let corners = [
        (pos2(rect.left() + radius, rect.top() + radius), 2.0),
        (pos2(rect.right() - radius, rect.top() + radius), 3.0),
        (pos2(rect.right() - radius, rect.bottom() - radius), 0.0),
        (pos2(rect.left() + radius, rect.bottom() - radius), 1.0),
    ];

    let mut points = Vec::with_capacity(corners.len() * (CORNER_SEGMENTS + 1));
    for (center, quarter) in corners {
        let start = quarter * FRAC_PI_2;
        for step in 0..=CORNER_SEGMENTS {
            let angle = start + FRAC_PI_2 * (step as f32 / CORNER_SEGMENTS as f32);
            points.push(center + vec2(angle.cos(), angle.sin()) * radius);
        }
    }
    points
}

pub(super) fn rounded_rect_shape(
    rect: Rect,
    corner_radius: f32,
    fill: Color32,
    stroke: Stroke,
) -> Shape {
    Shape::convex_polygon(rounded_rect_points(rect, corner_radius), fill, stroke)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_spans_the_viewport_width() {
        assert_eq!(position_color(0.0, 800.0), PALETTE_START);
        assert_eq!(position_color(400.0, 800.0), PALETTE_MID);
        assert_eq!(position_color(800.0, 800.0), PALETTE_END);
        assert_eq!(position_color(-50.0, 800.0), PALETTE_START);
        assert_eq!(position_color(10.0, 0.0), PALETTE_MID);
    }

    #[test]
    fn full_rounding_traces_a_circle() {
        let rect = Rect::from_center_size(pos2(50.0, 50.0), vec2(40.0, 40.0));
        for point in rounded_rect_points(rect, 20.0) {
            assert!((point.distance(rect.center()) - 20.0).abs() < 1e-3);
        }
    }

    #[test]
    fn rounded_outline_stays_inside_its_rect() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 60.0));
        let points = rounded_rect_points(rect, 6.0);
        assert_eq!(points.len(), 4 * (CORNER_SEGMENTS + 1));
        for point in points {
            assert!(rect.expand(1e-3).contains(point));
        }
    }
}
