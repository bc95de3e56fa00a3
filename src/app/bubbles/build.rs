use eframe::egui::{Vec2, vec2};

use crate::data::{Item, ItemKind};
use crate::util::stable_pair;

use super::super::physics::{Body, LayoutTarget};

const REFERENCE_EXTENT: f32 = 800.0;
const SEED_JITTER: f32 = 40.0;

fn viewport_scale(viewport: Vec2) -> f32 {
    (viewport.min_elem() / REFERENCE_EXTENT).clamp(0.6, 1.6)
}

pub(in crate::app) fn base_radius(item: &Item, viewport: Vec2) -> f32 {
    let unscaled = match item.kind {
        ItemKind::Leaf => 4.0 + (item.magnitude.clamp(0.0, 100.0) / 100.0) * 8.0,
        ItemKind::Group { group_size, .. } => (14.0 + (group_size as f32).sqrt() * 2.6).min(64.0),
    };
    unscaled * viewport_scale(viewport)
}

/// Fresh simulation state: each body starts near its spring target, offset by
/// a jitter derived from its id so reloads are reproducible.
pub(in crate::app) fn seed_bodies(
    items: &[Item],
    targets: &[LayoutTarget],
    viewport: Vec2,
) -> Vec<Body> {
    items
        .iter()
        .zip(targets)
        .map(|(item, target)| {
            let (jx, jy) = stable_pair(&item.id);
            let position = vec2(target.x, target.y) + vec2(jx, jy) * SEED_JITTER;
            Body::new(position, base_radius(item, viewport))
        })
        .collect()
}

/// Carries bodies across a viewport change: positions scale with the
/// viewport, radii are recomputed and the expansion state is dropped.
pub(in crate::app) fn rescale_bodies(
    items: &[Item],
    bodies: &mut [Body],
    previous: Vec2,
    viewport: Vec2,
) {
    let ratio = if previous.x > 0.0 && previous.y > 0.0 {
        vec2(viewport.x / previous.x, viewport.y / previous.y)
    } else {
        Vec2::splat(1.0)
    };

    for (item, body) in items.iter().zip(bodies.iter_mut()) {
        let radius = base_radius(item, viewport);
        body.position = body.position * ratio;
        body.velocity = Vec2::ZERO;
        body.base_radius = radius;
        body.target_radius = radius;
        body.current_radius = radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_magnitudes_and_groups_get_larger_radii() {
        let viewport = vec2(800.0, 800.0);
        let small = base_radius(&Item::leaf("a", 5.0, "A", false), viewport);
        let large = base_radius(&Item::leaf("b", 95.0, "A", false), viewport);
        let group = base_radius(&Item::group("A", 50.0, 400, 20), viewport);
        assert!(small < large);
        assert!(large < group);
        assert!(group <= 64.0);
    }

    #[test]
    fn seeding_is_deterministic_per_id() {
        let items = [Item::leaf("x", 20.0, "A", false), Item::leaf("y", 70.0, "A", true)];
        let targets = [
            LayoutTarget {
                x: 100.0,
                y: 200.0,
                strength_x: 0.04,
                strength_y: 0.1,
            };
            2
        ];
        let first = seed_bodies(&items, &targets, vec2(1000.0, 600.0));
        let second = seed_bodies(&items, &targets, vec2(1000.0, 600.0));
        assert_eq!(first, second);
        for body in &first {
            assert!((body.position - vec2(100.0, 200.0)).length() <= SEED_JITTER * 1.5);
            assert_eq!(body.current_radius, body.base_radius);
        }
    }
}
