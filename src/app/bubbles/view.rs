use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{
    self, Align2, Color32, FontId, Key, Order, Rect, Sense, Stroke, Ui, vec2,
};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::short_label;

use super::super::render_utils::{
    blend_color, circle_visible, draw_background, draw_glow, position_color, rounded_rect_shape,
    with_opacity,
};
use super::super::{SearchMatchCache, ViewModel};
use super::{OverlayGeometry, ViewMode};

const OVERLAY_FILL: Color32 = Color32::from_rgb(24, 28, 38);
const SEARCH_RING: Color32 = Color32::from_rgb(103, 196, 255);
const FLAG_RING: Color32 = Color32::from_rgb(235, 235, 245);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.items_revision == self.items_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .field
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                fuzzy_match_score(&matcher, &self.item_label(item), query).is_some()
                    || fuzzy_match_score(&matcher, &item.id, query).is_some()
                    || fuzzy_match_score(&matcher, &item.category, query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            items_revision: self.items_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    /// Pointer input, one field frame, then painting of the settled state.
    pub(in crate::app) fn draw_bubbles(&mut self, ui: &mut Ui) {
        if self.items_dirty {
            self.refresh_items();
        }
        if !self.field.is_mounted() {
            return;
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);
        self.field.set_viewport(rect.size());

        if self.field.items().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No papers match the current disciplines.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        let pointer = response.hover_pos();
        if pointer != self.last_pointer || self.field_moving {
            self.field
                .pointer_moved(pointer.map(|position| position - rect.min));
            self.last_pointer = pointer;
        }
        if pointer.is_none() {
            self.pointer = None;
        }

        if response.clicked()
            && let Some(position) = response.interact_pointer_pos()
        {
            self.field.click(position - rect.min);
        }
        if ui.input(|input| input.key_pressed(Key::Escape)) {
            self.field.close();
        }

        let dt = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        self.field_moving = self.field.frame(dt);
        self.handle_field_events(rect.min);

        let matches = self.cached_search_matches();
        self.paint_bodies(&painter, rect, matches.as_deref());

        if let Some(geometry) = self.field.overlay(rect) {
            self.paint_overlay(ui, &painter, rect, &geometry);
        } else {
            self.paint_tooltip(ui);
        }

        if self.field.hovered().is_some() && self.field.mode() == ViewMode::Overview {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
        if self.field_moving {
            ui.ctx().request_repaint();
        }
    }

    fn paint_bodies(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        matches: Option<&HashSet<usize>>,
    ) {
        let mode = self.field.mode();
        if mode == ViewMode::Expanded {
            return;
        }

        let progress = self.field.progress();
        let fade = if mode == ViewMode::Overview {
            1.0
        } else {
            1.0 - progress
        };
        let blur = 1.0 + progress * 2.5;
        let hover_scale = self.field.settings().hover_scale;
        let search_active = matches.is_some_and(|matches| !matches.is_empty());

        let bodies = self.field.items().iter().zip(self.field.bodies());
        for (index, (item, body)) in bodies.enumerate() {
            let hovered = mode == ViewMode::Overview && self.field.hovered() == Some(index);
            let radius = body.current_radius * if hovered { hover_scale } else { 1.0 };
            let center = rect.min + body.position;
            let spread = self.quality.glow_spread * blur * if hovered { 1.6 } else { 1.0 };
            if !circle_visible(rect, center, radius + spread) {
                continue;
            }

            let is_match = matches.is_some_and(|matches| matches.contains(&index));
            let mut color = position_color(body.position.x, rect.width());
            if search_active && !is_match {
                color = blend_color(color, Color32::from_rgb(14, 17, 24), 0.7);
            }

            draw_glow(
                painter,
                center,
                radius,
                color,
                self.quality.glow_layers,
                spread,
                fade * if hovered { 1.0 } else { 0.6 },
            );
            painter.circle_filled(center, radius, with_opacity(color, fade));

            if item.is_group() {
                painter.circle_stroke(
                    center,
                    radius + 3.0,
                    Stroke::new(2.6, with_opacity(FLAG_RING, fade * 0.8)),
                );
                if radius > 22.0 {
                    painter.text(
                        center,
                        Align2::CENTER_CENTER,
                        short_label(&item.category, (radius / 4.0) as usize),
                        FontId::proportional(12.0),
                        with_opacity(Color32::from_gray(245), fade),
                    );
                }
            } else if item.has_code {
                painter.circle_stroke(
                    center,
                    radius + 2.0,
                    Stroke::new(1.0, with_opacity(FLAG_RING, fade * 0.8)),
                );
            }

            if is_match {
                painter.circle_stroke(
                    center,
                    radius + 6.0,
                    Stroke::new(1.6, with_opacity(SEARCH_RING, fade)),
                );
            }
        }
    }

    fn paint_overlay(
        &mut self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        geometry: &OverlayGeometry,
    ) {
        let progress = self.field.progress();
        let overlay_rect = geometry.rect();
        let bubble_color = self
            .field
            .selected()
            .and_then(|index| self.field.bodies().get(index))
            .map_or(OVERLAY_FILL, |body| position_color(body.position.x, rect.width()));
        let fill = blend_color(bubble_color, OVERLAY_FILL, progress);

        painter.add(rounded_rect_shape(
            overlay_rect,
            geometry.corner_fraction * overlay_rect.width(),
            fill,
            Stroke::NONE,
        ));

        if !geometry.content_interactive {
            return;
        }

        let mut close_requested = false;
        let content_width = (rect.width() - 80.0).clamp(240.0, 560.0);
        egui::Area::new(egui::Id::new("selection_overlay"))
            .order(Order::Foreground)
            .pivot(Align2::CENTER_CENTER)
            .fixed_pos(rect.center())
            .show(ui.ctx(), |ui| {
                ui.multiply_opacity(geometry.content_opacity);
                ui.set_max_width(content_width);
                egui::Frame::NONE
                    .inner_margin(16.0)
                    .show(ui, |ui| close_requested = self.draw_selection_details(ui));
            });

        if close_requested {
            self.field.close();
        }
    }

    fn paint_tooltip(&self, ui: &Ui) {
        if self.field.mode() != ViewMode::Overview {
            return;
        }
        let (Some(id), Some(pointer)) = (self.hovered_id.as_deref(), self.pointer) else {
            return;
        };
        let Some(item) = self
            .field
            .index_of(id)
            .and_then(|index| self.field.item(index))
        else {
            return;
        };

        let lines = self.tooltip_lines(item);
        egui::Area::new(egui::Id::new("bubble_tooltip"))
            .order(Order::Tooltip)
            .interactable(false)
            .fixed_pos(pointer + vec2(14.0, 14.0))
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    let mut lines = lines.iter();
                    if let Some(title) = lines.next() {
                        ui.strong(title.as_str());
                    }
                    for line in lines {
                        ui.label(line.as_str());
                    }
                });
            });
    }
}
