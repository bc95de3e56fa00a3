use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use eframe::egui::{self, Key, Response, RichText, Ui};

use crate::data::ItemMode;

use super::super::ViewModel;

const NUDGE_BASE_RATE: f32 = 10.0;
const NUDGE_ACCEL_PER_SEC: f32 = 9.0;
const NUDGE_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct NudgeHold {
    secs: f32,
    direction: i8,
}

/// Arrow keys held on a focused slider move it faster the longer they are held.
fn nudge_with_arrow_keys(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    range: RangeInclusive<f32>,
) -> bool {
    let state_id = response.id.with("nudge_hold");
    if !response.has_focus() {
        ui.ctx().data_mut(|data| data.remove::<NudgeHold>(state_id));
        return false;
    }

    let (dt, up, down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });
    let direction = (up as i8) - (down as i8);

    let mut hold = ui
        .ctx()
        .data(|data| data.get_temp::<NudgeHold>(state_id).unwrap_or_default());
    if direction != hold.direction {
        hold = NudgeHold { secs: 0.0, direction };
    }
    hold.secs += dt;
    ui.ctx().data_mut(|data| data.insert_temp(state_id, hold));

    if direction == 0 {
        return false;
    }

    let (min, max) = (*range.start(), *range.end());
    let step = ((max - min) / 200.0).max(0.0005);
    let ramp = hold.secs * NUDGE_ACCEL_PER_SEC;
    let speed = NUDGE_BASE_RATE * (1.0 + ramp + ramp * ramp * 0.15).min(NUDGE_ACCEL_MAX);

    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * dt).clamp(min, max);
    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    label: &str,
    hint: &str,
) -> bool {
    let response = ui
        .add(
            egui::Slider::new(value, range.clone())
                .text(label)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hint);
    if response.hovered() {
        response.request_focus();
    }
    let dragged = response.changed();
    dragged | nudge_with_arrow_keys(ui, &response, value, range)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_mode_controls(ui);
        ui.separator();
        self.draw_filter_controls(ui);
        ui.separator();

        ui.label("Search (title, id or discipline)")
            .on_hover_text("Ring matching bubbles and dim the rest. The layout is not affected.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        self.draw_category_controls(ui);

        ui.separator();
        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live frame-rate readout in the header.");

        ui.collapsing("Tuning", |ui| self.draw_tuning_controls(ui));
    }

    fn draw_mode_controls(&mut self, ui: &mut Ui) {
        let mut mode = self.mode;
        ui.horizontal(|ui| {
            ui.selectable_value(&mut mode, ItemMode::Group, ItemMode::Group.label())
                .on_hover_text("One bubble per discipline, sized by paper count.");
            ui.selectable_value(&mut mode, ItemMode::Leaf, ItemMode::Leaf.label())
                .on_hover_text("One bubble per paper, sized by impact score.");
        });
        self.set_mode(mode);

        if self.drill_origin.is_some() && ui.button("Back to disciplines").clicked() {
            self.back_to_groups();
        }
    }

    fn draw_filter_controls(&mut self, ui: &mut Ui) {
        let mut filters = self.filters;
        ui.label(RichText::new("Split layout").strong());
        ui.checkbox(&mut filters.magnitude_split, "By impact (low / high)")
            .on_hover_text("Separate bubbles at or below 50 from those above.");
        let flag_hint = match self.mode {
            ItemMode::Leaf => "Code available on top, no code below.",
            ItemMode::Group => "Disciplines with more code-sharing papers rise higher.",
        };
        ui.checkbox(&mut filters.flag_split, "By code availability")
            .on_hover_text(flag_hint);

        if filters != self.filters {
            self.set_filters(filters);
        }
    }

    fn draw_category_controls(&mut self, ui: &mut Ui) {
        let categories = self.dataset.categories();
        let mut allow_list = self.allow_list.clone();

        ui.horizontal(|ui| {
            ui.label(RichText::new("Disciplines").strong());
            if ui.small_button("all").clicked() {
                allow_list.clear();
            }
            if ui.small_button("none").clicked() {
                allow_list = categories.iter().take(1).cloned().collect();
            }
        });

        egui::ScrollArea::vertical()
            .id_salt("category_scroll")
            .max_height(240.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for category in &categories {
                    let mut admitted = allow_list.is_empty() || allow_list.contains(category);
                    if ui.checkbox(&mut admitted, category.as_str()).changed() {
                        toggle_category(&mut allow_list, &categories, category, admitted);
                    }
                }
            });

        if allow_list != self.allow_list {
            self.allow_list = allow_list;
            self.drill_origin = None;
            self.items_dirty = true;
        }
    }

    fn draw_tuning_controls(&mut self, ui: &mut Ui) {
        let mut tuning = self.tuning.clone();
        let mut changed = false;

        changed |= tuning_slider(
            ui,
            &mut tuning.influence_radius,
            20.0..=400.0,
            "Influence radius",
            "Pointer distance within which bubbles grow.",
        );
        changed |= tuning_slider(
            ui,
            &mut tuning.max_expansion,
            1.0..=2.0,
            "Max expansion",
            "Growth factor of a bubble directly under the pointer.",
        );
        changed |= tuning_slider(
            ui,
            &mut tuning.smoothing,
            0.02..=1.0,
            "Smoothing",
            "Fraction of the remaining radius gap closed per frame.",
        );
        changed |= tuning_slider(
            ui,
            &mut tuning.collision_padding,
            0.0..=32.0,
            "Padding",
            "Spacing kept between bubble outlines.",
        );

        let mut velocity_decay = tuning
            .velocity_decay
            .unwrap_or(self.field.settings().engine.velocity_decay);
        if tuning_slider(
            ui,
            &mut velocity_decay,
            0.2..=0.4,
            "Velocity decay",
            "Friction applied to bubble motion every tick.",
        ) {
            tuning.velocity_decay = Some(velocity_decay);
            changed = true;
        }

        let mut alpha_decay = tuning
            .alpha_decay
            .unwrap_or(self.field.settings().engine.alpha_decay);
        if tuning_slider(
            ui,
            &mut alpha_decay,
            0.01..=0.02,
            "Cooling rate",
            "How fast the layout loses energy and comes to rest.",
        ) {
            tuning.alpha_decay = Some(alpha_decay);
            changed = true;
        }

        if ui.button("Reset to defaults").clicked() {
            tuning = crate::config::Tuning::default();
            changed = true;
        }

        let layout_state = if self.field.is_engine_running() {
            "running"
        } else {
            "frozen"
        };
        ui.small(format!(
            "quality tier: {} | layout {layout_state} at alpha {:.3}",
            self.quality.tier.label(),
            self.field.alpha()
        ));

        if changed {
            self.tuning = tuning;
            self.apply_tuning();
        }
    }
}

/// Applies one checkbox change. An empty allow-list means "every category", so
/// unticking from that state materialises the full list first.
fn toggle_category(
    allow_list: &mut BTreeSet<String>,
    categories: &[String],
    category: &str,
    admitted: bool,
) {
    if admitted {
        allow_list.insert(category.to_owned());
        if allow_list.len() == categories.len() {
            allow_list.clear();
        }
        return;
    }

    if allow_list.is_empty() {
        allow_list.extend(categories.iter().cloned());
    }
    allow_list.remove(category);
    if allow_list.is_empty() {
        allow_list.insert(category.to_owned());
    }
}
