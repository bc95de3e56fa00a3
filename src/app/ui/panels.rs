use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::data::{Dataset, ItemMode};

use super::super::bubbles::{BubbleEvent, BubbleField, FieldSettings};
use super::super::physics::FilterSet;
use super::super::{DrillOrigin, LaunchOptions, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(dataset: Dataset, options: &LaunchOptions) -> Self {
        let dataset = Arc::new(dataset);
        let known = dataset.categories();
        let allow_list = options
            .categories
            .iter()
            .filter(|category| {
                let found = known.contains(category);
                if !found {
                    log::warn!("ignoring unknown category {category:?}");
                }
                found
            })
            .cloned()
            .collect::<BTreeSet<_>>();

        let filters = FilterSet::default();
        let settings = FieldSettings::new(&options.tuning, &options.quality);
        let items = dataset.items(options.mode, &allow_list);
        let field = BubbleField::new(items, filters, Vec2::new(1000.0, 700.0), settings);

        log::info!(
            "dataset ready: {} papers in {} categories from {}",
            dataset.paper_count(),
            known.len(),
            dataset.source
        );

        Self {
            dataset,
            mode: options.mode,
            filters,
            allow_list,
            drill_origin: None,
            search: String::new(),
            search_match_cache: None,
            items_revision: 0,
            items_dirty: false,
            field,
            field_moving: true,
            last_pointer: None,
            tuning: options.tuning.clone(),
            quality: options.quality,
            hovered_id: None,
            pointer: None,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        data_path: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);
        if self.items_dirty {
            self.refresh_items();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("impact-lens");
                    ui.separator();
                    ui.label(format!("data: {data_path}"));
                    ui.label(format!("papers: {}", self.dataset.paper_count()));
                    ui.label(format!(
                        "bubbles: {} ({})",
                        self.field.items().len(),
                        self.mode.label()
                    ));
                    if self.dataset.skipped_lines > 0 {
                        ui.label(format!("skipped: {}", self.dataset.skipped_lines));
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!("view: {}", self.field.mode().label()));
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_bubbles(ui));
    }

    /// Rebuilds the item collection from the current mode and allow-list.
    /// A new collection resets hover, selection and any running transition.
    pub(in crate::app) fn refresh_items(&mut self) {
        self.items_dirty = false;
        let items = self.dataset.items(self.mode, &self.allow_list);
        self.field.set_items(items);
        self.items_revision = self.items_revision.wrapping_add(1);
        self.search_match_cache = None;
        self.hovered_id = None;
    }

    pub(in crate::app) fn set_mode(&mut self, mode: ItemMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.drill_origin = None;
        self.items_dirty = true;
    }

    pub(in crate::app) fn set_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
        self.field.set_filters(filters);
    }

    pub(in crate::app) fn apply_tuning(&mut self) {
        self.tuning = self.tuning.clone().sanitized();
        self.field
            .apply_settings(FieldSettings::new(&self.tuning, &self.quality));
    }

    /// Switches to the papers of one category, remembering where we came from.
    pub(in crate::app) fn drill_down(&mut self, category: String) {
        if !self.dataset.categories().contains(&category) {
            log::warn!("drill-down into unknown category {category:?} ignored");
            return;
        }

        log::info!("drilling into {category}");
        if self.drill_origin.is_none() {
            self.drill_origin = Some(DrillOrigin {
                mode: self.mode,
                allow_list: self.allow_list.clone(),
            });
        }
        self.mode = ItemMode::Leaf;
        self.allow_list = BTreeSet::from([category]);
        self.refresh_items();
    }

    pub(in crate::app) fn back_to_groups(&mut self) {
        let Some(origin) = self.drill_origin.take() else {
            return;
        };
        self.mode = origin.mode;
        self.allow_list = origin.allow_list;
        self.refresh_items();
    }

    pub(in crate::app) fn handle_field_events(&mut self, surface_origin: egui::Pos2) {
        for event in self.field.drain_events() {
            match event {
                BubbleEvent::DrillDown { category } => self.drill_down(category),
                BubbleEvent::HoverChanged(id) => self.hovered_id = id,
                BubbleEvent::PointerMoved(position) => {
                    self.pointer = Some(surface_origin + position.to_vec2());
                }
            }
        }
    }

    pub(in crate::app) fn unmount(&mut self) {
        self.field.unmount();
        self.hovered_id = None;
        self.pointer = None;
    }
}
