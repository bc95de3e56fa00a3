mod build;
mod interaction;
mod proximity;
mod transition;
mod view;

use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::{Pos2, Rect, Vec2};

use crate::config::Tuning;
use crate::data::Item;

use self::build::{rescale_bodies, seed_bodies};
use self::interaction::nearest_containing;
use self::proximity::{ProximityConfig, update_radii};
pub(in crate::app) use self::transition::{OverlayGeometry, ViewMode};
use self::transition::{TransitionEvent, ViewTransition, overlay_geometry};
use super::capability::{PerformanceTier, QualityProfile};
use super::physics::{Body, EngineConfig, FilterSet, LayoutEngine, LayoutTarget, layout_targets};

const VIEWPORT_CHANGE_EPSILON: f32 = 0.5;

/// Notifications for the dashboard around the field.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum BubbleEvent {
    DrillDown { category: String },
    HoverChanged(Option<String>),
    PointerMoved(Pos2),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct FieldSettings {
    pub(in crate::app) engine: EngineConfig,
    pub(in crate::app) proximity: ProximityConfig,
    pub(in crate::app) hover_tolerance: f32,
    pub(in crate::app) hover_scale: f32,
    pub(in crate::app) transition_ms: f32,
    pub(in crate::app) content_reveal: f32,
    pub(in crate::app) resume_alpha: f32,
    pub(in crate::app) interaction_alpha: f32,
}

impl FieldSettings {
    pub(in crate::app) fn new(tuning: &Tuning, quality: &QualityProfile) -> Self {
        Self {
            engine: EngineConfig {
                velocity_decay: tuning.velocity_decay.unwrap_or(quality.velocity_decay),
                alpha_decay: tuning.alpha_decay.unwrap_or(quality.alpha_decay),
                repulsion: tuning.repulsion,
                collision_padding: tuning.collision_padding,
                collision_strength: tuning.collision_strength,
                collision_iterations: tuning.collision_iterations,
            },
            proximity: ProximityConfig::from(tuning),
            hover_tolerance: tuning.hover_tolerance,
            hover_scale: tuning.hover_scale,
            transition_ms: tuning.transition_ms,
            content_reveal: tuning.content_reveal,
            resume_alpha: tuning.resume_alpha,
            interaction_alpha: tuning.interaction_alpha,
        }
    }
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self::new(&Tuning::default(), &QualityProfile::for_tier(PerformanceTier::High))
    }
}

/// The bubble visualisation core: immutable items plus engine-owned bodies,
/// the layout engine, the pointer expansion model, hover/click handling and
/// the overview/expanded transition.
pub(in crate::app) struct BubbleField {
    items: Arc<[Item]>,
    bodies: Vec<Body>,
    targets: Vec<LayoutTarget>,
    index_by_id: HashMap<String, usize>,
    filters: FilterSet,
    viewport: Vec2,
    settings: FieldSettings,
    engine: LayoutEngine,
    transition: ViewTransition,
    selected: Option<usize>,
    snapshot: Option<Vec<Body>>,
    hovered: Option<usize>,
    pointer: Option<Vec2>,
    mounted: bool,
    events: Vec<BubbleEvent>,
}

impl BubbleField {
    pub(in crate::app) fn new(
        items: Arc<[Item]>,
        filters: FilterSet,
        viewport: Vec2,
        settings: FieldSettings,
    ) -> Self {
        let mut field = Self {
            items: Arc::from(Vec::new()),
            bodies: Vec::new(),
            targets: Vec::new(),
            index_by_id: HashMap::new(),
            filters,
            viewport,
            settings,
            engine: LayoutEngine::new(settings.engine),
            transition: ViewTransition::new(settings.transition_ms),
            selected: None,
            snapshot: None,
            hovered: None,
            pointer: None,
            mounted: true,
            events: Vec::new(),
        };
        field.replace_items(items);
        field
    }

    pub(in crate::app) fn items(&self) -> &[Item] {
        &self.items
    }

    pub(in crate::app) fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub(in crate::app) fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub(in crate::app) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub(in crate::app) fn filters(&self) -> FilterSet {
        self.filters
    }

    pub(in crate::app) fn settings(&self) -> FieldSettings {
        self.settings
    }

    pub(in crate::app) fn mode(&self) -> ViewMode {
        self.transition.mode()
    }

    pub(in crate::app) fn progress(&self) -> f32 {
        self.transition.progress()
    }

    pub(in crate::app) fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub(in crate::app) fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub(in crate::app) fn selected_item(&self) -> Option<&Item> {
        self.selected.and_then(|index| self.items.get(index))
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.engine.alpha()
    }

    pub(in crate::app) fn is_engine_running(&self) -> bool {
        self.engine.is_running()
    }

    pub(in crate::app) fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub(in crate::app) fn drain_events(&mut self) -> Vec<BubbleEvent> {
        std::mem::take(&mut self.events)
    }

    pub(in crate::app) fn apply_settings(&mut self, settings: FieldSettings) {
        if self.settings == settings {
            return;
        }
        self.settings = settings;
        self.engine.set_config(settings.engine);
        self.transition.set_duration_ms(settings.transition_ms);
        if self.mode() == ViewMode::Overview {
            self.engine.reheat(settings.resume_alpha);
        }
    }

    /// Swaps in a new collection. The same `Arc` is a no-op; anything else
    /// invalidates hover, selection and any running transition.
    pub(in crate::app) fn set_items(&mut self, items: Arc<[Item]>) {
        if Arc::ptr_eq(&self.items, &items) {
            return;
        }
        self.replace_items(items);
    }

    fn replace_items(&mut self, items: Arc<[Item]>) {
        if self.selected.is_some() || self.hovered.is_some() {
            log::debug!("item collection replaced; clearing hover and selection");
        }
        if self.hovered.take().is_some() {
            self.events.push(BubbleEvent::HoverChanged(None));
        }
        self.selected = None;
        self.snapshot = None;
        self.transition.reset();

        self.index_by_id = items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.id.clone(), index))
            .collect();
        self.targets = layout_targets(&items, self.filters, self.viewport);
        self.bodies = seed_bodies(&items, &self.targets, self.viewport);
        self.items = items;
        self.engine.restart(1.0);
        log::info!("bubble field seeded with {} items", self.items.len());
    }

    pub(in crate::app) fn set_filters(&mut self, filters: FilterSet) {
        if self.filters == filters {
            return;
        }
        self.filters = filters;
        self.targets = layout_targets(&self.items, filters, self.viewport);
        if self.mode() == ViewMode::Overview {
            self.engine.restart(1.0);
        }
    }

    /// Re-seeds layout targets and radii for a new drawing-surface size.
    pub(in crate::app) fn set_viewport(&mut self, viewport: Vec2) {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return;
        }
        if (viewport - self.viewport).abs().max_elem() < VIEWPORT_CHANGE_EPSILON {
            return;
        }

        let previous = self.viewport;
        self.viewport = viewport;
        self.targets = layout_targets(&self.items, self.filters, viewport);
        rescale_bodies(&self.items, &mut self.bodies, previous, viewport);
        if let Some(snapshot) = self.snapshot.as_mut() {
            rescale_bodies(&self.items, snapshot, previous, viewport);
        }
        if self.mode() == ViewMode::Overview {
            self.engine.restart(1.0);
        }
    }

    /// Pointer moved over the surface (`Some`) or left it (`None`).
    pub(in crate::app) fn pointer_moved(&mut self, pointer: Option<Vec2>) {
        if !self.mounted {
            return;
        }
        self.pointer = pointer;
        if let Some(pointer) = pointer {
            self.events.push(BubbleEvent::PointerMoved(Pos2::new(pointer.x, pointer.y)));
        }

        let hovered = match pointer {
            Some(pointer) if self.mode() == ViewMode::Overview => {
                nearest_containing(&self.bodies, pointer, self.settings.hover_tolerance)
            }
            _ => None,
        };
        self.set_hovered(hovered);
    }

    fn set_hovered(&mut self, hovered: Option<usize>) {
        if self.hovered == hovered {
            return;
        }
        self.hovered = hovered;
        let id = hovered.and_then(|index| self.items.get(index)).map(|item| item.id.clone());
        self.events.push(BubbleEvent::HoverChanged(id));
    }

    /// Click on the surface. Only honoured in overview: groups ask for a
    /// drill-down, leaves start the expansion.
    pub(in crate::app) fn click(&mut self, point: Vec2) -> bool {
        if !self.mounted || self.mode() != ViewMode::Overview {
            return false;
        }
        let Some(index) = nearest_containing(&self.bodies, point, 0.0) else {
            return false;
        };

        let item = &self.items[index];
        if item.is_group() {
            log::info!("drill-down requested for {}", item.category);
            self.events.push(BubbleEvent::DrillDown {
                category: item.category.clone(),
            });
            return true;
        }

        self.expand(index)
    }

    fn expand(&mut self, index: usize) -> bool {
        if index >= self.bodies.len() || self.mode() != ViewMode::Overview {
            return false;
        }

        self.snapshot = Some(self.bodies.clone());
        self.engine.stop();
        self.selected = Some(index);
        self.set_hovered(None);
        self.transition.begin_expand()
    }

    /// Close action from the overlay.
    pub(in crate::app) fn close(&mut self) -> bool {
        self.mounted && self.transition.begin_collapse()
    }

    /// One frame: transition step, pointer expansion, then the layout tick
    /// (forces + collisions). Painting reads the result afterwards. Returns
    /// true while anything is still moving.
    pub(in crate::app) fn frame(&mut self, dt: f32) -> bool {
        if !self.mounted {
            return false;
        }

        if let Some(TransitionEvent::Collapsed) = self.transition.advance(dt) {
            self.finish_collapse();
        }

        let mut converging = false;
        if self.mode() == ViewMode::Overview {
            converging = update_radii(&mut self.bodies, self.pointer, &self.settings.proximity);
            if converging {
                self.engine.reheat(self.settings.interaction_alpha);
            }
        }

        let moved = self.engine.tick(&mut self.bodies, &self.targets);
        moved || converging || self.transition.is_animating()
    }

    fn finish_collapse(&mut self) {
        if let Some(snapshot) = self.snapshot.take()
            && snapshot.len() == self.bodies.len()
        {
            self.bodies = snapshot;
        }
        self.selected = None;
        self.engine.restart(self.settings.resume_alpha);
    }

    /// Stops the engine and drops any pending animation. The field ignores
    /// every later call until it is rebuilt.
    pub(in crate::app) fn unmount(&mut self) {
        self.engine.stop();
        self.transition.reset();
        self.selected = None;
        self.snapshot = None;
        self.hovered = None;
        self.pointer = None;
        self.events.clear();
        self.mounted = false;
    }

    pub(in crate::app) fn overlay(&self, viewport: Rect) -> Option<OverlayGeometry> {
        if !self.mode().has_selection() {
            return None;
        }
        let body = self.selected.and_then(|index| self.bodies.get(index))?;
        Some(overlay_geometry(
            self.progress(),
            viewport.min + body.position,
            body.current_radius,
            viewport,
            self.settings.content_reveal,
        ))
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    const FRAME: f32 = 1.0 / 60.0;
    const VIEWPORT: Vec2 = vec2(1000.0, 600.0);

    fn leaves() -> Arc<[Item]> {
        (0..12)
            .map(|index| {
                Item::leaf(
                    format!("paper-{index}"),
                    (index * 9) as f32,
                    if index % 2 == 0 { "Physics" } else { "Biology" },
                    index % 3 == 0,
                )
            })
            .collect()
    }

    fn field(items: Arc<[Item]>) -> BubbleField {
        BubbleField::new(items, FilterSet::default(), VIEWPORT, FieldSettings::default())
    }

    fn settle(field: &mut BubbleField, frames: usize) {
        for _ in 0..frames {
            field.frame(FRAME);
        }
    }

    fn center_of(field: &BubbleField, index: usize) -> Vec2 {
        field.bodies()[index].position
    }

    #[test]
    fn leaf_click_expands_and_freezes_layout() {
        let mut field = field(leaves());
        settle(&mut field, 120);

        let target = center_of(&field, 4);
        assert!(field.click(target));
        assert_eq!(field.mode(), ViewMode::Expanding);
        assert_eq!(field.selected(), Some(4));
        assert!(!field.is_engine_running());

        let frozen = field.bodies().to_vec();
        settle(&mut field, 10);
        assert_eq!(field.bodies(), frozen.as_slice());

        assert!(!field.click(center_of(&field, 2)));
        assert_eq!(field.selected(), Some(4));

        settle(&mut field, 30);
        assert_eq!(field.mode(), ViewMode::Expanded);
        assert_eq!(field.progress(), 1.0);
    }

    #[test]
    fn collapse_returns_to_overview_and_resumes_engine() {
        let mut field = field(leaves());
        settle(&mut field, 60);
        field.click(center_of(&field, 7));
        settle(&mut field, 40);

        assert!(field.close());
        assert_eq!(field.mode(), ViewMode::Collapsing);
        settle(&mut field, 36);

        assert_eq!(field.mode(), ViewMode::Overview);
        assert_eq!(field.selected(), None);
        assert!(field.is_engine_running());
        assert!(field.alpha() > 0.0);
    }

    #[test]
    fn group_click_requests_drill_down_without_state_change() {
        let groups: Arc<[Item]> = vec![
            Item::group("Physics", 40.0, 30, 10),
            Item::group("Biology", 70.0, 12, 2),
        ]
        .into();
        let mut field = field(groups);
        settle(&mut field, 200);
        field.drain_events();

        assert!(field.click(center_of(&field, 1)));
        assert_eq!(field.mode(), ViewMode::Overview);
        assert_eq!(field.selected(), None);
        assert_eq!(
            field.drain_events(),
            vec![BubbleEvent::DrillDown {
                category: "Biology".to_owned()
            }]
        );
    }

    #[test]
    fn unmount_during_expansion_stops_all_mutation() {
        let mut field = field(leaves());
        settle(&mut field, 30);
        field.click(center_of(&field, 3));
        field.frame(FRAME);
        assert_eq!(field.mode(), ViewMode::Expanding);

        field.unmount();
        let bodies = field.bodies().to_vec();
        let progress = field.progress();

        field.pointer_moved(Some(center_of(&field, 0)));
        assert!(!field.frame(FRAME));
        settle(&mut field, 60);
        assert!(!field.close());
        assert!(!field.click(center_of(&field, 0)));

        assert_eq!(field.bodies(), bodies.as_slice());
        assert_eq!(field.progress(), progress);
        assert!(!field.is_engine_running());
        assert!(!field.is_mounted());
        assert!(field.drain_events().is_empty());
    }

    #[test]
    fn hover_changes_are_reported_once() {
        let mut field = field(leaves());
        settle(&mut field, 120);
        field.drain_events();

        let target = center_of(&field, 5);
        field.pointer_moved(Some(target));
        field.pointer_moved(Some(target + vec2(0.5, 0.0)));
        field.pointer_moved(None);

        let hover_events = field
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, BubbleEvent::HoverChanged(_)))
            .collect::<Vec<_>>();
        assert_eq!(
            hover_events,
            vec![
                BubbleEvent::HoverChanged(Some("paper-5".to_owned())),
                BubbleEvent::HoverChanged(None),
            ]
        );
        assert_eq!(field.hovered(), None);
    }

    #[test]
    fn replacing_the_collection_clears_stale_selection() {
        let mut field = field(leaves());
        settle(&mut field, 30);
        field.click(center_of(&field, 1));
        assert!(field.selected().is_some());

        field.set_items(leaves());
        assert_eq!(field.mode(), ViewMode::Overview);
        assert_eq!(field.selected(), None);
        assert_eq!(field.hovered(), None);
        assert!(field.overlay(Rect::from_min_size(Pos2::ZERO, VIEWPORT)).is_none());
        assert!(field.is_engine_running());
    }

    #[test]
    fn same_collection_reference_keeps_state() {
        let items = leaves();
        let mut field = field(Arc::clone(&items));
        settle(&mut field, 30);
        field.click(center_of(&field, 1));

        field.set_items(items);
        assert_eq!(field.selected(), Some(1));
        assert_eq!(field.mode(), ViewMode::Expanding);
    }

    #[test]
    fn empty_collection_never_schedules_work() {
        let mut field = field(Arc::from(Vec::new()));
        assert!(!field.frame(FRAME));
        assert!(!field.click(vec2(10.0, 10.0)));
        field.pointer_moved(Some(vec2(10.0, 10.0)));
        assert_eq!(field.hovered(), None);
    }

    #[test]
    fn settled_layout_respects_padding_and_magnitude_order() {
        let mut field = field(leaves());
        settle(&mut field, 600);

        let bodies = field.bodies();
        let padding = field.settings().engine.collision_padding;
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let distance = (bodies[i].position - bodies[j].position).length();
                let required = bodies[i].current_radius + bodies[j].current_radius + padding;
                assert!(distance >= required - 1.0, "{i} and {j} overlap");
            }
        }
        assert!(bodies[0].position.x < bodies[11].position.x);
    }

    #[test]
    fn pointer_expansion_stays_within_bounds() {
        let mut field = field(leaves());
        settle(&mut field, 60);
        let target = center_of(&field, 6);
        field.pointer_moved(Some(target));

        for _ in 0..90 {
            field.frame(FRAME);
            for body in field.bodies() {
                assert!(body.current_radius >= body.base_radius);
                assert!(body.current_radius <= body.base_radius * 1.4 + 1e-4);
            }
        }
        let hovered = &field.bodies()[6];
        assert!(hovered.current_radius > hovered.base_radius);
    }
}
