use eframe::egui::{Pos2, Rect};

const COMPLETION_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) enum ViewMode {
    #[default]
    Overview,
    Expanding,
    Expanded,
    Collapsing,
}

impl ViewMode {
    pub(in crate::app) fn label(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Expanding => "expanding",
            Self::Expanded => "expanded",
            Self::Collapsing => "collapsing",
        }
    }

    pub(in crate::app) fn has_selection(self) -> bool {
        self != Self::Overview
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

#[derive(Clone, Copy, Debug)]
struct TransitionTask {
    id: u64,
    direction: Direction,
    from: f32,
    elapsed: f32,
}

/// Emitted by `advance` when an animation lands on its bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum TransitionEvent {
    Expanded,
    Collapsed,
}

pub(in crate::app) fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

pub(in crate::app) fn ease_in_cubic(t: f32) -> f32 {
    t.clamp(0.0, 1.0).powi(3)
}

/// Overview <-> expanded state machine. At most one timed task drives
/// `progress`; starting a task always drops the previous one first.
#[derive(Debug)]
pub(in crate::app) struct ViewTransition {
    mode: ViewMode,
    progress: f32,
    duration_secs: f32,
    task: Option<TransitionTask>,
    next_task_id: u64,
}

impl ViewTransition {
    pub(in crate::app) fn new(duration_ms: f32) -> Self {
        Self {
            mode: ViewMode::Overview,
            progress: 0.0,
            duration_secs: (duration_ms / 1000.0).max(0.001),
            task: None,
            next_task_id: 0,
        }
    }

    pub(in crate::app) fn mode(&self) -> ViewMode {
        self.mode
    }

    pub(in crate::app) fn progress(&self) -> f32 {
        self.progress
    }

    pub(in crate::app) fn is_animating(&self) -> bool {
        self.task.is_some()
    }

    #[cfg(test)]
    pub(in crate::app) fn active_task_id(&self) -> Option<u64> {
        self.task.map(|task| task.id)
    }

    pub(in crate::app) fn set_duration_ms(&mut self, duration_ms: f32) {
        self.duration_secs = (duration_ms / 1000.0).max(0.001);
    }

    fn start_task(&mut self, direction: Direction) {
        self.task = None;
        self.next_task_id = self.next_task_id.wrapping_add(1);
        self.task = Some(TransitionTask {
            id: self.next_task_id,
            direction,
            from: self.progress,
            elapsed: 0.0,
        });
    }

    /// OVERVIEW -> EXPANDING. Refused in every other mode.
    pub(in crate::app) fn begin_expand(&mut self) -> bool {
        if self.mode != ViewMode::Overview {
            return false;
        }

        self.mode = ViewMode::Expanding;
        self.progress = 0.0;
        self.start_task(Direction::Forward);
        log::debug!("view transition: overview -> expanding");
        true
    }

    /// EXPANDED (or an unfinished EXPANDING) -> COLLAPSING, reversing from the
    /// current progress.
    pub(in crate::app) fn begin_collapse(&mut self) -> bool {
        if !matches!(self.mode, ViewMode::Expanding | ViewMode::Expanded) {
            return false;
        }

        log::debug!(
            "view transition: {} -> collapsing at {:.2}",
            self.mode.label(),
            self.progress
        );
        self.mode = ViewMode::Collapsing;
        self.start_task(Direction::Reverse);
        true
    }

    pub(in crate::app) fn advance(&mut self, dt: f32) -> Option<TransitionEvent> {
        let task = self.task.as_mut()?;
        task.elapsed += dt.max(0.0);

        let t = (task.elapsed / self.duration_secs).min(1.0);
        let finished = t >= 1.0 - COMPLETION_EPSILON;
        let direction = task.direction;
        let from = task.from;

        match direction {
            Direction::Forward => {
                if finished {
                    self.task = None;
                    self.progress = 1.0;
                    self.mode = ViewMode::Expanded;
                    log::debug!("view transition: expanding -> expanded");
                    return Some(TransitionEvent::Expanded);
                }
                self.progress = from + (1.0 - from) * ease_out_cubic(t);
            }
            Direction::Reverse => {
                if finished {
                    self.task = None;
                    self.progress = 0.0;
                    self.mode = ViewMode::Overview;
                    log::debug!("view transition: collapsing -> overview");
                    return Some(TransitionEvent::Collapsed);
                }
                self.progress = from * (1.0 - ease_in_cubic(t));
            }
        }
        None
    }

    /// Drops any in-flight task and returns to a clean overview.
    pub(in crate::app) fn reset(&mut self) {
        self.task = None;
        self.mode = ViewMode::Overview;
        self.progress = 0.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct OverlayGeometry {
    pub(in crate::app) center: Pos2,
    pub(in crate::app) radius: f32,
    pub(in crate::app) scale: f32,
    /// Corner rounding as a fraction of the overlay side, 0.5 = circle.
    pub(in crate::app) corner_fraction: f32,
    pub(in crate::app) content_opacity: f32,
    pub(in crate::app) content_interactive: bool,
}

impl OverlayGeometry {
    pub(in crate::app) fn rect(&self) -> Rect {
        let side = self.radius * self.scale * 2.0;
        Rect::from_center_size(self.center, eframe::egui::vec2(side, side))
    }
}

pub(in crate::app) fn overlay_geometry(
    progress: f32,
    origin: Pos2,
    radius: f32,
    viewport: Rect,
    content_reveal: f32,
) -> OverlayGeometry {
    let progress = progress.clamp(0.0, 1.0);
    let radius = radius.max(1.0);
    let cover_scale = viewport.width().max(viewport.height()) / (radius * 2.0);
    let content_opacity = if progress > content_reveal && content_reveal < 1.0 {
        ((progress - content_reveal) / (1.0 - content_reveal)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    OverlayGeometry {
        center: origin + (viewport.center() - origin) * progress,
        radius,
        scale: 1.0 + (cover_scale - 1.0) * progress,
        corner_fraction: 0.5 - (0.4 * progress),
        content_opacity,
        content_interactive: progress > content_reveal,
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn run(transition: &mut ViewTransition, frames: usize) -> Vec<TransitionEvent> {
        (0..frames)
            .filter_map(|_| transition.advance(FRAME))
            .collect()
    }

    #[test]
    fn expansion_completes_after_six_hundred_milliseconds() {
        let mut transition = ViewTransition::new(600.0);
        assert!(transition.begin_expand());
        assert_eq!(transition.mode(), ViewMode::Expanding);

        assert!(run(&mut transition, 35).is_empty());
        assert_eq!(transition.mode(), ViewMode::Expanding);
        assert!(transition.progress() > 0.99 && transition.progress() < 1.0);

        assert_eq!(run(&mut transition, 1), vec![TransitionEvent::Expanded]);
        assert_eq!(transition.mode(), ViewMode::Expanded);
        assert_eq!(transition.progress(), 1.0);
        assert!(!transition.is_animating());
    }

    #[test]
    fn forward_progress_is_eased_out() {
        let mut transition = ViewTransition::new(600.0);
        transition.begin_expand();
        transition.advance(0.3);
        assert!((transition.progress() - 0.875).abs() < 1e-4);
    }

    #[test]
    fn collapse_interrupt_reverses_from_current_progress() {
        let mut transition = ViewTransition::new(600.0);
        transition.begin_expand();
        while transition.progress() < 0.4 {
            transition.advance(0.001);
        }
        let interrupted_at = transition.progress();
        assert!(interrupted_at < 0.45);

        assert!(transition.begin_collapse());
        assert_eq!(transition.mode(), ViewMode::Collapsing);
        assert_eq!(transition.advance(0.0), None);
        assert!((transition.progress() - interrupted_at).abs() < 1e-6);

        transition.advance(0.3);
        let halfway = transition.progress();
        assert!((halfway - interrupted_at * 0.875).abs() < 1e-4);

        assert_eq!(run(&mut transition, 18), vec![TransitionEvent::Collapsed]);
        assert_eq!(transition.mode(), ViewMode::Overview);
        assert_eq!(transition.progress(), 0.0);
    }

    #[test]
    fn each_mode_enables_exactly_its_own_transition() {
        let mut transition = ViewTransition::new(600.0);
        assert!(!transition.begin_collapse());

        assert!(transition.begin_expand());
        assert!(!transition.begin_expand());

        run(&mut transition, 36);
        assert_eq!(transition.mode(), ViewMode::Expanded);
        assert!(!transition.begin_expand());

        assert!(transition.begin_collapse());
        assert!(!transition.begin_collapse());
        assert!(!transition.begin_expand());

        run(&mut transition, 36);
        assert_eq!(transition.mode(), ViewMode::Overview);
        assert!(!transition.is_animating());
    }

    #[test]
    fn superseding_task_replaces_the_previous_one() {
        let mut transition = ViewTransition::new(600.0);
        transition.begin_expand();
        let first = transition.active_task_id();
        transition.advance(0.1);
        transition.begin_collapse();
        let second = transition.active_task_id();

        assert!(first.is_some() && second.is_some());
        assert_ne!(first, second);

        transition.reset();
        assert_eq!(transition.active_task_id(), None);
        assert_eq!(transition.advance(FRAME), None);
        assert_eq!(transition.mode(), ViewMode::Overview);
    }

    #[test]
    fn overlay_interpolates_from_bubble_to_viewport() {
        let viewport = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));
        let origin = pos2(100.0, 500.0);

        let start = overlay_geometry(0.0, origin, 20.0, viewport, 0.7);
        assert_eq!(start.center, origin);
        assert_eq!(start.scale, 1.0);
        assert_eq!(start.corner_fraction, 0.5);
        assert_eq!(start.content_opacity, 0.0);
        assert!(!start.content_interactive);

        let end = overlay_geometry(1.0, origin, 20.0, viewport, 0.7);
        assert_eq!(end.center, pos2(400.0, 300.0));
        assert!((end.rect().width() - 800.0).abs() < 1e-3);
        assert!((end.corner_fraction - 0.1).abs() < 1e-6);
        assert!((end.content_opacity - 1.0).abs() < 1e-6);
        assert!(end.content_interactive);

        let before_reveal = overlay_geometry(0.7, origin, 20.0, viewport, 0.7);
        assert_eq!(before_reveal.content_opacity, 0.0);
        assert!(!before_reveal.content_interactive);
        let after_reveal = overlay_geometry(0.85, origin, 20.0, viewport, 0.7);
        assert!((after_reveal.content_opacity - 0.5).abs() < 1e-4);
        assert!(after_reveal.content_interactive);
    }
}
