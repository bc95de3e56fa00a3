use eframe::egui::Context;

use super::super::ViewModel;

const FPS_SAMPLE_WINDOW: usize = 120;

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        self.record_frame_time(dt);
    }

    fn record_frame_time(&mut self, dt: f32) {
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if !self.show_fps_bar {
            return None;
        }

        let mut parts = vec![format!("FPS {:.0}", self.fps_current)];
        if !self.fps_samples.is_empty() {
            let avg = self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32;
            parts.push(format!("avg {avg:.1}"));
        }
        if let Some(low) = self.fps_samples.iter().copied().reduce(f32::min) {
            parts.push(format!("low {low:.0}"));
        }
        parts.push(format!("{} quality", self.quality.tier.label()));

        Some(parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::app::LaunchOptions;
    use crate::app::capability::{PerformanceTier, QualityProfile};
    use crate::config::Tuning;
    use crate::data::{Dataset, ItemMode};

    fn model() -> ViewModel {
        let options = LaunchOptions {
            data_path: PathBuf::from("empty.json"),
            mode: ItemMode::Group,
            categories: Vec::new(),
            tuning: Tuning::default(),
            quality: QualityProfile::for_tier(PerformanceTier::Low),
        };
        ViewModel::new(Dataset::new("memory", Vec::new(), 0), &options)
    }

    #[test]
    fn sample_window_is_bounded() {
        let mut model = model();
        for _ in 0..(FPS_SAMPLE_WINDOW + 40) {
            model.record_frame_time(1.0 / 50.0);
        }
        model.record_frame_time(0.0);
        assert_eq!(model.fps_samples.len(), FPS_SAMPLE_WINDOW);
        assert!((model.fps_current - 50.0).abs() < 1e-3);
    }

    #[test]
    fn readout_includes_tier_and_can_be_hidden() {
        let mut model = model();
        model.record_frame_time(1.0 / 30.0);
        let text = model.fps_display_text().unwrap_or_default();
        assert!(text.starts_with("FPS 30"));
        assert!(text.ends_with("low quality"));

        model.show_fps_bar = false;
        assert_eq!(model.fps_display_text(), None);
    }
}
