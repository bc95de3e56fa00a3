//! Tuning knobs for the bubble field.
//!
//! Every value has a default matching the stock layout; a TOML file passed with
//! `--config` may override any subset of them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Pointer distance beyond which a bubble gets no expansion boost.
    pub influence_radius: f32,
    pub falloff_power: f32,
    pub max_expansion: f32,
    pub smoothing: f32,
    /// Extra spacing kept between bubble outlines by the collision pass.
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub collision_iterations: usize,
    pub repulsion: f32,
    pub hover_scale: f32,
    pub hover_tolerance: f32,
    pub transition_ms: f32,
    pub content_reveal: f32,
    pub resume_alpha: f32,
    pub interaction_alpha: f32,
    /// Overrides the device profile when set.
    pub velocity_decay: Option<f32>,
    pub alpha_decay: Option<f32>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            influence_radius: 150.0,
            falloff_power: 2.0,
            max_expansion: 1.4,
            smoothing: 0.15,
            collision_padding: 12.0,
            collision_strength: 0.9,
            collision_iterations: 2,
            repulsion: 4.0,
            hover_scale: 1.2,
            hover_tolerance: 5.0,
            transition_ms: 600.0,
            content_reveal: 0.7,
            resume_alpha: 0.3,
            interaction_alpha: 0.1,
            velocity_decay: None,
            alpha_decay: None,
        }
    }
}

impl Tuning {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let tuning: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        log::info!("loaded tuning overrides from {}", path.display());
        Ok(tuning.sanitized())
    }

    /// Clamps every value into the range the simulation stays stable in.
    pub fn sanitized(mut self) -> Self {
        self.influence_radius = self.influence_radius.clamp(1.0, 2000.0);
        self.falloff_power = self.falloff_power.clamp(0.25, 8.0);
        self.max_expansion = self.max_expansion.clamp(1.0, 4.0);
        self.smoothing = self.smoothing.clamp(0.01, 1.0);
        self.collision_padding = self.collision_padding.clamp(0.0, 64.0);
        self.collision_strength = self.collision_strength.clamp(0.05, 1.0);
        self.collision_iterations = self.collision_iterations.clamp(1, 8);
        self.repulsion = self.repulsion.clamp(0.0, 200.0);
        self.hover_scale = self.hover_scale.clamp(1.0, 2.0);
        self.hover_tolerance = self.hover_tolerance.clamp(0.0, 40.0);
        self.transition_ms = self.transition_ms.clamp(16.0, 10_000.0);
        self.content_reveal = self.content_reveal.clamp(0.0, 1.0);
        self.resume_alpha = self.resume_alpha.clamp(0.0, 1.0);
        self.interaction_alpha = self.interaction_alpha.clamp(0.0, 1.0);
        self.velocity_decay = self.velocity_decay.map(|value| value.clamp(0.2, 0.4));
        self.alpha_decay = self.alpha_decay.map(|value| value.clamp(0.01, 0.02));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let tuning: Tuning = toml::from_str("influence_radius = 90.0\nsmoothing = 3.0").unwrap();
        let tuning = tuning.sanitized();
        assert_eq!(tuning.influence_radius, 90.0);
        assert_eq!(tuning.smoothing, 1.0);
        assert_eq!(tuning.max_expansion, 1.4);
        assert_eq!(tuning.collision_padding, 12.0);
        assert_eq!(tuning.velocity_decay, None);
    }

    #[test]
    fn decay_overrides_are_clamped() {
        let tuning: Tuning = toml::from_str("velocity_decay = 0.9\nalpha_decay = 0.001").unwrap();
        let tuning = tuning.sanitized();
        assert_eq!(tuning.velocity_decay, Some(0.4));
        assert_eq!(tuning.alpha_decay, Some(0.01));
    }
}
