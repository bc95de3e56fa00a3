use std::num::NonZeroUsize;

use clap::ValueEnum;

const LOW_TIER_MAX_CORES: usize = 4;
const SMALL_WINDOW_WIDTH: f32 = 900.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum QualityChoice {
    Auto,
    Low,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceTier {
    Low,
    High,
}

impl PerformanceTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

/// Rendering and physics constants derived once from the host at startup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityProfile {
    pub tier: PerformanceTier,
    pub multisampling: u16,
    pub glow_layers: usize,
    pub glow_spread: f32,
    pub velocity_decay: f32,
    pub alpha_decay: f32,
}

impl QualityProfile {
    pub fn for_tier(tier: PerformanceTier) -> Self {
        match tier {
            PerformanceTier::Low => Self {
                tier,
                multisampling: 0,
                glow_layers: 2,
                glow_spread: 4.0,
                velocity_decay: 0.4,
                alpha_decay: 0.02,
            },
            PerformanceTier::High => Self {
                tier,
                multisampling: 4,
                glow_layers: 5,
                glow_spread: 10.0,
                velocity_decay: 0.3,
                alpha_decay: 0.015,
            },
        }
    }

    pub fn detect(
        choice: QualityChoice,
        parallelism: Option<NonZeroUsize>,
        window_width: f32,
    ) -> Self {
        let tier = match choice {
            QualityChoice::Low => PerformanceTier::Low,
            QualityChoice::High => PerformanceTier::High,
            QualityChoice::Auto => {
                let cores = parallelism.map_or(1, NonZeroUsize::get);
                if cores <= LOW_TIER_MAX_CORES || window_width < SMALL_WINDOW_WIDTH {
                    PerformanceTier::Low
                } else {
                    PerformanceTier::High
                }
            }
        };
        Self::for_tier(tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn few_cores_or_small_window_selects_low_tier() {
        let quad = NonZeroUsize::new(4);
        let many = NonZeroUsize::new(16);
        assert_eq!(
            QualityProfile::detect(QualityChoice::Auto, quad, 1440.0).tier,
            PerformanceTier::Low
        );
        assert_eq!(
            QualityProfile::detect(QualityChoice::Auto, many, 640.0).tier,
            PerformanceTier::Low
        );
        assert_eq!(
            QualityProfile::detect(QualityChoice::Auto, many, 1440.0).tier,
            PerformanceTier::High
        );
        assert_eq!(
            QualityProfile::detect(QualityChoice::High, None, 320.0).tier,
            PerformanceTier::High
        );
    }
}
