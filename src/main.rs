mod app;
mod config;
mod data;
mod util;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::app::{LaunchOptions, QualityChoice, QualityProfile};
use crate::config::Tuning;
use crate::data::ItemMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Leaf,
    Group,
}

impl From<ModeArg> for ItemMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Leaf => Self::Leaf,
            ModeArg::Group => Self::Group,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Paper dataset: a JSON/JSONL file or a directory of them.
    #[arg(long, default_value = "data")]
    data: PathBuf,

    #[arg(long, value_enum, default_value_t = ModeArg::Group)]
    mode: ModeArg,

    /// Restrict the view to these disciplines (repeatable).
    #[arg(long = "category")]
    categories: Vec<String>,

    /// TOML file overriding layout and animation tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = QualityChoice::Auto)]
    quality: QualityChoice,

    /// Initial window width in points. Below 900 the auto quality tier drops to low.
    #[arg(long, default_value_t = 1440.0)]
    width: f32,

    #[arg(long, default_value_t = 920.0)]
    height: f32,

    /// Log filter, e.g. `debug` or `impact_lens=trace`. `RUST_LOG` wins when set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn initial_window(&self) -> [f32; 2] {
        [self.width.max(320.0), self.height.max(240.0)]
    }

    fn detect_quality(&self) -> QualityProfile {
        QualityProfile::detect(
            self.quality,
            std::thread::available_parallelism().ok(),
            self.initial_window()[0],
        )
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let tuning = match &args.config {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let quality = args.detect_quality();
    log::info!(
        "quality tier {} ({}x msaa, {} glow layers)",
        quality.tier.label(),
        quality.multisampling,
        quality.glow_layers
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size(args.initial_window()),
        multisampling: quality.multisampling,
        ..Default::default()
    };
    let launch = LaunchOptions {
        data_path: args.data,
        mode: args.mode.into(),
        categories: args.categories,
        tuning,
        quality,
    };

    eframe::run_native(
        "impact-lens",
        options,
        Box::new(move |cc| Ok(Box::new(app::ImpactLensApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow::anyhow!("failed to start the viewer: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_initial_window_selects_low_tier() {
        let args = Args::try_parse_from(["impact-lens", "--width", "800"]).unwrap();
        assert_eq!(args.initial_window(), [800.0, 920.0]);
        assert_eq!(args.detect_quality().tier.label(), "low");

        let forced =
            Args::try_parse_from(["impact-lens", "--width", "800", "--quality", "high"]).unwrap();
        assert_eq!(forced.detect_quality().tier.label(), "high");
    }

    #[test]
    fn window_size_is_clamped_to_a_usable_minimum() {
        let args = Args::try_parse_from(["impact-lens", "--width", "10", "--height", "10"]).unwrap();
        assert_eq!(args.initial_window(), [320.0, 240.0]);
    }
}
