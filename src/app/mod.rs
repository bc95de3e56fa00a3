use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2};

use crate::config::Tuning;
use crate::data::{Dataset, ItemMode, load_dataset};

mod bubbles;
mod capability;
mod physics;
mod render_utils;
mod ui;

pub use capability::{QualityChoice, QualityProfile};

use bubbles::BubbleField;
use physics::FilterSet;

type LoadResult = Result<Dataset, String>;

/// Startup choices applied to every freshly loaded view.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub data_path: PathBuf,
    pub mode: ItemMode,
    pub categories: Vec<String>,
    pub tuning: Tuning,
    pub quality: QualityProfile,
}

pub struct ImpactLensApp {
    options: LaunchOptions,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    dataset: Arc<Dataset>,
    mode: ItemMode,
    filters: FilterSet,
    allow_list: BTreeSet<String>,
    drill_origin: Option<DrillOrigin>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    items_revision: u64,
    items_dirty: bool,
    field: BubbleField,
    field_moving: bool,
    last_pointer: Option<Pos2>,
    tuning: Tuning,
    quality: QualityProfile,
    hovered_id: Option<String>,
    pointer: Option<Pos2>,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

/// View to return to after drilling into one category.
struct DrillOrigin {
    mode: ItemMode,
    allow_list: BTreeSet<String>,
}

struct SearchMatchCache {
    query: String,
    items_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl ImpactLensApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let state = Self::start_load(&options);
        Self {
            options,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(data_path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dataset(&data_path).map_err(|error| {
                log::error!("failed to load {}: {error:#}", data_path.display());
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(options: &LaunchOptions) -> AppState {
        log::info!("loading papers from {}", options.data_path.display());
        AppState::Loading {
            rx: Self::spawn_load(options.data_path.clone()),
        }
    }

    fn ready_state(&self, result: LoadResult) -> AppState {
        match result {
            Ok(dataset) => AppState::Ready(Box::new(ViewModel::new(dataset, &self.options))),
            Err(error) => AppState::Error(error),
        }
    }
}

impl eframe::App for ImpactLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(result);
                } else {
                    ctx.request_repaint();
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading papers...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the paper dataset");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                let data_path = self.options.data_path.display().to_string();
                model.show(ctx, &data_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.options.data_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(&self.options);
            return;
        }

        if let Some(result) = transition {
            if let AppState::Ready(model) = &mut self.state {
                model.unmount();
            }
            self.reload_rx = None;
            self.state = self.ready_state(result);
        }
    }
}
