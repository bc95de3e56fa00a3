use eframe::egui::Vec2;

use crate::data::{Item, ItemKind};

const SPREAD_MARGIN: f32 = 0.1;
const SPREAD_SPAN: f32 = 0.8;
const SPREAD_STRENGTH: f32 = 0.04;

const MAGNITUDE_THRESHOLD: f32 = 50.0;
const MAGNITUDE_LOW_X: f32 = 0.30;
const MAGNITUDE_HIGH_X: f32 = 0.70;
const MAGNITUDE_STRENGTH: f32 = 0.15;

const FLAG_TOP_Y: f32 = 0.35;
const FLAG_BOTTOM_Y: f32 = 0.65;
const FLAG_STRENGTH_LEAF: f32 = 0.25;
const FLAG_STRENGTH_GROUP: f32 = 0.8;

const CENTER_Y_STRENGTH: f32 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct FilterSet {
    pub(in crate::app) magnitude_split: bool,
    pub(in crate::app) flag_split: bool,
}

/// Spring anchor for one body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct LayoutTarget {
    pub(in crate::app) x: f32,
    pub(in crate::app) y: f32,
    pub(in crate::app) strength_x: f32,
    pub(in crate::app) strength_y: f32,
}

fn target_x(magnitude: f32, filters: FilterSet, width: f32) -> (f32, f32) {
    if filters.magnitude_split {
        let fraction = if magnitude <= MAGNITUDE_THRESHOLD {
            MAGNITUDE_LOW_X
        } else {
            MAGNITUDE_HIGH_X
        };
        (width * fraction, MAGNITUDE_STRENGTH)
    } else {
        let spread = (magnitude.clamp(0.0, 100.0) / 100.0) * SPREAD_SPAN * width;
        ((SPREAD_MARGIN * width) + spread, SPREAD_STRENGTH)
    }
}

/// Secondary-metric range across the group items of a collection.
#[derive(Clone, Copy, Debug)]
struct MetricRange {
    min: usize,
    max: usize,
}

impl MetricRange {
    fn of(items: &[Item]) -> Option<Self> {
        items
            .iter()
            .filter_map(Item::secondary_metric)
            .fold(None, |range, metric| {
                Some(match range {
                    None => Self {
                        min: metric,
                        max: metric,
                    },
                    Some(Self { min, max }) => Self {
                        min: min.min(metric),
                        max: max.max(metric),
                    },
                })
            })
    }

    /// Equal metrics everywhere land on the middle of the band.
    fn normalize(self, metric: usize) -> f32 {
        if self.max <= self.min {
            return 0.5;
        }
        (metric.saturating_sub(self.min) as f32 / (self.max - self.min) as f32).clamp(0.0, 1.0)
    }
}

fn target_y(
    item: &Item,
    filters: FilterSet,
    range: Option<MetricRange>,
    height: f32,
) -> (f32, f32) {
    if !filters.flag_split {
        return (height * 0.5, CENTER_Y_STRENGTH);
    }

    match item.kind {
        ItemKind::Leaf => {
            let fraction = if item.has_code {
                FLAG_TOP_Y
            } else {
                FLAG_BOTTOM_Y
            };
            (height * fraction, FLAG_STRENGTH_LEAF)
        }
        ItemKind::Group {
            secondary_metric, ..
        } => {
            let normalized = range.map_or(0.5, |range| range.normalize(secondary_metric));
            let fraction = FLAG_BOTTOM_Y - (normalized * (FLAG_BOTTOM_Y - FLAG_TOP_Y));
            (height * fraction, FLAG_STRENGTH_GROUP)
        }
    }
}

pub(in crate::app) fn layout_targets(
    items: &[Item],
    filters: FilterSet,
    viewport: Vec2,
) -> Vec<LayoutTarget> {
    let range = MetricRange::of(items);
    items
        .iter()
        .map(|item| {
            let (x, strength_x) = target_x(item.magnitude, filters, viewport.x);
            let (y, strength_y) = target_y(item, filters, range, viewport.y);
            LayoutTarget {
                x,
                y,
                strength_x,
                strength_y,
            }
        })
        .collect()
}
