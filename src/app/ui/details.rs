use eframe::egui::{self, Color32, Rect, RichText, Sense, Ui, pos2, vec2};

use crate::data::{CategorySummary, Item, ItemKind};
use crate::util::{format_percent, format_score, short_label};

use super::super::ViewModel;

const HISTOGRAM_HEIGHT: f32 = 56.0;
const HISTOGRAM_BAR: Color32 = Color32::from_rgb(103, 196, 255);

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// One-line publication timeline of a discipline, e.g. `published 2018-2023, peak 2021`.
fn timeline_line(summary: &CategorySummary) -> Option<String> {
    let (first, last) = summary.year_range()?;
    let mut line = if first == last {
        format!("published {first}")
    } else {
        let peak = summary.peak_year().unwrap_or(first);
        format!("published {first}-{last}, peak {peak}")
    };
    if summary.undated > 0 {
        line.push_str(&format!(" ({} undated)", summary.undated));
    }
    Some(line)
}

impl ViewModel {
    /// Display name of a bubble: paper title when known, else its id.
    pub(in crate::app) fn item_label(&self, item: &Item) -> String {
        match item.kind {
            ItemKind::Group { .. } => item.category.clone(),
            ItemKind::Leaf => self
                .dataset
                .paper(&item.id)
                .and_then(|paper| paper.title.clone())
                .unwrap_or_else(|| item.id.clone()),
        }
    }

    pub(in crate::app) fn tooltip_lines(&self, item: &Item) -> Vec<String> {
        let mut lines = vec![short_label(&self.item_label(item), 64)];
        match item.kind {
            ItemKind::Leaf => {
                lines.push(format!("{} | {}", item.category, item.id));
                lines.push(format!("impact {}", format_score(item.magnitude)));
                lines.push(format!("code: {}", yes_no(item.has_code)));
            }
            ItemKind::Group {
                group_size,
                secondary_metric,
            } => {
                lines.push(format!("{group_size} papers"));
                lines.push(format!("mean impact {}", format_score(item.magnitude)));
                lines.push(format!("{secondary_metric} with code"));
                if let Some(timeline) = self
                    .dataset
                    .summary_for(&item.category)
                    .as_ref()
                    .and_then(timeline_line)
                {
                    lines.push(timeline);
                }
                lines.push("click to explore".to_owned());
            }
        }
        lines
    }

    /// Content of the expanded overlay. Returns true when Close was pressed.
    pub(in crate::app) fn draw_selection_details(&self, ui: &mut Ui) -> bool {
        let Some(item) = self.field.selected_item() else {
            ui.label("The selected paper is no longer in view.");
            return ui.button("Close").clicked();
        };
        let paper = self.dataset.paper(&item.id);

        ui.label(RichText::new(self.item_label(item)).heading().strong());
        ui.small(item.id.as_str());
        ui.add_space(8.0);

        egui::Grid::new("selection_metrics")
            .num_columns(2)
            .spacing([18.0, 6.0])
            .show(ui, |ui| {
                ui.label("Discipline");
                ui.label(item.category.as_str());
                ui.end_row();

                ui.label("Year");
                ui.label(
                    paper
                        .and_then(|paper| paper.year)
                        .map_or_else(|| "unknown".to_owned(), |year| year.to_string()),
                );
                ui.end_row();

                ui.label("Impact score");
                ui.label(format_score(item.magnitude));
                ui.end_row();

                ui.label("Code available");
                ui.label(yes_no(item.has_code));
                ui.end_row();

                ui.label("Uses machine learning");
                ui.label(yes_no(paper.is_some_and(|paper| paper.uses_ml)));
                ui.end_row();
            });

        if let Some(summary) = self.dataset.summary_for(&item.category) {
            ui.separator();
            draw_category_summary(ui, &summary);
        }

        ui.add_space(12.0);
        ui.button("Close").on_hover_text("Escape also closes.").clicked()
    }
}

fn draw_category_summary(ui: &mut Ui, summary: &CategorySummary) {
    ui.label(RichText::new(format!("{} averages", summary.category)).strong());
    ui.label(format!("papers: {}", summary.paper_count));
    ui.label(format!("mean impact: {}", format_score(summary.mean_impact)));
    ui.label(format!("with code: {}", format_percent(summary.code_rate())));
    if summary.paper_count > 0 {
        let ml_rate = summary.with_ml as f32 / summary.paper_count as f32;
        ui.label(format!("using ML: {}", format_percent(ml_rate)));
    }
    if let Some(timeline) = timeline_line(summary) {
        ui.label(timeline);
        draw_year_histogram(ui, summary);
    }
}

/// Papers per year as bars, one slot for every year in the range.
fn draw_year_histogram(ui: &mut Ui, summary: &CategorySummary) {
    let Some((first, last)) = summary.year_range() else {
        return;
    };
    let peak = summary.papers_by_year.values().copied().max().unwrap_or(1).max(1);
    let slots = (last - first + 1) as usize;

    let width = ui.available_width().min(420.0);
    let (rect, response) = ui.allocate_exact_size(vec2(width, HISTOGRAM_HEIGHT), Sense::hover());
    let painter = ui.painter_at(rect);
    let slot_width = rect.width() / slots as f32;

    let mut hovered = None;
    for (&year, &count) in &summary.papers_by_year {
        let slot = (year - first) as usize;
        let height = rect.height() * count as f32 / peak as f32;
        let left = rect.left() + slot as f32 * slot_width;
        let bar = Rect::from_min_max(
            pos2(left + slot_width * 0.1, rect.bottom() - height),
            pos2(left + slot_width * 0.9, rect.bottom()),
        );
        painter.rect_filled(bar, 1.0, HISTOGRAM_BAR);
        if response
            .hover_pos()
            .is_some_and(|pointer| pointer.x >= left && pointer.x < left + slot_width)
        {
            hovered = Some((year, count));
        }
    }

    if let Some((year, count)) = hovered {
        response.on_hover_text(format!("{year}: {count} papers"));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::app::LaunchOptions;
    use crate::app::capability::{PerformanceTier, QualityProfile};
    use crate::config::Tuning;
    use crate::data::{Dataset, ItemMode, PaperRecord};

    fn model() -> ViewModel {
        let dataset = Dataset::new(
            "memory",
            vec![
                PaperRecord {
                    id: "x1".to_owned(),
                    title: Some("Quantum dots revisited".to_owned()),
                    category: "Physics".to_owned(),
                    year: Some(2019),
                    impact_score: 70.0,
                    has_code: true,
                    uses_ml: false,
                },
                PaperRecord {
                    id: "x2".to_owned(),
                    title: None,
                    category: "Physics".to_owned(),
                    year: None,
                    impact_score: 20.0,
                    has_code: false,
                    uses_ml: true,
                },
            ],
            0,
        );
        let options = LaunchOptions {
            data_path: PathBuf::from("papers.json"),
            mode: ItemMode::Leaf,
            categories: Vec::new(),
            tuning: Tuning::default(),
            quality: QualityProfile::for_tier(PerformanceTier::High),
        };
        ViewModel::new(dataset, &options)
    }

    #[test]
    fn labels_fall_back_to_ids() {
        let model = model();
        let items = model.field.items().to_vec();
        assert_eq!(model.item_label(&items[0]), "Quantum dots revisited");
        assert_eq!(model.item_label(&items[1]), "x2");
    }

    #[test]
    fn group_tooltips_mention_size_and_code() {
        let model = model();
        let group = Item::group("Physics", 45.0, 2, 1);
        let lines = model.tooltip_lines(&group);
        assert_eq!(lines[0], "Physics");
        assert!(lines.contains(&"2 papers".to_owned()));
        assert!(lines.contains(&"1 with code".to_owned()));
        assert!(lines.contains(&"published 2019 (1 undated)".to_owned()));
    }

    #[test]
    fn timelines_name_the_span_and_peak() {
        let dataset = Dataset::new(
            "memory",
            [(2018, "a"), (2021, "b"), (2021, "c"), (2023, "d")]
                .into_iter()
                .map(|(year, id)| PaperRecord {
                    id: id.to_owned(),
                    title: None,
                    category: "Biology".to_owned(),
                    year: Some(year),
                    impact_score: 50.0,
                    has_code: false,
                    uses_ml: true,
                })
                .collect(),
            0,
        );
        let summary = dataset.summary_for("Biology").unwrap();
        assert_eq!(
            timeline_line(&summary).as_deref(),
            Some("published 2018-2023, peak 2021")
        );
    }
}
