use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ItemMode {
    #[default]
    Leaf,
    Group,
}

impl ItemMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Leaf => "Papers",
            Self::Group => "Disciplines",
        }
    }
}

/// One normalised paper as it came out of the extraction pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PaperRecord {
    pub id: String,
    pub title: Option<String>,
    pub category: String,
    pub year: Option<u32>,
    pub impact_score: f32,
    pub has_code: bool,
    pub uses_ml: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Leaf,
    Group {
        group_size: usize,
        secondary_metric: usize,
    },
}

/// Immutable identity of a visualised entity. Simulation state lives in the
/// bubble field, keyed by position in the collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: String,
    pub magnitude: f32,
    pub category: String,
    pub has_code: bool,
    pub kind: ItemKind,
}

impl Item {
    pub fn leaf(
        id: impl Into<String>,
        magnitude: f32,
        category: impl Into<String>,
        has_code: bool,
    ) -> Self {
        Self {
            id: id.into(),
            magnitude: magnitude.clamp(0.0, 100.0),
            category: category.into(),
            has_code,
            kind: ItemKind::Leaf,
        }
    }

    pub fn group(
        category: impl Into<String>,
        magnitude: f32,
        group_size: usize,
        secondary_metric: usize,
    ) -> Self {
        let category = category.into();
        Self {
            id: category.clone(),
            magnitude: magnitude.clamp(0.0, 100.0),
            category,
            has_code: secondary_metric > 0,
            kind: ItemKind::Group {
                group_size,
                secondary_metric,
            },
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ItemKind::Group { .. })
    }

    pub fn group_size(&self) -> Option<usize> {
        match self.kind {
            ItemKind::Group { group_size, .. } => Some(group_size),
            ItemKind::Leaf => None,
        }
    }

    pub fn secondary_metric(&self) -> Option<usize> {
        match self.kind {
            ItemKind::Group {
                secondary_metric, ..
            } => Some(secondary_metric),
            ItemKind::Leaf => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub paper_count: usize,
    pub with_code: usize,
    pub with_ml: usize,
    pub mean_impact: f32,
    pub papers_by_year: BTreeMap<u32, usize>,
    pub undated: usize,
}

impl CategorySummary {
    pub fn code_rate(&self) -> f32 {
        if self.paper_count == 0 {
            0.0
        } else {
            self.with_code as f32 / self.paper_count as f32
        }
    }

    pub fn year_range(&self) -> Option<(u32, u32)> {
        let first = *self.papers_by_year.keys().next()?;
        let last = *self.papers_by_year.keys().next_back()?;
        Some((first, last))
    }

    /// Year with the most papers; the earliest one on ties.
    pub fn peak_year(&self) -> Option<u32> {
        self.papers_by_year
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&year, _)| year)
    }
}

#[derive(Clone, Debug)]
pub struct Dataset {
    pub source: String,
    pub skipped_lines: usize,
    pub duplicate_ids: usize,
    papers: Vec<PaperRecord>,
    index_by_id: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, records: Vec<PaperRecord>, skipped_lines: usize) -> Self {
        let mut papers = Vec::with_capacity(records.len());
        let mut index_by_id = HashMap::with_capacity(records.len());
        let mut duplicate_ids = 0usize;

        for record in records {
            if index_by_id.contains_key(&record.id) {
                duplicate_ids += 1;
                continue;
            }
            index_by_id.insert(record.id.clone(), papers.len());
            papers.push(record);
        }

        Self {
            source: source.into(),
            skipped_lines,
            duplicate_ids,
            papers,
            index_by_id,
        }
    }

    pub fn papers(&self) -> &[PaperRecord] {
        &self.papers
    }

    pub fn paper_count(&self) -> usize {
        self.papers.len()
    }

    pub fn paper(&self, id: &str) -> Option<&PaperRecord> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.papers.get(index))
    }

    pub fn categories(&self) -> Vec<String> {
        self.papers
            .iter()
            .map(|paper| paper.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn summaries(&self) -> Vec<CategorySummary> {
        let mut by_category: BTreeMap<&str, CategorySummary> = BTreeMap::new();
        for paper in &self.papers {
            let entry = by_category
                .entry(paper.category.as_str())
                .or_insert_with(|| CategorySummary {
                    category: paper.category.clone(),
                    paper_count: 0,
                    with_code: 0,
                    with_ml: 0,
                    mean_impact: 0.0,
                    papers_by_year: BTreeMap::new(),
                    undated: 0,
                });
            entry.paper_count += 1;
            entry.with_code += usize::from(paper.has_code);
            entry.with_ml += usize::from(paper.uses_ml);
            entry.mean_impact += paper.impact_score;
            match paper.year {
                Some(year) => *entry.papers_by_year.entry(year).or_default() += 1,
                None => entry.undated += 1,
            }
        }

        by_category
            .into_values()
            .map(|mut summary| {
                summary.mean_impact /= summary.paper_count.max(1) as f32;
                summary
            })
            .collect()
    }

    pub fn summary_for(&self, category: &str) -> Option<CategorySummary> {
        self.summaries()
            .into_iter()
            .find(|summary| summary.category == category)
    }

    /// Builds a fresh item collection. An empty allow-list admits every category.
    pub fn items(&self, mode: ItemMode, allow_list: &BTreeSet<String>) -> Arc<[Item]> {
        let admitted = |category: &str| allow_list.is_empty() || allow_list.contains(category);

        match mode {
            ItemMode::Leaf => self
                .papers
                .iter()
                .filter(|paper| admitted(&paper.category))
                .map(|paper| {
                    Item::leaf(
                        paper.id.clone(),
                        paper.impact_score,
                        paper.category.clone(),
                        paper.has_code,
                    )
                })
                .collect(),
            ItemMode::Group => self
                .summaries()
                .into_iter()
                .filter(|summary| admitted(&summary.category))
                .map(|summary| {
                    Item::group(
                        summary.category,
                        summary.mean_impact,
                        summary.paper_count,
                        summary.with_code,
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, category: &str, score: f32, has_code: bool) -> PaperRecord {
        PaperRecord {
            id: id.to_owned(),
            title: None,
            category: category.to_owned(),
            year: None,
            impact_score: score,
            has_code,
            uses_ml: score > 0.0,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(
            "memory",
            vec![
                paper("p1", "Physics", 20.0, true),
                paper("p2", "Physics", 40.0, false),
                paper("p3", "Biology", 90.0, true),
                paper("p1", "Biology", 10.0, false),
            ],
            0,
        )
    }

    #[test]
    fn first_record_wins_on_duplicate_ids() {
        let dataset = sample();
        assert_eq!(dataset.paper_count(), 3);
        assert_eq!(dataset.duplicate_ids, 1);
        assert_eq!(dataset.paper("p1").map(|p| p.category.as_str()), Some("Physics"));
    }

    #[test]
    fn groups_fold_leaves_per_category() {
        let dataset = sample();
        let items = dataset.items(ItemMode::Group, &BTreeSet::new());
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, "Biology");
        assert_eq!(items[1].id, "Physics");
        assert_eq!(items[1].group_size(), Some(2));
        assert_eq!(items[1].secondary_metric(), Some(1));
        assert!((items[1].magnitude - 30.0).abs() < 1e-4);
        assert!(items[1].has_code);
    }

    #[test]
    fn summaries_count_papers_per_year() {
        let mut records = vec![
            paper("a", "Physics", 10.0, false),
            paper("b", "Physics", 20.0, false),
            paper("c", "Physics", 30.0, false),
            paper("d", "Physics", 40.0, false),
            paper("e", "Physics", 50.0, false),
        ];
        let years = [Some(2021), Some(2019), Some(2021), Some(2019), None];
        for (record, year) in records.iter_mut().zip(years) {
            record.year = year;
        }
        let dataset = Dataset::new("memory", records, 0);

        let summary = dataset.summary_for("Physics").unwrap();
        assert_eq!(summary.papers_by_year, BTreeMap::from([(2019, 2), (2021, 2)]));
        assert_eq!(summary.undated, 1);
        assert_eq!(summary.year_range(), Some((2019, 2021)));
        assert_eq!(summary.peak_year(), Some(2019));
    }

    #[test]
    fn undated_categories_have_no_timeline() {
        let summary = sample().summary_for("Biology").unwrap();
        assert!(summary.papers_by_year.is_empty());
        assert_eq!(summary.undated, 1);
        assert_eq!(summary.year_range(), None);
        assert_eq!(summary.peak_year(), None);
    }

    #[test]
    fn allow_list_restricts_leaves() {
        let dataset = sample();
        let allow = BTreeSet::from(["Biology".to_owned()]);
        let items = dataset.items(ItemMode::Leaf, &allow);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "p3");
        assert!(!items[0].is_group());
    }
}
