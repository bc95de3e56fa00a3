use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::records::PaperRecord;

const ID_KEYS: &[&[&str]] = &[&["_paper_id"], &["paper_id"], &["id"]];
const CATEGORY_KEYS: &[&[&str]] = &[&["_category"], &["category"], &["field"], &["discipline"]];
const TITLE_KEYS: &[&[&str]] = &[&["title"], &["_title"]];
const YEAR_KEYS: &[&[&str]] = &[&["_year"], &["year"], &["metadata", "year"]];
const SCORE_KEYS: &[&[&str]] = &[
    &["impact_score"],
    &["ml_impact_score"],
    &["magnitude"],
    &[
        "ml_impact_quantification",
        "attribution_scoring",
        "ml_contribution_percent",
    ],
];
const LEVEL_KEYS: &[&[&str]] = &[&["ml_impact_quantification", "ml_contribution_level"]];
const CODE_KEYS: &[&[&str]] = &[
    &["has_code"],
    &["code_available"],
    &["reproducibility", "code_available"],
];
const ML_KEYS: &[&[&str]] = &[
    &["has_ml_usage"],
    &["ml_impact_quantification", "has_ml_usage"],
];

/// Where a batch of records came from. `name` keeps generated ids unique
/// across the files of one load.
#[derive(Clone, Copy, Debug)]
pub(super) struct RecordSource<'a> {
    pub(super) name: &'a str,
    pub(super) category: Option<&'a str>,
}

#[derive(Debug, Default)]
pub(super) struct ParsedRecords {
    pub(super) records: Vec<PaperRecord>,
    pub(super) skipped: usize,
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .filter(|found| !found.is_null())
}

fn first<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(value, path))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(super) fn contribution_level_score(level: &str) -> Option<f32> {
    match level.trim().to_ascii_lowercase().as_str() {
        "none" => Some(0.0),
        "minimal" => Some(20.0),
        "moderate" => Some(45.0),
        "substantial" => Some(70.0),
        "critical" => Some(90.0),
        _ => None,
    }
}

fn impact_score(value: &Value) -> f32 {
    let explicit = first(value, SCORE_KEYS).and_then(as_number);
    let generated = || {
        first(value, LEVEL_KEYS)
            .and_then(Value::as_str)
            .and_then(contribution_level_score)
            .map(f64::from)
    };

    let score = explicit.or_else(generated).unwrap_or(0.0) as f32;
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub(super) fn normalize_record(
    value: &Value,
    source: RecordSource<'_>,
    ordinal: usize,
) -> Option<PaperRecord> {
    if !value.is_object() {
        return None;
    }

    let category = first(value, CATEGORY_KEYS)
        .and_then(as_text)
        .or_else(|| source.category.map(str::to_owned))
        .unwrap_or_else(|| "Unknown".to_owned());
    let id = first(value, ID_KEYS)
        .and_then(as_text)
        .unwrap_or_else(|| format!("{}:{ordinal}", source.name));
    let year = first(value, YEAR_KEYS)
        .and_then(as_number)
        .filter(|year| year.is_finite() && *year >= 0.0)
        .map(|year| year as u32);
    let score = impact_score(value);
    let uses_ml = first(value, ML_KEYS)
        .and_then(as_flag)
        .unwrap_or(score > 0.0);

    Some(PaperRecord {
        id,
        title: first(value, TITLE_KEYS).and_then(as_text),
        category,
        year,
        impact_score: score,
        has_code: first(value, CODE_KEYS).and_then(as_flag).unwrap_or(false),
        uses_ml,
    })
}

fn collect_array(values: &[Value], source: RecordSource<'_>) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    for (ordinal, value) in values.iter().enumerate() {
        match normalize_record(value, source, ordinal) {
            Some(record) => parsed.records.push(record),
            None => parsed.skipped += 1,
        }
    }
    parsed
}

fn collect_lines(raw: &str, source: RecordSource<'_>) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    for (ordinal, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = serde_json::from_str::<Value>(line)
            .ok()
            .and_then(|value| normalize_record(&value, source, ordinal));
        match record {
            Some(record) => parsed.records.push(record),
            None => parsed.skipped += 1,
        }
    }
    parsed
}

/// Accepts a JSON array, an object wrapping a `papers` array, a single object,
/// or JSON lines.
pub(super) fn parse_records(raw: &str, source: RecordSource<'_>) -> Result<ParsedRecords> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Ok(ParsedRecords::default());
    }

    if trimmed.starts_with('[') {
        let parsed: Value = serde_json::from_str(trimmed).context("invalid JSON array")?;
        let values = parsed
            .as_array()
            .ok_or_else(|| anyhow!("expected a JSON array of paper records"))?;
        return Ok(collect_array(values, source));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(object)) => {
            if let Some(papers) = object.get("papers").and_then(Value::as_array) {
                return Ok(collect_array(papers, source));
            }
            Ok(collect_array(&[Value::Object(object)], source))
        }
        Ok(_) => Err(anyhow!("unexpected JSON type for paper records")),
        Err(_) => Ok(collect_lines(trimmed, source)),
    }
}

pub(super) fn category_from_file_name(stem: &str) -> Option<String> {
    let stem = stem.strip_suffix(".jsonl").unwrap_or(stem);
    let category = stem.strip_suffix("_impact").unwrap_or(stem).trim();
    (!category.is_empty()).then(|| category.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNNAMED: RecordSource<'static> = RecordSource {
        name: "papers.json",
        category: None,
    };

    #[test]
    fn normalizes_extraction_pipeline_fields() {
        let raw = r#"{"_paper_id":"W1","_year":"2021","_category":"Physics",
            "ml_impact_quantification":{"has_ml_usage":true,
              "attribution_scoring":{"ml_contribution_percent":62}},
            "reproducibility":{"code_available":true}}"#;
        let parsed = parse_records(raw, UNNAMED).unwrap();
        assert_eq!(parsed.records.len(), 1);

        let record = &parsed.records[0];
        assert_eq!(record.id, "W1");
        assert_eq!(record.category, "Physics");
        assert_eq!(record.year, Some(2021));
        assert_eq!(record.impact_score, 62.0);
        assert!(record.has_code);
        assert!(record.uses_ml);
    }

    #[test]
    fn generates_score_from_contribution_level() {
        let raw = r#"[{"id":"a","field":"Biology",
            "ml_impact_quantification":{"ml_contribution_level":"Substantial"}}]"#;
        let parsed = parse_records(raw, UNNAMED).unwrap();
        assert_eq!(parsed.records[0].impact_score, 70.0);
        assert_eq!(parsed.records[0].category, "Biology");
        assert!(!parsed.records[0].has_code);
    }

    #[test]
    fn json_lines_skip_malformed_entries_and_use_file_category() {
        let raw = "{\"id\":\"x\",\"impact_score\":140}\n\nnot json\n{\"impact_score\":\"12.5\"}\n";
        let source = RecordSource {
            name: "Medicine_impact.jsonl",
            category: Some("Medicine"),
        };
        let parsed = parse_records(raw, source).unwrap();
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].impact_score, 100.0);
        assert_eq!(parsed.records[0].category, "Medicine");
        assert_eq!(parsed.records[1].id, "Medicine_impact.jsonl:3");
        assert_eq!(parsed.records[1].impact_score, 12.5);
    }

    #[test]
    fn wrapped_papers_array_is_accepted() {
        let raw = r#"{"papers":[{"id":"a","has_code":"yes"}, 4]}"#;
        let parsed = parse_records(raw, UNNAMED).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 1);
        assert!(parsed.records[0].has_code);
        assert_eq!(parsed.records[0].category, "Unknown");
    }

    #[test]
    fn file_names_map_to_categories() {
        assert_eq!(
            category_from_file_name("ComputerScience_impact").as_deref(),
            Some("ComputerScience")
        );
        assert_eq!(category_from_file_name("_impact"), None);
    }
}
