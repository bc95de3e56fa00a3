use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::parse::{RecordSource, category_from_file_name, parse_records};
use super::records::Dataset;

fn is_record_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| matches!(extension, "json" | "jsonl"))
}

fn record_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = fs::read_dir(path)
        .with_context(|| format!("failed to list dataset directory {}", path.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|candidate| is_record_file(candidate))
        .collect::<Vec<_>>();
    files.sort();

    if files.is_empty() {
        return Err(anyhow!(
            "no .json or .jsonl files found in {}",
            path.display()
        ));
    }
    Ok(files)
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    log::info!("loading paper records from {}", path.display());

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for file in record_files(path)? {
        let raw = fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let fallback_category = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(category_from_file_name);

        let name = file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let source = RecordSource {
            name,
            category: fallback_category.as_deref(),
        };

        let parsed = parse_records(&raw, source)
            .with_context(|| format!("failed to parse {}", file.display()))?;
        log::debug!(
            "{}: {} records, {} skipped",
            file.display(),
            parsed.records.len(),
            parsed.skipped
        );
        skipped += parsed.skipped;
        records.extend(parsed.records);
    }

    if records.is_empty() {
        return Err(anyhow!("no paper records found in {}", path.display()));
    }

    let dataset = Dataset::new(path.display().to_string(), records, skipped);
    if dataset.skipped_lines > 0 || dataset.duplicate_ids > 0 {
        log::warn!(
            "ignored {} malformed records and {} duplicate ids",
            dataset.skipped_lines,
            dataset.duplicate_ids
        );
    }
    log::info!(
        "loaded {} papers across {} disciplines",
        dataset.paper_count(),
        dataset.categories().len()
    );
    Ok(dataset)
}
