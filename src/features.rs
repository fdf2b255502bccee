//! Joins analysis-service feature payloads onto the clip manifest.
//!
//! Each manifest row names a clip; its payload lives in
//! `{payload_dir}/{clip stem}.json`. Rows whose payload has no analysis
//! result are dropped from the dataset.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::export::manifest::FILENAME_COLUMN;
use crate::table::Table;

/// Location of the analysis result inside a payload document
pub const RESULT_POINTER: &str = "/libraryTrack/audioAnalysisV6/result";

/// Tag-cloud columns left out of the dataset
pub const DROPPED_COLUMNS: [&str; 4] = ["moodAdvancedTags", "moodMaxTimes", "moodTags", "movementTags"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub kept: usize,
    /// Filenames whose payload was missing or had no result
    pub dropped: Vec<String>,
}

/// Read the manifest, attach features, write the dataset.
pub fn reconcile_files(
    manifest_path: &Path,
    payload_dir: &Path,
    output_path: &Path,
) -> Result<ReconcileReport> {
    let manifest = Table::read(manifest_path)?;
    let (dataset, report) = reconcile(&manifest, payload_dir)?;
    dataset.write(output_path)?;
    info!(
        kept = report.kept,
        dropped = report.dropped.len(),
        output = %output_path.display(),
        "wrote feature dataset"
    );
    Ok(report)
}

pub fn reconcile(manifest: &Table, payload_dir: &Path) -> Result<(Table, ReconcileReport)> {
    let filename_col = manifest
        .column(FILENAME_COLUMN)
        .with_context(|| format!("Manifest has no '{}' column", FILENAME_COLUMN))?;

    let mut report = ReconcileReport::default();
    let mut kept_rows = Vec::new();
    let mut feature_columns = BTreeSet::new();

    for row in &manifest.rows {
        let filename = &row[filename_col];
        let payload_path = payload_path(payload_dir, filename);
        match load_result(&payload_path)? {
            Some(features) => {
                feature_columns.extend(features.iter().map(|(key, _)| key.clone()));
                kept_rows.push((row, features));
            }
            None => {
                warn!(filename = %filename, "no analysis result; dropping row");
                report.dropped.push(filename.clone());
            }
        }
    }

    for column in &feature_columns {
        ensure!(
            manifest.column(column).is_none(),
            "feature column '{}' collides with a manifest column",
            column
        );
    }

    // manifest columns keep their order; features follow sorted by name
    let mut dataset = Table::new(manifest.headers.iter().chain(&feature_columns).cloned());
    for (row, features) in kept_rows {
        let mut cells = row.clone();
        for column in &feature_columns {
            let cell = features
                .iter()
                .find(|(key, _)| key == column)
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            cells.push(cell);
        }
        dataset.push_row(cells)?;
    }
    report.kept = dataset.rows.len();

    Ok((dataset, report))
}

fn payload_path(payload_dir: &Path, filename: &str) -> PathBuf {
    let stem = filename.split('.').next().unwrap_or(filename);
    payload_dir.join(format!("{stem}.json"))
}

/// Flattened analysis result, or `None` when the payload is absent or unfinished
fn load_result(path: &Path) -> Result<Option<Vec<(String, String)>>> {
    if !path.is_file() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read feature payload {:?}", path))?;
    let payload: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse feature payload {:?}", path))?;

    let result = match payload.pointer(RESULT_POINTER) {
        Some(Value::Object(result)) => result,
        _ => return Ok(None),
    };

    let mut flat = Vec::new();
    flatten_into("", result, &mut flat);
    flat.retain(|(key, _)| !DROPPED_COLUMNS.contains(&key.as_str()));
    Ok(Some(flat))
}

/// Flatten nested objects into dotted keys; arrays stay JSON-encoded
fn flatten_into(prefix: &str, object: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in object {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(&key, inner, out),
            Value::Null => out.push((key, String::new())),
            Value::String(text) => out.push((key, text.clone())),
            other => out.push((key, other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> Table {
        let mut table = Table::new(["filename", "source"]);
        for name in ["r_1.wav", "r_2.wav", "r_3.wav"] {
            table.push_row(vec![name.into(), "r".into()]).unwrap();
        }
        table
    }

    fn write_payload(dir: &Path, stem: &str, payload: Value) {
        fs::write(dir.join(format!("{stem}.json")), payload.to_string()).unwrap();
    }

    #[test]
    fn flattens_nested_results() {
        let object = json!({
            "bpm": 92,
            "genre": {"ambient": 0.1, "folk": 0.7},
            "moodTags": ["calm"],
            "key": null
        });
        let mut flat = Vec::new();
        flatten_into("", object.as_object().unwrap(), &mut flat);
        assert!(flat.contains(&("genre.folk".to_string(), "0.7".to_string())));
        assert!(flat.contains(&("bpm".to_string(), "92".to_string())));
        assert!(flat.contains(&("moodTags".to_string(), "[\"calm\"]".to_string())));
        assert!(flat.contains(&("key".to_string(), String::new())));
    }

    #[test]
    fn drops_rows_without_results() {
        let dir = tempfile::tempdir().unwrap();
        write_payload(
            dir.path(),
            "r_1",
            json!({"libraryTrack": {"audioAnalysisV6": {"result": {
                "bpm": 120, "moodTags": ["dark"], "genre": {"folk": 0.5}
            }}}}),
        );
        write_payload(
            dir.path(),
            "r_2",
            json!({"libraryTrack": {"audioAnalysisV6": {"__typename": "AudioAnalysisV6Processing"}}}),
        );

        let (dataset, report) = reconcile(&manifest(), dir.path()).unwrap();
        assert_eq!(report.kept, 1);
        assert_eq!(report.dropped, vec!["r_2.wav", "r_3.wav"]);
        assert_eq!(dataset.headers, vec!["filename", "source", "bpm", "genre.folk"]);
        assert_eq!(dataset.rows, vec![vec!["r_1.wav", "r", "120", "0.5"]]);
    }

    #[test]
    fn missing_features_become_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        write_payload(
            dir.path(),
            "r_1",
            json!({"libraryTrack": {"audioAnalysisV6": {"result": {"bpm": 100}}}}),
        );
        write_payload(
            dir.path(),
            "r_3",
            json!({"libraryTrack": {"audioAnalysisV6": {"result": {"key": "Dm"}}}}),
        );

        let (dataset, _) = reconcile(&manifest(), dir.path()).unwrap();
        assert_eq!(dataset.headers[2..], ["bpm", "key"]);
        assert_eq!(dataset.rows[0][2..], ["100", ""]);
        assert_eq!(dataset.rows[1][2..], ["", "Dm"]);
    }

    #[test]
    fn feature_columns_are_sorted_across_payloads() {
        let dir = tempfile::tempdir().unwrap();
        write_payload(
            dir.path(),
            "r_1",
            json!({"libraryTrack": {"audioAnalysisV6": {"result": {"key": "Gm"}}}}),
        );
        write_payload(
            dir.path(),
            "r_2",
            json!({"libraryTrack": {"audioAnalysisV6": {"result": {"bpm": 88, "energy": {"level": "low"}}}}}),
        );

        let (dataset, _) = reconcile(&manifest(), dir.path()).unwrap();
        assert_eq!(
            dataset.headers,
            vec!["filename", "source", "bpm", "energy.level", "key"]
        );
        assert_eq!(dataset.rows[0][2..], ["", "", "Gm"]);
        assert_eq!(dataset.rows[1][2..], ["88", "low", ""]);
    }

    #[test]
    fn requires_filename_column() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::new(["name"]);
        assert!(reconcile(&table, dir.path()).is_err());
    }
}
