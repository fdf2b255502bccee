use std::path::Path;

use anyhow::{Context, Result};

use super::ExportReport;
use crate::table::Table;

pub const FILENAME_COLUMN: &str = "filename";

pub const MANIFEST_COLUMNS: [&str; 6] = [
    FILENAME_COLUMN,
    "source",
    "sequence_index",
    "start_secs",
    "end_secs",
    "tags",
];

/// One row per saved clip, in report order; failed clips are left out.
pub fn manifest_table(reports: &[ExportReport]) -> Result<Table> {
    let mut table = Table::new(MANIFEST_COLUMNS);
    for report in reports {
        for clip in &report.saved {
            let filename = clip
                .artifact
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| clip.name.clone());
            let tags = serde_json::to_string(&*clip.tags).context("Failed to serialize tags")?;
            table.push_row(vec![
                filename,
                report.source.clone(),
                clip.sequence_index.to_string(),
                format!("{:.3}", clip.start_secs),
                format!("{:.3}", clip.end_secs),
                tags,
            ])?;
        }
    }
    Ok(table)
}

pub fn write_manifest<P: AsRef<Path>>(path: P, reports: &[ExportReport]) -> Result<usize> {
    let table = manifest_table(reports)?;
    table.write(path)?;
    Ok(table.rows.len())
}
