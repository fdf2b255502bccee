//! Batch driver: decode each recording, fetch its metadata, segment, export.
//!
//! Recordings are independent. A recording that fails to decode or carries
//! bad metadata is logged and skipped; the rest of the batch continues.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::audio::decoder::{decode_audio, is_supported};
use crate::config::SplitConfig;
use crate::export::{ClipExporter, ClipSink, ExportReport};
use crate::metadata::MetadataSource;
use crate::segmentation::{segment_recording, TimeIndex};
use crate::types::AudioData;

#[derive(Debug, Clone, PartialEq)]
pub struct FailedRecording {
    pub recording_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub recordings: Vec<ExportReport>,
    pub failed: Vec<FailedRecording>,
}

impl BatchReport {
    pub fn clips_saved(&self) -> usize {
        self.recordings.iter().map(|r| r.saved.len()).sum()
    }

    pub fn clips_failed(&self) -> usize {
        self.recordings.iter().map(|r| r.failures.len()).sum()
    }
}

/// Recording identifier for an audio file: its name up to the first '.'
pub fn recording_id(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let id = name.split('.').next()?;
    (!id.is_empty()).then_some(id)
}

/// Audio files in `dir` with a usable recording identifier, sorted by name
pub fn list_recordings(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read input directory {:?}", dir))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list input directory {:?}", dir))?
            .path();
        if path.is_file() && is_supported(&path) && recording_id(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Segment and export one decoded recording.
pub fn split_audio<M, S>(
    audio: &AudioData,
    recording_id: &str,
    config: &SplitConfig,
    metadata: &M,
    exporter: &mut ClipExporter<S>,
) -> Result<ExportReport>
where
    M: MetadataSource + ?Sized,
    S: ClipSink,
{
    let archive = config.archive()?;
    let time_index = TimeIndex::for_audio(audio)?;
    let policy = config.policy(time_index)?;
    let path = metadata.recording(archive, recording_id)?;
    let clips = segment_recording(audio, recording_id, archive, &path, policy)?;
    Ok(exporter.export_all(clips, recording_id))
}

pub fn split_file<M, S>(
    path: &Path,
    config: &SplitConfig,
    metadata: &M,
    exporter: &mut ClipExporter<S>,
) -> Result<ExportReport>
where
    M: MetadataSource + ?Sized,
    S: ClipSink,
{
    let id = recording_id(path).with_context(|| format!("No recording id in {:?}", path))?;
    info!(recording = id, path = %path.display(), "loading recording");
    let audio = decode_audio(path)?;
    split_audio(&audio, id, config, metadata, exporter)
}

/// Split every recording in `input_dir`.
pub fn split_directory<M, S>(
    input_dir: &Path,
    config: &SplitConfig,
    metadata: &M,
    exporter: &mut ClipExporter<S>,
) -> Result<BatchReport>
where
    M: MetadataSource + ?Sized,
    S: ClipSink,
{
    config.validate()?;
    let recordings = list_recordings(input_dir)?;
    info!(count = recordings.len(), dir = %input_dir.display(), "found recordings");

    let mut report = BatchReport::default();
    for path in recordings {
        let id = recording_id(&path).unwrap_or_default().to_string();
        match split_file(&path, config, metadata, exporter) {
            Ok(recording) => report.recordings.push(recording),
            // a bad recording never aborts the batch
            Err(err) => {
                error!(recording = %id, error = %format!("{:#}", err), "recording skipped");
                report.failed.push(FailedRecording {
                    recording_id: id,
                    reason: format!("{:#}", err),
                });
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_id_stops_at_first_dot() {
        assert_eq!(recording_id(Path::new("in/abc-123.mp3")), Some("abc-123"));
        assert_eq!(recording_id(Path::new("in/abc.part.wav")), Some("abc"));
        assert_eq!(recording_id(Path::new("in/.hidden.mp3")), None);
    }

    #[test]
    fn lists_supported_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp3", "a.wav", "notes.txt", ".DS_Store", ".x.mp3"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("c.mp3")).unwrap();
        let listed: Vec<_> = list_recordings(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(listed, vec!["a.wav", "b.mp3"]);
    }
}
