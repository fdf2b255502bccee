use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use super::ClipSink;
use crate::audio::encoder::encode_samples;
use crate::types::{Clip, Tags};

/// Writes `{name}.wav` plus a `{name}.json` sidecar holding the clip's tags.
#[derive(Debug, Clone)]
pub struct WavClipSink {
    output_dir: PathBuf,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    name: &'a str,
    source: &'a str,
    sequence_index: usize,
    start_sample: usize,
    end_sample: usize,
    sample_rate: u32,
    tags: &'a Tags,
}

impl WavClipSink {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
        Ok(Self { output_dir })
    }
}

impl ClipSink for WavClipSink {
    fn save(&mut self, clip: &Clip<'_>, name: &str) -> Result<PathBuf> {
        // Sidecar goes first: a clip is only on disk once both files are.
        let sidecar = Sidecar {
            name,
            source: clip.source,
            sequence_index: clip.sequence_index,
            start_sample: clip.range.start,
            end_sample: clip.range.end,
            sample_rate: clip.sample_rate,
            tags: &clip.tags,
        };
        let json_path = self.output_dir.join(format!("{name}.json"));
        let body = serde_json::to_string_pretty(&sidecar).context("Failed to serialize tags")?;
        fs::write(&json_path, body)
            .with_context(|| format!("Failed to write tag sidecar {:?}", json_path))?;

        let wav_path = self.output_dir.join(format!("{name}.wav"));
        if let Err(err) = encode_samples(clip.samples, clip.sample_rate, &wav_path) {
            // drop partial artifacts
            let _ = fs::remove_file(&json_path);
            let _ = fs::remove_file(&wav_path);
            return Err(err).with_context(|| format!("Failed to encode clip {name}"));
        }

        Ok(wav_path)
    }
}
