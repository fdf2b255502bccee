//! Core types for the dunyasplit segmentation pipeline

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Open tag mapping attached to sections and clips (e.g. mizan/nawba/form or
/// layas/taals/forms, depending on the archive).
pub type Tags = BTreeMap<String, serde_json::Value>;

/// Tag key identifying the archive a clip came from
pub const GENRE_TAG: &str = "genre";

/// Raw audio data representation (mono, f32 samples)
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 44100). Also the time base used to index sections.
    pub sample_rate: u32,
}

impl AudioData {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Archive a recording belongs to. Selects the segmentation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Archive {
    /// Sections with mizan/nawba/form tags; structural segmentation.
    Andalusian,
    /// No usable section boundaries; fixed-window segmentation.
    Hindustani,
}

impl Archive {
    pub fn genre(self) -> &'static str {
        match self {
            Archive::Andalusian => "andalusian",
            Archive::Hindustani => "hindustani",
        }
    }
}

impl std::fmt::Display for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.genre())
    }
}

/// Wall-clock position inside a recording, as published by the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Timestamp {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn total_seconds(self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }
}

/// A structural unit of a recording (e.g. one movement of a nawba)
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub tags: Tags,
}

/// A planned clip: a half-open sample range plus its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSpan {
    pub range: Range<usize>,
    pub sequence_index: usize,
    pub tags: Arc<Tags>,
}

/// One segment of a recording, borrowing its samples from the source buffer
#[derive(Debug, Clone)]
pub struct Clip<'a> {
    pub samples: &'a [f32],
    pub sample_rate: u32,
    /// Position of `samples` inside the source buffer
    pub range: Range<usize>,
    pub sequence_index: usize,
    pub tags: Arc<Tags>,
    pub source: &'a str,
}

impl Clip<'_> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Deterministic output name: `{source}_{sequence_index}`
    pub fn name(&self) -> String {
        format!("{}_{}", self.source, self.sequence_index)
    }

    pub fn start_secs(&self) -> f64 {
        self.range.start as f64 / self.sample_rate as f64
    }

    pub fn end_secs(&self) -> f64 {
        self.range.end as f64 / self.sample_rate as f64
    }
}
