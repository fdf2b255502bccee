//! Segmentation engine: decides where a decoded recording is cut into clips.
//!
//! Both segmenters plan every clip span up front, so configuration problems
//! surface before the first clip is handed out. The resulting
//! [`Segmentation`] then yields clips lazily as borrowed views into the
//! source buffer.

mod fixed;
mod structural;
mod time_index;


pub use fixed::FixedWindowSegmenter;
pub use structural::StructuralSegmenter;
pub use time_index::TimeIndex;

use tracing::info;

use crate::error::{SplitError, SplitResult};
use crate::types::{Archive, AudioData, Clip, ClipSpan, Section, Tags};

/// Window length and oversize threshold, both in time-base units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationPolicy {
    window: usize,
    oversize_threshold: usize,
}

impl SegmentationPolicy {
    /// The threshold may not be shorter than the window; otherwise a section
    /// just over the threshold would be "subdivided" into a window longer
    /// than itself.
    pub fn new(window: usize, oversize_threshold: usize) -> SplitResult<Self> {
        if window == 0 {
            return Err(SplitError::invalid("window length must be positive"));
        }
        if oversize_threshold == 0 {
            return Err(SplitError::invalid("oversize threshold must be positive"));
        }
        if oversize_threshold < window {
            return Err(SplitError::invalid(format!(
                "oversize threshold ({}) must be at least the window length ({})",
                oversize_threshold, window
            )));
        }
        Ok(Self {
            window,
            oversize_threshold,
        })
    }

    pub fn from_minutes(
        window_minutes: f64,
        oversize_minutes: f64,
        time_index: TimeIndex,
    ) -> SplitResult<Self> {
        Self::new(
            time_index.minutes_to_units(window_minutes)?,
            time_index.minutes_to_units(oversize_minutes)?,
        )
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn oversize_threshold(&self) -> usize {
        self.oversize_threshold
    }
}

/// How a recording is cut, chosen from its archive metadata
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationPath {
    /// No section boundaries; equal windows carrying recording-level tags.
    FixedWindow(Tags),
    /// Archive-supplied sections, each with its own tags.
    Structural(Vec<Section>),
}

impl SegmentationPath {
    pub fn kind(&self) -> &'static str {
        match self {
            SegmentationPath::FixedWindow(_) => "fixed-window",
            SegmentationPath::Structural(_) => "structural",
        }
    }
}

/// Segment one recording along the given path.
///
/// The buffer's sample rate is the time base for section timestamps. An empty
/// buffer yields no clips on either path.
pub fn segment_recording<'a>(
    audio: &'a AudioData,
    source: &'a str,
    archive: Archive,
    path: &SegmentationPath,
    policy: SegmentationPolicy,
) -> SplitResult<Segmentation<'a>> {
    if audio.is_empty() {
        info!(source, archive = %archive, "empty recording; nothing to segment");
        return Ok(Segmentation::new(audio, source, Vec::new()));
    }

    let segmentation = match path {
        SegmentationPath::FixedWindow(base_tags) => {
            FixedWindowSegmenter::new(policy.window(), archive)?.segment(audio, source, base_tags)
        }
        SegmentationPath::Structural(sections) => {
            let time_index = TimeIndex::for_audio(audio)?;
            StructuralSegmenter::new(policy, time_index).segment(audio, source, sections)?
        }
    };
    info!(
        source,
        archive = %archive,
        path = path.kind(),
        clips = segmentation.len(),
        "segmented recording"
    );
    Ok(segmentation)
}

/// Lazily yields the planned clips of one recording
#[derive(Debug, Clone)]
pub struct Segmentation<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    source: &'a str,
    spans: std::vec::IntoIter<ClipSpan>,
}

impl<'a> Segmentation<'a> {
    pub(crate) fn new(audio: &'a AudioData, source: &'a str, spans: Vec<ClipSpan>) -> Self {
        Self {
            samples: &audio.samples,
            sample_rate: audio.sample_rate,
            source,
            spans: spans.into_iter(),
        }
    }
}

impl<'a> Iterator for Segmentation<'a> {
    type Item = Clip<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.spans.next()?;
        Some(Clip {
            samples: &self.samples[span.range.clone()],
            sample_rate: self.sample_rate,
            range: span.range,
            sequence_index: span.sequence_index,
            tags: span.tags,
            source: self.source,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.spans.size_hint()
    }
}

impl ExactSizeIterator for Segmentation<'_> {}
