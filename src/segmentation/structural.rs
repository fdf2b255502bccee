use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::error::{SplitError, SplitResult};
use crate::types::{AudioData, ClipSpan, Section, Tags};

use super::{SegmentationPolicy, Segmentation, TimeIndex};

/// Splits recordings along archive-supplied section boundaries.
///
/// Sections shorter than the oversize threshold become one clip each. Longer
/// sections are cut into policy windows, the last of which runs to the
/// section end so the whole section stays covered. Sequence indices start at 1
/// and run across all sections of the recording.
#[derive(Debug, Clone, Copy)]
pub struct StructuralSegmenter {
    policy: SegmentationPolicy,
    time_index: TimeIndex,
}

impl StructuralSegmenter {
    pub fn new(policy: SegmentationPolicy, time_index: TimeIndex) -> Self {
        Self { policy, time_index }
    }

    /// Plan clip spans for a buffer of `len` units.
    ///
    /// Every section is resolved before any span is planned, so a bad section
    /// anywhere in the list fails the whole recording. An empty buffer has
    /// nothing to cut and yields no spans.
    pub fn plan(&self, len: usize, sections: &[Section]) -> SplitResult<Vec<ClipSpan>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        // resolve everything first; no span is planned past a bad section
        let resolved = sections
            .iter()
            .enumerate()
            .map(|(idx, section)| self.resolve(idx, section, len))
            .collect::<SplitResult<Vec<_>>>()?;

        let mut accumulator = SpanAccumulator::new();
        for (range, section) in resolved.into_iter().zip(sections) {
            // sub-clips of one section share its tags
            let tags = Arc::new(section.tags.clone());
            if range.len() >= self.policy.oversize_threshold() {
                accumulator.subdivide(range, &tags, self.policy.window());
            } else {
                accumulator.push(range, &tags);
            }
        }
        Ok(accumulator.into_spans())
    }

    pub fn segment<'a>(
        &self,
        audio: &'a AudioData,
        source: &'a str,
        sections: &[Section],
    ) -> SplitResult<Segmentation<'a>> {
        let spans = self.plan(audio.len(), sections)?;
        debug!(
            source,
            sections = sections.len(),
            clips = spans.len(),
            "planned structural clips"
        );
        Ok(Segmentation::new(audio, source, spans))
    }

    fn resolve(&self, idx: usize, section: &Section, len: usize) -> SplitResult<Range<usize>> {
        let start = self.time_index.to_index(section.start_time);
        let end = self.time_index.to_index(section.end_time);
        if start >= end {
            return Err(SplitError::invalid(format!(
                "section {} starts at {} but ends at {}",
                idx, start, end
            )));
        }
        if end > len {
            return Err(SplitError::invalid(format!(
                "section {} ends at {} beyond buffer length {}",
                idx, end, len
            )));
        }
        Ok(start..end)
    }
}

/// Collects planned spans and owns the running sequence index.
struct SpanAccumulator {
    spans: Vec<ClipSpan>,
    last_index: usize,
}

impl SpanAccumulator {
    fn new() -> Self {
        Self {
            spans: Vec::new(),
            last_index: 0,
        }
    }

    fn push(&mut self, range: Range<usize>, tags: &Arc<Tags>) {
        self.last_index += 1;
        self.spans.push(ClipSpan {
            range,
            sequence_index: self.last_index,
            tags: Arc::clone(tags),
        });
    }

    /// Cut `range` into windows; the final piece absorbs the remainder.
    fn subdivide(&mut self, range: Range<usize>, tags: &Arc<Tags>, window: usize) {
        let pieces = (range.len() / window).max(1);
        for piece in 0..pieces {
            let start = range.start + piece * window;
            let end = if piece == pieces - 1 {
                // the last piece runs to the section end, absorbing the remainder
                range.end
            } else {
                start + window
            };
            self.push(start..end, tags);
        }
    }

    fn into_spans(self) -> Vec<ClipSpan> {
        self.spans
    }
}
