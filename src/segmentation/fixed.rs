use std::sync::Arc;

use tracing::debug;

use crate::error::{SplitError, SplitResult};
use crate::types::{Archive, AudioData, ClipSpan, Tags, GENRE_TAG};

use super::Segmentation;

/// Splits recordings without structural metadata into equal windows.
///
/// When fewer than two full windows fit, the whole buffer becomes a single
/// clip. Otherwise every clip is exactly one window long and the trailing
/// partial window is dropped.
#[derive(Debug, Clone, Copy)]
pub struct FixedWindowSegmenter {
    window: usize,
    archive: Archive,
}

impl FixedWindowSegmenter {
    pub fn new(window: usize, archive: Archive) -> SplitResult<Self> {
        if window == 0 {
            return Err(SplitError::invalid("window length must be positive"));
        }
        Ok(Self { window, archive })
    }

    /// Plan clip spans for a buffer of `len` units. Indices start at 0.
    pub fn plan(&self, len: usize, base_tags: &Tags) -> Vec<ClipSpan> {
        if len == 0 {
            return Vec::new();
        }

        let mut tags = base_tags.clone();
        tags.insert(GENRE_TAG.to_string(), self.archive.genre().into());
        let tags = Arc::new(tags);

        // under two full windows the recording stays whole
        let windows = len / self.window;
        if windows <= 1 {
            return vec![ClipSpan {
                range: 0..len,
                sequence_index: 0,
                tags,
            }];
        }

        (0..windows)
            .map(|i| ClipSpan {
                range: i * self.window..(i + 1) * self.window,
                sequence_index: i,
                tags: Arc::clone(&tags),
            })
            .collect()
    }

    pub fn segment<'a>(
        &self,
        audio: &'a AudioData,
        source: &'a str,
        base_tags: &Tags,
    ) -> Segmentation<'a> {
        let spans = self.plan(audio.len(), base_tags);
        let dropped = audio.len() - spans.last().map_or(0, |span| span.range.end);
        debug!(
            source,
            clips = spans.len(),
            dropped_tail = dropped,
            "planned fixed windows"
        );
        Segmentation::new(audio, source, spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(spans: &[ClipSpan]) -> Vec<std::ops::Range<usize>> {
        spans.iter().map(|span| span.range.clone()).collect()
    }

    #[test]
    fn rejects_zero_window() {
        let err = FixedWindowSegmenter::new(0, Archive::Hindustani).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn exact_multiple_has_no_tail() {
        let segmenter = FixedWindowSegmenter::new(10, Archive::Hindustani).unwrap();
        let spans = segmenter.plan(40, &Tags::new());
        assert_eq!(ranges(&spans), vec![0..10, 10..20, 20..30, 30..40]);
    }

    #[test]
    fn exactly_two_windows_split() {
        let segmenter = FixedWindowSegmenter::new(10, Archive::Hindustani).unwrap();
        let spans = segmenter.plan(20, &Tags::new());
        assert_eq!(ranges(&spans), vec![0..10, 10..20]);
    }

    #[test]
    fn just_under_two_windows_stays_whole() {
        let segmenter = FixedWindowSegmenter::new(10, Archive::Hindustani).unwrap();
        let spans = segmenter.plan(19, &Tags::new());
        assert_eq!(ranges(&spans), vec![0..19]);
        assert_eq!(spans[0].sequence_index, 0);
    }

    #[test]
    fn genre_overrides_base_tag() {
        let segmenter = FixedWindowSegmenter::new(10, Archive::Hindustani).unwrap();
        let mut base = Tags::new();
        base.insert("genre".into(), "unknown".into());
        base.insert("taals".into(), serde_json::json!(["Tīntāl"]));
        let spans = segmenter.plan(35, &base);
        assert_eq!(spans[0].tags["genre"], "hindustani");
        assert_eq!(spans[2].tags["taals"], serde_json::json!(["Tīntāl"]));
    }
}
