//! Clip export: deterministic naming and hand-off to a persistence sink.
//!
//! Clips are independent artifacts, so a failed save is recorded in the
//! [`ExportReport`] and the remaining clips are still attempted.

pub mod manifest;
pub mod wav;

pub use manifest::write_manifest;
pub use wav::WavClipSink;

use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::error::SplitError;
use crate::types::{Clip, Tags};

/// Persistence collaborator: stores one clip under `name`.
pub trait ClipSink {
    /// Returns the path of the written artifact.
    fn save(&mut self, clip: &Clip<'_>, name: &str) -> Result<PathBuf>;
}

impl<S: ClipSink + ?Sized> ClipSink for &mut S {
    fn save(&mut self, clip: &Clip<'_>, name: &str) -> Result<PathBuf> {
        (**self).save(clip, name)
    }
}

/// A clip that reached the sink
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedClip {
    pub name: String,
    pub artifact: PathBuf,
    pub sequence_index: usize,
    pub range: Range<usize>,
    pub start_secs: f64,
    pub end_secs: f64,
    pub tags: Arc<Tags>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFailure {
    pub sequence_index: usize,
    pub error: SplitError,
}

/// Outcome of exporting every clip of one recording
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub source: String,
    pub saved: Vec<ExportedClip>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ClipExporter<S> {
    sink: S,
}

impl<S: ClipSink> ClipExporter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Save every clip under [`Clip::name`], in ascending index order.
    pub fn export_all<'a, I>(&mut self, clips: I, source: &str) -> ExportReport
    where
        I: IntoIterator<Item = Clip<'a>>,
    {
        let mut clips: Vec<Clip<'a>> = clips.into_iter().collect();
        clips.sort_by_key(|clip| clip.sequence_index);

        let mut report = ExportReport {
            source: source.to_string(),
            ..ExportReport::default()
        };

        for clip in &clips {
            let name = clip.name();
            match self.sink.save(clip, &name) {
                Ok(artifact) => {
                    debug!(clip = %name, artifact = %artifact.display(), "saved clip");
                    report.saved.push(ExportedClip {
                        name,
                        artifact,
                        sequence_index: clip.sequence_index,
                        range: clip.range.clone(),
                        start_secs: clip.start_secs(),
                        end_secs: clip.end_secs(),
                        tags: Arc::clone(&clip.tags),
                    });
                }
                Err(err) => {
                    warn!(clip = %name, error = %format!("{:#}", err), "failed to save clip");
                    report.failures.push(ExportFailure {
                        sequence_index: clip.sequence_index,
                        error: SplitError::Persistence {
                            name,
                            message: format!("{:#}", err),
                        },
                    });
                }
            }
        }

        info!(
            source,
            saved = report.saved.len(),
            failed = report.failures.len(),
            "exported clips"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClipSpan;
    use anyhow::bail;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct RecordingSink {
        names: Vec<String>,
        fail_on: Vec<String>,
    }

    impl ClipSink for RecordingSink {
        fn save(&mut self, _clip: &Clip<'_>, name: &str) -> Result<PathBuf> {
            self.names.push(name.to_string());
            if self.fail_on.iter().any(|n| n == name) {
                bail!("disk full");
            }
            Ok(PathBuf::from(format!("{name}.wav")))
        }
    }

    fn clips<'a>(samples: &'a [f32], spans: &[ClipSpan]) -> Vec<Clip<'a>> {
        spans
            .iter()
            .map(|span| Clip {
                samples: &samples[span.range.clone()],
                sample_rate: 10,
                range: span.range.clone(),
                sequence_index: span.sequence_index,
                tags: Arc::clone(&span.tags),
                source: "mbid",
            })
            .collect()
    }

    fn span(range: Range<usize>, sequence_index: usize) -> ClipSpan {
        ClipSpan {
            range,
            sequence_index,
            tags: Arc::new(Tags::new()),
        }
    }

    #[test]
    fn names_and_orders_by_sequence_index() {
        let samples = vec![0.0; 30];
        let spans = vec![span(20..30, 3), span(0..10, 1), span(10..20, 2)];
        let mut exporter = ClipExporter::new(RecordingSink::default());
        let report = exporter.export_all(clips(&samples, &spans), "mbid");

        assert_eq!(exporter.sink().names, vec!["mbid_1", "mbid_2", "mbid_3"]);
        assert!(report.is_clean());
        assert_eq!(report.saved[1].artifact, PathBuf::from("mbid_2.wav"));
        assert_relative_eq!(report.saved[2].end_secs, 3.0);
    }

    #[test]
    fn failure_does_not_stop_the_batch() {
        let samples = vec![0.0; 30];
        let spans = vec![span(0..10, 0), span(10..20, 1), span(20..30, 2)];
        let sink = RecordingSink {
            fail_on: vec!["mbid_1".into()],
            ..RecordingSink::default()
        };
        let mut exporter = ClipExporter::new(sink);
        let report = exporter.export_all(clips(&samples, &spans), "mbid");

        assert_eq!(exporter.sink().names.len(), 3);
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].sequence_index, 1);
        assert!(matches!(
            &report.failures[0].error,
            SplitError::Persistence { name, message } if name == "mbid_1" && message.contains("disk full")
        ));
    }

    #[test]
    fn no_clips_no_calls() {
        let mut exporter = ClipExporter::new(RecordingSink::default());
        let report = exporter.export_all(Vec::new(), "mbid");
        assert!(exporter.sink().names.is_empty());
        assert_eq!(report.attempted(), 0);
    }
}
