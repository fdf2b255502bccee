//! Archive metadata adapters.
//!
//! Recording documents are read from local JSON files named after the
//! recording identifier. Andalusian documents carry timed sections; Hindustani
//! documents only carry recording-level laya/taal/form lists.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::{SplitError, SplitResult};
use crate::segmentation::SegmentationPath;
use crate::types::{Archive, Section, Tags, Timestamp, GENRE_TAG};

/// Separator used when several laya/taal/form names apply to one recording
pub const NAME_SEPARATOR: &str = "/-/-";

pub trait MetadataSource {
    fn recording(&self, archive: Archive, recording_id: &str) -> Result<SegmentationPath>;
}

/// Reads `{recording_id}.json` documents from a directory
#[derive(Debug, Clone)]
pub struct JsonMetadataSource {
    dir: PathBuf,
}

impl JsonMetadataSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl MetadataSource for JsonMetadataSource {
    fn recording(&self, archive: Archive, recording_id: &str) -> Result<SegmentationPath> {
        let path = self.dir.join(format!("{recording_id}.json"));
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read metadata document {:?}", path))?;
        let parsed = match archive {
            Archive::Andalusian => parse_andalusian(&raw).map(SegmentationPath::Structural),
            Archive::Hindustani => parse_hindustani(&raw).map(SegmentationPath::FixedWindow),
        };
        parsed.with_context(|| format!("Invalid metadata in {:?}", path))
    }
}

#[derive(Deserialize)]
struct AndalusianRecording {
    #[serde(default)]
    sections: Vec<RawSection>,
}

#[derive(Deserialize)]
struct RawSection {
    start_time: Option<String>,
    end_time: Option<String>,
    mizan: Option<Ordered>,
    nawba: Option<Ordered>,
    form: Option<Ordered>,
}

#[derive(Deserialize)]
struct Ordered {
    display_order: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct HindustaniRecording {
    #[serde(default)]
    layas: Vec<Named>,
    #[serde(default)]
    taals: Vec<Named>,
    #[serde(default)]
    forms: Vec<Named>,
}

#[derive(Deserialize)]
struct Named {
    common_name: String,
}

/// Parse an Andalusian recording document into sections.
///
/// Section tags are the `display_order` of its mizan, nawba and form, plus
/// the archive genre.
pub fn parse_andalusian(raw: &str) -> SplitResult<Vec<Section>> {
    let doc: AndalusianRecording = serde_json::from_str(raw)
        .map_err(|err| SplitError::invalid(format!("malformed recording document: {err}")))?;

    doc.sections
        .into_iter()
        .enumerate()
        .map(|(idx, section)| {
            let missing = |field: &str| SplitError::invalid(format!("section {idx} has no {field}"));
            let start_time: Timestamp = section
                .start_time
                .ok_or_else(|| missing("start_time"))?
                .parse()?;
            let end_time: Timestamp = section
                .end_time
                .ok_or_else(|| missing("end_time"))?
                .parse()?;

            // every section tag is required; a partial section is a bad document
            let mut tags = Tags::new();
            tags.insert(GENRE_TAG.to_string(), Archive::Andalusian.genre().into());
            for (name, ordered) in [
                ("mizan", section.mizan),
                ("nawba", section.nawba),
                ("form", section.form),
            ] {
                let order = ordered
                    .and_then(|ordered| ordered.display_order)
                    .ok_or_else(|| missing(name))?;
                tags.insert(name.to_string(), order);
            }

            Ok(Section {
                start_time,
                end_time,
                tags,
            })
        })
        .collect()
}

/// Parse a Hindustani recording document into recording-level tags.
pub fn parse_hindustani(raw: &str) -> SplitResult<Tags> {
    let doc: HindustaniRecording = serde_json::from_str(raw)
        .map_err(|err| SplitError::invalid(format!("malformed recording document: {err}")))?;

    let mut tags = Tags::new();
    for (name, entries) in [("layas", doc.layas), ("taals", doc.taals), ("forms", doc.forms)] {
        let joined = entries
            .into_iter()
            .map(|entry| entry.common_name)
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR);
        // one joined entry, even when the list is empty
        tags.insert(name.to_string(), serde_json::json!([joined]));
    }
    Ok(tags)
}
