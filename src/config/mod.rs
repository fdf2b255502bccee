use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::error::SplitResult;
use crate::segmentation::{SegmentationPolicy, TimeIndex};
use crate::types::Archive;

pub const DEFAULT_WINDOW_MINUTES: f64 = 3.0;
pub const DEFAULT_OVERSIZE_MINUTES: f64 = 6.0;

/// Splitting configuration, from an optional JSON file overlaid by CLI flags
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    pub archive: Option<Archive>,
    #[serde(alias = "window", alias = "len_minutes_crop")]
    pub window_minutes: f64,
    #[serde(alias = "oversize", alias = "len_large_segment")]
    pub oversize_minutes: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            archive: None,
            window_minutes: DEFAULT_WINDOW_MINUTES,
            oversize_minutes: DEFAULT_OVERSIZE_MINUTES,
        }
    }
}

impl SplitConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_json(&data).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse config JSON")
    }

    /// Overlay explicitly given CLI values
    pub fn with_overrides(
        mut self,
        archive: Option<Archive>,
        window_minutes: Option<f64>,
        oversize_minutes: Option<f64>,
    ) -> Self {
        if archive.is_some() {
            self.archive = archive;
        }
        if let Some(window) = window_minutes {
            self.window_minutes = window;
        }
        if let Some(oversize) = oversize_minutes {
            self.oversize_minutes = oversize;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.archive.is_some(),
            "An archive must be selected (andalusian or hindustani)"
        );
        ensure!(
            self.window_minutes.is_finite() && self.window_minutes > 0.0,
            "Window duration must be positive, got: {}",
            self.window_minutes
        );
        ensure!(
            self.oversize_minutes.is_finite() && self.oversize_minutes > 0.0,
            "Oversize threshold must be positive, got: {}",
            self.oversize_minutes
        );
        ensure!(
            self.oversize_minutes >= self.window_minutes,
            "Oversize threshold ({} min) must not be shorter than the window ({} min)",
            self.oversize_minutes,
            self.window_minutes
        );
        Ok(())
    }

    pub fn archive(&self) -> Result<Archive> {
        self.archive
            .context("An archive must be selected (andalusian or hindustani)")
    }

    /// Policy in the units of `time_index` (the decoded sample rate)
    pub fn policy(&self, time_index: TimeIndex) -> SplitResult<SegmentationPolicy> {
        SegmentationPolicy::from_minutes(self.window_minutes, self.oversize_minutes, time_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_archive_tooling() {
        let config = SplitConfig::default();
        assert_eq!(config.window_minutes, 3.0);
        assert_eq!(config.oversize_minutes, 6.0);
    }

    #[test]
    fn parses_json_with_aliases() {
        let config =
            SplitConfig::from_json(r#"{"archive": "andalusian", "len_minutes_crop": 2.5}"#).unwrap();
        assert_eq!(config.archive, Some(Archive::Andalusian));
        assert_eq!(config.window_minutes, 2.5);
        assert_eq!(config.oversize_minutes, 6.0);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(SplitConfig::from_json(r#"{"windw": 3}"#).is_err());
    }

    #[test]
    fn cli_overrides_win() {
        let config = SplitConfig::from_json(r#"{"archive": "andalusian", "window_minutes": 2}"#)
            .unwrap()
            .with_overrides(Some(Archive::Hindustani), None, Some(8.0));
        assert_eq!(config.archive, Some(Archive::Hindustani));
        assert_eq!(config.window_minutes, 2.0);
        assert_eq!(config.oversize_minutes, 8.0);
    }

    #[test]
    fn validation_catches_bad_durations() {
        let base = SplitConfig::default().with_overrides(Some(Archive::Hindustani), None, None);
        assert!(base.validate().is_ok());
        assert!(base.clone().with_overrides(None, Some(0.0), None).validate().is_err());
        assert!(base.clone().with_overrides(None, Some(4.0), Some(3.0)).validate().is_err());
        assert!(SplitConfig::default().validate().is_err());
    }

    #[test]
    fn policy_uses_time_base() {
        let config = SplitConfig::default();
        let policy = config.policy(TimeIndex::new(16_000).unwrap()).unwrap();
        assert_eq!(policy.window(), 3 * 60 * 16_000);
        assert_eq!(policy.oversize_threshold(), 6 * 60 * 16_000);
    }
}
