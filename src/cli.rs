use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::SplitConfig;
use crate::types::Archive;

/// Dunya archive splitter
///
/// Cuts long archive recordings into tagged clips and joins analysis
/// features back onto the resulting clip manifest.
#[derive(Parser, Debug)]
#[command(name = "dunyasplit", version, about = "Archive recording splitter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split every recording in a directory into tagged clips.
    Split(SplitArgs),
    /// Join analysis payloads onto a clip manifest.
    Features(FeaturesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    /// Directory holding the full-length recordings
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Directory where clips, tag sidecars and manifest.csv are written
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Archive the recordings come from
    #[arg(long, value_enum)]
    pub archive: Option<Archive>,

    /// Directory of `{recording id}.json` metadata documents
    #[arg(long, value_name = "DIR")]
    pub metadata_dir: PathBuf,

    /// Clip length in minutes
    #[arg(long, value_name = "MINUTES")]
    pub window_minutes: Option<f64>,

    /// Section length in minutes from which sections are subdivided
    #[arg(long, value_name = "MINUTES")]
    pub oversize_minutes: Option<f64>,

    /// JSON file with archive / window_minutes / oversize_minutes
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl SplitArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.is_dir() {
            bail!("Input directory does not exist: {:?}", self.input_dir);
        }
        if !self.metadata_dir.is_dir() {
            bail!("Metadata directory does not exist: {:?}", self.metadata_dir);
        }
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            bail!("Output path must be a directory: {:?}", self.output_dir);
        }
        Ok(())
    }

    /// File config (if any) overlaid with CLI flags, validated
    pub fn split_config(&self) -> Result<SplitConfig> {
        let base = match &self.config {
            Some(path) => SplitConfig::from_file(path)?,
            None => SplitConfig::default(),
        };
        let config = base.with_overrides(self.archive, self.window_minutes, self.oversize_minutes);
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct FeaturesArgs {
    /// Clip manifest written by `split`
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Directory of `{clip stem}.json` analysis payloads
    #[arg(value_name = "PAYLOAD_DIR")]
    pub payload_dir: PathBuf,

    /// Output CSV path
    #[arg(value_name = "OUTPUT_CSV")]
    pub output: PathBuf,
}

impl FeaturesArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.manifest.is_file() {
            bail!("Manifest does not exist: {:?}", self.manifest);
        }
        if !self.payload_dir.is_dir() {
            bail!("Payload directory does not exist: {:?}", self.payload_dir);
        }
        Ok(())
    }
}
