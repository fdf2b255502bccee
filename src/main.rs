use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dunyasplit::cli::{Cli, Command, FeaturesArgs, SplitArgs};
use dunyasplit::export::{write_manifest, ClipExporter, WavClipSink};
use dunyasplit::features::reconcile_files;
use dunyasplit::metadata::JsonMetadataSource;
use dunyasplit::pipeline::split_directory;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Split(args) => run_split(&args),
        Command::Features(args) => run_features(&args),
    }
}

fn run_split(args: &SplitArgs) -> Result<()> {
    args.validate()
        .context("Failed to validate command-line arguments")?;
    let config = args.split_config().context("Invalid split configuration")?;
    info!(
        archive = ?config.archive,
        window_minutes = config.window_minutes,
        oversize_minutes = config.oversize_minutes,
        "splitting {:?} into {:?}",
        args.input_dir,
        args.output_dir
    );

    let metadata = JsonMetadataSource::new(&args.metadata_dir);
    let mut exporter = ClipExporter::new(WavClipSink::new(&args.output_dir)?);
    let report = split_directory(&args.input_dir, &config, &metadata, &mut exporter)?;

    let manifest_path = args.output_dir.join("manifest.csv");
    let rows = write_manifest(&manifest_path, &report.recordings)?;

    for failure in report.recordings.iter().flat_map(|r| &r.failures) {
        warn!(clip = ?failure.sequence_index, "{}", failure.error);
    }
    for failed in &report.failed {
        warn!(recording = %failed.recording_id, "{}", failed.reason);
    }
    info!(
        recordings = report.recordings.len(),
        skipped = report.failed.len(),
        clips = report.clips_saved(),
        failed_clips = report.clips_failed(),
        manifest_rows = rows,
        "split complete"
    );
    Ok(())
}

fn run_features(args: &FeaturesArgs) -> Result<()> {
    args.validate()
        .context("Failed to validate command-line arguments")?;
    let report = reconcile_files(&args.manifest, &args.payload_dir, &args.output)?;
    info!(
        kept = report.kept,
        dropped = report.dropped.len(),
        "feature reconciliation complete"
    );
    Ok(())
}
