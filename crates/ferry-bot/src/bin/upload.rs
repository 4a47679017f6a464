//! Transfer runner binary.
//!
//! Reads the source path persisted by the bot run and mirrors the file
//! into the configured chat in bounded segments.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use ferry_bot::config::{FerryConfig, SOURCE_PATH_KEY};
use ferry_bot::store::KvStore;
use ferry_models::SourceFile;
use ferry_telegram::TelegramDestination;
use ferry_transfer::{TransferConfig, TransferPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ferry_bot::logging::init();

    info!("Starting ferry-upload");

    let config = FerryConfig::from_env();

    ferry_media::check_ffmpeg().context("splitting requires ffmpeg")?;
    if let Err(e) = ferry_media::check_ffprobe() {
        warn!("{e}; segments will carry zero metadata");
    }

    let store = KvStore::new(&config.store_path);

    let source_path = store
        .get(SOURCE_PATH_KEY)
        .await
        .context("failed to read the config store")?
        .map(PathBuf::from)
        .with_context(|| {
            format!("{SOURCE_PATH_KEY} not set; run the bot's /download first")
        })?;

    let source = SourceFile::stat(&source_path)
        .with_context(|| format!("cannot read source file {}", source_path.display()))?;
    info!(
        path = %source.path.display(),
        size_mb = source.size_bytes as f64 / (1024.0 * 1024.0),
        "Uploading source file in segments"
    );

    let destination = TelegramDestination::from_env().context("Telegram configuration")?;

    let pipeline = TransferPipeline::new(TransferConfig {
        segment_secs: config.segment_secs,
        ..Default::default()
    })
    .with_progress(Arc::new(|index, sent, total| {
        let percent = if total > 0 {
            sent as f64 / total as f64 * 100.0
        } else {
            100.0
        };
        debug!("Segment {index}: {percent:.1}% ({sent}/{total} bytes)");
    }));

    let report = pipeline
        .transfer(&source.path, &destination)
        .await
        .context("transfer aborted")?;

    info!("{}", report.summary());
    for path in report.failed_paths() {
        warn!(path = %path.display(), "Failed segment kept on disk for manual retry");
    }

    Ok(())
}
