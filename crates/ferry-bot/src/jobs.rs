//! Download job execution.

use std::path::PathBuf;

use anyhow::Context;
use tokio::fs;
use tracing::{info, warn};

use ferry_media::{download_stream, probe_or_default, remux_to_mp4, DownloadOptions};
use ferry_models::MirrorJob;

use crate::config::{FerryConfig, SOURCE_PATH_KEY};
use crate::proxy::fetch_proxy;
use crate::store::KvStore;

/// Acquire the stream for `job`, remux it to MP4 and persist the resolved
/// path for the upload run. Returns the final file path.
pub async fn run_download_job(job: &MirrorJob, config: &FerryConfig) -> anyhow::Result<PathBuf> {
    info!(job_id = %job.id, url = %job.url, "Running download job");

    fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create download directory {}",
                config.download_dir.display()
            )
        })?;

    let temp_path = config.download_dir.join(format!("temp_{}", job.id));
    let final_path = config.download_dir.join(&job.file_name);

    let proxy = match &config.proxy_api {
        Some(api_url) => fetch_proxy(api_url).await,
        None => None,
    };
    if proxy.is_none() {
        info!("No proxy available, proceeding without proxy");
    }

    let options = DownloadOptions {
        proxy,
        cookies_file: Some(config.cookies_file.clone()),
        rate_limit: config.rate_limit.clone(),
        ..Default::default()
    };

    download_stream(&job.url, &temp_path, &options)
        .await
        .context("stream download failed")?;

    let metadata = probe_or_default(&temp_path).await;
    let duration_hint = (metadata.duration_secs > 0).then_some(metadata.duration_secs);
    remux_to_mp4(&temp_path, &final_path, duration_hint)
        .await
        .context("remux to MP4 failed")?;

    if let Err(e) = fs::remove_file(&temp_path).await {
        warn!(path = %temp_path.display(), error = %e, "Failed to remove temp download");
    }

    KvStore::new(&config.store_path)
        .set(SOURCE_PATH_KEY, &final_path.to_string_lossy())
        .await
        .context("failed to persist the source path")?;

    info!(job_id = %job.id, path = %final_path.display(), "Download job complete");
    Ok(final_path)
}
