//! Stream acquisition via yt-dlp.
//!
//! Downloads a remote stream to a local file, merging best video and audio
//! into MP4. Proxy, cookies and custom headers are passed through to yt-dlp;
//! failures surface as an opaque error string built from the stderr tail.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Minimum size for a plausible cookies file (bytes).
const MIN_COOKIES_FILE_SIZE: u64 = 50;

/// How many stderr lines to keep for error reporting.
const STDERR_TAIL_LINES: usize = 20;

/// Options for a stream download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Proxy URL, e.g. `http://1.2.3.4:8080`
    pub proxy: Option<String>,
    /// Netscape-format cookies file; skipped when absent or invalid
    pub cookies_file: Option<PathBuf>,
    /// User agent header
    pub user_agent: String,
    /// Extra HTTP headers as `Name: value` pairs
    pub extra_headers: Vec<(String, String)>,
    /// Download rate limit, e.g. `2M`
    pub rate_limit: Option<String>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            cookies_file: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extra_headers: Vec::new(),
            rate_limit: None,
        }
    }
}

/// Progress parsed from one yt-dlp `[download]` line.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Percent complete, 0.0..=100.0
    pub percent: f64,
}

/// Download a stream from `url` to `output_path`.
pub async fn download_stream(
    url: &str,
    output_path: impl AsRef<Path>,
    options: &DownloadOptions,
) -> MediaResult<()> {
    let output_path = output_path.as_ref();

    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let cookies = match &options.cookies_file {
        Some(path) => validated_cookies_path(path).await,
        None => None,
    };

    let args = build_args(url, output_path, options, cookies.as_deref());
    info!(url, output = %output_path.display(), "Starting stream download");
    debug!("yt-dlp {}", args.join(" "));

    let mut child = Command::new("yt-dlp")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take().expect("stdout not captured");
    let progress_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(progress) = parse_download_progress(&line) {
                debug!("Download progress: {:.1}%", progress.percent);
            }
        }
    });

    let stderr = child.stderr.take().expect("stderr not captured");
    let stderr_task = tokio::spawn(async move {
        let mut tail: Vec<String> = Vec::new();
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tail.len() == STDERR_TAIL_LINES {
                tail.remove(0);
            }
            tail.push(line);
        }
        tail
    });

    let status = child.wait().await?;
    let _ = progress_task.await;
    let stderr_tail = stderr_task.await.unwrap_or_default();

    if !status.success() {
        let cause = stderr_tail
            .last()
            .map(String::as_str)
            .unwrap_or("unknown error");
        return Err(MediaError::download_failed(format!(
            "yt-dlp failed: {cause}"
        )));
    }

    if !output_path.exists() {
        return Err(MediaError::download_failed("output file not created"));
    }

    let size = output_path.metadata()?.len();
    info!(
        output = %output_path.display(),
        size_mb = size as f64 / (1024.0 * 1024.0),
        "Stream downloaded"
    );
    Ok(())
}

/// Validate a cookies file and return its path as a string, or `None` when
/// the file is missing, too small, or not Netscape-format.
async fn validated_cookies_path(path: &Path) -> Option<String> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(_) => {
            debug!(path = %path.display(), "Cookies file not found, skipping");
            return None;
        }
    };
    if meta.len() < MIN_COOKIES_FILE_SIZE {
        debug!(
            path = %path.display(),
            size = meta.len(),
            "Cookies file too small, skipping"
        );
        return None;
    }

    match tokio::fs::read_to_string(path).await {
        Ok(content) if is_valid_netscape_cookies(&content) => {
            Some(path.to_string_lossy().into_owned())
        }
        Ok(_) => {
            warn!(path = %path.display(), "Cookies file is not Netscape format, skipping");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read cookies file");
            None
        }
    }
}

/// Netscape cookies files start with a known header or contain
/// tab-separated entries with at least six fields.
fn is_valid_netscape_cookies(content: &str) -> bool {
    if content.starts_with("# Netscape HTTP Cookie File")
        || content.starts_with("# HTTP Cookie File")
    {
        return true;
    }

    content.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#') && line.split('\t').count() >= 6
    })
}

/// Assemble the yt-dlp argument vector.
fn build_args(
    url: &str,
    output_path: &Path,
    options: &DownloadOptions,
    cookies: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "--newline".to_string(),
        "--no-part".to_string(),
        "--geo-bypass".to_string(),
        "-f".to_string(),
        "bestvideo+bestaudio/best".to_string(),
        "--merge-output-format".to_string(),
        "mp4".to_string(),
        "--user-agent".to_string(),
        options.user_agent.clone(),
    ];

    for (name, value) in &options.extra_headers {
        args.push("--add-header".to_string());
        args.push(format!("{name}:{value}"));
    }

    if let Some(limit) = &options.rate_limit {
        args.push("--limit-rate".to_string());
        args.push(limit.clone());
    }

    if let Some(proxy) = &options.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    if let Some(cookies) = cookies {
        args.push("--cookies".to_string());
        args.push(cookies.to_string());
    }

    args.push("-o".to_string());
    args.push(output_path.to_string_lossy().into_owned());
    args.push(url.to_string());
    args
}

/// Parse a yt-dlp progress line, e.g.
/// `[download]  45.2% of 10.00MiB at 500.00KiB/s ETA 00:10`.
pub fn parse_download_progress(line: &str) -> Option<DownloadProgress> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("valid progress regex")
    });

    let caps = re.captures(line)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(DownloadProgress { percent })
}
