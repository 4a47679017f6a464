//! Runtime configuration.

use std::path::PathBuf;

/// Store key holding the resolved source file path between the download
/// run and the upload run.
pub const SOURCE_PATH_KEY: &str = "FERRY_SOURCE_PATH";

/// Configuration shared by both binaries.
#[derive(Debug, Clone)]
pub struct FerryConfig {
    /// Directory downloads land in
    pub download_dir: PathBuf,
    /// Netscape cookies file passed to the downloader
    pub cookies_file: PathBuf,
    /// KEY=value store file
    pub store_path: PathBuf,
    /// Maximum duration of one segment, in seconds
    pub segment_secs: u64,
    /// Download rate limit passed to the downloader, e.g. `2M`
    pub rate_limit: Option<String>,
    /// Proxy list API endpoint; no lookup when unset
    pub proxy_api: Option<String>,
}

impl Default for FerryConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            cookies_file: PathBuf::from("cookies.txt"),
            store_path: PathBuf::from(".env"),
            segment_secs: ferry_transfer::pipeline::DEFAULT_SEGMENT_SECS,
            rate_limit: None,
            proxy_api: None,
        }
    }
}

impl FerryConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            download_dir: std::env::var("FERRY_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            cookies_file: std::env::var("FERRY_COOKIES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cookies_file),
            store_path: std::env::var("FERRY_STORE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            segment_secs: std::env::var("FERRY_SEGMENT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.segment_secs),
            rate_limit: std::env::var("FERRY_RATE_LIMIT").ok(),
            proxy_api: std::env::var("FERRY_PROXY_API").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FerryConfig::default();
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.segment_secs, 7200);
        assert!(config.proxy_api.is_none());
    }
}
