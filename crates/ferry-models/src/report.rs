//! Per-segment upload outcomes and the aggregated transfer report.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of one segment upload attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    /// Segment position in the upload sequence
    pub index: u32,
    /// Segment path at the time of the attempt
    pub path: PathBuf,
    /// Bytes transferred (0 when the upload failed)
    pub bytes_sent: u64,
    /// Failure cause; `None` means the upload succeeded
    pub error: Option<String>,
}

impl UploadResult {
    /// Record a successful upload.
    pub fn success(index: u32, path: PathBuf, bytes_sent: u64) -> Self {
        Self {
            index,
            path,
            bytes_sent,
            error: None,
        }
    }

    /// Record a failed upload.
    pub fn failure(index: u32, path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            index,
            path,
            bytes_sent: 0,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Final report of a transfer run, one entry per attempted segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferReport {
    /// Outcomes in upload order
    pub results: Vec<UploadResult>,
}

impl TransferReport {
    pub fn record(&mut self, result: UploadResult) {
        self.results.push(result);
    }

    /// Number of segments attempted.
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Number of segments uploaded successfully.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    /// Paths of segments whose upload failed; these files remain on disk.
    pub fn failed_paths(&self) -> Vec<&PathBuf> {
        self.results
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| &r.path)
            .collect()
    }

    /// Whether every attempted segment was uploaded.
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|r| r.succeeded())
    }

    /// One-line summary for status replies and logs.
    pub fn summary(&self) -> String {
        let failed = self.attempted() - self.succeeded();
        if failed == 0 {
            format!(
                "{} of {} segments uploaded",
                self.succeeded(),
                self.attempted()
            )
        } else {
            format!(
                "{} of {} segments uploaded, {} failed and kept on disk",
                self.succeeded(),
                self.attempted(),
                failed
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = TransferReport::default();
        assert_eq!(report.attempted(), 0);
        assert_eq!(report.succeeded(), 0);
        assert!(report.failed_paths().is_empty());
        assert!(report.is_complete());
    }

    #[test]
    fn test_mixed_outcomes() {
        let mut report = TransferReport::default();
        report.record(UploadResult::success(0, PathBuf::from("a_000.mp4"), 100));
        report.record(UploadResult::failure(
            1,
            PathBuf::from("a_001.mp4"),
            "network reset",
        ));
        report.record(UploadResult::success(2, PathBuf::from("a_002.mp4"), 100));

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed_paths(), vec![&PathBuf::from("a_001.mp4")]);
        assert!(!report.is_complete());
        assert!(report.summary().contains("2 of 3"));
    }
}
