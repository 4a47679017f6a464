//! The transfer pipeline: probe, split, then upload segments in order.

use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use ferry_media::split::segment_dir_for;
use ferry_media::{probe_or_default, split_into_segments};
use ferry_models::{Segment, TransferReport, UploadResult};

use crate::error::{TransferError, TransferResult};
use crate::sink::{ProgressFn, SegmentSink};

/// Default segment duration: 120 minutes keeps typical segments under the
/// destination's per-file cap.
pub const DEFAULT_SEGMENT_SECS: u64 = 120 * 60;

/// Per-file upload cap of the destination (approximate). Duration-based
/// splitting does not guarantee staying under it; larger segments are
/// reported but still attempted.
pub const DEFAULT_OVERSIZE_WARN_BYTES: u64 = 1_900_000_000;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum duration of one segment, in seconds
    pub segment_secs: u64,
    /// Segment byte size above which a warning is logged
    pub oversize_warn_bytes: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            segment_secs: DEFAULT_SEGMENT_SECS,
            oversize_warn_bytes: DEFAULT_OVERSIZE_WARN_BYTES,
        }
    }
}

/// Caller-facing progress observer: `(segment_index, bytes_sent, total)`.
pub type SegmentProgressFn = Arc<dyn Fn(u32, u64, u64) + Send + Sync>;

/// Sequential split → upload → delete pipeline for one source file.
///
/// Uploads run strictly in segment index order, one at a time, over a
/// single shared destination handle. A pipeline value is cheap and not
/// meant to be reused across unrelated source files.
pub struct TransferPipeline {
    config: TransferConfig,
    on_progress: Option<SegmentProgressFn>,
}

impl TransferPipeline {
    pub fn new(config: TransferConfig) -> Self {
        Self {
            config,
            on_progress: None,
        }
    }

    /// Forward per-segment byte progress to `callback`.
    pub fn with_progress(mut self, callback: SegmentProgressFn) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Transfer `source` through `sink`.
    ///
    /// Probing is fail-soft (zero metadata). A segmentation failure aborts
    /// with `TransferError::Segmentation` and leaves no segment files. Any
    /// other outcome yields a report with one entry per attempted segment;
    /// a failed segment keeps its file on disk and does not stop the
    /// remaining segments.
    pub async fn transfer<S>(&self, source: &Path, sink: &S) -> TransferResult<TransferReport>
    where
        S: SegmentSink + ?Sized,
    {
        info!(source = %source.display(), "Starting transfer");

        let metadata = Arc::new(probe_or_default(source).await);
        debug!(?metadata, "Probed source metadata");

        let out_dir = segment_dir_for(source);
        let segments = split_into_segments(
            source,
            &out_dir,
            self.config.segment_secs,
            Arc::clone(&metadata),
        )
        .await
        .map_err(|e| TransferError::Segmentation {
            path: source.to_path_buf(),
            source: e,
        })?;

        let report = self.upload_all(segments, sink).await;

        // Directory is empty once every segment uploaded and was deleted
        if report.attempted() > 0 && report.is_complete() {
            let _ = fs::remove_dir(&out_dir).await;
        }

        info!(source = %source.display(), "Transfer done: {}", report.summary());
        Ok(report)
    }

    /// Upload `segments` in index order, deleting each file only after its
    /// upload is confirmed. Returns one `UploadResult` per segment.
    pub async fn upload_all<S>(&self, segments: Vec<Segment>, sink: &S) -> TransferReport
    where
        S: SegmentSink + ?Sized,
    {
        let total = segments.len();
        let mut report = TransferReport::default();

        for segment in segments {
            if segment.size_bytes > self.config.oversize_warn_bytes {
                warn!(
                    file = %segment.file_name(),
                    size = segment.size_bytes,
                    cap = self.config.oversize_warn_bytes,
                    "Segment exceeds destination size cap; upload may be rejected"
                );
            }

            info!(
                index = segment.index,
                of = total,
                file = %segment.file_name(),
                size = segment.size_bytes,
                "Uploading segment"
            );

            let forward = self.on_progress.clone();
            let index = segment.index;
            let progress: ProgressFn = Arc::new(move |sent, total_bytes| {
                if let Some(cb) = &forward {
                    cb(index, sent, total_bytes);
                }
            });

            match sink.send_segment(&segment, progress).await {
                Ok(bytes_sent) => {
                    // Delete only after the destination confirmed the upload
                    match fs::remove_file(&segment.path).await {
                        Ok(()) => debug!(file = %segment.file_name(), "Deleted uploaded segment"),
                        Err(e) => warn!(
                            file = %segment.file_name(),
                            error = %e,
                            "Uploaded segment could not be deleted"
                        ),
                    }
                    report.record(UploadResult::success(
                        segment.index,
                        segment.path.clone(),
                        bytes_sent,
                    ));
                }
                Err(e) => {
                    warn!(
                        index = segment.index,
                        file = %segment.file_name(),
                        error = %e,
                        "Segment upload failed; file kept on disk"
                    );
                    report.record(UploadResult::failure(
                        segment.index,
                        segment.path.clone(),
                        e.to_string(),
                    ));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use ferry_models::MediaMetadata;

    use crate::error::UploadError;

    /// Sink that fails configured indices and simulates chunked progress.
    struct MockSink {
        fail_indices: HashSet<u32>,
        sent: Mutex<Vec<u32>>,
    }

    impl MockSink {
        fn new(fail_indices: impl IntoIterator<Item = u32>) -> Self {
            Self {
                fail_indices: fail_indices.into_iter().collect(),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SegmentSink for MockSink {
        async fn send_segment(
            &self,
            segment: &Segment,
            progress: ProgressFn,
        ) -> Result<u64, UploadError> {
            self.sent.lock().unwrap().push(segment.index);

            let total = segment.size_bytes;
            progress(0, total);
            progress(total / 2, total);

            if self.fail_indices.contains(&segment.index) {
                return Err(UploadError::transport("simulated network failure"));
            }

            progress(total, total);
            Ok(total)
        }
    }

    async fn make_segments(dir: &TempDir, count: usize) -> Vec<Segment> {
        let metadata = Arc::new(MediaMetadata::new(60, 1280, 720));
        let mut segments = Vec::new();
        for i in 0..count {
            let path = dir.path().join(format!("show_{i:03}.mp4"));
            tokio::fs::write(&path, vec![0u8; 64]).await.unwrap();
            segments.push(Segment {
                index: i as u32,
                path,
                size_bytes: 64,
                metadata: Arc::clone(&metadata),
            });
        }
        segments
    }

    #[tokio::test]
    async fn test_failed_segment_does_not_stop_later_ones() {
        let dir = TempDir::new().unwrap();
        let segments = make_segments(&dir, 3).await;
        let paths: Vec<PathBuf> = segments.iter().map(|s| s.path.clone()).collect();

        let sink = MockSink::new([1]);
        let pipeline = TransferPipeline::new(TransferConfig::default());
        let report = pipeline.upload_all(segments, &sink).await;

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed_paths(), vec![&paths[1]]);

        // All three were attempted, in order
        assert_eq!(*sink.sent.lock().unwrap(), vec![0, 1, 2]);

        // Deleted iff succeeded
        assert!(!paths[0].exists());
        assert!(paths[1].exists());
        assert!(!paths[2].exists());
    }

    #[tokio::test]
    async fn test_empty_segment_list_is_not_an_error() {
        let sink = MockSink::new([]);
        let pipeline = TransferPipeline::new(TransferConfig::default());
        let report = pipeline.upload_all(Vec::new(), &sink).await;

        assert_eq!(report.attempted(), 0);
        assert_eq!(report.succeeded(), 0);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_terminal() {
        let dir = TempDir::new().unwrap();
        let segments = make_segments(&dir, 1).await;
        let total = segments[0].size_bytes;

        let calls: Arc<Mutex<Vec<(u32, u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = Arc::clone(&calls);

        let sink = MockSink::new([]);
        let pipeline = TransferPipeline::new(TransferConfig::default()).with_progress(Arc::new(
            move |index, sent, total_bytes| {
                calls_clone.lock().unwrap().push((index, sent, total_bytes));
            },
        ));
        let report = pipeline.upload_all(segments, &sink).await;
        assert_eq!(report.succeeded(), 1);

        let calls = calls.lock().unwrap();
        assert!(!calls.is_empty());
        let mut last = 0;
        for (index, sent, total_bytes) in calls.iter() {
            assert_eq!(*index, 0);
            assert_eq!(*total_bytes, total);
            assert!(*sent >= last, "progress went backwards");
            last = *sent;
        }
        assert_eq!(last, total, "final progress must equal segment size");
    }

    #[tokio::test]
    async fn test_transfer_aborts_on_segmentation_failure() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("garbage.mp4");
        tokio::fs::write(&source, b"not a demuxable container")
            .await
            .unwrap();

        let sink = MockSink::new([]);
        let pipeline = TransferPipeline::new(TransferConfig::default());
        let err = pipeline.transfer(&source, &sink).await.unwrap_err();

        assert!(matches!(err, TransferError::Segmentation { .. }));
        // No upload attempted, no segment files left behind
        assert!(sink.sent.lock().unwrap().is_empty());
        assert!(!segment_dir_for(&source).exists());
        assert!(source.exists());
    }
}
