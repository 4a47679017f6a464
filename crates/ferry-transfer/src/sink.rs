//! Destination abstraction for segment uploads.

use std::sync::Arc;

use async_trait::async_trait;

use ferry_models::Segment;

use crate::error::UploadError;

/// Byte-level progress callback: `(bytes_sent, total_bytes)`.
///
/// Invoked at a bounded rate; values are monotonically non-decreasing and
/// the final call on a successful upload reports `bytes_sent == total`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// An authenticated destination that accepts one segment per call.
///
/// Implementations stream the segment file as a single attachment with its
/// media metadata and a caption carrying the sequence position. They must
/// never delete or modify the segment file; deletion is the pipeline's
/// responsibility, and only after a confirmed success. No retry happens at
/// this layer.
#[async_trait]
pub trait SegmentSink: Send + Sync {
    /// Upload `segment`, reporting progress through `progress`.
    ///
    /// Returns the number of bytes transferred on success.
    async fn send_segment(&self, segment: &Segment, progress: ProgressFn)
        -> Result<u64, UploadError>;
}
