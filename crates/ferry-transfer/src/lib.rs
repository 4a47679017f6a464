//! Chunked large-file transfer pipeline.
//!
//! Drives one source file through split → upload → delete: the splitter
//! produces ordered segments, each segment is uploaded through a
//! [`SegmentSink`] one at a time, and a segment file is deleted only after
//! its upload is confirmed. Per-segment failures are collected into the
//! final [`ferry_models::TransferReport`]; only segmentation failures abort
//! a transfer.

pub mod error;
pub mod pipeline;
pub mod sink;

pub use error::{TransferError, TransferResult, UploadError};
pub use pipeline::{SegmentProgressFn, TransferConfig, TransferPipeline};
pub use sink::{ProgressFn, SegmentSink};
