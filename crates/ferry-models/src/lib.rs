//! Shared data models for the StreamFerry pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Source files and probed media metadata
//! - Segments produced by the splitter
//! - Per-segment upload results and the aggregated transfer report
//! - Mirror jobs and their identifiers

pub mod job;
pub mod metadata;
pub mod report;
pub mod segment;

// Re-export common types
pub use job::{JobId, MirrorJob};
pub use metadata::MediaMetadata;
pub use report::{TransferReport, UploadResult};
pub use segment::{Segment, SourceFile};
