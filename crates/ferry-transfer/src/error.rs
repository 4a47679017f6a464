//! Transfer error types.

use std::path::PathBuf;

use thiserror::Error;

use ferry_media::MediaError;

pub type TransferResult<T> = Result<T, TransferError>;

/// Failure of a single segment upload.
///
/// Localized to one segment: collected into its `UploadResult`, never
/// propagated past the pipeline.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("segment file missing or empty: {0}")]
    InvalidSegment(PathBuf),

    #[error("destination rejected upload: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Failure that aborts a whole transfer.
///
/// Segmentation is the only failure that crosses the pipeline boundary;
/// probe failures degrade to zero metadata and upload failures are
/// per-segment.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("segmentation of {path} failed")]
    Segmentation {
        path: PathBuf,
        #[source]
        source: MediaError,
    },
}
