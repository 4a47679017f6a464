//! Probed media metadata.

use serde::{Deserialize, Serialize};

/// Metadata extracted from a media file.
///
/// Attached to every segment cut from the file so the destination can
/// render the upload as a streamable video. The zero value is a valid
/// stand-in when probing fails; metadata is advisory, not required for
/// transfer correctness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Duration in whole seconds
    pub duration_secs: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl MediaMetadata {
    /// Create metadata from probed values.
    pub fn new(duration_secs: u64, width: u32, height: u32) -> Self {
        Self {
            duration_secs,
            width,
            height,
        }
    }

    /// Whether this is the zero value produced by a failed probe.
    pub fn is_zero(&self) -> bool {
        self.duration_secs == 0 && self.width == 0 && self.height == 0
    }
}
