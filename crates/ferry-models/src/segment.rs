//! Source files and the segments cut from them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::metadata::MediaMetadata;

/// A local media file about to be segmented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path on disk
    pub path: PathBuf,
    /// Total size in bytes
    pub size_bytes: u64,
}

impl SourceFile {
    /// Build a source descriptor by statting the file.
    pub fn stat(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
        })
    }
}

/// One bounded slice of a source file, ready for upload.
///
/// Segments are created by the splitter and owned by the transfer pipeline
/// from then on; only the pipeline deletes them. `index` values are
/// contiguous from 0 and match the lexical sort order of the segment paths,
/// which is the order the destination needs for reassembly.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Position in the upload sequence, starting at 0
    pub index: u32,
    /// Path of the segment file on disk
    pub path: PathBuf,
    /// Size of the segment file in bytes
    pub size_bytes: u64,
    /// Metadata of the parent source file, shared across all its segments
    pub metadata: Arc<MediaMetadata>,
}

impl Segment {
    /// File name of the segment, for captions and logs.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
