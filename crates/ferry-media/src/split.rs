//! Duration-bounded segmentation of large media files.
//!
//! Splits one source file into independently playable segments via the
//! FFmpeg segment muxer, stream-copying at container-safe points. Segment
//! byte size is bounded only indirectly, through the duration threshold.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{info, warn};

use ferry_models::{MediaMetadata, Segment};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Default output directory for a source file's segments.
pub fn segment_dir_for(source: impl AsRef<Path>) -> PathBuf {
    let source = source.as_ref();
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    source
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_segments"))
}

/// Split `source` into segments of at most `segment_secs` each.
///
/// Segments land in `out_dir` named `<stem>_%03d.mp4`, so lexical sort
/// order equals upload order. Returned indices are contiguous from 0.
/// The source file is never deleted.
///
/// On any failure the partial output directory is removed and a
/// `SplitFailed` error carrying the source path is returned, so a failed
/// split leaves zero segments on disk.
pub async fn split_into_segments(
    source: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    segment_secs: u64,
    metadata: Arc<MediaMetadata>,
) -> MediaResult<Vec<Segment>> {
    let source = source.as_ref();
    let out_dir = out_dir.as_ref();

    if !source.exists() {
        return Err(MediaError::FileNotFound(source.to_path_buf()));
    }

    fs::create_dir_all(out_dir).await?;

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    let pattern = out_dir.join(format!("{stem}_%03d.mp4"));

    let cmd = FfmpegCommand::new(source, &pattern)
        .codec_copy()
        .map_all()
        .segment_time(segment_secs)
        .format("segment")
        .reset_timestamps();

    info!(
        source = %source.display(),
        out_dir = %out_dir.display(),
        segment_secs,
        "Splitting source into segments"
    );

    if let Err(e) = FfmpegRunner::new().run(&cmd).await {
        // A failed split must leave no partial segments behind
        if let Err(cleanup) = fs::remove_dir_all(out_dir).await {
            warn!(
                out_dir = %out_dir.display(),
                error = %cleanup,
                "Failed to remove partial segment directory"
            );
        }

        let stderr = match &e {
            MediaError::FfmpegFailed { stderr, .. } => stderr.clone(),
            _ => None,
        };
        return Err(MediaError::split_failed(source, e.to_string(), stderr));
    }

    let segments = collect_segments(out_dir, metadata).await?;
    info!(
        source = %source.display(),
        count = segments.len(),
        "Split produced {} segment(s)",
        segments.len()
    );
    Ok(segments)
}

/// Collect segment files from `dir` in lexical order, assigning contiguous
/// indices from 0.
async fn collect_segments(
    dir: &Path,
    metadata: Arc<MediaMetadata>,
) -> MediaResult<Vec<Segment>> {
    let mut paths = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("mp4") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut segments = Vec::with_capacity(paths.len());
    for (index, path) in paths.into_iter().enumerate() {
        let size_bytes = fs::metadata(&path).await?.len();
        segments.push(Segment {
            index: index as u32,
            path,
            size_bytes,
            metadata: Arc::clone(&metadata),
        });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_collect_segments_sorted_and_contiguous() {
        let dir = TempDir::new().unwrap();
        // Written out of order on purpose
        for name in ["show_002.mp4", "show_000.mp4", "show_001.mp4"] {
            fs::write(dir.path().join(name), b"data").await.unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"ignored")
            .await
            .unwrap();

        let segments = collect_segments(dir.path(), Arc::new(MediaMetadata::default()))
            .await
            .unwrap();

        assert_eq!(segments.len(), 3);
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, i as u32);
            assert_eq!(seg.file_name(), format!("show_{i:03}.mp4"));
            assert_eq!(seg.size_bytes, 4);
        }
    }

    #[tokio::test]
    async fn test_collect_segments_empty_dir() {
        let dir = TempDir::new().unwrap();
        let segments = collect_segments(dir.path(), Arc::new(MediaMetadata::default()))
            .await
            .unwrap();
        assert!(segments.is_empty());
    }

    #[tokio::test]
    async fn test_split_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = split_into_segments(
            dir.path().join("absent.mp4"),
            dir.path().join("out"),
            7200,
            Arc::new(MediaMetadata::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_split_failure_leaves_no_segments() {
        let dir = TempDir::new().unwrap();
        // Not a demuxable container, so the split cannot succeed whether or
        // not ffmpeg is installed
        let source = dir.path().join("garbage.mp4");
        fs::write(&source, b"not a real container").await.unwrap();
        let out_dir = dir.path().join("garbage_segments");

        let err = split_into_segments(&source, &out_dir, 7200, Arc::new(MediaMetadata::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::SplitFailed { .. }));
        assert!(!out_dir.exists());
        assert!(source.exists(), "source must never be deleted");
    }

    #[test]
    fn test_segment_dir_naming() {
        assert_eq!(
            segment_dir_for("/data/match replay.mp4"),
            PathBuf::from("/data/match replay_segments")
        );
    }
}
