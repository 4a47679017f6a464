//! FFmpeg and yt-dlp CLI wrappers for stream mirroring.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Stream acquisition via yt-dlp with proxy/cookie support
//! - Stream-copy remuxing to MP4
//! - Duration-bounded segmentation of large files
//! - Fail-soft ffprobe metadata extraction

pub mod command;
pub mod download;
pub mod error;
pub mod probe;
pub mod progress;
pub mod remux;
pub mod split;

pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use download::{download_stream, DownloadOptions};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_media, probe_or_default};
pub use progress::FfmpegProgress;
pub use remux::remux_to_mp4;
pub use split::{segment_dir_for, split_into_segments};
