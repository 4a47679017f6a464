//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// How many non-progress stderr lines to keep for error reporting.
const STDERR_TAIL_LINES: usize = 40;

/// Builder for FFmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path, or an output pattern for the segment muxer
    output: PathBuf,
    /// Arguments placed after -i
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Copy all codec data without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Map every stream of the input into the output.
    pub fn map_all(self) -> Self {
        self.output_arg("-map").output_arg("0")
    }

    /// Force the output container format.
    pub fn format(self, fmt: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(fmt)
    }

    /// Cut a new segment every `seconds` (segment muxer option).
    pub fn segment_time(self, seconds: u64) -> Self {
        self.output_arg("-segment_time").output_arg(seconds.to_string())
    }

    /// Restart timestamps at zero for each segment so it plays standalone.
    pub fn reset_timestamps(self) -> Self {
        self.output_arg("-reset_timestamps").output_arg("1")
    }

    /// Build the argument vector.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        args.push("-y".to_string());

        // Errors only; progress arrives through the key=value stream
        args.push("-v".to_string());
        args.push("error".to_string());

        // Progress key=value stream interleaved on stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and an optional timeout.
#[derive(Debug, Default)]
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command, discarding progress.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command, invoking `progress_callback` on each progress
    /// block. Non-progress stderr output is retained and attached to the
    /// error when FFmpeg exits non-zero.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr).lines();

        let stderr_task = tokio::spawn(async move {
            let mut current = FfmpegProgress::default();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                match parse_progress_line(&line, &mut current) {
                    ProgressLine::Update => progress_callback(current.clone()),
                    ProgressLine::Partial => {}
                    ProgressLine::Other => {
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line);
                    }
                }
            }

            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let wait_result = self.wait_for_completion(&mut child).await;
        let stderr_tail = stderr_task.await.unwrap_or_default();

        match wait_result {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!stderr_tail.is_empty()).then_some(stderr_tail),
                status.code(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait for the child process, killing it on timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let status = if let Some(timeout_secs) = self.timeout_secs {
            let timeout = tokio::time::timeout(
                std::time::Duration::from_secs(timeout_secs),
                child.wait(),
            );
            match timeout.await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        "FFmpeg timed out after {} seconds, killing process",
                        timeout_secs
                    );
                    let _ = child.kill().await;
                    return Err(MediaError::Timeout(timeout_secs));
                }
            }
        } else {
            child.wait().await?
        };

        Ok(status)
    }
}

/// Classification of one stderr line from an FFmpeg run.
#[derive(Debug, PartialEq, Eq)]
enum ProgressLine {
    /// End of a progress block; the accumulated progress should be reported
    Update,
    /// A recognized progress key that only updates the accumulator
    Partial,
    /// Diagnostic output worth keeping for error reporting
    Other,
}

/// Parse one line of FFmpeg's `-progress` stream into `current`.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> ProgressLine {
    let Some((key, value)) = line.trim().split_once('=') else {
        return ProgressLine::Other;
    };

    match key {
        "out_time_ms" | "out_time_us" => {
            // Both keys carry microseconds in modern FFmpeg
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
            ProgressLine::Partial
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.parse().ok()) {
                current.speed = speed;
            }
            ProgressLine::Partial
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            ProgressLine::Update
        }
        // Remaining keys of the progress block are not tracked
        "frame" | "fps" | "bitrate" | "total_size" | "out_time" | "dup_frames"
        | "drop_frames" | "stream_0_0_q" => ProgressLine::Partial,
        _ => ProgressLine::Other,
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

/// Check if yt-dlp is available.
pub fn check_ytdlp() -> MediaResult<PathBuf> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mkv", "out_%03d.mp4")
            .codec_copy()
            .map_all()
            .format("segment")
            .segment_time(7200)
            .reset_timestamps();

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-c".to_string()));
        assert!(args.contains(&"copy".to_string()));
        assert!(args.contains(&"-segment_time".to_string()));
        assert!(args.contains(&"7200".to_string()));
        assert!(args.contains(&"-reset_timestamps".to_string()));
        assert_eq!(args.last().unwrap(), "out_%03d.mp4");

        // -i precedes the input path, which precedes all output args
        let i_pos = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[i_pos + 1], "input.mkv");
        let c_pos = args.iter().position(|a| a == "-c").unwrap();
        assert!(c_pos > i_pos);
    }

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        assert_eq!(
            parse_progress_line("out_time_ms=5000000", &mut progress),
            ProgressLine::Partial
        );
        assert_eq!(progress.out_time_ms, 5000);

        assert_eq!(
            parse_progress_line("speed=1.5x", &mut progress),
            ProgressLine::Partial
        );
        assert!((progress.speed - 1.5).abs() < 0.01);

        assert_eq!(
            parse_progress_line("progress=end", &mut progress),
            ProgressLine::Update
        );
        assert!(progress.is_complete);
    }

    #[test]
    fn test_diagnostic_lines_are_kept_apart() {
        let mut progress = FfmpegProgress::default();
        assert_eq!(
            parse_progress_line(
                "[mp4 @ 0x55] moov atom not found",
                &mut progress
            ),
            ProgressLine::Other
        );
        assert_eq!(
            parse_progress_line("frame=100", &mut progress),
            ProgressLine::Partial
        );
    }
}
