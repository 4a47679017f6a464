//! Stream-copy repackaging into MP4.

use std::path::Path;

use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Generous bound for a stream-copy pass; remuxing never re-encodes, so
/// anything slower than this indicates a wedged process.
const REMUX_TIMEOUT_SECS: u64 = 2 * 60 * 60;

/// Repackage `input` into an MP4 container at `output` without re-encoding.
///
/// `duration_hint_secs` is used only to turn progress into a percentage for
/// logging. A non-zero FFmpeg exit is fatal for this step.
pub async fn remux_to_mp4(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    duration_hint_secs: Option<u64>,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    info!(
        input = %input.display(),
        output = %output.display(),
        "Remuxing to MP4"
    );

    let cmd = FfmpegCommand::new(input, output).codec_copy().format("mp4");

    let total_ms = duration_hint_secs.map(|s| (s * 1000) as i64);
    FfmpegRunner::new()
        .with_timeout(REMUX_TIMEOUT_SECS)
        .run_with_progress(&cmd, move |progress| match total_ms {
            Some(total) => debug!(
                "Remux progress: {:.1}% (speed {:.2}x)",
                progress.percentage(total),
                progress.speed
            ),
            None => debug!(
                "Remux progress: {}ms processed (speed {:.2}x)",
                progress.out_time_ms, progress.speed
            ),
        })
        .await?;

    info!(output = %output.display(), "Remux complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remux_missing_input() {
        let err = remux_to_mp4("/nonexistent/in.ts", "/tmp/out.mp4", None)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
