//! Segment upload as a streaming Telegram video.

use async_trait::async_trait;
use teloxide::payloads::SendVideoSetters;
use teloxide::prelude::Requester;
use teloxide::types::InputFile;
use teloxide::RequestError;
use tracing::info;

use ferry_models::Segment;
use ferry_transfer::{ProgressFn, SegmentSink, UploadError};

use crate::client::TelegramDestination;
use crate::progress_reader::ProgressReader;

/// Human-readable caption carrying the segment's sequence position, which
/// the receiving side uses as reassembly guidance.
fn segment_caption(segment: &Segment) -> String {
    format!("Part {:03}: {}", segment.index + 1, segment.file_name())
}

#[async_trait]
impl SegmentSink for TelegramDestination {
    async fn send_segment(
        &self,
        segment: &Segment,
        progress: ProgressFn,
    ) -> Result<u64, UploadError> {
        let total = match tokio::fs::metadata(&segment.path).await {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => return Err(UploadError::InvalidSegment(segment.path.clone())),
        };

        let file = tokio::fs::File::open(&segment.path).await?;
        let reader = ProgressReader::new(file, total, progress);
        let attachment = InputFile::read(reader).file_name(segment.file_name());

        let metadata = segment.metadata.as_ref();
        let mut request = self
            .bot()
            .send_video(self.chat(), attachment)
            .caption(segment_caption(segment))
            .supports_streaming(true);
        if !metadata.is_zero() {
            request = request
                .duration(metadata.duration_secs as u32)
                .width(metadata.width)
                .height(metadata.height);
        }

        request.await.map_err(map_request_error)?;

        info!(
            file = %segment.file_name(),
            bytes = total,
            "Segment delivered to Telegram"
        );
        Ok(total)
    }
}

/// Map a teloxide failure onto the pipeline's upload error taxonomy.
fn map_request_error(error: RequestError) -> UploadError {
    match error {
        RequestError::Api(api) => UploadError::rejected(api.to_string()),
        RequestError::RetryAfter(secs) => {
            UploadError::rejected(format!("flood control, retry after {secs:?}"))
        }
        RequestError::Network(e) => UploadError::transport(e.to_string()),
        RequestError::Io(e) => UploadError::transport(e.to_string()),
        other => UploadError::transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::sync::Arc;

    use ferry_models::MediaMetadata;

    #[test]
    fn test_caption_carries_position() {
        let segment = Segment {
            index: 1,
            path: PathBuf::from("/tmp/match_segments/match_001.mp4"),
            size_bytes: 10,
            metadata: Arc::new(MediaMetadata::default()),
        };
        assert_eq!(segment_caption(&segment), "Part 002: match_001.mp4");
    }

    #[test]
    fn test_captions_sort_in_sequence_order() {
        let metadata = Arc::new(MediaMetadata::default());
        let captions: Vec<String> = (0..12)
            .map(|i| {
                segment_caption(&Segment {
                    index: i,
                    path: PathBuf::from(format!("/tmp/m_{i:03}.mp4")),
                    size_bytes: 1,
                    metadata: Arc::clone(&metadata),
                })
            })
            .collect();
        let mut sorted = captions.clone();
        sorted.sort();
        assert_eq!(captions, sorted);
    }
}
