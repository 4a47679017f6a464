//! Byte-counting reader for upload progress.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

use ferry_transfer::ProgressFn;

/// Minimum bytes between two progress reports.
const MIN_REPORT_STEP: u64 = 256 * 1024;

/// Wraps an `AsyncRead` and reports `(bytes_read, total)` as the upload
/// body is consumed.
///
/// Reports fire at most once per `max(total/100, 256 KiB)` bytes, plus one
/// final report at end of stream, so callbacks are bounded regardless of
/// file size. Reported values never decrease, and the final report of a
/// fully read stream carries `bytes_read == total`.
pub struct ProgressReader<R> {
    inner: R,
    total: u64,
    bytes_read: u64,
    last_reported: u64,
    step: u64,
    finished: bool,
    progress: ProgressFn,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, total: u64, progress: ProgressFn) -> Self {
        Self {
            inner,
            total,
            bytes_read: 0,
            last_reported: 0,
            step: (total / 100).max(MIN_REPORT_STEP),
            finished: false,
            progress,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let me = self.get_mut();
        let before = buf.filled().len();

        match Pin::new(&mut me.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let n = (buf.filled().len() - before) as u64;
                if n == 0 {
                    if !me.finished {
                        me.finished = true;
                        (me.progress)(me.bytes_read, me.total);
                    }
                } else {
                    me.bytes_read += n;
                    if me.bytes_read - me.last_reported >= me.step {
                        me.last_reported = me.bytes_read;
                        (me.progress)(me.bytes_read, me.total);
                    }
                }
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}
