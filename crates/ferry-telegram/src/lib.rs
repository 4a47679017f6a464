//! Telegram destination for segment uploads.
//!
//! Wraps a teloxide [`Bot`](teloxide::Bot) as a
//! [`SegmentSink`](ferry_transfer::SegmentSink): each segment is streamed as
//! a video attachment with its probed metadata, a positional caption, and
//! bounded-rate byte progress. Large uploads assume a local Bot API server
//! (the hosted API caps files well below segment size).

pub mod client;
pub mod error;
pub mod progress_reader;
pub mod upload;

pub use client::{TelegramConfig, TelegramDestination};
pub use error::{TelegramError, TelegramResult};
pub use progress_reader::ProgressReader;
