//! Telegram command surface and transfer runner.
//!
//! Two binaries share this crate:
//! - `ferry-bot` listens for `/seturl`, `/setfilename` and `/download`,
//!   acquires the stream, remuxes it and persists the resolved path.
//! - `ferry-upload` reads the persisted path and drives the chunked
//!   transfer pipeline into the configured chat.

pub mod commands;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod proxy;
pub mod session;
pub mod store;

pub use commands::Command;
pub use config::FerryConfig;
pub use session::{MirrorSession, Sessions};
pub use store::KvStore;
