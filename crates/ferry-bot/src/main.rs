//! Stream mirror bot binary.

use std::sync::Arc;

use teloxide::dptree;
use teloxide::prelude::*;
use tracing::{error, info, warn};

use ferry_bot::commands::{handle_command, Command};
use ferry_bot::config::FerryConfig;
use ferry_bot::session::Sessions;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    ferry_bot::logging::init();

    info!("Starting ferry-bot");

    let token = match std::env::var("TELOXIDE_TOKEN") {
        Ok(t) => t,
        Err(_) => {
            error!("TELOXIDE_TOKEN not set");
            std::process::exit(1);
        }
    };
    let bot = Bot::new(token);

    let config = Arc::new(FerryConfig::from_env());
    info!("Config: {:?}", config);

    // Downloads need both tools; surface missing ones before the first job
    if let Err(e) = ferry_media::check_ytdlp() {
        warn!("{e}");
    }
    if let Err(e) = ferry_media::check_ffmpeg() {
        warn!("{e}");
    }

    let sessions = Sessions::default();

    let handler = Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command);

    info!("Bot is running");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![sessions, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot shutdown complete");
}
