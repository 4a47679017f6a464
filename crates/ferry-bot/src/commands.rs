//! Bot commands and their handlers.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::error;
use url::Url;

use crate::config::FerryConfig;
use crate::jobs::run_download_job;
use crate::session::Sessions;

/// Commands accepted by the bot.
#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "Mirror a stream into this chat:"
)]
pub enum Command {
    #[command(description = "show usage")]
    Start,
    #[command(description = "set the stream URL")]
    SetUrl(String),
    #[command(description = "set the output file name")]
    SetFilename(String),
    #[command(description = "download and remux the stream")]
    Download,
}

/// Keep file names shell- and filesystem-safe; everything else becomes `_`.
fn sanitize_file_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Dispatch one command.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    sessions: Sessions,
    config: Arc<FerryConfig>,
) -> ResponseResult<()> {
    let chat = msg.chat.id;

    match cmd {
        Command::Start => {
            bot.send_message(chat, Command::descriptions().to_string())
                .await?;
        }

        Command::SetUrl(raw) => {
            let reply = match Url::parse(raw.trim()) {
                Ok(parsed_url) => {
                    let stream_url = parsed_url.to_string();
                    sessions
                        .update(chat, |s| s.url = Some(stream_url.clone()))
                        .await;
                    format!("Stream URL set to: {stream_url}")
                }
                Err(_) => {
                    "Please provide a valid stream URL. \
                     Example: /seturl http://example.com/stream"
                        .to_string()
                }
            };
            bot.send_message(chat, reply).await?;
        }

        Command::SetFilename(raw) => {
            let name = sanitize_file_name(&raw);
            let reply = if name.is_empty() {
                "Please provide a file name. Example: /setfilename my_video".to_string()
            } else {
                let file_name = if name.ends_with(".mp4") {
                    name
                } else {
                    format!("{name}.mp4")
                };
                sessions
                    .update(chat, |s| s.file_name = Some(file_name.clone()))
                    .await;
                format!("Output file name set to: {file_name}")
            };
            bot.send_message(chat, reply).await?;
        }

        Command::Download => {
            let session = sessions.get(chat).await;
            match session.to_job() {
                None => {
                    bot.send_message(
                        chat,
                        "Set the stream URL and file name first using /seturl and /setfilename.",
                    )
                    .await?;
                }
                Some(job) => {
                    bot.send_message(chat, format!("Starting download of: {}", job.url))
                        .await?;

                    let bot = bot.clone();
                    let config = Arc::clone(&config);
                    tokio::spawn(async move {
                        let reply = match run_download_job(&job, &config).await {
                            Ok(path) => format!(
                                "Download and conversion completed. Saved as: {}",
                                path.display()
                            ),
                            Err(e) => format!("Error during download or conversion: {e:#}"),
                        };
                        if let Err(e) = bot.send_message(chat, reply).await {
                            error!(error = %e, "Failed to deliver job status message");
                        }
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my video"), "my video");
        assert_eq!(sanitize_file_name("  match replay  "), "match replay");
        assert_eq!(sanitize_file_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_file_name("série finale"), "série finale");
        assert_eq!(sanitize_file_name("   "), "");
    }

    #[test]
    fn test_command_parsing() {
        let cmd = Command::parse("/seturl https://example.com/live", "ferrybot").unwrap();
        assert!(matches!(cmd, Command::SetUrl(u) if u == "https://example.com/live"));

        let cmd = Command::parse("/setfilename india vs nz day 3", "ferrybot").unwrap();
        assert!(matches!(cmd, Command::SetFilename(n) if n == "india vs nz day 3"));

        let cmd = Command::parse("/download", "ferrybot").unwrap();
        assert!(matches!(cmd, Command::Download));
    }
}
