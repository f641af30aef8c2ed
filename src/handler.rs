// src/handler.rs

//! Chat command shell: `/start`, `/check` and `/info` over long polling.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::Config;
use crate::pipeline::{CrawlEngine, sleep_or_cancel};
use crate::services::{IncomingMessage, MessageSender, TelegramClient};
use crate::utils::escape_html;

const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Recognized bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Check,
    Info,
}

/// Parse the leading command of a message, accepting the `/cmd@botname` form.
pub fn parse_command(text: &str) -> Option<Command> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    match name.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "check" => Some(Command::Check),
        "info" => Some(Command::Info),
        _ => None,
    }
}

/// Answers chat commands by calling into the crawl engine.
pub struct CommandShell {
    client: Arc<TelegramClient>,
    engine: Arc<CrawlEngine>,
    summary_lines: Vec<String>,
    interval_secs: u64,
    poll_timeout_secs: u64,
}

impl CommandShell {
    pub fn new(client: Arc<TelegramClient>, engine: Arc<CrawlEngine>, config: &Config) -> Self {
        Self {
            client,
            engine,
            summary_lines: config.search.summary_lines.clone(),
            interval_secs: config.schedule.interval_secs,
            poll_timeout_secs: config.telegram.poll_timeout_secs,
        }
    }

    fn search_summary(&self) -> String {
        self.summary_lines.join("\n")
    }

    /// Build the reply for an incoming message, if it is a command.
    pub async fn handle(&self, message: &IncomingMessage) -> Option<String> {
        let command = parse_command(message.text.as_deref()?)?;
        log::info!("Received {:?} from chat {}", command, message.chat.id);

        let reply = match command {
            Command::Start => {
                let name = message
                    .from
                    .as_ref()
                    .map(|u| escape_html(&u.first_name))
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "there".to_string());
                format!(
                    "🏠 <b>Divar Post Notifier Bot</b>\n\n\
                     👋 Welcome {}!\n\n\
                     {}\n\n\
                     /check - check for new posts now\n\
                     /info - show search settings",
                    name,
                    self.search_summary()
                )
            }
            Command::Check => match self.engine.try_run_cycle().await {
                Ok(report) if report.is_failure() => {
                    format!("❌ {}", escape_html(&report.summary()))
                }
                Ok(report) => format!("✅ {}", escape_html(&report.summary())),
                Err(AppError::CycleInProgress) => {
                    "⏳ A check is already in progress, try again shortly.".to_string()
                }
                Err(e) => {
                    log::error!("Manual check failed: {}", e);
                    format!("❌ Check failed: {}", escape_html(&e.to_string()))
                }
            },
            Command::Info => format!(
                "{}\n⏰ <b>Check Interval:</b> {} seconds",
                self.search_summary(),
                self.interval_secs
            ),
        };
        Some(reply)
    }

    /// Poll for commands until `cancel` fires.
    ///
    /// A command already being handled (including a `/check` cycle) runs to
    /// completion before cancellation is observed.
    pub async fn run(self, cancel: CancellationToken) {
        log::info!("Command shell started");
        let mut offset = 0i64;

        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = self.client.get_updates(offset, self.poll_timeout_secs) => polled,
            };

            let updates = match polled {
                Ok(updates) => updates,
                Err(e) => {
                    log::warn!("Polling for commands failed: {}", e);
                    if !sleep_or_cancel(POLL_ERROR_PAUSE, &cancel).await {
                        break;
                    }
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                let Some(reply) = self.handle(&message).await else {
                    continue;
                };
                let chat_id = message.chat.id.to_string();
                if let Err(e) = self.client.send_text(&chat_id, &reply).await {
                    log::warn!("Failed to reply to chat {}: {}", chat_id, e);
                }
            }
        }

        log::info!("Command shell stopped");
    }
}
