// src/services/telegram.rs

//! Telegram Bot API client.
//!
//! Only the handful of methods the notifier needs: `sendMessage`,
//! `sendPhoto`, `getUpdates` and `getMe`. All messages use HTML markup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::TelegramConfig;
use crate::utils::http::create_async_client;

const PARSE_MODE: &str = "HTML";
const USER_AGENT: &str = concat!("divar-notifier/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound message delivery to a single chat.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send an HTML-formatted text message.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;

    /// Send a photo by URL with an HTML-formatted caption.
    async fn send_photo(&self, chat_id: &str, photo_url: &str, caption: &str) -> Result<()>;
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

/// Incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    endpoint: String,
}

impl TelegramClient {
    /// Create a client for the configured bot.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(AppError::config("Telegram bot token is empty"));
        }
        let client = create_async_client(USER_AGENT, REQUEST_TIMEOUT)?;
        let endpoint = format!(
            "{}/bot{}",
            config.api_base_url.trim_end_matches('/'),
            config.bot_token.trim()
        );
        Ok(Self { client, endpoint })
    }

    /// Call a Bot API method and unwrap the `result` field.
    async fn call<B, T>(&self, method: &str, body: &B, timeout: Option<Duration>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, method);
        let mut request = self.client.post(url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // Request URLs embed the bot token; keep it out of error messages.
        let response = request.send().await.map_err(|e| e.without_url())?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| e.without_url())?;

        let envelope: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(AppError::Json(e)),
            Err(_) => {
                let body = String::from_utf8_lossy(&bytes);
                return Err(AppError::api(
                    format!("telegram {method}"),
                    status.as_u16(),
                    crate::utils::truncate_chars(body.trim(), 300),
                ));
            }
        };

        if !status.is_success() || !envelope.ok {
            return Err(AppError::api(
                format!("telegram {method}"),
                status.as_u16(),
                envelope
                    .description
                    .unwrap_or_else(|| "request not ok".to_string()),
            ));
        }

        envelope.result.ok_or_else(|| {
            AppError::api(format!("telegram {method}"), status.as_u16(), "missing result")
        })
    }

    /// Verify the token and return the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let user: User = self.call("getMe", &serde_json::json!({}), None).await?;
        Ok(user.username.unwrap_or(user.first_name))
    }

    /// Long-poll for new messages starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let body = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        let http_timeout = Duration::from_secs(timeout_secs) + Duration::from_secs(10);
        self.call("getUpdates", &body, Some(http_timeout)).await
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: PARSE_MODE,
            disable_web_page_preview: false,
        };
        self.call::<_, serde_json::Value>("sendMessage", &body, None)
            .await
            .map(|_| ())
            .map_err(|e| AppError::delivery(chat_id, e))
    }

    async fn send_photo(&self, chat_id: &str, photo_url: &str, caption: &str) -> Result<()> {
        let body = SendPhoto {
            chat_id,
            photo: photo_url,
            caption,
            parse_mode: PARSE_MODE,
        };
        self.call::<_, serde_json::Value>("sendPhoto", &body, None)
            .await
            .map(|_| ())
            .map_err(|e| AppError::delivery(chat_id, e))
    }
}
