use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::dispatcher::OutgoingMessage;
use super::messages::TextFormat;
use crate::config::BotSettings;
use crate::http::RateLimitedClient;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    allow_sending_without_reply: bool,
}

impl<'a> SendMessageRequest<'a> {
    fn from_outgoing(message: &'a OutgoingMessage) -> Self {
        Self {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: match message.format {
                TextFormat::Plain => None,
                TextFormat::Markdown => Some("Markdown"),
            },
            message_thread_id: message.thread_id,
            reply_to_message_id: message.reply_to,
            allow_sending_without_reply: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SetWebhookRequest<'a> {
    url: &'a str,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Minimal Bot API client: outgoing messages and webhook registration
pub struct TelegramClient {
    http: Mutex<RateLimitedClient>,
    api_root: String,
}

impl TelegramClient {
    pub fn new(settings: &BotSettings) -> Result<Self> {
        let token = settings.require_token()?;
        let http = RateLimitedClient::new(
            settings.user_agent,
            settings.timeout_secs,
            settings.rate_limit_ms,
        )?;

        Ok(Self {
            http: Mutex::new(http),
            api_root: format!("{}/bot{}", settings.api_base_url.trim_end_matches('/'), token),
        })
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        debug!("Sending reply to chat {}", message.chat_id);
        self.call("sendMessage", &SendMessageRequest::from_outgoing(message))
            .await
            .with_context(|| format!("Failed to send message to chat {}", message.chat_id))
    }

    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        let request = SetWebhookRequest {
            url,
            allowed_updates: &["message"],
        };
        self.call("setWebhook", &request)
            .await
            .context("Failed to register webhook")?;

        info!("Webhook registered");
        Ok(())
    }

    async fn call<T: Serialize>(&self, method: &str, payload: &T) -> Result<()> {
        let url = format!("{}/{}", self.api_root, method);
        let response = self.http.lock().await.post_json(&url, payload).await?;

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .with_context(|| format!("Invalid {} response (HTTP {})", method, status))?;

        if !body.ok {
            anyhow::bail!(
                "{} rejected: {}",
                method,
                body.description.unwrap_or_else(|| status.to_string())
            );
        }

        Ok(())
    }
}
