// src/services/sinks.rs

//! Notification sinks: the Discord webhook (primary) and a social post API
//! (secondary).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{NotifyConfig, SocialConfig, truncate_graphemes};

/// A delivery endpoint for notification text.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Deliver one message.
    async fn post(&self, text: &str) -> Result<()>;
}

/// Fail on any non-success status, keeping the response body for the log.
async fn check_status(sink: &str, response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::sink(sink, format!("HTTP {status}: {}", body.trim())))
}

/// Posts `{"content": text}` to a Discord webhook.
pub struct DiscordWebhook {
    client: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhook {
    fn name(&self) -> &str {
        "discord"
    }

    async fn post(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "content": text }))
            .send()
            .await?;
        check_status(self.name(), response).await
    }
}

/// Posts `{"text": text}` with a bearer token to a social post endpoint.
pub struct SocialPost {
    client: Client,
    endpoint: String,
    bearer_token: String,
    max_chars: usize,
}

impl SocialPost {
    pub fn new(client: Client, config: &SocialConfig, bearer_token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            bearer_token: bearer_token.into(),
            max_chars: config.max_chars,
        }
    }
}

#[async_trait]
impl NotificationSink for SocialPost {
    fn name(&self) -> &str {
        "social"
    }

    async fn post(&self, text: &str) -> Result<()> {
        let text = truncate_graphemes(text, self.max_chars);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .json(&json!({ "text": text }))
            .send()
            .await?;
        check_status(self.name(), response).await
    }
}

/// Primary sink from config, if a webhook URL is set.
pub fn primary_from_config(client: &Client, config: &NotifyConfig) -> Option<DiscordWebhook> {
    config
        .discord_webhook_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| DiscordWebhook::new(client.clone(), url))
}

/// Secondary sink from config, if a bearer token is set.
pub fn secondary_from_config(client: &Client, config: &NotifyConfig) -> Option<SocialPost> {
    config
        .social
        .bearer_token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        .map(|token| SocialPost::new(client.clone(), &config.social, token))
}
