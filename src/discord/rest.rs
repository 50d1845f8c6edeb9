use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::models::{Channel, CreateMessage};
use crate::render::Notification;
use crate::tracker::{Destination, Messenger};

const USER_AGENT: &str = concat!(
    "DiscordBot (voice-call-tracker, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Minimal Discord REST client for the log channel
pub struct DiscordRest {
    client: reqwest::Client,
    api_base: String,
    token: String,
    /// Channels already resolved as deliverable
    resolved: RwLock<HashMap<String, Destination>>,
}

impl DiscordRest {
    pub fn new(api_base: &str, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            resolved: RwLock::new(HashMap::new()),
        })
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Fetch a channel; `Ok(None)` when it does not exist or is not visible
    pub async fn fetch_channel(&self, channel_id: &str) -> Result<Option<Channel>> {
        let url = format!("{}/channels/{}", self.api_base, channel_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .context("Failed to fetch channel")?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let channel = response
                    .json::<Channel>()
                    .await
                    .context("Failed to parse channel")?;
                Ok(Some(channel))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Channel lookup returned {}: {}", status, body)
            }
        }
    }
}

#[async_trait]
impl Messenger for DiscordRest {
    async fn resolve(&self, channel_id: &str) -> Result<Destination> {
        {
            let resolved = self.resolved.read().await;
            if let Some(destination) = resolved.get(channel_id) {
                return Ok(*destination);
            }
        }

        let destination = match self.fetch_channel(channel_id).await? {
            Some(channel) if channel.is_text_based() => Destination::Text,
            Some(channel) => {
                debug!("Channel {} has non-text type {}", channel.id, channel.kind);
                Destination::NotText
            }
            None => Destination::Unavailable,
        };

        // Only cache successes so a channel fixed later is picked up again
        if destination == Destination::Text {
            info!("Resolved log channel {}", channel_id);
            let mut resolved = self.resolved.write().await;
            resolved.insert(channel_id.to_string(), destination);
        }

        Ok(destination)
    }

    async fn send(&self, channel_id: &str, notification: &Notification) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let payload = CreateMessage::from_notification(notification);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&payload)
            .send()
            .await
            .context("Failed to send message")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Message send returned {}: {}", status, body);
        }

        debug!("Sent {:?} notification to {}", notification.kind, channel_id);
        Ok(())
    }
}
