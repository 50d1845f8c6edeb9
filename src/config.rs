use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;

use crate::render::RenderMode;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Process configuration, parsed once at startup.
#[derive(Clone)]
pub struct Config {
    /// Bot credential used for both the gateway and REST calls
    pub bot_token: String,
    /// Text channel that receives join/leave notifications
    pub log_channel_id: String,
    /// Rich embeds (`true`) or plain text (`false`)
    pub log_embeds: bool,
    pub api_base: String,
    pub gateway_url: String,
    /// Optional `host:port` for the status API
    pub status_bind: Option<String>,
    /// Emit JSON log lines instead of the pretty format
    pub log_json: bool,
}

/// Raw environment view; every field is optional so validation can report
/// exactly what is missing.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    bot_token: Option<String>,
    log_channel_id: Option<String>,
    log_embeds: Option<String>,
    discord_api_base: Option<String>,
    discord_gateway_url: Option<String>,
    status_bind: Option<String>,
    log_json: Option<String>,
}

impl Config {
    /// Load from the process environment.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("Failed to read environment")?;

        Self::from_settings(settings)
    }

    /// Validate an already-built settings tree.
    pub fn from_settings(settings: config::Config) -> Result<Self> {
        let raw: RawSettings = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;

        let (bot_token, log_channel_id) = match (non_blank(raw.bot_token), non_blank(raw.log_channel_id)) {
            (Some(token), Some(channel)) => (token, channel),
            _ => anyhow::bail!("BOT_TOKEN and LOG_CHANNEL_ID must be set"),
        };

        Ok(Self {
            bot_token,
            log_channel_id,
            log_embeds: raw.log_embeds.as_deref().map(parse_flag).unwrap_or(true),
            api_base: non_blank(raw.discord_api_base)
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            gateway_url: non_blank(raw.discord_gateway_url)
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            status_bind: non_blank(raw.status_bind),
            log_json: raw.log_json.as_deref().map(parse_flag).unwrap_or(false),
        })
    }

    pub fn render_mode(&self) -> RenderMode {
        if self.log_embeds {
            RenderMode::Rich
        } else {
            RenderMode::Plain
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("log_channel_id", &self.log_channel_id)
            .field("log_embeds", &self.log_embeds)
            .field("api_base", &self.api_base)
            .field("gateway_url", &self.gateway_url)
            .field("status_bind", &self.status_bind)
            .field("log_json", &self.log_json)
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
