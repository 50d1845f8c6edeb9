use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::render::{Embed, Notification};
use crate::tracker::{AccountKind, Participant};

const CDN_BASE: &str = "https://cdn.discordapp.com";

pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// `GUILDS | GUILD_VOICE_STATES`
pub const INTENTS: u64 = (1 << 0) | (1 << 7);

/// Gateway frame envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Serialize)]
pub struct Identify {
    pub token: String,
    pub intents: u64,
    pub properties: IdentifyProperties,
}

#[derive(Debug, Serialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

#[derive(Debug, Deserialize)]
pub struct Ready {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct GuildCreate {
    pub id: String,
    /// Voice states of members already connected (no `member`/`guild_id`)
    #[serde(default)]
    pub voice_states: Vec<VoiceState>,
    /// Members sent with the guild; may be a subset on large guilds
    #[serde(default)]
    pub members: Vec<Member>,
}

/// Voice state object as sent in `VOICE_STATE_UPDATE` and `GUILD_CREATE`
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceState {
    #[serde(default)]
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub member: Option<Member>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    /// Guild-specific avatar hash
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// `name` for migrated usernames, `name#1234` otherwise
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }

    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!("{}/avatars/{}/{}.{}", CDN_BASE, self.id, hash, image_ext(hash)),
            None => format!("{}/embed/avatars/{}.png", CDN_BASE, self.default_avatar_index()),
        }
    }

    fn default_avatar_index(&self) -> u64 {
        match self.discriminator.as_deref().map(str::parse::<u64>) {
            Some(Ok(d)) if d != 0 => d % 5,
            _ => self.id.parse::<u64>().map(|id| (id >> 22) % 6).unwrap_or(0),
        }
    }
}

impl Member {
    /// Build the participant view of a guild member
    pub fn to_participant(&self, guild_id: Option<&str>) -> Option<Participant> {
        let user = self.user.as_ref()?;

        let display_name = self
            .nick
            .clone()
            .or_else(|| user.global_name.clone())
            .unwrap_or_else(|| user.username.clone());

        let avatar_url = match (&self.avatar, guild_id) {
            (Some(hash), Some(guild_id)) => format!(
                "{}/guilds/{}/users/{}/avatars/{}.{}",
                CDN_BASE,
                guild_id,
                user.id,
                hash,
                image_ext(hash)
            ),
            _ => user.avatar_url(),
        };

        Some(Participant {
            id: user.id.clone(),
            display_name,
            avatar_url: Some(avatar_url),
            kind: if user.bot {
                AccountKind::Automated
            } else {
                AccountKind::Human
            },
        })
    }
}

fn image_ext(hash: &str) -> &'static str {
    if hash.starts_with("a_") {
        "gif"
    } else {
        "png"
    }
}

/// Channel object, only the fields needed to decide deliverability
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

impl Channel {
    /// Text, DM, voice, group DM, announcement, threads and stage channels
    /// accept messages; categories, directories, forums and media do not.
    pub fn is_text_based(&self) -> bool {
        matches!(self.kind, 0 | 1 | 2 | 3 | 5 | 10 | 11 | 12 | 13)
    }
}

/// Body of `POST /channels/{id}/messages`
#[derive(Debug, Serialize)]
pub struct CreateMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<&'a Embed>,
    pub allowed_mentions: AllowedMentions,
}

#[derive(Debug, Default, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

impl<'a> CreateMessage<'a> {
    pub fn from_notification(notification: &'a Notification) -> Self {
        Self {
            content: notification.content(),
            embeds: notification.embed().into_iter().collect(),
            allowed_mentions: AllowedMentions::default(),
        }
    }
}
