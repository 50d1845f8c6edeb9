//! Notification rendering
//!
//! Join and leave notifications come in two presentations selected once at
//! startup: a rich embed or a single line of plain text. Both carry the same
//! information; times are Discord timestamp tokens (`<t:SECONDS:STYLE>`) so
//! every reader sees them in their own timezone.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::tracker::Participant;

/// Accent color for join embeds (green)
pub const JOIN_COLOR: u32 = 0x57F287;

/// Accent color for leave embeds (red)
pub const LEAVE_COLOR: u32 = 0xED4245;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Rich,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Join,
    Leave,
}

/// A rendered notification ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Embed(Embed),
    Plain(String),
}

/// Structured message document (Discord embed object)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub author: EmbedAuthor,
    pub description: String,
    pub color: u32,
    /// RFC 3339 timestamp shown in the embed footer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Notification {
    /// Join notification for `participant` entering `channel_id` at `joined_at`
    pub fn join(
        mode: RenderMode,
        participant: &Participant,
        channel_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Self {
        let secs = joined_at.timestamp();
        let body = match mode {
            RenderMode::Rich => MessageBody::Embed(Embed {
                author: EmbedAuthor {
                    name: format!("{} joined a voice channel", participant.display_name),
                    icon_url: participant.avatar_url.clone(),
                },
                description: format!(
                    "\u{1F4E5} **Channel:** <#{}>\n\n\u{23F0} Joined: <t:{}:t> (<t:{}:R>)",
                    channel_id, secs, secs
                ),
                color: JOIN_COLOR,
                timestamp: Some(joined_at.to_rfc3339()),
            }),
            RenderMode::Plain => MessageBody::Plain(format!(
                "\u{2705} {} joined <#{}> at <t:{}:t> (<t:{}:R>)",
                participant.display_name, channel_id, secs, secs
            )),
        };

        Self {
            kind: NotificationKind::Join,
            body,
        }
    }

    /// Leave notification carrying an already formatted duration
    pub fn leave(
        mode: RenderMode,
        participant: &Participant,
        left_at: DateTime<Utc>,
        duration: &str,
    ) -> Self {
        let secs = left_at.timestamp();
        let body = match mode {
            RenderMode::Rich => MessageBody::Embed(Embed {
                author: EmbedAuthor {
                    name: format!("{} left voice", participant.display_name),
                    icon_url: participant.avatar_url.clone(),
                },
                description: format!(
                    "\u{1F4E4} **Duration:** {}\n\n\u{23F0} Left: <t:{}:t> (<t:{}:R>)",
                    duration, secs, secs
                ),
                color: LEAVE_COLOR,
                timestamp: Some(left_at.to_rfc3339()),
            }),
            RenderMode::Plain => MessageBody::Plain(format!(
                "\u{274C} {} left voice at <t:{}:t> | \u{1F4CA} Duration: {}",
                participant.display_name, secs, duration
            )),
        };

        Self {
            kind: NotificationKind::Leave,
            body,
        }
    }

    /// Text content for plain notifications
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Plain(text) => Some(text),
            MessageBody::Embed(_) => None,
        }
    }

    pub fn embed(&self) -> Option<&Embed> {
        match &self.body {
            MessageBody::Embed(embed) => Some(embed),
            MessageBody::Plain(_) => None,
        }
    }
}
