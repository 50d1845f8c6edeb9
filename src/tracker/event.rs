/// Whether an account belongs to a person or a bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Human,
    Automated,
}

/// Identity and display metadata for the member behind a presence change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable platform user id
    pub id: String,
    /// Name shown in notifications (guild nickname when set)
    pub display_name: String,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    pub kind: AccountKind,
}

/// A voice presence change as delivered by the gateway
#[derive(Debug, Clone)]
pub struct VoicePresenceEvent {
    /// Id of the user the change belongs to
    pub user_id: String,
    pub guild_id: Option<String>,
    /// Channel before the change (`None` = not in voice)
    pub previous_channel_id: Option<String>,
    /// Channel after the change (`None` = not in voice)
    pub next_channel_id: Option<String>,
    /// Member as known before the change, if cached
    pub member_before: Option<Participant>,
    /// Member as carried by the change itself
    pub member_after: Option<Participant>,
}

impl VoicePresenceEvent {
    /// Resolve the member, preferring the after-state.
    pub fn participant(&self) -> Option<&Participant> {
        self.member_after.as_ref().or(self.member_before.as_ref())
    }
}
