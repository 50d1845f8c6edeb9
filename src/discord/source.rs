use anyhow::Result;
use tokio::sync::mpsc;

use crate::tracker::VoicePresenceEvent;

/// Events forwarded from the platform connection
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Session established; carries the bot's own user tag
    Ready { user_tag: String },
    /// A member's voice channel membership changed
    VoiceStateChanged(VoicePresenceEvent),
}

/// Source of presence events
///
/// Implementations:
/// - `DiscordGateway`: live gateway connection (reconnects on its own)
#[async_trait::async_trait]
pub trait PresenceSource: Send + Sync {
    /// Start receiving events
    ///
    /// Returns a channel receiver that yields events in delivery order
    async fn start(&mut self) -> Result<mpsc::Receiver<GatewayEvent>>;

    /// Stop the source; returns the error that ended it, if any
    async fn stop(&mut self) -> Result<()>;

    /// Check if the source is currently connected or reconnecting
    fn is_running(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}
