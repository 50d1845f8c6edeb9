use super::classify::{classify, Transition};
use super::clock::Clock;
use super::duration::format_duration;
use super::event::{AccountKind, VoicePresenceEvent};
use super::store::SessionStore;
use crate::render::{Notification, RenderMode};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of resolving the notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Channel exists and accepts messages
    Text,
    /// Channel exists but cannot hold text (category, forum, ...)
    NotText,
    /// Channel is missing or not visible to the bot
    Unavailable,
}

/// Outbound side of the tracker
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Check whether `channel_id` can receive notifications
    async fn resolve(&self, channel_id: &str) -> Result<Destination>;

    /// Deliver a rendered notification
    async fn send(&self, channel_id: &str, notification: &Notification) -> Result<()>;
}

/// Why an event produced no notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither the before- nor the after-state carried a member
    UnknownMember,
    /// The member is a bot account
    AutomatedAccount,
    /// The log channel could not be resolved or cannot hold text
    DestinationUnavailable,
    /// Channel-to-channel move or a change that kept the channel
    Unhandled(Transition),
}

/// What the tracker did with a presence event
#[derive(Debug)]
pub enum EventOutcome {
    Skipped(SkipReason),
    Delivered(Notification),
    /// The registry was updated but the send failed
    DeliveryFailed {
        notification: Notification,
        error: anyhow::Error,
    },
}

impl EventOutcome {
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            EventOutcome::Skipped(_) => None,
            EventOutcome::Delivered(notification) => Some(notification),
            EventOutcome::DeliveryFailed { notification, .. } => Some(notification),
        }
    }
}

/// Turns voice presence changes into join/leave notifications
///
/// Events must be handed in one at a time; the store is mutated before the
/// notification is sent, so a failed send never rolls back bookkeeping.
pub struct SessionTracker {
    store: Arc<dyn SessionStore>,
    messenger: Arc<dyn Messenger>,
    clock: Arc<dyn Clock>,
    log_channel_id: String,
    mode: RenderMode,
}

impl SessionTracker {
    pub fn new(
        store: Arc<dyn SessionStore>,
        messenger: Arc<dyn Messenger>,
        clock: Arc<dyn Clock>,
        log_channel_id: String,
        mode: RenderMode,
    ) -> Self {
        Self {
            store,
            messenger,
            clock,
            log_channel_id,
            mode,
        }
    }

    /// Handle a single presence event
    pub async fn handle(&self, event: &VoicePresenceEvent) -> EventOutcome {
        let participant = match event.participant() {
            Some(p) => p,
            None => {
                debug!("Ignoring voice update for {} without member data", event.user_id);
                return EventOutcome::Skipped(SkipReason::UnknownMember);
            }
        };

        if participant.kind == AccountKind::Automated {
            debug!("Ignoring voice update from bot {}", participant.id);
            return EventOutcome::Skipped(SkipReason::AutomatedAccount);
        }

        match self.messenger.resolve(&self.log_channel_id).await {
            Ok(Destination::Text) => {}
            Ok(destination) => {
                warn!(
                    "Log channel {} cannot receive messages ({:?}), dropping event",
                    self.log_channel_id, destination
                );
                return EventOutcome::Skipped(SkipReason::DestinationUnavailable);
            }
            Err(e) => {
                warn!(
                    "Failed to resolve log channel {}: {:#}, dropping event",
                    self.log_channel_id, e
                );
                return EventOutcome::Skipped(SkipReason::DestinationUnavailable);
            }
        }

        let transition = classify(
            event.previous_channel_id.as_deref(),
            event.next_channel_id.as_deref(),
        );

        let notification = match (transition, event.next_channel_id.as_deref()) {
            (Transition::Join, Some(channel_id)) => {
                let joined_at = self.clock.now();
                self.store.record_join(&participant.id, joined_at).await;

                info!("{} joined voice channel {}", participant.display_name, channel_id);
                Notification::join(self.mode, participant, channel_id, joined_at)
            }
            (Transition::Leave, _) => {
                let left_at = self.clock.now();
                let joined_at = self.store.take(&participant.id).await;

                let duration_ms = joined_at
                    .map(|start| left_at.signed_duration_since(start).num_milliseconds())
                    .unwrap_or(0);
                let duration = format_duration(duration_ms);

                info!("{} left voice after {}", participant.display_name, duration);
                Notification::leave(self.mode, participant, left_at, &duration)
            }
            (transition, _) => {
                // Moves keep the original start time; the next leave spans them.
                debug!(
                    "Ignoring {:?} transition for {} ({:?} -> {:?})",
                    transition,
                    participant.id,
                    event.previous_channel_id,
                    event.next_channel_id
                );
                return EventOutcome::Skipped(SkipReason::Unhandled(transition));
            }
        };

        match self.messenger.send(&self.log_channel_id, &notification).await {
            Ok(()) => EventOutcome::Delivered(notification),
            Err(error) => {
                error!("Failed to send {:?} notification: {:#}", notification.kind, error);
                EventOutcome::DeliveryFailed {
                    notification,
                    error,
                }
            }
        }
    }
}
