use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A participant currently believed to be in a voice channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenSession {
    pub participant_id: String,
    pub joined_at: DateTime<Utc>,
}

/// Session start bookkeeping
///
/// Holds at most one start time per participant. Implementations can be
/// swapped for a durable backend without touching the tracker.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record (or overwrite) the start of a participant's session
    async fn record_join(&self, participant_id: &str, at: DateTime<Utc>);

    /// Remove and return the start time; removing a missing entry is a no-op
    async fn take(&self, participant_id: &str) -> Option<DateTime<Utc>>;

    /// Look up a start time without removing it
    async fn get(&self, participant_id: &str) -> Option<DateTime<Utc>>;

    /// All open sessions, oldest first
    async fn open_sessions(&self) -> Vec<OpenSession>;
}

/// Process-local store; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn record_join(&self, participant_id: &str, at: DateTime<Utc>) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(participant_id.to_string(), at);
    }

    async fn take(&self, participant_id: &str) -> Option<DateTime<Utc>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(participant_id)
    }

    async fn get(&self, participant_id: &str) -> Option<DateTime<Utc>> {
        let sessions = self.sessions.read().await;
        sessions.get(participant_id).copied()
    }

    async fn open_sessions(&self) -> Vec<OpenSession> {
        let sessions = self.sessions.read().await;
        let mut open: Vec<OpenSession> = sessions
            .iter()
            .map(|(id, joined_at)| OpenSession {
                participant_id: id.clone(),
                joined_at: *joined_at,
            })
            .collect();
        open.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.participant_id.cmp(&b.participant_id))
        });
        open
    }
}
