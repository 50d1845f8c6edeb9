use super::state::AppState;
use crate::tracker::format_duration;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OpenSessionResponse {
    pub participant_id: String,
    pub joined_at: DateTime<Utc>,
    /// Time in voice so far, same format as leave notifications
    pub elapsed: String,
}

/// GET /sessions
/// List participants currently believed to be in voice
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let now = state.clock.now();

    let sessions: Vec<OpenSessionResponse> = state
        .store
        .open_sessions()
        .await
        .into_iter()
        .map(|session| OpenSessionResponse {
            elapsed: format_duration(now.signed_duration_since(session.joined_at).num_milliseconds()),
            participant_id: session.participant_id,
            joined_at: session.joined_at,
        })
        .collect();

    (StatusCode::OK, Json(sessions))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
