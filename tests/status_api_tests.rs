// Integration tests for the status API

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use voice_call_tracker::tracker::{Clock, InMemorySessionStore, SessionStore};
use voice_call_tracker::{create_router, AppState};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

async fn start_server(state: AppState) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    Ok(format!("http://{}", addr))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let state = AppState::new(Arc::new(InMemorySessionStore::new()));
    let base = start_server(state).await?;

    let response = reqwest::get(format!("{}/health", base)).await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_sessions_lists_open_sessions() -> Result<()> {
    let store = Arc::new(InMemorySessionStore::new());
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    store.record_join("alice", t0).await;
    store
        .record_join("bob", t0 + chrono::Duration::seconds(60))
        .await;
    store.record_join("gone", t0).await;
    store.take("gone").await;

    let state = AppState {
        store: store.clone(),
        clock: Arc::new(FixedClock(t0 + chrono::Duration::seconds(185))),
    };
    let base = start_server(state).await?;

    let body: Value = reqwest::get(format!("{}/sessions", base)).await?.json().await?;
    let sessions = body.as_array().expect("sessions should be a list");

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["participant_id"], "alice");
    assert_eq!(sessions[0]["elapsed"], "3m 5s");
    assert_eq!(sessions[1]["participant_id"], "bob");
    assert_eq!(sessions[1]["elapsed"], "2m 5s");
    Ok(())
}

#[tokio::test]
async fn test_sessions_empty() -> Result<()> {
    let state = AppState::new(Arc::new(InMemorySessionStore::new()));
    let base = start_server(state).await?;

    let body: Value = reqwest::get(format!("{}/sessions", base)).await?.json().await?;
    assert_eq!(body, serde_json::json!([]));
    Ok(())
}
