//! Read-only status API
//!
//! - GET /health - Health check
//! - GET /sessions - Participants currently in voice and their elapsed time

mod handlers;
mod routes;
mod state;

pub use handlers::OpenSessionResponse;
pub use routes::create_router;
pub use state::AppState;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

/// Bind `addr` and serve the status API until the task is dropped
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind status API on {}", addr))?;

    info!("Status API listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .await
        .context("Status API server failed")
}
