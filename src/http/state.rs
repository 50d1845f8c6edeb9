use crate::tracker::{Clock, SessionStore, SystemClock};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Open voice sessions, shared with the tracker
    pub store: Arc<dyn SessionStore>,
    /// Used to compute elapsed time for open sessions
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }
}
