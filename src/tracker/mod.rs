//! Voice session tracking
//!
//! This module turns voice presence changes into join/leave notifications:
//! - Transition classification (join, leave, move, none)
//! - Session start bookkeeping behind the `SessionStore` trait
//! - Duration formatting for leave notifications
//! - The `SessionTracker` event handler that ties them together

mod classify;
mod clock;
mod duration;
mod event;
mod store;
mod tracker;

pub use classify::{classify, Transition};
pub use clock::{Clock, SystemClock};
pub use duration::format_duration;
pub use event::{AccountKind, Participant, VoicePresenceEvent};
pub use store::{InMemorySessionStore, OpenSession, SessionStore};
pub use tracker::{Destination, EventOutcome, Messenger, SessionTracker, SkipReason};
