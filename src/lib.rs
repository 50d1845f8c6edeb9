pub mod config;
pub mod discord;
pub mod http;
pub mod render;
pub mod tracker;

pub use config::Config;
pub use discord::{DiscordGateway, DiscordRest, GatewayEvent, PresenceSource};
pub use http::{create_router, AppState};
pub use render::{Notification, NotificationKind, RenderMode};
pub use tracker::{
    classify, format_duration, EventOutcome, InMemorySessionStore, Messenger, SessionStore,
    SessionTracker, Transition, VoicePresenceEvent,
};
