//! Discord transport
//!
//! - `gateway`: websocket session that yields voice presence events
//! - `rest`: channel lookup and message delivery for the log channel
//! - `cache`: last known voice channel per member
//! - `models`: wire types for both

pub mod cache;
pub mod gateway;
pub mod models;
pub mod rest;
pub mod source;

pub use cache::VoiceStateCache;
pub use gateway::{DiscordGateway, EventTranslator};
pub use rest::DiscordRest;
pub use source::{GatewayEvent, PresenceSource};
