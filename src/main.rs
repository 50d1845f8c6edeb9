use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_call_tracker::tracker::SystemClock;
use voice_call_tracker::{
    AppState, Config, DiscordGateway, DiscordRest, GatewayEvent, InMemorySessionStore,
    PresenceSource, SessionTracker,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the environment
    dotenv::dotenv().ok();

    let cfg = Config::load()?;
    init_tracing(cfg.log_json);

    info!("Voice Call Tracker v{}", env!("CARGO_PKG_VERSION"));
    info!("Log channel: {}", cfg.log_channel_id);
    info!("Render mode: {:?}", cfg.render_mode());

    let rest = Arc::new(DiscordRest::new(&cfg.api_base, &cfg.bot_token)?);
    let store = Arc::new(InMemorySessionStore::new());

    let tracker = SessionTracker::new(
        store.clone(),
        rest,
        Arc::new(SystemClock),
        cfg.log_channel_id.clone(),
        cfg.render_mode(),
    );

    if let Some(addr) = cfg.status_bind.clone() {
        let state = AppState::new(store);
        tokio::spawn(async move {
            if let Err(e) = voice_call_tracker::http::serve(&addr, state).await {
                tracing::error!("{:#}", e);
            }
        });
    }

    let mut gateway = DiscordGateway::new(&cfg.gateway_url, &cfg.bot_token);
    let mut events = gateway.start().await?;
    info!("Started presence source: {}", gateway.name());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(GatewayEvent::Ready { user_tag }) => info!("Logged in as {}", user_tag),
                Some(GatewayEvent::VoiceStateChanged(event)) => {
                    tracker.handle(&event).await;
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                info!("Shutting down");
                break;
            }
        }
    }

    gateway.stop().await
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("voice_call_tracker=info"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
