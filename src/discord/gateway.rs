use anyhow::{Context, Result};
use futures::{Sink, SinkExt, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::cache::VoiceStateCache;
use super::models::{
    opcode, GatewayPayload, GuildCreate, Hello, Identify, IdentifyProperties, Ready, VoiceState,
    INTENTS,
};
use super::source::{GatewayEvent, PresenceSource};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const EVENT_BUFFER: usize = 100;

/// Close codes after which reconnecting cannot succeed
const FATAL_CLOSE_CODES: [u16; 6] = [4004, 4010, 4011, 4012, 4013, 4014];

/// Translates gateway dispatches into presence events
///
/// Owns the voice state cache that supplies the "before" side of each update.
#[derive(Debug, Default)]
pub struct EventTranslator {
    cache: VoiceStateCache,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &VoiceStateCache {
        &self.cache
    }

    /// Handle one dispatch (`op` 0) by event name and payload
    pub fn translate(&mut self, event_name: &str, data: Value) -> Result<Vec<GatewayEvent>> {
        match event_name {
            "READY" => {
                let ready: Ready = serde_json::from_value(data).context("Invalid READY payload")?;
                Ok(vec![GatewayEvent::Ready {
                    user_tag: ready.user.tag(),
                }])
            }
            "GUILD_CREATE" => {
                let guild: GuildCreate =
                    serde_json::from_value(data).context("Invalid GUILD_CREATE payload")?;
                let missed = self
                    .cache
                    .reseed(&guild.id, &guild.voice_states, &guild.members);
                debug!(
                    "Guild {} available with {} voice states ({} missed changes)",
                    guild.id,
                    guild.voice_states.len(),
                    missed.len()
                );
                Ok(missed.into_iter().map(GatewayEvent::VoiceStateChanged).collect())
            }
            "GUILD_DELETE" => {
                // An outage keeps the cache so the next GUILD_CREATE can be diffed
                let unavailable = data.get("unavailable").and_then(Value::as_bool) == Some(true);
                if let Some(guild_id) = data.get("id").and_then(Value::as_str) {
                    if !unavailable {
                        self.cache.forget_guild(guild_id);
                    }
                }
                Ok(Vec::new())
            }
            "VOICE_STATE_UPDATE" => {
                let state: VoiceState =
                    serde_json::from_value(data).context("Invalid VOICE_STATE_UPDATE payload")?;
                Ok(vec![GatewayEvent::VoiceStateChanged(self.cache.apply(state))])
            }
            _ => Ok(Vec::new()),
        }
    }
}

enum SessionEnd {
    /// Server asked for a reconnect (op 7)
    ReconnectNow,
    Reconnect,
    Shutdown,
    Fatal(u16),
}

/// Live Discord gateway connection
pub struct DiscordGateway {
    url: String,
    token: String,
    reconnect_delay: Duration,
    event_buffer: usize,
    running: Arc<AtomicBool>,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<Result<()>>>,
}

impl DiscordGateway {
    pub fn new(url: &str, token: &str) -> Self {
        Self {
            url: url.to_string(),
            token: token.to_string(),
            reconnect_delay: RECONNECT_DELAY,
            event_buffer: EVENT_BUFFER,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx: None,
            task: None,
        }
    }

    /// Wait between a failed session and the next connect attempt
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Capacity of the event channel returned by `start`
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }
}

#[async_trait::async_trait]
impl PresenceSource for DiscordGateway {
    async fn start(&mut self) -> Result<mpsc::Receiver<GatewayEvent>> {
        if self.task.is_some() {
            anyhow::bail!("Gateway already started");
        }

        let (event_tx, event_rx) = mpsc::channel(self.event_buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let url = self.url.clone();
        let token = self.token.clone();
        let reconnect_delay = self.reconnect_delay;
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let task = tokio::spawn(async move {
            let result = run(url, token, reconnect_delay, event_tx, shutdown_rx).await;
            running.store(false, Ordering::SeqCst);
            if let Err(e) = &result {
                error!("Gateway stopped: {:#}", e);
            }
            result
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(task);

        Ok(event_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }

        match self.task.take() {
            Some(task) => task.await.context("Gateway task panicked")?,
            None => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "discord-gateway"
    }
}

/// Connect, and reconnect with a fresh identify, until shut down
async fn run(
    url: String,
    token: String,
    reconnect_delay: Duration,
    events: mpsc::Sender<GatewayEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut translator = EventTranslator::new();
    // Events not yet accepted by the consumer; survives reconnects
    let mut backlog: VecDeque<GatewayEvent> = VecDeque::new();

    loop {
        let delay = match run_session(
            &url,
            &token,
            &events,
            &mut backlog,
            &mut translator,
            &mut shutdown,
        )
        .await
        {
            Ok(SessionEnd::Shutdown) => {
                info!("Gateway connection closed");
                return Ok(());
            }
            Ok(SessionEnd::Fatal(code)) => {
                anyhow::bail!("Gateway closed the connection with fatal code {}", code);
            }
            Ok(SessionEnd::ReconnectNow) => {
                info!("Gateway requested a reconnect");
                Duration::ZERO
            }
            Ok(SessionEnd::Reconnect) => {
                info!("Gateway session ended, reconnecting in {:?}", reconnect_delay);
                reconnect_delay
            }
            Err(e) => {
                warn!("Gateway session failed: {:#}, reconnecting in {:?}", e, reconnect_delay);
                reconnect_delay
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => return Ok(()),
        }
    }
}

async fn run_session(
    url: &str,
    token: &str,
    events: &mpsc::Sender<GatewayEvent>,
    backlog: &mut VecDeque<GatewayEvent>,
    translator: &mut EventTranslator,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<SessionEnd> {
    info!("Connecting to gateway at {}", url);

    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .context("Failed to connect to gateway")?;
    let (mut sink, mut stream) = ws.split();

    let hello = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let payload: GatewayPayload =
                    serde_json::from_str(&text).context("Invalid gateway frame")?;
                if payload.op == opcode::HELLO {
                    break serde_json::from_value::<Hello>(payload.d).context("Invalid HELLO")?;
                }
            }
            Some(Ok(Message::Close(frame))) => return Ok(close_end(frame)),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e).context("Gateway read failed"),
            None => return Ok(SessionEnd::Reconnect),
        }
    };

    let identify = GatewayPayload {
        op: opcode::IDENTIFY,
        d: serde_json::to_value(Identify {
            token: token.to_string(),
            intents: INTENTS,
            properties: IdentifyProperties {
                os: std::env::consts::OS.to_string(),
                browser: env!("CARGO_PKG_NAME").to_string(),
                device: env!("CARGO_PKG_NAME").to_string(),
            },
        })?,
        s: None,
        t: None,
    };
    send_payload(&mut sink, &identify).await?;

    let mut heartbeat = tokio::time::interval(Duration::from_millis(hello.heartbeat_interval));
    let mut sequence: Option<u64> = None;
    let mut awaiting_ack = false;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                return Ok(SessionEnd::Shutdown);
            }
            _ = heartbeat.tick() => {
                if awaiting_ack {
                    warn!("No heartbeat ACK received since last heartbeat");
                    return Ok(SessionEnd::Reconnect);
                }
                send_payload(&mut sink, &heartbeat_payload(sequence)).await?;
                awaiting_ack = true;
            }
            // Hand events over without blocking heartbeats on a slow consumer
            permit = events.reserve(), if !backlog.is_empty() => match permit {
                Ok(permit) => {
                    if let Some(event) = backlog.pop_front() {
                        permit.send(event);
                    }
                }
                Err(_) => return Ok(SessionEnd::Shutdown),
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let payload: GatewayPayload = match serde_json::from_str(&text) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("Skipping malformed gateway frame: {}", e);
                            continue;
                        }
                    };
                    if payload.s.is_some() {
                        sequence = payload.s;
                    }

                    match payload.op {
                        opcode::DISPATCH => {
                            let name = payload.t.unwrap_or_default();
                            match translator.translate(&name, payload.d) {
                                Ok(translated) => {
                                    backlog.extend(translated);
                                    if backlog.len() > EVENT_BUFFER {
                                        debug!("{} gateway events waiting for the tracker", backlog.len());
                                    }
                                }
                                Err(e) => warn!("Skipping {} dispatch: {:#}", name, e),
                            }
                        }
                        opcode::HEARTBEAT => {
                            send_payload(&mut sink, &heartbeat_payload(sequence)).await?;
                        }
                        opcode::HEARTBEAT_ACK => awaiting_ack = false,
                        opcode::RECONNECT => return Ok(SessionEnd::ReconnectNow),
                        opcode::INVALID_SESSION => return Ok(SessionEnd::Reconnect),
                        _ => {}
                    }
                }
                Some(Ok(Message::Close(frame))) => return Ok(close_end(frame)),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Gateway read failed"),
                None => return Ok(SessionEnd::Reconnect),
            }
        }
    }
}

fn heartbeat_payload(sequence: Option<u64>) -> GatewayPayload {
    GatewayPayload {
        op: opcode::HEARTBEAT,
        d: sequence.map(Value::from).unwrap_or(Value::Null),
        s: None,
        t: None,
    }
}

async fn send_payload<S>(sink: &mut S, payload: &GatewayPayload) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let text = serde_json::to_string(payload)?;
    sink.send(Message::Text(text))
        .await
        .context("Gateway write failed")
}

fn close_end(frame: Option<CloseFrame<'static>>) -> SessionEnd {
    match frame {
        Some(frame) => {
            let code = u16::from(frame.code);
            if FATAL_CLOSE_CODES.contains(&code) {
                SessionEnd::Fatal(code)
            } else {
                info!("Gateway closed with code {}: {}", code, frame.reason);
                SessionEnd::Reconnect
            }
        }
        None => SessionEnd::Reconnect,
    }
}
