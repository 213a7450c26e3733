//! # STOMP-over-WebSocket Transport
//!
//! Owns the live broker connection for a chat session.
//!
//! One spawned task per [`TransportHandle`] handles:
//! - WebSocket connection establishment and the STOMP `CONNECT` handshake
//! - Replaying registered subscriptions every time the connection comes up
//! - Heart-beats in both directions, treating a silent broker as a drop
//! - Reconnecting after a fixed delay until [`TransportHandle::shutdown`]
//!
//! State transitions and incoming payloads are delivered as [`TransportEvent`]s
//! on an `async_channel`. Payloads are handed over raw; decoding them is the
//! caller's job.

use crate::config::ChatConfig;
use crate::core::error::{ChatError, Result};
use crate::core::service::MessageTransport;
use crate::services::stomp::{decode_all, Command, Frame, HeartBeat, HEARTBEAT};
use async_channel::{Receiver, Sender};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Missed inbound heart-beat intervals tolerated before the link counts as dropped.
const HEARTBEAT_GRACE_FACTOR: u32 = 3;

/// Connection state of the broker link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected; terminal after shutdown
    #[default]
    Disconnected,
    /// First connection attempt in progress
    Connecting,
    /// STOMP session established
    Connected,
    /// Connection lost or failed, retrying after the fixed delay
    Reconnecting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        };
        f.write_str(label)
    }
}

/// Snapshot of the connection for status displays.
#[derive(Debug, Clone, Default)]
pub struct TransportStatus {
    pub state: ConnectionState,
    /// Number of connection attempts since the handle was created
    pub connection_attempts: u64,
    pub last_error: Option<String>,
    /// Total `MESSAGE` frames received
    pub messages_received: u64,
}

/// Events emitted by the connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StateChanged(ConnectionState),
    /// `MESSAGE` frame body received on `destination`
    Message { destination: String, body: String },
    /// Diagnostic for a failed attempt, broker `ERROR` frame, or dropped link
    Error(String),
}

enum TransportCommand {
    Subscribe(String),
    Publish {
        destination: String,
        body: String,
        ack: oneshot::Sender<Result<()>>,
    },
    Shutdown,
}

/// How a connected session ended.
enum SessionEnd {
    Shutdown,
    Dropped(String),
}

/// Settings the connection task needs, taken from [`ChatConfig`].
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub url: String,
    pub host: String,
    pub heartbeat: Duration,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl From<&ChatConfig> for TransportSettings {
    fn from(config: &ChatConfig) -> Self {
        Self {
            url: config.ws_url(),
            host: config.host(),
            heartbeat: config.heartbeat_interval,
            reconnect_delay: config.reconnect_delay,
            connect_timeout: config.request_timeout,
        }
    }
}

/// Handle to a live (or reconnecting) broker connection.
///
/// Dropping every handle stops the connection task.
pub struct TransportHandle {
    status: Arc<RwLock<TransportStatus>>,
    subscriptions: Arc<RwLock<Vec<String>>>,
    commands: mpsc::UnboundedSender<TransportCommand>,
    events: Receiver<TransportEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Open a broker connection for `config`. Must be called inside a Tokio runtime.
pub fn connect(config: &ChatConfig) -> TransportHandle {
    connect_with(TransportSettings::from(config))
}

pub fn connect_with(settings: TransportSettings) -> TransportHandle {
    let status = Arc::new(RwLock::new(TransportStatus::default()));
    let subscriptions = Arc::new(RwLock::new(Vec::new()));
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = async_channel::unbounded();

    info!(url = %settings.url, "Starting broker connection task");

    let context = ConnectionContext {
        settings,
        status: Arc::clone(&status),
        subscriptions: Arc::clone(&subscriptions),
        events: event_tx,
    };
    let task = tokio::spawn(context.run(command_rx));

    TransportHandle {
        status,
        subscriptions,
        commands: command_tx,
        events: event_rx,
        task: Mutex::new(Some(task)),
    }
}

impl TransportHandle {
    pub fn status(&self) -> TransportStatus {
        self.status.read().clone()
    }

    /// Event stream of this connection. Intended for a single consumer.
    pub fn events(&self) -> Receiver<TransportEvent> {
        self.events.clone()
    }

    /// Topics replayed on every (re)connect.
    pub fn registered_topics(&self) -> Vec<String> {
        self.subscriptions.read().clone()
    }
}

#[async_trait::async_trait]
impl MessageTransport for TransportHandle {
    fn state(&self) -> ConnectionState {
        self.status.read().state
    }

    async fn subscribe(&self, topic: &str) -> Result<()> {
        {
            let mut topics = self.subscriptions.write();
            if !topics.iter().any(|t| t == topic) {
                topics.push(topic.to_string());
            }
        }
        self.commands
            .send(TransportCommand::Subscribe(topic.to_string()))
            .map_err(|_| ChatError::SessionClosed)
    }

    async fn publish(&self, destination: &str, body: String) -> Result<()> {
        if self.state() != ConnectionState::Connected {
            return Err(ChatError::NotConnected);
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(TransportCommand::Publish {
                destination: destination.to_string(),
                body,
                ack: ack_tx,
            })
            .map_err(|_| ChatError::SessionClosed)?;
        ack_rx
            .await
            .map_err(|_| ChatError::Connection("connection task stopped before publishing".to_string()))?
    }

    async fn shutdown(&self) {
        let _ = self.commands.send(TransportCommand::Shutdown);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "Broker connection task ended abnormally");
            }
        }
        self.status.write().state = ConnectionState::Disconnected;
    }
}

struct ConnectionContext {
    settings: TransportSettings,
    status: Arc<RwLock<TransportStatus>>,
    subscriptions: Arc<RwLock<Vec<String>>>,
    events: Sender<TransportEvent>,
}

impl ConnectionContext {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<TransportCommand>) {
        let mut attempt = 0u64;
        loop {
            attempt += 1;
            let next_state = if attempt == 1 {
                ConnectionState::Connecting
            } else {
                ConnectionState::Reconnecting
            };
            self.status.write().connection_attempts = attempt;
            self.set_state(next_state).await;

            let connected = tokio::time::timeout(self.settings.connect_timeout, self.handshake()).await;
            let failure = match connected {
                Ok(Ok((ws, heartbeat))) => {
                    info!(
                        url = %self.settings.url,
                        attempt = attempt,
                        send_every_ms = ?heartbeat.send_every.map(|d| d.as_millis()),
                        expect_every_ms = ?heartbeat.expect_every.map(|d| d.as_millis()),
                        "STOMP session established"
                    );
                    self.status.write().last_error = None;
                    self.set_state(ConnectionState::Connected).await;

                    match self.pump(ws, heartbeat, &mut commands).await {
                        SessionEnd::Shutdown => {
                            self.set_state(ConnectionState::Disconnected).await;
                            info!("Broker connection shut down");
                            return;
                        }
                        SessionEnd::Dropped(reason) => {
                            warn!(reason = %reason, "Broker connection lost");
                            format!("connection lost: {}", reason)
                        }
                    }
                }
                Ok(Err(e)) => {
                    error!(url = %self.settings.url, attempt = attempt, error = %e, "Failed to connect to broker");
                    e.to_string()
                }
                Err(_) => {
                    error!(
                        url = %self.settings.url,
                        attempt = attempt,
                        timeout_ms = self.settings.connect_timeout.as_millis() as u64,
                        "Timed out connecting to broker"
                    );
                    "timed out waiting for CONNECTED".to_string()
                }
            };

            self.status.write().last_error = Some(failure.clone());
            let _ = self.events.send(TransportEvent::Error(failure)).await;
            self.set_state(ConnectionState::Reconnecting).await;

            info!(
                attempt = attempt,
                delay_ms = self.settings.reconnect_delay.as_millis() as u64,
                "Reconnecting after fixed delay"
            );
            if !self.wait_before_retry(&mut commands).await {
                self.set_state(ConnectionState::Disconnected).await;
                info!("Broker connection shut down while waiting to reconnect");
                return;
            }
        }
    }

    async fn set_state(&self, state: ConnectionState) {
        let changed = {
            let mut status = self.status.write();
            let changed = status.state != state;
            status.state = state;
            changed
        };
        if changed {
            debug!(state = ?state, "Transport state changed");
            let _ = self.events.send(TransportEvent::StateChanged(state)).await;
        }
    }

    /// Open the socket and complete the STOMP `CONNECT`/`CONNECTED` exchange.
    async fn handshake(&self) -> Result<(WsStream, HeartBeat)> {
        let (mut ws, response) = connect_async(self.settings.url.as_str()).await?;
        debug!(status = ?response.status(), "WebSocket upgraded, sending CONNECT");

        let connect = Frame::connect(&self.settings.host, self.settings.heartbeat);
        ws.send(WsMessage::Text(connect.encode())).await?;

        while let Some(message) = ws.next().await {
            let text = match message? {
                WsMessage::Text(text) => text,
                WsMessage::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                WsMessage::Close(frame) => {
                    return Err(ChatError::Connection(format!(
                        "socket closed during handshake: {:?}",
                        frame.map(|f| f.reason.to_string())
                    )));
                }
                _ => continue,
            };
            for frame in decode_all(&text)? {
                match frame.command {
                    Command::Connected => {
                        let heartbeat = HeartBeat::negotiate(self.settings.heartbeat, frame.get("heart-beat"));
                        return Ok((ws, heartbeat));
                    }
                    Command::Error => return Err(ChatError::Connection(broker_error_text(&frame))),
                    other => debug!(command = %other, "Ignoring frame before CONNECTED"),
                }
            }
        }
        Err(ChatError::Connection("socket closed before CONNECTED".to_string()))
    }

    /// Drive a connected session until it drops or is shut down.
    async fn pump(
        &self,
        ws: WsStream,
        heartbeat: HeartBeat,
        commands: &mut mpsc::UnboundedReceiver<TransportCommand>,
    ) -> SessionEnd {
        let (mut write, mut read) = ws.split();
        let mut active: HashMap<String, String> = HashMap::new();
        let mut next_subscription = 0u64;

        let topics = self.subscriptions.read().clone();
        for topic in topics {
            if let Err(e) = subscribe_on(&mut write, &mut active, &mut next_subscription, &topic).await {
                return SessionEnd::Dropped(e.to_string());
            }
        }

        let idle = Duration::from_secs(3600);
        let mut send_tick = tokio::time::interval(heartbeat.send_every.unwrap_or(idle));
        let mut check_tick = tokio::time::interval(heartbeat.expect_every.unwrap_or(idle));
        let mut last_inbound = Instant::now();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(TransportCommand::Subscribe(topic)) => {
                        if let Err(e) = subscribe_on(&mut write, &mut active, &mut next_subscription, &topic).await {
                            return SessionEnd::Dropped(e.to_string());
                        }
                    }
                    Some(TransportCommand::Publish { destination, body, ack }) => {
                        let frame = Frame::send_json(&destination, body);
                        let result = write.send(WsMessage::Text(frame.encode())).await.map_err(ChatError::from);
                        let failed = result.as_ref().err().map(|e| e.to_string());
                        trace!(destination = %destination, ok = failed.is_none(), "Published SEND frame");
                        let _ = ack.send(result);
                        if let Some(reason) = failed {
                            return SessionEnd::Dropped(reason);
                        }
                    }
                    Some(TransportCommand::Shutdown) | None => {
                        let _ = write.send(WsMessage::Text(Frame::disconnect("disconnect-0").encode())).await;
                        let _ = write.close().await;
                        return SessionEnd::Shutdown;
                    }
                },
                incoming = read.next() => {
                    last_inbound = Instant::now();
                    match incoming {
                        Some(Ok(WsMessage::Text(text))) => self.handle_text(&text).await,
                        Some(Ok(WsMessage::Binary(bytes))) => {
                            self.handle_text(&String::from_utf8_lossy(&bytes)).await
                        }
                        Some(Ok(WsMessage::Ping(data))) => {
                            trace!(data_len = data.len(), "Received ping, sending pong");
                            if let Err(e) = write.send(WsMessage::Pong(data)).await {
                                return SessionEnd::Dropped(e.to_string());
                            }
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                            return SessionEnd::Dropped(format!("closed by broker {}", reason).trim_end().to_string());
                        }
                        Some(Ok(_)) => trace!("Received other WebSocket message type"),
                        Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
                        None => return SessionEnd::Dropped("stream ended".to_string()),
                    }
                }
                _ = send_tick.tick(), if heartbeat.send_every.is_some() => {
                    trace!("Sending heart-beat");
                    if let Err(e) = write.send(WsMessage::Text(HEARTBEAT.to_string())).await {
                        return SessionEnd::Dropped(e.to_string());
                    }
                }
                _ = check_tick.tick(), if heartbeat.expect_every.is_some() => {
                    if let Some(expected) = heartbeat.expect_every {
                        if last_inbound.elapsed() > expected * HEARTBEAT_GRACE_FACTOR {
                            return SessionEnd::Dropped(format!(
                                "no data from broker for {} ms",
                                last_inbound.elapsed().as_millis()
                            ));
                        }
                    }
                }
            }
        }
    }

    async fn handle_text(&self, text: &str) {
        let frames = match decode_all(text) {
            Ok(frames) => frames,
            Err(e) => {
                warn!(error = %e, preview = %shared::preview(text, 100), "Failed to decode STOMP frame");
                return;
            }
        };

        for frame in frames {
            match frame.command {
                Command::Message => {
                    let destination = frame.destination().unwrap_or_default().to_string();
                    let total = {
                        let mut status = self.status.write();
                        status.messages_received += 1;
                        status.messages_received
                    };
                    debug!(
                        destination = %destination,
                        body_len = frame.body.len(),
                        total_messages = total,
                        "Received MESSAGE frame"
                    );
                    let _ = self
                        .events
                        .send(TransportEvent::Message {
                            destination,
                            body: frame.body,
                        })
                        .await;
                }
                Command::Error => {
                    let text = broker_error_text(&frame);
                    error!(error = %text, "Broker sent ERROR frame");
                    self.status.write().last_error = Some(text.clone());
                    let _ = self.events.send(TransportEvent::Error(text)).await;
                }
                Command::Receipt => trace!(receipt = ?frame.get("receipt-id"), "Received RECEIPT"),
                other => debug!(command = %other, "Ignoring unexpected frame"),
            }
        }
    }

    /// Sleep the fixed reconnect delay while still answering commands.
    /// Returns `false` when shutdown was requested.
    async fn wait_before_retry(&self, commands: &mut mpsc::UnboundedReceiver<TransportCommand>) -> bool {
        let delay = tokio::time::sleep(self.settings.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => return true,
                command = commands.recv() => match command {
                    // Registered topics are replayed once connected.
                    Some(TransportCommand::Subscribe(_)) => {}
                    Some(TransportCommand::Publish { ack, .. }) => {
                        let _ = ack.send(Err(ChatError::NotConnected));
                    }
                    Some(TransportCommand::Shutdown) | None => return false,
                },
            }
        }
    }
}

async fn subscribe_on(
    write: &mut SplitSink<WsStream, WsMessage>,
    active: &mut HashMap<String, String>,
    next_id: &mut u64,
    topic: &str,
) -> Result<()> {
    if active.contains_key(topic) {
        return Ok(());
    }
    let id = format!("sub-{}", next_id);
    *next_id += 1;
    write
        .send(WsMessage::Text(Frame::subscribe(&id, topic).encode()))
        .await?;
    info!(topic = %topic, subscription_id = %id, "Subscribed to topic");
    active.insert(topic.to_string(), id);
    Ok(())
}

fn broker_error_text(frame: &Frame) -> String {
    match (frame.get("message"), frame.body.trim()) {
        (Some(message), "") => message.to_string(),
        (Some(message), body) => format!("{}: {}", message, body),
        (None, "") => "broker reported an error".to_string(),
        (None, body) => body.to_string(),
    }
}
