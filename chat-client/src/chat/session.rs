//! # Chat Session Manager
//!
//! Orchestrates one mounted chat widget: the broker connection, the selected
//! contact, the ordered message log and the compose box.
//!
//! ## Send Flow
//!
//! ```text
//! send()
//!   ├─ nothing to send / no contact ──> Ignored (no network, no log change)
//!   ├─ pending file ──> AttachmentUploader ──(error)──> abort, compose kept
//!   ├─ assemble Message
//!   ├─ Connected? ──> publish to /app/chat (best effort, no outbox)
//!   ├─ append to log (optimistic echo)
//!   └─ clear compose box
//! ```
//!
//! ## Ordering
//!
//! Every contact selection bumps a generation counter. Async work captures the
//! generation it started under; results that finish under a newer generation
//! are not applied to the log.
//!
//! ## Events
//!
//! [`ChatSession::events`] hands out a bounded channel. Until a host asks for
//! it, or after the host drops its receiver, events are not queued at all. A
//! host that stops reading loses events once the buffer is full.

use crate::chat::assembler::{self, IgnoreReason, SenderIdentity};
use crate::chat::history::HistoryLoader;
use crate::chat::uploader::{AttachmentFile, AttachmentUploader};
use crate::config::ChatConfig;
use crate::core::error::{ChatError, Result};
use crate::core::service::{ChatApi, MessageTransport};
use crate::debug::trace_context::operation_span;
use crate::services::api::ApiClient;
use crate::services::transport::{self, ConnectionState, TransportEvent};
use async_channel::{Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use shared::dto::chat::{Contact, Message};
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

/// Session events buffered for a host that is slow to read.
pub const EVENT_BUFFER: usize = 256;

/// Own messages still awaiting their broadcast echo. Older ids are forgotten first.
pub const MAX_PENDING_ECHOES: usize = 256;

/// Handling of our own messages coming back on the broadcast topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoPolicy {
    /// Drop a broadcast whose `clientId` matches a message we already echoed locally.
    #[default]
    SuppressOwnEchoes,
    /// Append every broadcast; our own messages show up twice.
    ShowAll,
}

impl EchoPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "suppress" | "suppress_own_echoes" => Some(EchoPolicy::SuppressOwnEchoes),
            "show_all" | "all" => Some(EchoPolicy::ShowAll),
            _ => None,
        }
    }
}

/// Result of [`ChatSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent {
        message: Message,
        /// Handed to the broker. `false` when offline; the message is not retried.
        published: bool,
        /// Added to the local log. `false` when the contact changed mid-send.
        appended: bool,
    },
    Ignored(IgnoreReason),
}

/// Result of [`ChatSession::select_contact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    Loaded { count: usize },
    /// Another contact was selected before this history arrived.
    Superseded,
}

/// Notifications for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ConnectionChanged(ConnectionState),
    MessagesChanged { count: usize },
    HistoryLoaded { contact_id: String, count: usize },
    Error(String),
}

#[derive(Debug, Default)]
struct SessionState {
    selected_contact: Option<Contact>,
    messages: Vec<Message>,
    compose_input: String,
    pending_attachment: Option<AttachmentFile>,
    generation: u64,
    /// Client ids published by us whose broadcast echo has not arrived yet, oldest first
    pending_echoes: VecDeque<String>,
    last_error: Option<String>,
    closed: bool,
}

pub struct ChatSession {
    sender: SenderIdentity,
    subscribe_topic: String,
    send_destination: String,
    echo_policy: EchoPolicy,
    uploader: AttachmentUploader,
    history: HistoryLoader,
    transport: RwLock<Option<Arc<dyn MessageTransport>>>,
    state: RwLock<SessionState>,
    events_tx: Mutex<Option<Sender<SessionEvent>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    /// Build a session from explicit collaborators. No event pump is started;
    /// see [`ChatSession::spawn_event_pump`].
    pub fn new(
        config: &ChatConfig,
        sender: SenderIdentity,
        api: Arc<dyn ChatApi>,
        transport: Arc<dyn MessageTransport>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sender,
            subscribe_topic: config.subscribe_topic.clone(),
            send_destination: config.send_destination.clone(),
            echo_policy: config.echo_policy,
            uploader: AttachmentUploader::new(Arc::clone(&api)),
            history: HistoryLoader::new(api),
            transport: RwLock::new(Some(transport)),
            state: RwLock::new(SessionState::default()),
            events_tx: Mutex::new(None),
            pump: Mutex::new(None),
        })
    }

    /// Mount a session against the real backend: REST client, broker
    /// connection, topic subscription and event pump.
    pub async fn start(config: &ChatConfig, sender: SenderIdentity) -> Result<Arc<Self>> {
        let api: Arc<dyn ChatApi> = Arc::new(ApiClient::new(config));
        let handle = Arc::new(transport::connect(config));
        let events = handle.events();

        handle.subscribe(&config.subscribe_topic).await?;

        info!(
            user_id = %sender.id,
            school_id = %sender.school_id,
            ws_url = %config.ws_url(),
            "Chat session started"
        );
        let session = ChatSession::new(config, sender, api, handle);
        session.spawn_event_pump(events);
        Ok(session)
    }

    /// Consume transport events until the transport goes away or the session is dropped.
    pub fn spawn_event_pump(self: &Arc<Self>, events: Receiver<TransportEvent>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                let Some(session) = weak.upgrade() else { break };
                session.handle_transport_event(event);
            }
            debug!("Transport event pump ended");
        });
        if let Some(previous) = self.pump.lock().replace(task) {
            previous.abort();
        }
    }

    /// Apply one transport event to the session.
    pub fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::StateChanged(state) => {
                info!(state = ?state, "Chat connection state changed");
                self.emit(SessionEvent::ConnectionChanged(state));
            }
            TransportEvent::Message { destination, body } => {
                if destination != self.subscribe_topic {
                    debug!(destination = %destination, "Ignoring message for another destination");
                    return;
                }
                match serde_json::from_str::<Message>(&body) {
                    Ok(message) => self.receive(message),
                    Err(e) => {
                        warn!(
                            error = %e,
                            preview = %shared::preview(&body, 100),
                            "Dropping broker payload that is not a chat message"
                        );
                    }
                }
            }
            TransportEvent::Error(diagnostic) => {
                warn!(error = %diagnostic, "Chat connection error");
                self.state.write().last_error = Some(diagnostic.clone());
                self.emit(SessionEvent::Error(diagnostic));
            }
        }
    }

    /// Append an incoming message, unless it is the echo of our own send.
    pub fn receive(&self, message: Message) {
        let count = {
            let mut state = self.state.write();
            if self.echo_policy == EchoPolicy::SuppressOwnEchoes {
                if let Some(client_id) = &message.client_id {
                    if let Some(index) = state.pending_echoes.iter().position(|id| id == client_id) {
                        state.pending_echoes.remove(index);
                        debug!(client_id = %client_id, "Suppressed broker echo of own message");
                        return;
                    }
                }
            }
            state.messages.push(message);
            state.messages.len()
        };
        self.emit(SessionEvent::MessagesChanged { count });
    }

    /// Select `contact` and replace the log with its history.
    ///
    /// On failure the log stays empty and the error is returned.
    pub async fn select_contact(&self, contact: Contact) -> Result<HistoryOutcome> {
        let (span, _trace_id) = operation_span("select_contact");
        async move {
            let generation = {
                let mut state = self.state.write();
                if state.closed {
                    return Err(ChatError::SessionClosed);
                }
                state.generation += 1;
                state.selected_contact = Some(contact.clone());
                state.messages.clear();
                state.generation
            };
            info!(contact_id = %contact.id, generation = generation, "Contact selected");
            self.emit(SessionEvent::MessagesChanged { count: 0 });

            let result = self.history.load(&self.sender.id, &contact.id).await;

            let applied = {
                let mut state = self.state.write();
                if state.generation != generation {
                    None
                } else {
                    Some(match &result {
                        Ok(messages) => {
                            state.messages = messages.clone();
                            Ok(messages.len())
                        }
                        Err(e) => {
                            state.messages.clear();
                            state.last_error = Some(e.to_string());
                            Err(e.clone())
                        }
                    })
                }
            };

            match applied {
                None => {
                    debug!(contact_id = %contact.id, generation = generation, "Discarding superseded history");
                    Ok(HistoryOutcome::Superseded)
                }
                Some(Ok(count)) => {
                    self.emit(SessionEvent::HistoryLoaded { contact_id: contact.id.clone(), count });
                    self.emit(SessionEvent::MessagesChanged { count });
                    Ok(HistoryOutcome::Loaded { count })
                }
                Some(Err(e)) => {
                    self.emit(SessionEvent::Error(e.to_string()));
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Send whatever is in the compose box.
    pub async fn send(&self) -> Result<SendOutcome> {
        let (span, _trace_id) = operation_span("send");
        self.send_inner().instrument(span).await
    }

    async fn send_inner(&self) -> Result<SendOutcome> {
        let transport = self.transport.read().clone().ok_or(ChatError::SessionClosed)?;
        let (content, pending_file, contact, generation) = {
            let state = self.state.read();
            (
                state.compose_input.clone(),
                state.pending_attachment.clone(),
                state.selected_contact.clone(),
                state.generation,
            )
        };

        if let Err(reason) = assembler::check_sendable(&content, pending_file.is_some(), contact.as_ref()) {
            debug!(reason = ?reason, "Send ignored");
            return Ok(SendOutcome::Ignored(reason));
        }

        let attachment = match &pending_file {
            Some(file) => match self.uploader.upload(file).await {
                Ok(attachment) => Some(attachment),
                Err(e) => {
                    self.state.write().last_error = Some(e.to_string());
                    self.emit(SessionEvent::Error(e.to_string()));
                    return Err(e);
                }
            },
            None => None,
        };

        let Some(message) = assembler::assemble(&content, contact.as_ref(), &self.sender, attachment) else {
            return Ok(SendOutcome::Ignored(IgnoreReason::EmptyMessage));
        };

        let published = self.publish(transport.as_ref(), &message).await?;

        let appended = {
            let mut state = self.state.write();
            let appended = !state.closed && state.generation == generation;
            if appended {
                state.messages.push(message.clone());
            }
            if state.compose_input == content {
                state.compose_input.clear();
            }
            if state.pending_attachment == pending_file {
                state.pending_attachment = None;
            }
            appended
        };

        info!(
            recipient_id = %message.recipient_id,
            has_attachment = message.has_attachment(),
            published = published,
            appended = appended,
            "Message sent"
        );
        if appended {
            let count = self.state.read().messages.len();
            self.emit(SessionEvent::MessagesChanged { count });
        }

        Ok(SendOutcome::Sent {
            message,
            published,
            appended,
        })
    }

    /// Best-effort publish. Returns whether the broker accepted the frame.
    async fn publish(&self, transport: &dyn MessageTransport, message: &Message) -> Result<bool> {
        if transport.state() != ConnectionState::Connected {
            info!(state = ?transport.state(), "Not connected, message kept locally only");
            return Ok(false);
        }

        let body = serde_json::to_string(message)?;
        let echo_id = match (self.echo_policy, &message.client_id) {
            (EchoPolicy::SuppressOwnEchoes, Some(id)) => Some(id.clone()),
            _ => None,
        };
        // Registered before publishing: the broadcast can beat the publish ack.
        if let Some(id) = &echo_id {
            let mut state = self.state.write();
            state.pending_echoes.push_back(id.clone());
            if state.pending_echoes.len() > MAX_PENDING_ECHOES {
                state.pending_echoes.pop_front();
            }
        }

        match transport.publish(&self.send_destination, body).await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "Publish failed, message kept locally only");
                if let Some(id) = &echo_id {
                    self.state.write().pending_echoes.retain(|pending| pending != id);
                }
                Ok(false)
            }
        }
    }

    pub fn set_compose_input(&self, text: impl Into<String>) {
        self.state.write().compose_input = text.into();
    }

    pub fn attach_file(&self, file: AttachmentFile) {
        self.state.write().pending_attachment = Some(file);
    }

    /// Tear the session down: stop the transport and refuse further sends.
    pub async fn shutdown(&self) {
        let transport = self.transport.write().take();
        {
            let mut state = self.state.write();
            state.closed = true;
            state.pending_echoes.clear();
        }
        if let Some(transport) = transport {
            transport.shutdown().await;
        }
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        info!(user_id = %self.sender.id, "Chat session shut down");
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.read().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.state.read().messages.len()
    }

    pub fn selected_contact(&self) -> Option<Contact> {
        self.state.read().selected_contact.clone()
    }

    pub fn compose_input(&self) -> String {
        self.state.read().compose_input.clone()
    }

    pub fn pending_attachment(&self) -> Option<AttachmentFile> {
        self.state.read().pending_attachment.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport
            .read()
            .as_ref()
            .map(|t| t.state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    pub fn sender(&self) -> &SenderIdentity {
        &self.sender
    }

    /// Subscribe to session notifications.
    ///
    /// There is one listener at a time: a new call closes the previous receiver.
    pub fn events(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = async_channel::bounded(EVENT_BUFFER);
        *self.events_tx.lock() = Some(tx);
        rx
    }

    fn emit(&self, event: SessionEvent) {
        let mut listener = self.events_tx.lock();
        let Some(tx) = listener.as_ref() else { return };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = ?event, "Session event buffer full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Session event listener went away");
                *listener = None;
            }
        }
    }
}
