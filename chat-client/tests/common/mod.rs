//! # Test Fixtures
//!
//! A scripted STOMP broker on top of tokio-tungstenite and helpers for
//! spinning up an axum mock of the REST backend.

#![allow(dead_code)]

use async_channel::Receiver;
use axum::Router;
use chat_client::services::stomp::{decode_all, Command, Frame};
use chat_client::services::transport::{ConnectionState, TransportEvent, TransportSettings};
use futures_util::{SinkExt, StreamExt};
use shared::dto::chat::Message;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{accept_async, WebSocketStream};

pub const WAIT: Duration = Duration::from_secs(5);

pub type BrokerSocket = WebSocketStream<TcpStream>;

/// Listening broker plus transport settings pointing at it.
pub struct MockBroker {
    listener: TcpListener,
    pub url: String,
}

impl MockBroker {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        Self { listener, url }
    }

    pub fn settings(&self, heartbeat: Duration, reconnect_delay: Duration) -> TransportSettings {
        TransportSettings {
            url: self.url.clone(),
            host: "127.0.0.1".to_string(),
            heartbeat,
            reconnect_delay,
            connect_timeout: Duration::from_secs(2),
        }
    }

    /// Accept one client and complete the STOMP handshake, answering with `heart_beat`.
    pub async fn accept_with(&self, heart_beat: &str) -> BrokerSocket {
        let (tcp, _) = tokio::time::timeout(WAIT, self.listener.accept())
            .await
            .expect("client never connected")
            .unwrap();
        let mut ws = accept_async(tcp).await.unwrap();

        let connect = next_frame(&mut ws).await;
        assert_eq!(connect.command, Command::Connect);
        assert_eq!(connect.get("accept-version"), Some("1.2"));

        let connected = Frame::new(Command::Connected)
            .header("version", "1.2")
            .header("heart-beat", heart_beat);
        ws.send(WsMessage::Text(connected.encode())).await.unwrap();
        ws
    }

    pub async fn accept(&self) -> BrokerSocket {
        self.accept_with("0,0").await
    }
}

/// Next STOMP frame from the client, skipping heart-beats and control messages.
pub async fn next_frame(ws: &mut BrokerSocket) -> Frame {
    loop {
        let message = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("client closed the socket")
            .unwrap();
        if let WsMessage::Text(text) = message {
            if let Some(frame) = decode_all(&text).unwrap().into_iter().next() {
                return frame;
            }
        }
    }
}

/// Deliver `body` as a `MESSAGE` frame on `destination`.
pub async fn deliver(ws: &mut BrokerSocket, destination: &str, body: &str) {
    let frame = Frame::new(Command::Message)
        .header("destination", destination)
        .header("subscription", "sub-0")
        .header("message-id", "m-1")
        .header("content-type", "application/json")
        .body(body);
    ws.send(WsMessage::Text(frame.encode())).await.unwrap();
}

/// Skip events until the transport reports `state`.
pub async fn wait_for_state(events: &Receiver<TransportEvent>, state: ConnectionState) {
    loop {
        let event = tokio::time::timeout(WAIT, events.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {:?}", state))
            .unwrap();
        if event == TransportEvent::StateChanged(state) {
            return;
        }
    }
}

/// Skip events until the transport reports an error, returning its text.
pub async fn wait_for_error(events: &Receiver<TransportEvent>) -> String {
    loop {
        let event = tokio::time::timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for an error event")
            .unwrap();
        if let TransportEvent::Error(text) = event {
            return text;
        }
    }
}

/// Poll `condition` every 10 ms until it holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition never became true");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Serve `app` on an ephemeral port, returning its base URL.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn message(from: &str, to: &str, content: &str) -> Message {
    Message {
        sender_id: from.to_string(),
        sender_name: from.to_uppercase(),
        recipient_id: to.to_string(),
        recipient_name: to.to_uppercase(),
        content: content.to_string(),
        timestamp: "2026-10-15T08:00:00.000Z".to_string(),
        school_id: "sch-1".to_string(),
        session: "2026-27".to_string(),
        attachment: None,
        client_id: None,
    }
}
