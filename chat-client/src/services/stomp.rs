//! # STOMP 1.2 Frame Codec
//!
//! Encodes and decodes the text frames exchanged with the message broker over
//! the WebSocket. Frames look like:
//!
//! ```text
//! SEND
//! destination:/app/chat
//! content-type:application/json
//! content-length:17
//!
//! {"content":"hi"}^@
//! ```
//!
//! A bare end-of-line between frames is a heart-beat. A single WebSocket text
//! message may carry several frames, so [`decode_all`] returns a list.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Protocol version negotiated in `CONNECT`.
pub const ACCEPT_VERSION: &str = "1.2";
/// Heart-beat frame sent on an idle connection.
pub const HEARTBEAT: &str = "\n";

/// Codec failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StompError {
    #[error("unknown STOMP command: {0}")]
    UnknownCommand(String),
    #[error("malformed header line: {0}")]
    MalformedHeader(String),
    #[error("invalid escape sequence in header: {0}")]
    InvalidEscape(String),
    #[error("invalid content-length: {0}")]
    BadContentLength(String),
    #[error("frame is not NUL terminated")]
    MissingNul,
    #[error("frame ended before the header block")]
    Truncated,
}

impl From<StompError> for crate::core::ChatError {
    fn from(err: StompError) -> Self {
        crate::core::ChatError::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        }
    }

    fn parse(line: &str) -> Result<Self, StompError> {
        Ok(match line {
            "CONNECT" => Command::Connect,
            "STOMP" => Command::Stomp,
            "CONNECTED" => Command::Connected,
            "SEND" => Command::Send,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            "DISCONNECT" => Command::Disconnect,
            other => return Err(StompError::UnknownCommand(other.to_string())),
        })
    }

    /// `CONNECT`/`CONNECTED` headers are never escaped (STOMP 1.2 §Value Encoding).
    fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Stomp | Command::Connected)
    }

    fn carries_body(&self) -> bool {
        matches!(self, Command::Send | Command::Message | Command::Error)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One STOMP frame. Header order is preserved; on repeated names the first wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// `CONNECT` advertising `heartbeat` in both directions.
    pub fn connect(host: &str, heartbeat: Duration) -> Self {
        let millis = heartbeat.as_millis();
        Frame::new(Command::Connect)
            .header("accept-version", ACCEPT_VERSION)
            .header("host", host)
            .header("heart-beat", format!("{},{}", millis, millis))
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn send_json(destination: &str, body: impl Into<String>) -> Self {
        Frame::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .body(body)
    }

    pub fn disconnect(receipt: &str) -> Self {
        Frame::new(Command::Disconnect).header("receipt", receipt)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn destination(&self) -> Option<&str> {
        self.get("destination")
    }

    /// Serialize to wire text, adding `content-length` for frames with a body.
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');

        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if self.command.carries_body() && !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }

        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(StompError::InvalidEscape(raw.to_string())),
        }
    }
    Ok(out)
}

/// Decode every frame in `input`, skipping heart-beat EOLs.
///
/// Returns an empty list when `input` is only heart-beats.
pub fn decode_all(input: &str) -> Result<Vec<Frame>, StompError> {
    let mut frames = Vec::new();
    let mut rest = input;
    loop {
        rest = rest.trim_start_matches(['\r', '\n']);
        if rest.is_empty() {
            return Ok(frames);
        }
        let (frame, remaining) = decode_one(rest)?;
        frames.push(frame);
        rest = remaining;
    }
}

fn next_line(input: &str) -> Option<(&str, &str)> {
    let end = input.find('\n')?;
    let line = input[..end].strip_suffix('\r').unwrap_or(&input[..end]);
    Some((line, &input[end + 1..]))
}

fn decode_one(input: &str) -> Result<(Frame, &str), StompError> {
    let (command_line, mut rest) = next_line(input).ok_or(StompError::Truncated)?;
    let command = Command::parse(command_line)?;
    let escaped = command.escapes_headers();

    let mut headers: Vec<(String, String)> = Vec::new();
    loop {
        let (line, after) = next_line(rest).ok_or(StompError::Truncated)?;
        rest = after;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;
        let (name, value) = if escaped {
            (unescape_header(name)?, unescape_header(value)?)
        } else {
            (name.to_string(), value.to_string())
        };
        headers.push((name, value));
    }

    let content_length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .map(|(_, value)| {
            value
                .trim()
                .parse::<usize>()
                .map_err(|_| StompError::BadContentLength(value.clone()))
        })
        .transpose()?;

    let body_end = match content_length {
        Some(len) => {
            if rest.len() < len || !rest.is_char_boundary(len) {
                return Err(StompError::BadContentLength(len.to_string()));
            }
            len
        }
        None => rest.find('\0').ok_or(StompError::MissingNul)?,
    };

    let body = rest[..body_end].to_string();
    let after_body = &rest[body_end..];
    let remaining = after_body.strip_prefix('\0').ok_or(StompError::MissingNul)?;

    Ok((Frame { command, headers, body }, remaining))
}

/// Heart-beat intervals agreed after `CONNECTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartBeat {
    /// How often we must send something; `None` disables.
    pub send_every: Option<Duration>,
    /// How often the broker promises to send something; `None` disables.
    pub expect_every: Option<Duration>,
}

impl HeartBeat {
    pub const DISABLED: HeartBeat = HeartBeat {
        send_every: None,
        expect_every: None,
    };

    /// Negotiate from our advertised `(cx, cy)` and the broker's `heart-beat` header.
    ///
    /// A missing or unparsable header disables heart-beating.
    pub fn negotiate(client: Duration, server_header: Option<&str>) -> Self {
        let Some((sx, sy)) = server_header.and_then(parse_heartbeat) else {
            return HeartBeat::DISABLED;
        };
        let c = client.as_millis() as u64;

        let pick = |ours: u64, theirs: u64| {
            if ours == 0 || theirs == 0 {
                None
            } else {
                Some(Duration::from_millis(ours.max(theirs)))
            }
        };

        HeartBeat {
            send_every: pick(c, sy),
            expect_every: pick(sx, c),
        }
    }
}

fn parse_heartbeat(value: &str) -> Option<(u64, u64)> {
    let (x, y) = value.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}
