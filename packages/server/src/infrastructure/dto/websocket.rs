//! Relay wire protocol.
//!
//! One JSON object per WebSocket text frame. Inbound frames are classified by
//! their `command` field before any payload is trusted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Reasons an inbound frame is rejected at the relay boundary
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("message has no 'command' field")]
    MissingCommand,

    #[error("invalid '{command}' payload: {source}")]
    InvalidPayload {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Identify(IdentifyMessage),
    CurrentTrack(Box<CurrentTrackMessage>),
    RequestHandled(RequestHandledMessage),
    /// Any other command. Forwarded but otherwise ignored.
    Other { command: String },
}

impl InboundMessage {
    pub const IDENTIFY: &'static str = "identify";
    pub const CURRENT_TRACK: &'static str = "currentTrack";
    pub const REQUEST_HANDLED: &'static str = "requestHandled";

    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        let command = value
            .get("command")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingCommand)?
            .to_string();

        let invalid = |source| ProtocolError::InvalidPayload {
            command: command.clone(),
            source,
        };

        match command.as_str() {
            Self::IDENTIFY => serde_json::from_value(value)
                .map(Self::Identify)
                .map_err(invalid),
            Self::CURRENT_TRACK => serde_json::from_value(value)
                .map(|message| Self::CurrentTrack(Box::new(message)))
                .map_err(invalid),
            Self::REQUEST_HANDLED => serde_json::from_value(value)
                .map(Self::RequestHandled)
                .map_err(invalid),
            _ => Ok(Self::Other {
                command: command.clone(),
            }),
        }
    }

    pub fn command(&self) -> &str {
        match self {
            Self::Identify(_) => Self::IDENTIFY,
            Self::CurrentTrack(_) => Self::CURRENT_TRACK,
            Self::RequestHandled(_) => Self::REQUEST_HANDLED,
            Self::Other { command } => command,
        }
    }
}

/// `{command:"identify", type, version?}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdentifyMessage {
    #[serde(rename = "type", default)]
    pub client_type: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// `{command:"currentTrack", data:{...}, isPlaying, progress, volume, shuffle, repeat, isLiked, id}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTrackMessage {
    #[serde(default)]
    pub data: CurrentTrackData,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_playing: Option<bool>,
    /// milliseconds
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub shuffle: Option<bool>,
    #[serde(default)]
    pub repeat: Option<u8>,
    #[serde(default)]
    pub is_liked: Option<bool>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl CurrentTrackMessage {
    pub fn request_id(&self) -> Option<Uuid> {
        parse_request_id(self.request_id.as_deref())
    }

    /// Local file path for players that stream from disk.
    pub fn local_path(&self) -> Option<&str> {
        self.data.path.as_deref().filter(|path| !path.trim().is_empty())
    }
}

/// Platform-specific track fields. Bridges disagree on naming, so the common
/// spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTrackData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    /// A string, an array of strings or an array of `{name}` objects.
    #[serde(default, alias = "artists")]
    pub artist: Option<Value>,
    /// A string or `{name}`.
    #[serde(default)]
    pub album: Option<Value>,
    /// milliseconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, alias = "image", alias = "coverUrl", alias = "artwork")]
    pub cover: Option<String>,
    #[serde(default, alias = "filePath")]
    pub path: Option<String>,
}

/// `{command:"requestHandled", data:{...track metadata...}}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHandledMessage {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl RequestHandledMessage {
    pub fn request_id(&self) -> Option<Uuid> {
        parse_request_id(self.request_id.as_deref())
    }
}

fn parse_request_id(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|id| Uuid::parse_str(id.trim()).ok())
}

/// Server-to-client command names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayCommand {
    PlayPause,
    Next,
    Prev,
    Shuffle,
    Repeat,
    #[serde(rename = "getdata")]
    GetData,
    #[serde(rename = "addTrack")]
    AddTrack,
    #[serde(rename = "seek")]
    Seek,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "volume")]
    Volume,
    #[serde(rename = "getInfo")]
    GetInfo,
    #[serde(rename = "identify")]
    Identify,
    #[serde(rename = "error")]
    Error,
    /// queue snapshot for overlay pages
    #[serde(rename = "queue")]
    Queue,
    #[serde(rename = "notification")]
    Notification,
}

/// `{command, data?, requestId?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundCommand {
    pub command: RelayCommand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
}

impl OutboundCommand {
    pub fn new(command: RelayCommand) -> Self {
        Self {
            command,
            data: None,
            request_id: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Welcome message asking a new connection to identify itself
    pub fn identify_request() -> Self {
        Self::new(RelayCommand::Identify)
    }

    /// `{command:"error", data:<string>}`
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(RelayCommand::Error).with_data(Value::String(message.into()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `{acknowledged:true, type}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyAck {
    pub acknowledged: bool,
    #[serde(rename = "type")]
    pub client_type: String,
}

impl IdentifyAck {
    pub fn new(client_type: &str) -> Self {
        Self {
            acknowledged: true,
            client_type: client_type.to_string(),
        }
    }
}
