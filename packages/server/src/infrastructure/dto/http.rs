//! HTTP API request/response bodies.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatRole, QueueItem};

/// `GET /api/queue`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDto {
    pub items: Vec<QueueItem>,
    /// -1 when nothing is playing
    pub currently_playing_index: i64,
    pub count: usize,
}

/// `GET /api/clients`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub handle: String,
    pub client_type: String,
    pub connected_at: String,
    pub version: Option<String>,
}

/// `GET /api/now-playing`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingDto {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: u64,
    pub progress: u64,
    pub cover: Option<String>,
    pub is_playing: bool,
    /// true while guess-the-song hides the title
    pub hidden: bool,
}

/// `POST /api/queue`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQueueItemRequest {
    pub track_id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub duration: u64,
    pub requested_by: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

/// `PUT /api/playback/backend`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBackendRequest {
    pub platform: String,
}

/// `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user: String,
    #[serde(default)]
    pub role: ChatRole,
    pub message: String,
}

/// `POST /api/chat` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: Option<String>,
}
