//! Video platform desktop player (companion server API v1)
//!
//! `GET /api/v1/state` for the player state, `POST /api/v1/command` with
//! `{command, data?}` for control. Positions are in seconds on the wire.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::{HttpEndpoint, check_status};
use crate::domain::{
    PlaybackBackend, PlaybackCommand, PlaybackError, Platform, RepeatMode, ResolvedTrack,
    TrackSnapshot,
};

const TRACK_STATE_PLAYING: i32 = 1;
const LIKE_STATUS_LIKE: i32 = 2;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateResponse {
    pub player: Option<PlayerState>,
    pub video: Option<VideoState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    /// -1 unknown, 0 paused, 1 playing, 2 buffering
    pub track_state: i32,
    pub video_progress: f64,
    /// 0 - 100
    pub volume: f64,
    pub queue: Option<QueueState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueState {
    /// -1 unknown, 0 none, 1 all, 2 one
    pub repeat_mode: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoState {
    pub id: String,
    pub title: String,
    pub author: String,
    pub album: Option<String>,
    pub duration_seconds: f64,
    pub thumbnails: Vec<Thumbnail>,
    /// -1 unknown, 0 dislike, 1 indifferent, 2 like
    pub like_status: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
}

/// Map the player state to a snapshot. `None` when no video is loaded.
pub fn snapshot_from_state(state: &StateResponse) -> Option<TrackSnapshot> {
    let video = state.video.as_ref().filter(|v| !v.id.is_empty())?;
    let player = state.player.as_ref();

    Some(TrackSnapshot {
        id: video.id.clone(),
        title: video.title.clone(),
        artist: video.author.clone(),
        album: video.album.clone().unwrap_or_default(),
        duration: seconds_to_millis(video.duration_seconds),
        progress: player
            .map(|p| seconds_to_millis(p.video_progress))
            .unwrap_or_default(),
        cover: video
            .thumbnails
            .iter()
            .max_by_key(|t| t.width)
            .map(|t| t.url.clone()),
        is_playing: player.is_some_and(|p| p.track_state == TRACK_STATE_PLAYING),
        volume: player
            .map(|p| (p.volume / 100.0).clamp(0.0, 1.0) as f32)
            .unwrap_or(1.0),
        shuffle: false,
        repeat: player
            .and_then(|p| p.queue.as_ref())
            .and_then(|q| u8::try_from(q.repeat_mode).ok())
            .map(RepeatMode::from)
            .unwrap_or_default(),
        is_liked: video.like_status == LIKE_STATUS_LIKE,
    })
}

fn seconds_to_millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// `{command, data?}` body for a playback command
pub fn command_body(
    command: &PlaybackCommand,
    current_repeat: RepeatMode,
) -> Result<Value, PlaybackError> {
    let body = match command {
        PlaybackCommand::PlayPause => json!({ "command": "playPause" }),
        PlaybackCommand::Next => json!({ "command": "next" }),
        PlaybackCommand::Prev => json!({ "command": "previous" }),
        PlaybackCommand::Shuffle => json!({ "command": "shuffle" }),
        PlaybackCommand::Repeat => {
            let next = match current_repeat {
                RepeatMode::Off => RepeatMode::All,
                RepeatMode::All => RepeatMode::One,
                RepeatMode::One => RepeatMode::Off,
            };
            json!({ "command": "repeatMode", "data": u8::from(next) })
        }
        PlaybackCommand::Seek { position_ms } => {
            json!({ "command": "seekTo", "data": *position_ms as f64 / 1000.0 })
        }
        PlaybackCommand::Volume { level } => {
            json!({ "command": "setVolume", "data": (level * 100.0).round() as u8 })
        }
        PlaybackCommand::Like => json!({ "command": "toggleLike" }),
        PlaybackCommand::AddTrack { .. } => {
            return Err(PlaybackError::Unsupported {
                platform: Platform::YtmDesktop.to_string(),
                operation: "addTrack",
            });
        }
    };
    Ok(body)
}

pub struct YtmDesktopBackend {
    client: reqwest::Client,
    endpoint: HttpEndpoint,
    last: Mutex<Option<TrackSnapshot>>,
}

impl YtmDesktopBackend {
    pub fn new(client: reqwest::Client, endpoint: HttpEndpoint) -> Self {
        Self {
            client,
            endpoint,
            last: Mutex::new(None),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.endpoint.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token),
            None => request,
        }
    }

    async fn fetch_state(&self) -> Result<StateResponse, PlaybackError> {
        let request = self.client.get(self.endpoint.url("/api/v1/state"));
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PlaybackError::Http(e.to_string()))?;
        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PlaybackError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PlaybackBackend for YtmDesktopBackend {
    async fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        let current_repeat = self
            .last
            .lock()
            .await
            .as_ref()
            .map(|s| s.repeat)
            .unwrap_or_default();
        let body = command_body(&command, current_repeat)?;

        let request = self
            .client
            .post(self.endpoint.url("/api/v1/command"))
            .json(&body);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PlaybackError::Http(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }

    async fn current_track(&self) -> Result<Option<TrackSnapshot>, PlaybackError> {
        let state = self.fetch_state().await?;
        let mut last = self.last.lock().await;

        match snapshot_from_state(&state) {
            Some(snapshot) => {
                *last = Some(snapshot.clone());
                Ok(Some(snapshot))
            }
            None => Ok(last.clone().map(|mut snapshot| {
                snapshot.is_playing = false;
                if let Some(player) = &state.player {
                    snapshot.progress = seconds_to_millis(player.video_progress);
                }
                snapshot
            })),
        }
    }

    async fn resolve(&self, _link: &str) -> Result<ResolvedTrack, PlaybackError> {
        Err(PlaybackError::Unsupported {
            platform: Platform::YtmDesktop.to_string(),
            operation: "resolve",
        })
    }
}
