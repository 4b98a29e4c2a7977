//! Desktop music app (RPC API v1)
//!
//! Endpoints live under `/api/v1/playback`. Requests carry the optional
//! `apptoken` header. Positions are in seconds on the wire.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::{HttpEndpoint, check_status};
use crate::domain::{
    PlaybackBackend, PlaybackCommand, PlaybackError, Platform, RepeatMode, ResolvedTrack,
    TrackSnapshot,
};

const ARTWORK_SIZE: &str = "600";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NowPlayingResponse {
    pub info: Option<NowPlayingInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NowPlayingInfo {
    pub name: String,
    pub artist_name: String,
    pub album_name: String,
    pub duration_in_millis: f64,
    /// seconds
    pub current_playback_time: f64,
    pub artwork: Option<Artwork>,
    pub play_params: Option<PlayParams>,
    pub shuffle_mode: u8,
    pub repeat_mode: u8,
    pub in_favorites: bool,
    /// 0 - 1
    pub volume: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Artwork {
    /// template with `{w}` and `{h}` placeholders
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlayParams {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IsPlayingResponse {
    pub is_playing: bool,
}

pub fn snapshot_from_now_playing(
    response: &NowPlayingResponse,
    is_playing: bool,
) -> Option<TrackSnapshot> {
    let info = response.info.as_ref()?;
    let id = info
        .play_params
        .as_ref()
        .map(|p| p.id.clone())
        .filter(|id| !id.is_empty())?;

    Some(TrackSnapshot {
        id,
        title: info.name.clone(),
        artist: info.artist_name.clone(),
        album: info.album_name.clone(),
        duration: non_negative(info.duration_in_millis),
        progress: non_negative(info.current_playback_time * 1000.0),
        cover: info
            .artwork
            .as_ref()
            .filter(|a| !a.url.is_empty())
            .map(|a| {
                a.url
                    .replace("{w}", ARTWORK_SIZE)
                    .replace("{h}", ARTWORK_SIZE)
            }),
        is_playing,
        volume: info.volume.unwrap_or(1.0).clamp(0.0, 1.0) as f32,
        shuffle: info.shuffle_mode != 0,
        repeat: RepeatMode::from(info.repeat_mode),
        is_liked: info.in_favorites,
    })
}

fn non_negative(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// `(path, body)` for a playback command
pub fn command_request(command: &PlaybackCommand) -> (&'static str, Option<Value>) {
    match command {
        PlaybackCommand::PlayPause => ("/playpause", None),
        PlaybackCommand::Next => ("/next", None),
        PlaybackCommand::Prev => ("/previous", None),
        PlaybackCommand::Shuffle => ("/toggle-shuffle", None),
        PlaybackCommand::Repeat => ("/toggle-repeat", None),
        PlaybackCommand::Seek { position_ms } => (
            "/seek",
            Some(json!({ "position": *position_ms as f64 / 1000.0 })),
        ),
        PlaybackCommand::Volume { level } => ("/volume", Some(json!({ "volume": level }))),
        PlaybackCommand::Like => ("/set-rating", Some(json!({ "rating": 1 }))),
        PlaybackCommand::AddTrack { track_id } => (
            "/play-next",
            Some(json!({ "type": "songs", "id": track_id })),
        ),
    }
}

pub struct CiderBackend {
    client: reqwest::Client,
    endpoint: HttpEndpoint,
    last: Mutex<Option<TrackSnapshot>>,
}

impl CiderBackend {
    pub fn new(client: reqwest::Client, endpoint: HttpEndpoint) -> Self {
        Self {
            client,
            endpoint,
            last: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        self.endpoint.url(&format!("/api/v1/playback{}", path))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.endpoint.token {
            Some(token) => request.header("apptoken", token),
            None => request,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, PlaybackError> {
        let response = self
            .authorize(self.client.get(self.url(path)))
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
impl PlaybackBackend for CiderBackend {
    async fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        let (path, body) = command_request(&command);
        let mut request = self.authorize(self.client.post(self.url(path)));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| PlaybackError::Http(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }

    async fn current_track(&self) -> Result<Option<TrackSnapshot>, PlaybackError> {
        let playing: IsPlayingResponse = self.get_json("/is-playing").await?;
        let now_playing: NowPlayingResponse = self.get_json("/now-playing").await?;
        let mut last = self.last.lock().await;

        match snapshot_from_now_playing(&now_playing, playing.is_playing) {
            Some(snapshot) => {
                *last = Some(snapshot.clone());
                Ok(Some(snapshot))
            }
            None => Ok(last.clone().map(|mut snapshot| {
                snapshot.is_playing = false;
                if let Some(info) = &now_playing.info {
                    snapshot.progress = non_negative(info.current_playback_time * 1000.0);
                }
                snapshot
            })),
        }
    }

    async fn resolve(&self, _link: &str) -> Result<ResolvedTrack, PlaybackError> {
        Err(PlaybackError::Unsupported {
            platform: Platform::Cider.to_string(),
            operation: "resolve",
        })
    }
}
