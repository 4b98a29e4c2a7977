//! Conversion logic between DTOs and domain entities.

use serde_json::{Value, json};

use crate::domain::{
    ConnectedClient, PlaybackCommand, Queue, QueueItem, RepeatMode, ResolvedTrack, TrackSnapshot,
};
use crate::infrastructure::dto::{
    http as http_dto,
    websocket::{CurrentTrackMessage, OutboundCommand, RelayCommand, RequestHandledMessage},
};
use encore_shared::time::timestamp_to_rfc3339;

// ========================================
// DTO → Domain Entity
// ========================================

impl From<&CurrentTrackMessage> for TrackSnapshot {
    fn from(message: &CurrentTrackMessage) -> Self {
        let data = &message.data;
        Self {
            id: message
                .id
                .clone()
                .or_else(|| data.id.clone())
                .unwrap_or_default(),
            title: data.title.clone().unwrap_or_default(),
            artist: data.artist.as_ref().map(join_names).unwrap_or_default(),
            album: data.album.as_ref().map(join_names).unwrap_or_default(),
            duration: data.duration.map(to_millis).unwrap_or_default(),
            progress: message.progress.map(to_millis).unwrap_or_default(),
            cover: data.cover.clone().filter(|cover| !cover.is_empty()),
            is_playing: message.is_playing.unwrap_or(false),
            volume: message.volume.map(normalize_volume).unwrap_or(1.0),
            shuffle: message.shuffle.unwrap_or(false),
            repeat: message.repeat.map(RepeatMode::from).unwrap_or_default(),
            is_liked: message.is_liked.unwrap_or(false),
        }
    }
}

impl From<&RequestHandledMessage> for ResolvedTrack {
    fn from(message: &RequestHandledMessage) -> Self {
        resolved_track_from_value(&message.data)
    }
}

/// Build track metadata from a loosely shaped bridge payload
pub fn resolved_track_from_value(data: &Value) -> ResolvedTrack {
    let text = |keys: &[&str]| {
        keys.iter()
            .filter_map(|key| data.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    };

    ResolvedTrack {
        id: text(&["id", "trackId", "videoId"]).unwrap_or_default(),
        title: text(&["title", "name"]).unwrap_or_default(),
        artist: ["artist", "artists"]
            .iter()
            .find_map(|key| data.get(*key))
            .map(join_names)
            .unwrap_or_default(),
        album: data.get("album").map(join_names).unwrap_or_default(),
        duration: data
            .get("duration")
            .and_then(Value::as_f64)
            .map(to_millis)
            .unwrap_or_default(),
        cover: text(&["cover", "image", "coverUrl", "artwork"]),
    }
}

impl From<http_dto::AddQueueItemRequest> for QueueItem {
    fn from(request: http_dto::AddQueueItemRequest) -> Self {
        let platform = request.platform.unwrap_or_default();
        QueueItem::from_resolved(
            ResolvedTrack {
                id: request.track_id,
                title: request.title,
                artist: request.artist,
                album: request.album,
                duration: request.duration,
                cover: request.cover,
            },
            &request.requested_by,
            &platform,
        )
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&PlaybackCommand> for OutboundCommand {
    fn from(command: &PlaybackCommand) -> Self {
        match command {
            PlaybackCommand::PlayPause => Self::new(RelayCommand::PlayPause),
            PlaybackCommand::Next => Self::new(RelayCommand::Next),
            PlaybackCommand::Prev => Self::new(RelayCommand::Prev),
            PlaybackCommand::Shuffle => Self::new(RelayCommand::Shuffle),
            PlaybackCommand::Repeat => Self::new(RelayCommand::Repeat),
            PlaybackCommand::Like => Self::new(RelayCommand::Like),
            PlaybackCommand::Seek { position_ms } => {
                Self::new(RelayCommand::Seek).with_data(json!({ "position": position_ms }))
            }
            PlaybackCommand::Volume { level } => {
                Self::new(RelayCommand::Volume).with_data(json!({ "volume": level }))
            }
            PlaybackCommand::AddTrack { track_id } => {
                Self::new(RelayCommand::AddTrack).with_data(json!({ "id": track_id }))
            }
        }
    }
}

impl From<&Queue> for http_dto::QueueDto {
    fn from(queue: &Queue) -> Self {
        Self {
            items: queue.items().to_vec(),
            currently_playing_index: queue
                .currently_playing_index()
                .map(|index| index as i64)
                .unwrap_or(-1),
            count: queue.len(),
        }
    }
}

impl From<&ConnectedClient> for http_dto::ClientDto {
    fn from(client: &ConnectedClient) -> Self {
        Self {
            handle: client.handle.to_string(),
            client_type: client.client_type.to_string(),
            connected_at: timestamp_to_rfc3339(client.connected_at.value()),
            version: client.version.clone(),
        }
    }
}

/// Overlay view of a snapshot. Title and artist are masked while hidden.
pub fn now_playing_dto(snapshot: &TrackSnapshot, hidden: bool) -> http_dto::NowPlayingDto {
    const MASK: &str = "???";
    let mask = |value: &str| {
        if hidden {
            MASK.to_string()
        } else {
            value.to_string()
        }
    };

    http_dto::NowPlayingDto {
        id: snapshot.id.clone(),
        title: mask(&snapshot.title),
        artist: mask(&snapshot.artist),
        album: mask(&snapshot.album),
        duration: snapshot.duration,
        progress: snapshot.progress,
        cover: if hidden { None } else { snapshot.cover.clone() },
        is_playing: snapshot.is_playing,
        hidden,
    }
}

// ========================================
// helpers
// ========================================

/// Join a string, an array of strings or an array of `{name}` objects.
fn join_names(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(values) => values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => v.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn to_millis(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Bridges report either 0-1 or 0-100.
fn normalize_volume(value: f64) -> f32 {
    let value = if value > 1.0 { value / 100.0 } else { value };
    value.clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueItemId;
    use crate::infrastructure::dto::websocket::{CurrentTrackData, InboundMessage};

    #[test]
    fn test_current_track_to_snapshot() {
        // テスト項目: currentTrack メッセージが TrackSnapshot に変換される
        // given (前提条件):
        let text = json!({
            "command": "currentTrack",
            "data": {
                "title": "Song A",
                "artists": [{"name": "X"}, {"name": "Y"}],
                "album": {"name": "Album"},
                "duration": 200000.4,
                "cover": "https://img/a.jpg"
            },
            "id": "abc",
            "isPlaying": true,
            "progress": 1500,
            "volume": 65,
            "shuffle": true,
            "repeat": 2,
            "isLiked": true
        })
        .to_string();
        let InboundMessage::CurrentTrack(message) = InboundMessage::parse(&text).unwrap() else {
            panic!("expected currentTrack");
        };

        // when (操作):
        let snapshot = TrackSnapshot::from(message.as_ref());

        // then (期待する結果):
        assert_eq!(snapshot.id, "abc");
        assert_eq!(snapshot.title, "Song A");
        assert_eq!(snapshot.artist, "X, Y");
        assert_eq!(snapshot.album, "Album");
        assert_eq!(snapshot.duration, 200_000);
        assert_eq!(snapshot.progress, 1_500);
        assert!((snapshot.volume - 0.65).abs() < f32::EPSILON);
        assert!(snapshot.shuffle);
        assert_eq!(snapshot.repeat, RepeatMode::One);
        assert!(snapshot.is_liked);
    }

    #[test]
    fn test_current_track_falls_back_to_data_id() {
        // テスト項目: トップレベルに id が無ければ data.id を使う
        // given (前提条件):
        let message = CurrentTrackMessage {
            data: CurrentTrackData {
                id: Some("from-data".to_string()),
                ..CurrentTrackData::default()
            },
            ..CurrentTrackMessage::default()
        };

        // when (操作):
        let snapshot = TrackSnapshot::from(&message);

        // then (期待する結果):
        assert_eq!(snapshot.id, "from-data");
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.cover, None);
    }

    #[test]
    fn test_resolved_track_from_loose_payload() {
        // テスト項目: requestHandled のデータが ResolvedTrack に変換される
        // given (前提条件):
        let data = json!({"trackId": 42, "name": "Song B", "artist": "Z", "duration": 180000});

        // when (操作):
        let track = resolved_track_from_value(&data);

        // then (期待する結果):
        assert_eq!(track.id, "42");
        assert_eq!(track.title, "Song B");
        assert_eq!(track.artist, "Z");
        assert_eq!(track.duration, 180_000);
        assert_eq!(track.cover, None);
    }

    #[test]
    fn test_playback_command_to_relay_command() {
        // テスト項目: 再生操作がリレーのコマンド形式に変換される
        // given (前提条件):
        let commands = [
            PlaybackCommand::Seek { position_ms: 30_000 },
            PlaybackCommand::AddTrack {
                track_id: "abc".to_string(),
            },
            PlaybackCommand::PlayPause,
        ];

        // when (操作):
        let outbound: Vec<Value> = commands
            .iter()
            .map(|c| serde_json::to_value(OutboundCommand::from(c)).unwrap())
            .collect();

        // then (期待する結果):
        assert_eq!(outbound[0], json!({"command": "seek", "data": {"position": 30000}}));
        assert_eq!(outbound[1], json!({"command": "addTrack", "data": {"id": "abc"}}));
        assert_eq!(outbound[2], json!({"command": "PlayPause"}));
    }

    #[test]
    fn test_queue_to_dto_reports_minus_one_when_idle() {
        // テスト項目: 再生中アイテムが無いとき currentlyPlayingIndex は -1
        // given (前提条件):
        let mut queue = Queue::new();
        queue.push(crate::domain::entity::fixtures::item("abc", "alice"));

        // when (操作):
        let dto = http_dto::QueueDto::from(&queue);

        // then (期待する結果):
        assert_eq!(dto.currently_playing_index, -1);
        assert_eq!(dto.count, 1);
        assert_eq!(dto.items[0].id, QueueItemId::compose("abc", "alice"));
    }

    #[test]
    fn test_now_playing_is_masked_while_hidden() {
        // テスト項目: 非公開中はタイトルとアーティストが隠される
        // given (前提条件):
        let snapshot = TrackSnapshot {
            id: "abc".to_string(),
            title: "Midnight City".to_string(),
            artist: "M83".to_string(),
            cover: Some("https://img".to_string()),
            ..TrackSnapshot::default()
        };

        // when (操作):
        let hidden = now_playing_dto(&snapshot, true);
        let visible = now_playing_dto(&snapshot, false);

        // then (期待する結果):
        assert_eq!(hidden.title, "???");
        assert_eq!(hidden.artist, "???");
        assert_eq!(hidden.cover, None);
        assert_eq!(visible.title, "Midnight City");
        assert!(hidden.hidden);
    }
}
