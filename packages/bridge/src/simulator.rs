//! Simulated player.
//!
//! ブラウザのプレイヤーの代わりに、時計に合わせて再生位置が進むだけの
//! 最小のプレイヤー。リレーからのコマンドを反映し、`currentTrack` と
//! `requestHandled` の応答を組み立てる。

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use encore_server::infrastructure::dto::websocket::{OutboundCommand, RelayCommand};
use encore_shared::time::Clock;
use serde_json::{Value, json};

const DEFAULT_DURATION_MS: u64 = 180_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTrack {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
}

impl SimulatedTrack {
    pub fn new(id: &str, title: &str, artist: &str, duration_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: String::new(),
            duration_ms,
        }
    }

    /// メタデータが分からない曲のための仮の曲
    fn placeholder(id: &str) -> Self {
        Self::new(id, &format!("Track {}", id), "Unknown Artist", DEFAULT_DURATION_MS)
    }

    fn to_data(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "artist": self.artist,
            "album": self.album,
            "duration": self.duration_ms,
        })
    }
}

pub struct SimulatedPlayer {
    clock: Arc<dyn Clock>,
    playlist: Vec<SimulatedTrack>,
    index: usize,
    /// addTrack で積まれた曲。プレイリストより先に再生する
    up_next: VecDeque<SimulatedTrack>,
    /// getInfo で解決した曲
    catalog: HashMap<String, SimulatedTrack>,
    current: SimulatedTrack,
    position_ms: u64,
    resumed_at: Option<i64>,
    volume: f64,
    shuffle: bool,
    repeat: u8,
    liked: bool,
}

impl SimulatedPlayer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_playlist(clock, demo_playlist())
    }

    /// 空のプレイヤーリストは仮の曲 1 つに置き換える
    pub fn with_playlist(clock: Arc<dyn Clock>, playlist: Vec<SimulatedTrack>) -> Self {
        let playlist = if playlist.is_empty() {
            vec![SimulatedTrack::placeholder("demo")]
        } else {
            playlist
        };
        let current = playlist[0].clone();
        let resumed_at = Some(clock.now_millis());
        Self {
            clock,
            playlist,
            index: 0,
            up_next: VecDeque::new(),
            catalog: HashMap::new(),
            current,
            position_ms: 0,
            resumed_at,
            volume: 0.5,
            shuffle: false,
            repeat: 0,
            liked: false,
        }
    }

    pub fn current(&mut self) -> &SimulatedTrack {
        self.settle();
        &self.current
    }

    pub fn is_playing(&self) -> bool {
        self.resumed_at.is_some()
    }

    pub fn progress(&mut self) -> u64 {
        self.settle();
        self.position_ms
    }

    /// リレーからのコマンドを反映する。未対応のコマンドは `false`
    pub fn apply(&mut self, command: &OutboundCommand) -> bool {
        self.settle();
        let data = command.data.as_ref();
        match command.command {
            RelayCommand::PlayPause => {
                if self.resumed_at.is_some() {
                    self.resumed_at = None;
                } else {
                    self.resumed_at = Some(self.clock.now_millis());
                }
            }
            RelayCommand::Next => self.advance(),
            RelayCommand::Prev => {
                self.index = (self.index + self.playlist.len() - 1) % self.playlist.len();
                self.start(self.playlist[self.index].clone());
            }
            RelayCommand::Shuffle => self.shuffle = !self.shuffle,
            RelayCommand::Repeat => self.repeat = (self.repeat + 1) % 3,
            RelayCommand::Like => self.liked = !self.liked,
            RelayCommand::Seek => {
                let position = data.and_then(|d| d.get("position")).and_then(Value::as_u64);
                if let Some(position) = position {
                    self.position_ms = position.min(self.current.duration_ms);
                    if self.resumed_at.is_some() {
                        self.resumed_at = Some(self.clock.now_millis());
                    }
                }
            }
            RelayCommand::Volume => {
                let volume = data.and_then(|d| d.get("volume")).and_then(Value::as_f64);
                if let Some(volume) = volume {
                    self.volume = volume.clamp(0.0, 1.0);
                }
            }
            RelayCommand::AddTrack => {
                let Some(id) = data.and_then(|d| d.get("id")).and_then(Value::as_str) else {
                    return false;
                };
                let track = self
                    .catalog
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| SimulatedTrack::placeholder(id));
                self.up_next.push_back(track);
            }
            _ => return false,
        }
        true
    }

    /// `getdata` への応答。要求の requestId があればそのまま返す
    pub fn current_track_message(&mut self, request_id: Option<&Value>) -> Value {
        self.settle();
        let mut message = json!({
            "command": "currentTrack",
            "data": self.current.to_data(),
            "id": self.current.id,
            "isPlaying": self.is_playing(),
            "progress": self.position_ms,
            "volume": self.volume,
            "shuffle": self.shuffle,
            "repeat": self.repeat,
            "isLiked": self.liked,
        });
        if let Some(request_id) = request_id {
            message["requestId"] = request_id.clone();
        }
        message
    }

    /// `getInfo` への応答。リンクの末尾を曲 ID とみなす
    pub fn request_handled_message(&mut self, url: &str, request_id: Option<&Value>) -> Value {
        let id = track_id_from_link(url);
        let track = self
            .playlist
            .iter()
            .find(|track| track.id == id)
            .cloned()
            .unwrap_or_else(|| SimulatedTrack::placeholder(&id));
        self.catalog.insert(track.id.clone(), track.clone());

        let mut message = json!({
            "command": "requestHandled",
            "data": track.to_data(),
        });
        if let Some(request_id) = request_id {
            message["requestId"] = request_id.clone();
        }
        message
    }

    /// 時計に合わせて再生位置を進め、終わった曲を次へ送る
    fn settle(&mut self) {
        let Some(resumed_at) = self.resumed_at else {
            return;
        };
        let now = self.clock.now_millis();
        let mut elapsed = now.saturating_sub(resumed_at).max(0) as u64;
        self.resumed_at = Some(now);

        while self.current.duration_ms > 0 && self.position_ms + elapsed >= self.current.duration_ms {
            elapsed -= self.current.duration_ms - self.position_ms;
            self.advance();
        }
        self.position_ms += elapsed;
    }

    fn advance(&mut self) {
        let next = match self.up_next.pop_front() {
            Some(track) => track,
            None => {
                self.index = (self.index + 1) % self.playlist.len();
                self.playlist[self.index].clone()
            }
        };
        self.start(next);
    }

    fn start(&mut self, track: SimulatedTrack) {
        self.current = track;
        self.position_ms = 0;
        self.liked = false;
    }
}

/// `https://open.spotify.com/track/abc?si=x` から `abc` を取り出す
pub fn track_id_from_link(link: &str) -> String {
    let without_query = link.split(['?', '#']).next().unwrap_or(link);
    without_query
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(link)
        .to_string()
}

fn demo_playlist() -> Vec<SimulatedTrack> {
    vec![
        SimulatedTrack::new("demo-1", "Opening Theme", "The Simulators", 150_000),
        SimulatedTrack::new("demo-2", "Loopback", "Localhost Trio", 200_000),
        SimulatedTrack::new("demo-3", "Encore", "The Simulators", 170_000),
    ]
}
