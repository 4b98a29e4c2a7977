//! Entities
//!
//! 接続クライアント、再生スナップショット、リクエストキューを定義します。
//! キューの不変条件（再生中アイテムは高々 1 つ、ポインタは有効な位置を指す）は
//! `Queue` のメソッドだけが保証し、外部から直接フィールドを書き換えない。

use serde::{Deserialize, Serialize};

use super::value_object::{ClientHandle, ClientType, QueueItemId, RepeatMode, Timestamp};

/// カバー画像が無いリクエストに使う画像
pub const DEFAULT_COVER_URL: &str = "/assets/default-cover.png";

/// リレーに接続中のクライアント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedClient {
    pub handle: ClientHandle,
    pub client_type: ClientType,
    pub connected_at: Timestamp,
    pub version: Option<String>,
}

impl ConnectedClient {
    /// 接続直後のクライアント（種別は `"unknown"`）
    pub fn new(handle: ClientHandle, connected_at: Timestamp) -> Self {
        Self {
            handle,
            client_type: ClientType::unknown(),
            connected_at,
            version: None,
        }
    }

    pub fn is_identified(&self) -> bool {
        !self.client_type.is_unknown()
    }

    pub fn identify(&mut self, client_type: ClientType, version: Option<String>) {
        self.client_type = client_type;
        self.version = version;
    }
}

/// 正規化された再生状態のスナップショット
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSnapshot {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// ミリ秒
    pub duration: u64,
    /// ミリ秒
    pub progress: u64,
    pub cover: Option<String>,
    pub is_playing: bool,
    /// 0.0 - 1.0
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub is_liked: bool,
}

impl TrackSnapshot {
    /// 残り時間（ミリ秒）。進捗が長さを超えていれば 0
    pub fn remaining(&self) -> u64 {
        self.duration.saturating_sub(self.progress)
    }
}

/// バックエンドが解決した曲のメタデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTrack {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: u64,
    pub cover: Option<String>,
}

/// リクエスト 1 件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: QueueItemId,
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: u64,
    pub requested_by: String,
    pub platform: String,
    pub cover: String,
    pub is_currently_playing: bool,
    pub is_queued: bool,
}

impl QueueItem {
    pub fn from_resolved(track: ResolvedTrack, requested_by: &str, platform: &str) -> Self {
        Self {
            id: QueueItemId::compose(&track.id, requested_by),
            track_id: track.id,
            title: track.title,
            artist: track.artist,
            album: track.album,
            duration: track.duration,
            requested_by: requested_by.to_string(),
            platform: platform.to_string(),
            cover: track.cover.unwrap_or_default(),
            is_currently_playing: false,
            is_queued: false,
        }
    }
}

/// リクエストキュー
///
/// 並び順がそのまま優先順位（FIFO）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    items: Vec<QueueItem>,
    currently_playing: Option<usize>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn currently_playing_index(&self) -> Option<usize> {
        self.currently_playing
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    pub fn contains(&self, id: &QueueItemId) -> bool {
        self.position_of(id).is_some()
    }

    pub fn position_of(&self, id: &QueueItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// 末尾に追加する。カバー画像を補い、`is_queued` を初期化する
    pub fn push(&mut self, mut item: QueueItem) {
        if item.cover.trim().is_empty() {
            item.cover = DEFAULT_COVER_URL.to_string();
        }
        item.is_queued = false;
        item.is_currently_playing = false;
        self.items.push(item);
    }

    /// 指定位置のアイテムを取り除く
    ///
    /// 範囲外なら `false` を返し何も変更しない。取り除いた位置が再生中アイテムより
    /// 前ならポインタを 1 つ詰め、再生中アイテム自身を取り除いた場合はポインタを外す。
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.items.remove(index);

        self.currently_playing = match self.currently_playing {
            Some(playing) if index < playing => Some(playing - 1),
            Some(playing) if index == playing => None,
            other => other,
        };
        if self.items.is_empty() {
            self.currently_playing = None;
        }
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.currently_playing = None;
    }

    /// 再生中アイテムを設定する
    ///
    /// まず全アイテムのフラグを下ろす。範囲外の位置は「再生中なし」として扱う。
    pub fn set_currently_playing(&mut self, index: usize) {
        for item in &mut self.items {
            item.is_currently_playing = false;
        }
        match self.items.get_mut(index) {
            Some(item) => {
                item.is_currently_playing = true;
                self.currently_playing = Some(index);
            }
            None => self.currently_playing = None,
        }
    }

    /// バックエンドのキューに渡したことを記録する
    pub fn set_track_as_queued(&mut self, index: usize) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.is_queued = true;
                true
            }
            None => false,
        }
    }

    /// 次にバックエンドへ渡すべきアイテム（未キュー・非再生中の先頭）
    pub fn next_to_queue(&self) -> Option<(usize, &QueueItem)> {
        self.items
            .iter()
            .enumerate()
            .find(|(_, item)| !item.is_queued && !item.is_currently_playing)
    }

    /// まだ再生されていない、指定ユーザーのリクエスト数
    pub fn pending_requests_by(&self, requested_by: &str) -> usize {
        self.items
            .iter()
            .filter(|item| !item.is_currently_playing)
            .filter(|item| item.requested_by.eq_ignore_ascii_case(requested_by))
            .count()
    }

    /// 不変条件を満たしているか
    pub fn is_consistent(&self) -> bool {
        let flagged: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_currently_playing)
            .map(|(index, _)| index)
            .collect();

        match self.currently_playing {
            None => flagged.is_empty(),
            Some(index) => index < self.items.len() && flagged == vec![index],
        }
    }
}
