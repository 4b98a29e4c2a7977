//! Playback backend abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use super::{PlaybackCommand, PlaybackError, Platform, ResolvedTrack, TrackSnapshot};

/// 再生バックエンド（リレー経由ブリッジ / 動画アプリ API / 音楽アプリ API）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// 操作を送る
    async fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackError>;

    /// 現在の再生状態を取得する。何も再生していなければ `Ok(None)`
    async fn current_track(&self) -> Result<Option<TrackSnapshot>, PlaybackError>;

    /// リクエストされたリンクを曲のメタデータに解決する
    async fn resolve(&self, link: &str) -> Result<ResolvedTrack, PlaybackError>;
}

/// プラットフォームに対応するバックエンドを作る
#[cfg_attr(test, mockall::automock)]
pub trait BackendProvider: Send + Sync {
    fn backend_for(&self, platform: &Platform) -> Arc<dyn PlaybackBackend>;
}
