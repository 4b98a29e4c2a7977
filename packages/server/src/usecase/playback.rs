//! UseCase: Playback Facade
//!
//! 有効なバックエンドを 1 つ保持し、操作・再生状態の取得・リンクの解決を
//! バックエンドの種類に関係なく同じ形で提供する。エラーはここで握りつぶし、
//! 呼び出し側（ポーリングループやチャット）を止めない。

use std::{sync::Arc, time::Duration};

use tokio::sync::RwLock;

use crate::domain::{
    BackendProvider, PlaybackBackend, PlaybackCommand, PlaybackError, Platform, ResolvedTrack,
    TrackSnapshot,
};

struct ActiveBackend {
    platform: Platform,
    backend: Arc<dyn PlaybackBackend>,
}

pub struct PlaybackFacade {
    provider: Arc<dyn BackendProvider>,
    active: RwLock<ActiveBackend>,
    last_snapshot: RwLock<Option<TrackSnapshot>>,
}

impl PlaybackFacade {
    pub fn new(provider: Arc<dyn BackendProvider>, platform: Platform) -> Self {
        let backend = provider.backend_for(&platform);
        Self {
            provider,
            active: RwLock::new(ActiveBackend { platform, backend }),
            last_snapshot: RwLock::new(None),
        }
    }

    /// ロックを保持したまま呼び出さないよう、バックエンドを複製して返す
    async fn backend(&self) -> Arc<dyn PlaybackBackend> {
        self.active.read().await.backend.clone()
    }

    pub async fn platform(&self) -> Platform {
        self.active.read().await.platform.clone()
    }

    pub async fn poll_interval(&self) -> Duration {
        self.active.read().await.platform.poll_interval()
    }

    /// バックエンドを切り替える。実行中の呼び出しは待たない
    pub async fn update_backend(&self, platform: Platform) {
        let backend = self.provider.backend_for(&platform);
        let mut active = self.active.write().await;
        tracing::info!("Playback backend switched: {} -> {}", active.platform, platform);
        *active = ActiveBackend { platform, backend };
    }

    /// 操作を送る。失敗はログに残すだけ
    pub async fn issue_command(&self, command: PlaybackCommand) {
        let name = command.name();
        if let Err(e) = self.try_issue_command(command).await {
            tracing::warn!("Playback command '{}' failed: {}", name, e);
        }
    }

    pub async fn try_issue_command(&self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        tracing::debug!("Issuing playback command '{}'", command.name());
        self.backend().await.send(command).await
    }

    /// 現在の再生状態。取得できなければ None
    pub async fn get_current_song(&self) -> Option<TrackSnapshot> {
        match self.backend().await.current_track().await {
            Ok(Some(snapshot)) => {
                *self.last_snapshot.write().await = Some(snapshot.clone());
                Some(snapshot)
            }
            Ok(None) => None,
            Err(e @ (PlaybackError::NoResponse { .. } | PlaybackError::NoClient(_))) => {
                tracing::debug!("No current track: {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to get current track: {}", e);
                None
            }
        }
    }

    pub async fn resolve_track(&self, link: &str) -> Result<ResolvedTrack, PlaybackError> {
        self.backend().await.resolve(link).await
    }

    /// 最後に取得できた再生状態
    pub async fn last_snapshot(&self) -> Option<TrackSnapshot> {
        self.last_snapshot.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientType, MockBackendProvider, MockPlaybackBackend};

    fn relay() -> Platform {
        Platform::Relay(ClientType::new("spotify").unwrap())
    }

    fn provider_returning(backend: MockPlaybackBackend) -> Arc<MockBackendProvider> {
        let backend: Arc<dyn PlaybackBackend> = Arc::new(backend);
        let mut provider = MockBackendProvider::new();
        provider
            .expect_backend_for()
            .returning(move |_| backend.clone());
        Arc::new(provider)
    }

    #[tokio::test]
    async fn test_issue_command_swallows_errors() {
        // テスト項目: 操作の失敗は呼び出し側に伝わらない
        // given (前提条件):
        let mut backend = MockPlaybackBackend::new();
        backend
            .expect_send()
            .times(1)
            .returning(|_| Err(PlaybackError::NoClient("spotify".to_string())));
        let facade = PlaybackFacade::new(provider_returning(backend), relay());

        // when (操作):
        facade.issue_command(PlaybackCommand::Next).await;

        // then (期待する結果):
        // パニックせずに戻る（mock が 1 回の呼び出しを検証する）
    }

    #[tokio::test]
    async fn test_get_current_song_caches_last_snapshot() {
        // テスト項目: 取得できた再生状態は保持され、タイムアウト時は None
        // given (前提条件):
        let mut backend = MockPlaybackBackend::new();
        let mut calls = 0;
        backend.expect_current_track().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(Some(TrackSnapshot {
                    id: "abc".to_string(),
                    ..TrackSnapshot::default()
                }))
            } else {
                Err(PlaybackError::NoResponse {
                    client_type: "spotify".to_string(),
                    timeout_ms: 1500,
                })
            }
        });
        let facade = PlaybackFacade::new(provider_returning(backend), relay());

        // when (操作):
        let first = facade.get_current_song().await;
        let second = facade.get_current_song().await;

        // then (期待する結果):
        assert_eq!(first.map(|s| s.id), Some("abc".to_string()));
        assert!(second.is_none());
        assert_eq!(facade.last_snapshot().await.unwrap().id, "abc");
    }

    #[tokio::test]
    async fn test_update_backend_switches_platform_and_interval() {
        // テスト項目: バックエンドの切り替えでポーリング間隔も変わる
        // given (前提条件):
        let facade = PlaybackFacade::new(provider_returning(MockPlaybackBackend::new()), relay());

        // when (操作):
        facade.update_backend(Platform::Cider).await;

        // then (期待する結果):
        assert_eq!(facade.platform().await, Platform::Cider);
        assert_eq!(facade.poll_interval().await, Duration::from_millis(2000));
    }
}
