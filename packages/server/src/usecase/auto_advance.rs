//! UseCase: Auto-Advance Monitor
//!
//! 一定間隔で再生状態をポーリングし、
//!
//! 1. 曲が変わったら、先頭のリクエストが今の曲なら再生中にし、猶予の後に取り除く
//! 2. 曲の残りが閾値以下になったら、次のリクエストをバックエンドのキューへ渡す
//! 3. guess-the-song のタイトル非公開・公開を判定する
//!
//! キューが空のときは 1 と 2 を行わない。照合は先頭のみ（FIFO）。

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use super::{notification::Notifier, playback::PlaybackFacade, queue::QueueEngine};
use crate::domain::{
    GuessGame, GuessResult, GuessSettings, OverlayAction, PlaybackCommand, QueueItemId,
    TrackSnapshot,
};
use encore_shared::time::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// 残り時間がこれ以下になったら次の曲をキューへ渡す（ミリ秒）
    pub auto_queue_threshold_ms: u64,
    /// 再生中にしてから取り除くまでの猶予
    pub reveal_grace: Duration,
    pub guess: GuessSettings,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            auto_queue_threshold_ms: 10_000,
            reveal_grace: Duration::from_millis(2_000),
            guess: GuessSettings::default(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    current_track_id: Option<String>,
    auto_queue_triggered: bool,
    last_requested_by: Option<String>,
}

/// 1 回のポーリングで起きたこと
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub track_changed: bool,
    pub reconciled: Option<QueueItemId>,
    pub auto_queued: Option<QueueItemId>,
    pub overlay: Option<OverlayAction>,
}

pub struct AutoAdvanceMonitor {
    facade: Arc<PlaybackFacade>,
    queue: Arc<QueueEngine>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    state: Mutex<SessionState>,
    guess: Mutex<GuessGame>,
}

impl AutoAdvanceMonitor {
    pub fn new(
        facade: Arc<PlaybackFacade>,
        queue: Arc<QueueEngine>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            facade,
            queue,
            notifier,
            clock,
            settings,
            state: Mutex::new(SessionState::default()),
            guess: Mutex::new(GuessGame::new()),
        }
    }

    /// 終了しないポーリングループ。呼び出し側が abort する
    pub async fn run(self: Arc<Self>) {
        tracing::info!("Auto-advance monitor started");
        loop {
            self.tick().await;
            let interval = self.facade.poll_interval().await;
            tokio::time::sleep(interval).await;
        }
    }

    pub async fn tick(&self) -> TickOutcome {
        match self.facade.get_current_song().await {
            Some(snapshot) => self.process_snapshot(&snapshot).await,
            None => TickOutcome::default(),
        }
    }

    pub async fn process_snapshot(&self, snapshot: &TrackSnapshot) -> TickOutcome {
        let mut outcome = TickOutcome {
            overlay: self.observe_guess(snapshot).await,
            ..TickOutcome::default()
        };

        let queue = self.queue.get_queue().await;
        if queue.is_empty() {
            return outcome;
        }

        let mut state = self.state.lock().await;
        if state.current_track_id.as_deref() != Some(snapshot.id.as_str()) {
            state.current_track_id = Some(snapshot.id.clone());
            state.auto_queue_triggered = false;
            outcome.track_changed = true;
            tracing::debug!("Track changed to '{}'", snapshot.id);

            if let Some(requested_by) = &state.last_requested_by {
                let expected = QueueItemId::compose(&snapshot.id, requested_by);
                if queue.get(0).is_some_and(|item| item.id == expected) {
                    self.reconcile(&expected, snapshot, requested_by).await;
                    outcome.reconciled = Some(expected);
                }
            }
            return outcome;
        }

        let near_end = snapshot.progress > 0
            && snapshot.remaining() <= self.settings.auto_queue_threshold_ms;
        if near_end && !state.auto_queue_triggered {
            let Some((index, item)) = self.queue.get_next_track_to_queue().await else {
                return outcome;
            };

            let command = PlaybackCommand::AddTrack {
                track_id: item.track_id.clone(),
            };
            match self.facade.try_issue_command(command).await {
                Ok(()) => {
                    self.queue.set_track_as_queued(index).await;
                    state.last_requested_by = Some(item.requested_by.clone());
                    tracing::info!("Auto-queued '{}' for {}", item.title, item.requested_by);
                    outcome.auto_queued = Some(item.id);
                }
                Err(e) => {
                    tracing::warn!("Auto-queue of '{}' failed: {}", item.title, e);
                    self.notifier
                        .warning(format!("Could not queue '{}': {}", item.title, e));
                }
            }
            state.auto_queue_triggered = true;
        }

        outcome
    }

    async fn reconcile(&self, id: &QueueItemId, snapshot: &TrackSnapshot, requested_by: &str) {
        self.queue.set_currently_playing(0).await;
        self.notifier.info(format!(
            "Now playing '{}' requested by {}",
            snapshot.title, requested_by
        ));

        let queue = self.queue.clone();
        let id = id.clone();
        let grace = self.settings.reveal_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if queue.remove_by_id(&id).await {
                tracing::debug!("Removed played request '{}'", id);
            }
        });
    }

    async fn observe_guess(&self, snapshot: &TrackSnapshot) -> Option<OverlayAction> {
        let mut game = self.guess.lock().await;
        let action = game.observe(snapshot, self.clock.now_millis(), &self.settings.guess);
        match action {
            Some(OverlayAction::Hide) => {
                tracing::info!("Guess-the-song: title hidden");
                self.notifier
                    .info("Guess the song! The next title is hidden.");
            }
            Some(OverlayAction::Reveal) if game.has_failed() => {
                self.notifier
                    .info("Nobody guessed the song in time. Title revealed.");
            }
            Some(OverlayAction::Reveal) => {
                tracing::info!("Guess-the-song: title revealed");
                self.notifier.info("Title revealed.");
            }
            None => {}
        }
        action
    }

    pub async fn submit_guess(&self, user: &str, guess: &str) -> GuessResult {
        let result = self.guess.lock().await.submit(guess);
        if let GuessResult::Correct { title } = &result {
            self.notifier
                .success(format!("{} guessed the song: {}", user, title));
        }
        result
    }

    /// guess-the-song でタイトルを隠している最中か
    pub async fn is_hidden(&self) -> bool {
        self.guess.lock().await.is_hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ClientType, MockBackendProvider, MockPlaybackBackend, PlaybackBackend, PlaybackError,
        Platform, entity::fixtures::item,
    };
    use crate::usecase::notification::NotificationLevel;
    use encore_shared::time::ManualClock;

    struct Harness {
        monitor: AutoAdvanceMonitor,
        queue: Arc<QueueEngine>,
        notifier: Notifier,
        clock: Arc<ManualClock>,
    }

    fn harness(backend: MockPlaybackBackend, settings: MonitorSettings) -> Harness {
        let backend: Arc<dyn PlaybackBackend> = Arc::new(backend);
        let mut provider = MockBackendProvider::new();
        provider
            .expect_backend_for()
            .returning(move |_| backend.clone());
        let facade = Arc::new(PlaybackFacade::new(
            Arc::new(provider),
            Platform::Relay(ClientType::new("spotify").unwrap()),
        ));
        let queue = Arc::new(QueueEngine::default());
        let notifier = Notifier::default();
        let clock = Arc::new(ManualClock::new(0));
        let monitor = AutoAdvanceMonitor::new(
            facade,
            queue.clone(),
            notifier.clone(),
            clock.clone(),
            settings,
        );
        Harness {
            monitor,
            queue,
            notifier,
            clock,
        }
    }

    fn fast_settings() -> MonitorSettings {
        MonitorSettings {
            reveal_grace: Duration::from_millis(20),
            ..MonitorSettings::default()
        }
    }

    fn playing(id: &str, progress: u64) -> TrackSnapshot {
        TrackSnapshot {
            id: id.to_string(),
            title: format!("Song {}", id),
            duration: 200_000,
            progress,
            is_playing: true,
            ..TrackSnapshot::default()
        }
    }

    #[tokio::test]
    async fn test_auto_queue_fires_once_per_track() {
        // テスト項目: 残り 10 秒以内で次のリクエストを 1 回だけキューへ渡す
        // given (前提条件):
        let mut backend = MockPlaybackBackend::new();
        backend
            .expect_send()
            .withf(|c| *c == PlaybackCommand::AddTrack { track_id: "a".to_string() })
            .times(1)
            .returning(|_| Ok(()));
        let h = harness(backend, fast_settings());
        h.queue.add_to_queue(item("a", "alice")).await;
        h.queue.add_to_queue(item("b", "bob")).await;
        h.monitor.process_snapshot(&playing("x", 100_000)).await;

        // when (操作):
        let first = h.monitor.process_snapshot(&playing("x", 191_000)).await;
        let second = h.monitor.process_snapshot(&playing("x", 195_000)).await;

        // then (期待する結果):
        assert_eq!(first.auto_queued, Some(QueueItemId::compose("a", "alice")));
        assert_eq!(second.auto_queued, None);
        let queue = h.queue.get_queue().await;
        assert!(queue.get(0).unwrap().is_queued);
        assert!(!queue.get(1).unwrap().is_queued);
    }

    #[tokio::test]
    async fn test_reconcile_then_remove_after_grace() {
        // テスト項目: キューへ渡した曲が始まると再生中になり、猶予の後に取り除かれる
        // given (前提条件):
        let mut backend = MockPlaybackBackend::new();
        backend.expect_send().returning(|_| Ok(()));
        let h = harness(backend, fast_settings());
        h.queue.add_to_queue(item("a", "alice")).await;
        h.queue.add_to_queue(item("b", "bob")).await;
        h.monitor.process_snapshot(&playing("x", 100_000)).await;
        h.monitor.process_snapshot(&playing("x", 195_000)).await;

        // when (操作):
        let outcome = h.monitor.process_snapshot(&playing("a", 500)).await;

        // then (期待する結果):
        let id = QueueItemId::compose("a", "alice");
        assert!(outcome.track_changed);
        assert_eq!(outcome.reconciled, Some(id.clone()));
        let queue = h.queue.get_queue().await;
        assert_eq!(queue.currently_playing_index(), Some(0));
        assert!(queue.is_consistent());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let queue = h.queue.get_queue().await;
        assert!(!queue.contains(&id));
        assert_eq!(queue.currently_playing_index(), None);
        assert_eq!(queue.get(0).unwrap().track_id, "b");
    }

    #[tokio::test]
    async fn test_reconcile_only_considers_head_of_queue() {
        // テスト項目: 先頭以外のアイテムが一致しても再生中にしない
        // given (前提条件):
        let mut backend = MockPlaybackBackend::new();
        backend.expect_send().returning(|_| Ok(()));
        let h = harness(backend, fast_settings());
        h.queue.add_to_queue(item("a", "alice")).await;
        h.monitor.process_snapshot(&playing("x", 100_000)).await;
        h.monitor.process_snapshot(&playing("x", 195_000)).await;
        // 先頭に別のリクエストを割り込ませる
        h.queue.remove_from_queue(0).await;
        h.queue.add_to_queue(item("z", "zoe")).await;
        h.queue.add_to_queue(item("a", "alice")).await;

        // when (操作):
        let outcome = h.monitor.process_snapshot(&playing("a", 500)).await;

        // then (期待する結果):
        assert!(outcome.track_changed);
        assert_eq!(outcome.reconciled, None);
        assert_eq!(h.queue.get_queue().await.currently_playing_index(), None);
    }

    #[tokio::test]
    async fn test_auto_queue_failure_notifies_and_does_not_retry() {
        // テスト項目: キューへの追加に失敗したら通知し、同じ曲の間は再試行しない
        // given (前提条件):
        let mut backend = MockPlaybackBackend::new();
        backend
            .expect_send()
            .times(1)
            .returning(|_| Err(PlaybackError::NoClient("spotify".to_string())));
        let h = harness(backend, fast_settings());
        let mut notifications = h.notifier.subscribe();
        h.queue.add_to_queue(item("a", "alice")).await;
        h.monitor.process_snapshot(&playing("x", 100_000)).await;

        // when (操作):
        let first = h.monitor.process_snapshot(&playing("x", 195_000)).await;
        let second = h.monitor.process_snapshot(&playing("x", 196_000)).await;

        // then (期待する結果):
        assert_eq!(first.auto_queued, None);
        assert_eq!(second.auto_queued, None);
        assert!(!h.queue.get_queue().await.get(0).unwrap().is_queued);
        let notification = notifications.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Warning);
    }

    #[tokio::test]
    async fn test_empty_queue_skips_advance_but_runs_guess_game() {
        // テスト項目: キューが空でも guess-the-song は動く
        // given (前提条件):
        let settings = MonitorSettings {
            guess: GuessSettings {
                enabled: true,
                ..GuessSettings::default()
            },
            ..fast_settings()
        };
        let h = harness(MockPlaybackBackend::new(), settings);
        h.monitor.process_snapshot(&playing("x", 100_000)).await;

        // when (操作):
        let outcome = h.monitor.process_snapshot(&playing("x", 195_000)).await;

        // then (期待する結果):
        assert_eq!(outcome.overlay, Some(OverlayAction::Hide));
        assert!(!outcome.track_changed);
        assert!(h.monitor.is_hidden().await);
    }

    #[tokio::test]
    async fn test_overlay_changes_are_announced() {
        // テスト項目: タイトルの非表示と時間切れの公開がそれぞれ通知される
        // given (前提条件):
        let settings = MonitorSettings {
            guess: GuessSettings {
                enabled: true,
                ..GuessSettings::default()
            },
            ..fast_settings()
        };
        let h = harness(MockPlaybackBackend::new(), settings);
        let mut notifications = h.notifier.subscribe();
        h.monitor.process_snapshot(&playing("x", 100_000)).await;

        // when (操作):
        let hidden = h.monitor.process_snapshot(&playing("x", 195_000)).await;
        h.monitor.process_snapshot(&playing("y", 1_000)).await;
        h.clock.advance(31_000);
        let revealed = h.monitor.process_snapshot(&playing("y", 32_000)).await;

        // then (期待する結果):
        assert_eq!(hidden.overlay, Some(OverlayAction::Hide));
        assert_eq!(revealed.overlay, Some(OverlayAction::Reveal));
        let hide_notice = notifications.recv().await.unwrap();
        assert_eq!(hide_notice.level, NotificationLevel::Info);
        assert!(hide_notice.message.contains("hidden"));
        let reveal_notice = notifications.recv().await.unwrap();
        assert!(reveal_notice.message.contains("revealed"));
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_guess_window_expires_then_correct_guess_is_inactive() {
        // テスト項目: 次の曲の開始から 30 秒で公開され、その後の回答は受け付けない
        // given (前提条件):
        let settings = MonitorSettings {
            guess: GuessSettings {
                enabled: true,
                ..GuessSettings::default()
            },
            ..fast_settings()
        };
        let h = harness(MockPlaybackBackend::new(), settings);
        h.monitor.process_snapshot(&playing("x", 195_000)).await;
        h.monitor.process_snapshot(&playing("y", 1_000)).await;

        // when (操作):
        h.clock.advance(31_000);
        let outcome = h.monitor.process_snapshot(&playing("y", 32_000)).await;
        let late = h.monitor.submit_guess("alice", "Song y").await;

        // then (期待する結果):
        assert_eq!(outcome.overlay, Some(OverlayAction::Reveal));
        assert_eq!(late, GuessResult::NotActive);
    }

    #[tokio::test]
    async fn test_correct_guess_reveals_title() {
        // テスト項目: 正解すると即座に公開される
        // given (前提条件):
        let settings = MonitorSettings {
            guess: GuessSettings {
                enabled: true,
                ..GuessSettings::default()
            },
            ..fast_settings()
        };
        let h = harness(MockPlaybackBackend::new(), settings);
        h.monitor.process_snapshot(&playing("x", 195_000)).await;
        h.monitor.process_snapshot(&playing("y", 1_000)).await;
        let mut notifications = h.notifier.subscribe();

        // when (操作):
        let result = h.monitor.submit_guess("alice", "  song Y ").await;

        // then (期待する結果):
        assert_eq!(
            result,
            GuessResult::Correct {
                title: "Song y".to_string()
            }
        );
        assert!(!h.monitor.is_hidden().await);
        assert_eq!(
            notifications.recv().await.unwrap().level,
            NotificationLevel::Success
        );
    }
}
