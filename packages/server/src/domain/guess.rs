//! Guess-the-song game.
//!
//! 曲の終わり際にオーバーレイのタイトルを隠し、次の曲の開始から一定時間内に
//! チャットが当てられるかを判定する純粋な状態機械。時刻は呼び出し側が渡す。

use super::entity::TrackSnapshot;

/// ゲームの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessSettings {
    pub enabled: bool,
    /// 残り時間がこれ以下になったらタイトルを隠す（ミリ秒）
    pub hide_threshold_ms: u64,
    /// 曲の開始からこの時間が過ぎたら失敗として公開する（ミリ秒）
    pub window_ms: u64,
}

impl Default for GuessSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            hide_threshold_ms: 6_000,
            window_ms: 30_000,
        }
    }
}

/// オーバーレイへの指示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Hide,
    Reveal,
}

/// 回答の判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessResult {
    /// 正解。タイトルを公開する
    Correct { title: String },
    Incorrect,
    /// タイトルが隠れていない、または判定済み
    NotActive,
}

#[derive(Debug, Clone, Default)]
pub struct GuessGame {
    track_id: Option<String>,
    title: String,
    started_at_ms: i64,
    hidden: bool,
    has_guessed: bool,
    failed: bool,
}

impl GuessGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn has_guessed(&self) -> bool {
        self.has_guessed
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// ポーリングごとのスナップショットを反映する
    pub fn observe(
        &mut self,
        snapshot: &TrackSnapshot,
        now_ms: i64,
        settings: &GuessSettings,
    ) -> Option<OverlayAction> {
        if self.track_id.as_deref() != Some(snapshot.id.as_str()) {
            self.track_id = Some(snapshot.id.clone());
            self.title = snapshot.title.clone();
            self.started_at_ms = now_ms;
            self.has_guessed = false;
            self.failed = false;
        }

        if !settings.enabled {
            if self.hidden {
                self.hidden = false;
                return Some(OverlayAction::Reveal);
            }
            return None;
        }

        let remaining = snapshot.remaining();
        let in_hide_window =
            snapshot.duration > 0 && snapshot.progress > 0 && remaining <= settings.hide_threshold_ms;

        if !self.hidden && in_hide_window {
            self.hidden = true;
            return Some(OverlayAction::Hide);
        }

        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        if self.hidden
            && !self.has_guessed
            && !self.failed
            && !in_hide_window
            && elapsed > settings.window_ms as i64
        {
            self.failed = true;
            self.hidden = false;
            return Some(OverlayAction::Reveal);
        }

        None
    }

    /// チャットからの回答を判定する
    pub fn submit(&mut self, guess: &str) -> GuessResult {
        if !self.hidden || self.has_guessed {
            return GuessResult::NotActive;
        }
        if titles_match(&self.title, guess) {
            self.has_guessed = true;
            self.hidden = false;
            GuessResult::Correct {
                title: self.title.clone(),
            }
        } else {
            GuessResult::Incorrect
        }
    }
}

/// 前後の空白と大文字小文字を無視した完全一致
pub fn titles_match(actual: &str, guess: &str) -> bool {
    let guess = guess.trim();
    !guess.is_empty() && actual.trim().to_lowercase() == guess.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> GuessSettings {
        GuessSettings {
            enabled: true,
            ..GuessSettings::default()
        }
    }

    fn snapshot(id: &str, title: &str, progress: u64) -> TrackSnapshot {
        TrackSnapshot {
            id: id.to_string(),
            title: title.to_string(),
            duration: 200_000,
            progress,
            is_playing: true,
            ..TrackSnapshot::default()
        }
    }

    #[test]
    fn test_titles_match_ignores_case_and_whitespace() {
        // テスト項目: 大文字小文字と前後の空白を無視して一致判定する
        // given (前提条件):
        let actual = "Midnight City";

        // when (操作) / then (期待する結果):
        assert!(titles_match(actual, "  midnight city "));
        assert!(!titles_match(actual, "midnight"));
        assert!(!titles_match(actual, "   "));
    }

    #[test]
    fn test_hides_near_end_of_track() {
        // テスト項目: 残り 6 秒以下でタイトルを隠す（一度だけ）
        // given (前提条件):
        let mut game = GuessGame::new();
        let settings = enabled();
        assert_eq!(game.observe(&snapshot("a", "Song A", 100_000), 0, &settings), None);

        // when (操作):
        let first = game.observe(&snapshot("a", "Song A", 194_000), 500, &settings);
        let second = game.observe(&snapshot("a", "Song A", 194_500), 1_000, &settings);

        // then (期待する結果):
        assert_eq!(first, Some(OverlayAction::Hide));
        assert_eq!(second, None);
        assert!(game.is_hidden());
    }

    #[test]
    fn test_disabled_game_never_hides() {
        // テスト項目: 無効時はタイトルを隠さない
        // given (前提条件):
        let mut game = GuessGame::new();
        let settings = GuessSettings::default();

        // when (操作):
        let action = game.observe(&snapshot("a", "Song A", 199_000), 0, &settings);

        // then (期待する結果):
        assert_eq!(action, None);
        assert!(!game.is_hidden());
    }

    #[test]
    fn test_reveals_after_window_without_guess() {
        // テスト項目: 次の曲の開始から 30 秒経っても正解がなければ失敗として公開する
        // given (前提条件):
        let mut game = GuessGame::new();
        let settings = enabled();
        game.observe(&snapshot("a", "Song A", 195_000), 0, &settings);
        assert!(game.is_hidden());
        game.observe(&snapshot("b", "Song B", 1_000), 5_000, &settings);

        // when (操作):
        let before_window = game.observe(&snapshot("b", "Song B", 20_000), 25_000, &settings);
        let after_window = game.observe(&snapshot("b", "Song B", 31_000), 35_001, &settings);

        // then (期待する結果):
        assert_eq!(before_window, None);
        assert_eq!(after_window, Some(OverlayAction::Reveal));
        assert!(game.has_failed());
        assert!(!game.has_guessed());
    }

    #[test]
    fn test_correct_guess_reveals_immediately() {
        // テスト項目: 正解すると即座に公開し、正解を記録する
        // given (前提条件):
        let mut game = GuessGame::new();
        let settings = enabled();
        game.observe(&snapshot("a", "Song A", 195_000), 0, &settings);
        game.observe(&snapshot("b", "Midnight City", 1_000), 5_000, &settings);

        // when (操作):
        let wrong = game.submit("Daydream");
        let right = game.submit("  midnight city ");

        // then (期待する結果):
        assert_eq!(wrong, GuessResult::Incorrect);
        assert_eq!(
            right,
            GuessResult::Correct {
                title: "Midnight City".to_string()
            }
        );
        assert!(game.has_guessed());
        assert!(!game.is_hidden());
    }

    #[test]
    fn test_guess_when_not_hidden_is_inactive() {
        // テスト項目: タイトルが隠れていないときの回答は判定しない
        // given (前提条件):
        let mut game = GuessGame::new();
        game.observe(&snapshot("a", "Song A", 10_000), 0, &enabled());

        // when (操作):
        let result = game.submit("Song A");

        // then (期待する結果):
        assert_eq!(result, GuessResult::NotActive);
    }

    #[test]
    fn test_no_reveal_inside_hide_window_of_long_track() {
        // テスト項目: 長い曲の終わり際に隠した直後は、経過時間が長くても公開しない
        // given (前提条件):
        let mut game = GuessGame::new();
        let settings = enabled();
        game.observe(&snapshot("a", "Song A", 1_000), 0, &settings);

        // when (操作):
        let hide = game.observe(&snapshot("a", "Song A", 195_000), 194_000, &settings);
        let next_tick = game.observe(&snapshot("a", "Song A", 195_500), 194_500, &settings);

        // then (期待する結果):
        assert_eq!(hide, Some(OverlayAction::Hide));
        assert_eq!(next_tick, None);
        assert!(game.is_hidden());
    }
}
