//! Playback commands.
//!
//! 各バックエンドへ送る操作をタグ付き列挙型で表す。境界で検証済みの値だけが流れる。

use serde::{Deserialize, Serialize};

/// 再生操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlaybackCommand {
    PlayPause,
    Next,
    Prev,
    Shuffle,
    Repeat,
    #[serde(rename_all = "camelCase")]
    Seek { position_ms: u64 },
    /// 0.0 - 1.0
    Volume { level: f32 },
    Like,
    #[serde(rename_all = "camelCase")]
    AddTrack { track_id: String },
}

impl PlaybackCommand {
    /// ペイロードを持たない操作を名前から作る（大文字小文字は区別しない）
    pub fn from_simple_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "playpause" | "toggle" => Some(Self::PlayPause),
            "next" | "skip" => Some(Self::Next),
            "prev" | "previous" => Some(Self::Prev),
            "shuffle" => Some(Self::Shuffle),
            "repeat" => Some(Self::Repeat),
            "like" => Some(Self::Like),
            _ => None,
        }
    }

    /// Volume のレベルを 0.0 - 1.0 に丸めて作る
    pub fn volume(level: f32) -> Self {
        let level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
        Self::Volume { level }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayPause => "PlayPause",
            Self::Next => "Next",
            Self::Prev => "Prev",
            Self::Shuffle => "Shuffle",
            Self::Repeat => "Repeat",
            Self::Seek { .. } => "Seek",
            Self::Volume { .. } => "Volume",
            Self::Like => "Like",
            Self::AddTrack { .. } => "AddTrack",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_simple_name_accepts_aliases() {
        // テスト項目: 単純な操作名とその別名が解釈される
        // given (前提条件):
        let names = ["PlayPause", "skip", "previous", "LIKE"];

        // when (操作):
        let commands: Vec<Option<PlaybackCommand>> =
            names.iter().map(|n| PlaybackCommand::from_simple_name(n)).collect();

        // then (期待する結果):
        assert_eq!(commands[0], Some(PlaybackCommand::PlayPause));
        assert_eq!(commands[1], Some(PlaybackCommand::Next));
        assert_eq!(commands[2], Some(PlaybackCommand::Prev));
        assert_eq!(commands[3], Some(PlaybackCommand::Like));
    }

    #[test]
    fn test_from_simple_name_rejects_payload_commands() {
        // テスト項目: ペイロードが必要な操作は名前だけでは作れない
        // given (前提条件):
        let names = ["seek", "volume", "addTrack", "dance"];

        // when (操作) / then (期待する結果):
        for name in names {
            assert_eq!(PlaybackCommand::from_simple_name(name), None);
        }
    }

    #[test]
    fn test_volume_is_clamped() {
        // テスト項目: 音量は 0.0 - 1.0 に丸められる
        // given (前提条件):
        let too_loud = 3.5;

        // when (操作):
        let command = PlaybackCommand::volume(too_loud);

        // then (期待する結果):
        assert_eq!(command, PlaybackCommand::Volume { level: 1.0 });
        assert_eq!(PlaybackCommand::volume(f32::NAN), PlaybackCommand::Volume { level: 0.0 });
    }
}
