//! Value Objects
//!
//! 識別子や種別タグなど、値そのものに意味を持つ型を定義します。

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// リレー接続を一意に識別するハンドル
///
/// 接続受付時にサーバー側で採番する。クライアントの自己申告 ID は使わない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientHandle(Uuid);

impl ClientHandle {
    /// 新しいハンドルを生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// クライアントが自己申告する種別タグ
///
/// `"spotify-bridge"` などの開いた集合。identify 前は `"unknown"`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientType(String);

impl ClientType {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyClientType);
        }
        if trimmed.eq_ignore_ascii_case(Self::UNKNOWN) {
            return Err(ValueObjectError::ReservedClientType(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientType {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientType> for String {
    fn from(value: ClientType) -> Self {
        value.0
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 再生対象のプラットフォーム
///
/// リレー経由のブリッジは種別タグで区別し、ローカル HTTP API を持つ
/// デスクトップアプリは専用のバリアントを持つ。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Platform {
    /// ブラウザ拡張ブリッジ（リレーサーバー経由）
    Relay(ClientType),
    /// 動画プラットフォームのデスクトップアプリ（ローカル制御 API）
    YtmDesktop,
    /// デスクトップ音楽アプリ（ローカル HTTP API）
    Cider,
}

impl Platform {
    pub const YTM_DESKTOP: &'static str = "ytmdesktop";
    pub const CIDER: &'static str = "cider";

    pub fn spotify_bridge() -> Self {
        Self::Relay(ClientType("spotify-bridge".to_string()))
    }

    /// スナップショットのポーリング間隔
    ///
    /// デスクトップ音楽アプリの API は更新が遅いため間隔を長く取る。
    pub fn poll_interval(&self) -> Duration {
        match self {
            Self::Relay(_) | Self::YtmDesktop => Duration::from_millis(500),
            Self::Cider => Duration::from_millis(2000),
        }
    }

    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relay(client_type) => f.write_str(client_type.as_str()),
            Self::YtmDesktop => f.write_str(Self::YTM_DESKTOP),
            Self::Cider => f.write_str(Self::CIDER),
        }
    }
}

impl FromStr for Platform {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            Self::YTM_DESKTOP => Ok(Self::YtmDesktop),
            Self::CIDER => Ok(Self::Cider),
            _ => match ClientType::new(s) {
                Ok(client_type) => Ok(Self::Relay(client_type)),
                Err(ValueObjectError::ReservedClientType(_)) => {
                    Err(ValueObjectError::InvalidPlatform(s.to_string()))
                }
                Err(e) => Err(e),
            },
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.to_string()
    }
}

/// リピートモード（0=off / 1=all / 2=one）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl From<u8> for RepeatMode {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::All,
            2 => Self::One,
            _ => Self::Off,
        }
    }
}

impl From<RepeatMode> for u8 {
    fn from(value: RepeatMode) -> Self {
        match value {
            RepeatMode::Off => 0,
            RepeatMode::All => 1,
            RepeatMode::One => 2,
        }
    }
}

/// キューアイテムの複合 ID（`"<trackId>-<requesterName>"`）
///
/// 同じ視聴者が同じ曲を二重にリクエストしたことを検出するキーにもなる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueItemId(String);

impl QueueItemId {
    /// The requester part is ASCII-lowercased, matching how requesters are compared.
    pub fn compose(track_id: &str, requested_by: &str) -> Self {
        Self(format!("{}-{}", track_id, requested_by.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_type_rejects_blank_value() {
        // テスト項目: 空白のみの種別タグはエラーになる
        // given (前提条件):
        let blank = "   ".to_string();

        // when (操作):
        let result = ClientType::new(blank);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyClientType));
    }

    #[test]
    fn test_client_type_rejects_reserved_unknown_tag() {
        // テスト項目: 未識別を表す "unknown" は大文字小文字を問わず種別として名乗れない
        // given (前提条件):
        let tags = ["unknown", " Unknown ", "UNKNOWN"];

        // when (操作) / then (期待する結果):
        for tag in tags {
            assert!(matches!(
                ClientType::new(tag),
                Err(ValueObjectError::ReservedClientType(_))
            ));
        }
    }

    #[test]
    fn test_client_type_unknown_is_detected() {
        // テスト項目: "unknown" タグは未識別として扱われる
        // given (前提条件):
        let unknown = ClientType::unknown();
        let bridge = ClientType::new("spotify-bridge").unwrap();

        // when (操作) / then (期待する結果):
        assert!(unknown.is_unknown());
        assert!(!bridge.is_unknown());
    }

    #[test]
    fn test_platform_parses_http_backends_and_bridges() {
        // テスト項目: プラットフォームタグが正しく解釈される
        // given (前提条件):
        let tags = ["cider", "YTMDesktop", "soundcloud-bridge"];

        // when (操作):
        let parsed: Vec<Platform> = tags.iter().map(|t| t.parse().unwrap()).collect();

        // then (期待する結果):
        assert_eq!(parsed[0], Platform::Cider);
        assert_eq!(parsed[1], Platform::YtmDesktop);
        assert_eq!(
            parsed[2],
            Platform::Relay(ClientType::new("soundcloud-bridge").unwrap())
        );
    }

    #[test]
    fn test_platform_rejects_unknown_tag() {
        // テスト項目: "unknown" をプラットフォームとして指定するとエラーになる
        // given (前提条件):
        let tag = "unknown";

        // when (操作):
        let result = tag.parse::<Platform>();

        // then (期待する結果):
        assert!(matches!(result, Err(ValueObjectError::InvalidPlatform(_))));
    }

    #[test]
    fn test_platform_poll_interval() {
        // テスト項目: デスクトップ音楽アプリだけポーリング間隔が長い
        // given (前提条件):
        let relay = Platform::spotify_bridge();

        // when (操作) / then (期待する結果):
        assert_eq!(relay.poll_interval(), Duration::from_millis(500));
        assert_eq!(Platform::YtmDesktop.poll_interval(), Duration::from_millis(500));
        assert_eq!(Platform::Cider.poll_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn test_repeat_mode_conversion() {
        // テスト項目: リピートモードの数値変換が対称である
        // given (前提条件):
        let values = [0u8, 1, 2, 7];

        // when (操作):
        let modes: Vec<RepeatMode> = values.iter().map(|v| RepeatMode::from(*v)).collect();

        // then (期待する結果):
        assert_eq!(modes, vec![RepeatMode::Off, RepeatMode::All, RepeatMode::One, RepeatMode::Off]);
        assert_eq!(u8::from(RepeatMode::One), 2);
    }

    #[test]
    fn test_queue_item_id_compose() {
        // テスト項目: 複合 ID が "<trackId>-<requester>" 形式になる
        // given (前提条件):
        let track_id = "abc";

        // when (操作):
        let id = QueueItemId::compose(track_id, "alice");

        // then (期待する結果):
        assert_eq!(id.as_str(), "abc-alice");
    }

    #[test]
    fn test_queue_item_id_ignores_requester_case() {
        // テスト項目: リクエスト者名の大文字小文字が違っても同じ ID になる
        // given (前提条件):
        let track_id = "abc";

        // when (操作):
        let upper = QueueItemId::compose(track_id, "Alice");
        let lower = QueueItemId::compose(track_id, "alice");

        // then (期待する結果):
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "abc-alice");
    }
}
