//! Domain layer errors.

use thiserror::Error;

/// Value Object の生成時エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("client type must not be empty")]
    EmptyClientType,

    #[error("'{0}' is reserved for unidentified clients")]
    ReservedClientType(String),

    #[error("'{0}' is not a valid playback platform")]
    InvalidPlatform(String),
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// 再生バックエンド操作のエラー
///
/// すべて一時的なエラーとして扱い、Playback Facade の境界で握りつぶす。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// リレー経由の問い合わせに期限内の応答がなかった
    #[error("no response from '{client_type}' within {timeout_ms}ms")]
    NoResponse { client_type: String, timeout_ms: u64 },

    /// 対象種別のクライアントが接続していない
    #[error("no '{0}' client is connected")]
    NoClient(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("unexpected response from backend: {0}")]
    Decode(String),

    #[error("'{operation}' is not supported by {platform}")]
    Unsupported {
        platform: String,
        operation: &'static str,
    },
}

/// キュー操作のエラー
///
/// `Queue` 自体は範囲外の操作を `false` で黙って無視する。
/// チャットや HTTP から理由を返したい場合にこちらを使う。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("'{0}' is already in the queue")]
    DuplicateItem(String),

    #[error("position {position} is out of range (queue has {len} items)")]
    OutOfRange { position: usize, len: usize },
}
