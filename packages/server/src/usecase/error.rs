//! UseCase layer errors.

use thiserror::Error;

use crate::domain::{ChatParseError, ChatRole, PlaybackError, QueueError};

/// チャットコマンド処理のエラー
///
/// どれも利用者への返信文として表示される。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChatCommandError {
    #[error(transparent)]
    Parse(#[from] ChatParseError),

    #[error("{command} requires the {required:?} role")]
    NotPermitted {
        command: &'static str,
        required: ChatRole,
    },

    #[error("you already have {limit} pending request(s)")]
    LimitReached { limit: usize },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("could not find that song: {0}")]
    Resolve(PlaybackError),

    #[error("guess-the-song is not running")]
    GuessNotActive,
}
