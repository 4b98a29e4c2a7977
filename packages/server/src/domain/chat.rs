//! Chat command grammar.
//!
//! 先頭トークンで判定するコマンド文法（`!sr <link>` など）と、
//! コマンドごとの権限判定に使うロールを定義します。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// チャット上のロール（昇順に強い）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    #[default]
    Everyone,
    Subscriber,
    Moderator,
    Broadcaster,
}

/// 解釈済みのチャットコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `!sr <link>` / `!songrequest <link>`
    SongRequest { link: String },
    /// `!remove <n>`（1 始まり）
    Remove { position: usize },
    /// `!guess <text>`
    Guess { text: String },
    /// `!srhelp`
    Help,
    /// `!skip`
    Skip,
    /// `!queue`
    ShowQueue,
}

impl ChatCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SongRequest { .. } => "sr",
            Self::Remove { .. } => "remove",
            Self::Guess { .. } => "guess",
            Self::Help => "srhelp",
            Self::Skip => "skip",
            Self::ShowQueue => "queue",
        }
    }
}

/// コマンド解釈のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatParseError {
    #[error("usage: {prefix}{command} <{argument}>")]
    MissingArgument {
        prefix: String,
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{0}' is not a valid queue position")]
    InvalidPosition(String),
}

/// チャットの 1 行を解釈する
///
/// プレフィックスで始まらない行と未知のコマンドは `Ok(None)`。
pub fn parse_command(prefix: &str, text: &str) -> Result<Option<ChatCommand>, ChatParseError> {
    let Some(body) = text.trim().strip_prefix(prefix) else {
        return Ok(None);
    };
    let (word, rest) = match body.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (body, ""),
    };

    let missing = |command: &'static str, argument: &'static str| ChatParseError::MissingArgument {
        prefix: prefix.to_string(),
        command,
        argument,
    };

    let command = match word.to_lowercase().as_str() {
        "sr" | "songrequest" => {
            if rest.is_empty() {
                return Err(missing("sr", "link"));
            }
            ChatCommand::SongRequest {
                link: rest.to_string(),
            }
        }
        "remove" => {
            if rest.is_empty() {
                return Err(missing("remove", "position"));
            }
            let position = rest
                .split_whitespace()
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| ChatParseError::InvalidPosition(rest.to_string()))?;
            ChatCommand::Remove { position }
        }
        "guess" => {
            if rest.is_empty() {
                return Err(missing("guess", "title"));
            }
            ChatCommand::Guess {
                text: rest.to_string(),
            }
        }
        "srhelp" => ChatCommand::Help,
        "skip" => ChatCommand::Skip,
        "queue" => ChatCommand::ShowQueue,
        _ => return Ok(None),
    };

    Ok(Some(command))
}
