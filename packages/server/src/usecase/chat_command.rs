//! UseCase: チャットコマンドの処理
//!
//! チャットの 1 行を解釈し、権限と上限を確認してからキュー・再生操作・
//! guess-the-song に振り分ける。戻り値はチャットへ返す文面（返さない場合は None）。

use std::sync::Arc;

use super::{
    auto_advance::AutoAdvanceMonitor, error::ChatCommandError, playback::PlaybackFacade,
    queue::QueueEngine,
};
use crate::domain::{
    ChatCommand, ChatRole, GuessResult, PlaybackCommand, QueueItem, parse_command,
};

const QUEUE_PREVIEW_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub prefix: String,
    pub song_request_role: ChatRole,
    pub remove_role: ChatRole,
    pub skip_role: ChatRole,
    /// 0 なら無制限
    pub max_requests_per_user: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            song_request_role: ChatRole::Everyone,
            remove_role: ChatRole::Moderator,
            skip_role: ChatRole::Moderator,
            max_requests_per_user: 0,
        }
    }
}

pub struct ChatCommandUseCase {
    settings: ChatSettings,
    queue: Arc<QueueEngine>,
    facade: Arc<PlaybackFacade>,
    monitor: Arc<AutoAdvanceMonitor>,
}

impl ChatCommandUseCase {
    pub fn new(
        settings: ChatSettings,
        queue: Arc<QueueEngine>,
        facade: Arc<PlaybackFacade>,
        monitor: Arc<AutoAdvanceMonitor>,
    ) -> Self {
        Self {
            settings,
            queue,
            facade,
            monitor,
        }
    }

    /// チャットの 1 行を処理し、返信文を返す
    pub async fn execute(&self, user: &str, role: ChatRole, text: &str) -> Option<String> {
        match self.dispatch(user, role, text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!("Chat command from {} rejected: {}", user, e);
                Some(format!("@{} {}", user, e))
            }
        }
    }

    pub async fn dispatch(
        &self,
        user: &str,
        role: ChatRole,
        text: &str,
    ) -> Result<Option<String>, ChatCommandError> {
        let Some(command) = parse_command(&self.settings.prefix, text)? else {
            return Ok(None);
        };
        tracing::debug!("Chat command '{}' from {} ({:?})", command.name(), user, role);

        match command {
            ChatCommand::SongRequest { link } => {
                require("sr", role, self.settings.song_request_role)?;
                self.song_request(user, &link).await.map(Some)
            }
            ChatCommand::Remove { position } => {
                require("remove", role, self.settings.remove_role)?;
                let item = self.queue.remove_at_position(position).await?;
                Ok(Some(format!(
                    "Removed '{}' requested by {}",
                    item.title, item.requested_by
                )))
            }
            ChatCommand::Guess { text } => match self.monitor.submit_guess(user, &text).await {
                GuessResult::Correct { title } => {
                    Ok(Some(format!("@{} got it! The song was '{}'", user, title)))
                }
                GuessResult::Incorrect => Ok(None),
                GuessResult::NotActive => Err(ChatCommandError::GuessNotActive),
            },
            ChatCommand::Help => Ok(Some(self.help())),
            ChatCommand::Skip => {
                require("skip", role, self.settings.skip_role)?;
                self.facade.issue_command(PlaybackCommand::Next).await;
                Ok(Some("Skipped.".to_string()))
            }
            ChatCommand::ShowQueue => Ok(Some(self.queue_summary().await)),
        }
    }

    async fn song_request(&self, user: &str, link: &str) -> Result<String, ChatCommandError> {
        let limit = self.settings.max_requests_per_user;
        if limit > 0 && self.queue.pending_requests_by(user).await >= limit {
            return Err(ChatCommandError::LimitReached { limit });
        }

        let track = self
            .facade
            .resolve_track(link)
            .await
            .map_err(ChatCommandError::Resolve)?;
        let platform = self.facade.platform().await.tag();
        let item = QueueItem::from_resolved(track, user, &platform);
        let reply = format!("@{} added '{}' by {}", user, item.title, item.artist);

        let position = self.queue.try_add_to_queue(item).await?;
        Ok(format!("{} (#{} in queue)", reply, position))
    }

    async fn queue_summary(&self) -> String {
        let queue = self.queue.get_queue().await;
        let upcoming: Vec<String> = queue
            .items()
            .iter()
            .filter(|item| !item.is_currently_playing)
            .take(QUEUE_PREVIEW_LEN)
            .enumerate()
            .map(|(i, item)| format!("{}. {} ({})", i + 1, item.title, item.requested_by))
            .collect();

        if upcoming.is_empty() {
            "The queue is empty.".to_string()
        } else {
            format!("Up next: {}", upcoming.join(", "))
        }
    }

    fn help(&self) -> String {
        let p = &self.settings.prefix;
        format!(
            "{p}sr <link> to request a song, {p}queue to see what's next, {p}guess <title> during guess-the-song"
        )
    }
}

fn require(
    command: &'static str,
    role: ChatRole,
    required: ChatRole,
) -> Result<(), ChatCommandError> {
    if role >= required {
        Ok(())
    } else {
        Err(ChatCommandError::NotPermitted { command, required })
    }
}
