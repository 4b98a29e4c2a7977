//! Domain layer
//!
//! ビジネスルールと、その外側に要求するインターフェース（trait）を定義します。
//! 他の層には依存しません。

pub mod chat;
pub mod command;
pub mod entity;
pub mod error;
pub mod guess;
pub mod message_pusher;
pub mod playback;
pub mod relay;
pub mod repository;
pub mod value_object;

pub use chat::{ChatCommand, ChatParseError, ChatRole, parse_command};
pub use command::PlaybackCommand;
pub use entity::{
    ConnectedClient, DEFAULT_COVER_URL, Queue, QueueItem, ResolvedTrack, TrackSnapshot,
};
pub use error::{
    MessagePushError, PlaybackError, QueueError, RepositoryError, ValueObjectError,
};
pub use guess::{GuessGame, GuessResult, GuessSettings, OverlayAction};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use playback::{BackendProvider, PlaybackBackend};
pub use relay::{ArtworkSource, RelayHub};
pub use repository::ClientRepository;
pub use value_object::{ClientHandle, ClientType, Platform, QueueItemId, RepeatMode, Timestamp};

#[cfg(test)]
pub use playback::{MockBackendProvider, MockPlaybackBackend};
