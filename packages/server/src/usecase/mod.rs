//! UseCase layer
//!
//! リレー、キュー、再生操作、自動送り、チャットコマンドのアプリケーションロジック。
//! ドメイン層の trait にだけ依存し、具体的な実装は呼び出し側が注入する。

pub mod auto_advance;
pub mod broadcast_events;
pub mod chat_command;
pub mod connect_client;
pub mod disconnect_client;
pub mod error;
pub mod notification;
pub mod playback;
pub mod queue;
pub mod relay_message;

pub use auto_advance::{AutoAdvanceMonitor, MonitorSettings, TickOutcome};
pub use broadcast_events::BroadcastEventsUseCase;
pub use chat_command::{ChatCommandUseCase, ChatSettings};
pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::ChatCommandError;
pub use notification::{Notification, NotificationLevel, Notifier};
pub use playback::PlaybackFacade;
pub use queue::QueueEngine;
pub use relay_message::{RelayMessageUseCase, RelayOutcome};
