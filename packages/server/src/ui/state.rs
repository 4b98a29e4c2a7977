//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::ClientRepository,
    usecase::{
        AutoAdvanceMonitor, ChatCommandUseCase, ConnectClientUseCase, DisconnectClientUseCase,
        PlaybackFacade, QueueEngine, RelayMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub relay_message_usecase: Arc<RelayMessageUseCase>,
    pub chat_command_usecase: Arc<ChatCommandUseCase>,
    pub queue: Arc<QueueEngine>,
    pub playback: Arc<PlaybackFacade>,
    pub monitor: Arc<AutoAdvanceMonitor>,
    /// 接続クライアント台帳（`GET /api/clients` 用）
    pub repository: Arc<dyn ClientRepository>,
}
