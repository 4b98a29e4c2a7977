//! UseCase: クライアント切断処理

use std::sync::Arc;

use crate::domain::{ClientHandle, ClientRepository, ConnectedClient, MessagePusher};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    repository: Arc<dyn ClientRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectClientUseCase {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 切断を実行し、台帳から外したクライアントを返す
    ///
    /// 同じハンドルで二度呼ばれても何もしない。
    pub async fn execute(&self, handle: &ClientHandle) -> Option<ConnectedClient> {
        self.message_pusher.unregister_client(handle).await;
        let removed = self.repository.remove_client(handle).await;

        if let Some(client) = &removed {
            let count = self.repository.count_connected_clients().await;
            tracing::info!(
                "Client '{}' ({}) disconnected ({} connected)",
                handle,
                client.client_type,
                count
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessagePushError, Timestamp};
    use crate::infrastructure::{InMemoryClientRepository, WebSocketMessagePusher};

    #[tokio::test]
    async fn test_disconnect_removes_client_once() {
        // テスト項目: 切断したクライアントは台帳と送信先から外れ、二度目は None
        // given (前提条件):
        let repository = Arc::new(InMemoryClientRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let handle = ClientHandle::generate();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        repository
            .add_client(ConnectedClient::new(handle, Timestamp::new(0)))
            .await;
        pusher.register_client(handle, tx).await;
        let usecase = DisconnectClientUseCase::new(repository.clone(), pusher.clone());

        // when (操作):
        let first = usecase.execute(&handle).await;
        let second = usecase.execute(&handle).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(repository.count_connected_clients().await, 0);
        assert!(matches!(
            pusher.push_to(&handle, "x").await,
            Err(MessagePushError::ClientNotFound(_))
        ));
    }
}
