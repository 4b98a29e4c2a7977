//! UseCase: クライアント接続処理

use std::sync::Arc;

use crate::domain::{
    ClientHandle, ClientRepository, ConnectedClient, MessagePusher, PusherChannel, Timestamp,
};
use encore_shared::time::get_timestamp;

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    repository: Arc<dyn ClientRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectClientUseCase {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// クライアント接続を実行
    ///
    /// 種別 `"unknown"` として台帳に登録し、送信チャンネルを登録したうえで
    /// `welcome`（identify の要求）を送る。識別されないままでもタイムアウトはしない。
    ///
    /// # Arguments
    ///
    /// * `handle` - サーバーが割り当てたハンドル
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    /// * `welcome` - 接続直後に送る JSON（DTO 層で生成されたもの）
    pub async fn execute(
        &self,
        handle: ClientHandle,
        sender: PusherChannel,
        welcome: &str,
    ) -> ConnectedClient {
        let client = ConnectedClient::new(handle, Timestamp::new(get_timestamp()));
        self.repository.add_client(client.clone()).await;
        self.message_pusher.register_client(handle, sender).await;

        if let Err(e) = self.message_pusher.push_to(&handle, welcome).await {
            tracing::warn!("Failed to send identify request to '{}': {}", handle, e);
        }

        let count = self.repository.count_connected_clients().await;
        tracing::info!("Client '{}' connected ({} connected)", handle, count);

        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{InMemoryClientRepository, WebSocketMessagePusher};

    #[tokio::test]
    async fn test_connect_registers_unknown_client_and_sends_identify_request() {
        // テスト項目: 接続したクライアントは unknown として登録され、identify を要求される
        // given (前提条件):
        let repository = Arc::new(InMemoryClientRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = ConnectClientUseCase::new(repository.clone(), pusher);
        let handle = ClientHandle::generate();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        // when (操作):
        let client = usecase
            .execute(handle, tx, r#"{"command":"identify"}"#)
            .await;

        // then (期待する結果):
        assert!(!client.is_identified());
        assert_eq!(repository.count_connected_clients().await, 1);
        assert_eq!(rx.recv().await.unwrap(), r#"{"command":"identify"}"#);
    }
}
