//! WebSocket を使った MessagePusher 実装
//!
//! WebSocket 接続の受付と送信タスクの生成は UI 層で行い、
//! ここでは生成された `UnboundedSender` をハンドルごとに保持して書き込む。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientHandle, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    clients: Arc<Mutex<HashMap<ClientHandle, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, handle: ClientHandle, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(handle, sender);
        tracing::debug!("Client '{}' registered to MessagePusher", handle);
    }

    async fn unregister_client(&self, handle: &ClientHandle) {
        let mut clients = self.clients.lock().await;
        clients.remove(handle);
        tracing::debug!("Client '{}' unregistered from MessagePusher", handle);
    }

    async fn push_to(&self, handle: &ClientHandle, content: &str) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        let sender = clients
            .get(handle)
            .ok_or_else(|| MessagePushError::ClientNotFound(handle.to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }

    async fn broadcast(
        &self,
        targets: Vec<ClientHandle>,
        content: &str,
    ) -> Result<usize, MessagePushError> {
        let clients = self.clients.lock().await;
        let mut delivered = 0;

        for target in targets {
            match clients.get(&target) {
                Some(sender) if sender.is_closed() => {
                    tracing::debug!("Client '{}' is closing, skipping", target);
                }
                Some(sender) => {
                    // 一部の送信失敗は許容
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push message to client '{}': {}", target, e);
                    } else {
                        delivered += 1;
                    }
                }
                None => {
                    tracing::warn!("Client '{}' not found during broadcast, skipping", target);
                }
            }
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定のクライアントにメッセージを送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ClientHandle::generate();
        pusher.register_client(handle, tx).await;

        // when (操作):
        let result = pusher.push_to(&handle, "{\"command\":\"Next\"}").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("{\"command\":\"Next\"}".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_unregistered_client() {
        // テスト項目: 登録解除したクライアントへの送信はエラー
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = ClientHandle::generate();
        pusher.register_client(handle, tx).await;
        pusher.unregister_client(&handle).await;

        // when (操作):
        let result = pusher.push_to(&handle, "hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_and_missing_clients() {
        // テスト項目: 閉じたチャンネルと未登録のクライアントは読み飛ばし、届いた数を返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (open_tx, mut open_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        drop(closed_rx);
        let open = ClientHandle::generate();
        let closed = ClientHandle::generate();
        pusher.register_client(open, open_tx).await;
        pusher.register_client(closed, closed_tx).await;

        // when (操作):
        let delivered = pusher
            .broadcast(vec![open, closed, ClientHandle::generate()], "msg")
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(open_rx.recv().await, Some("msg".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_empty_targets() {
        // テスト項目: 空のターゲットリストでもエラーにならない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let result = pusher.broadcast(vec![], "msg").await;

        // then (期待する結果):
        assert_eq!(result.unwrap(), 0);
    }
}
