//! Relay hub
//!
//! 接続クライアントへの配送（全体 / 種別指定 / 送信者以外）と、
//! ブリッジからの応答を受け取る「最新値スロット」および応答待ちテーブルを持つ。
//!
//! 応答待ちは `requestId` で対応付ける。ID を返さない古いブリッジの応答は、
//! 同じ種類の応答待ちをすべて解決する。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, oneshot};
use uuid::Uuid;

use super::{
    ClientHandle, ClientRepository, ClientType, MessagePusher, ResolvedTrack, TrackSnapshot,
};

/// ローカルファイルの埋め込みアートワークを読む
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    /// data URL を返す。読めなければ None
    async fn cover_for(&self, path: &str) -> Option<String>;
}

enum PendingReply {
    Track(oneshot::Sender<TrackSnapshot>),
    Resolved(oneshot::Sender<ResolvedTrack>),
}

impl PendingReply {
    fn is_track(&self) -> bool {
        matches!(self, Self::Track(_))
    }
}

pub struct RelayHub {
    repository: Arc<dyn ClientRepository>,
    pusher: Arc<dyn MessagePusher>,
    /// 最後に受け取った currentTrack
    current_track: RwLock<Option<TrackSnapshot>>,
    /// 最後に受け取った requestHandled
    resolved_request: RwLock<Option<ResolvedTrack>>,
    pending: Mutex<HashMap<Uuid, PendingReply>>,
}

impl RelayHub {
    pub fn new(repository: Arc<dyn ClientRepository>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            pusher,
            current_track: RwLock::new(None),
            resolved_request: RwLock::new(None),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn ClientRepository> {
        &self.repository
    }

    pub fn pusher(&self) -> &Arc<dyn MessagePusher> {
        &self.pusher
    }

    /// 全クライアントへ送る。届いた数を返す
    pub async fn send_to_all(&self, content: &str) -> usize {
        let targets = self.repository.get_all_handles().await;
        self.deliver(targets, content).await
    }

    /// 指定種別のクライアントへ送る。届いた数を返す
    pub async fn send_to_type(&self, content: &str, client_type: &ClientType) -> usize {
        let targets = self.repository.handles_of_type(client_type).await;
        self.deliver(targets, content).await
    }

    /// 送信者以外の全クライアントへ転送する
    pub async fn forward_from(&self, sender: &ClientHandle, content: &str) -> usize {
        let targets = self
            .repository
            .get_all_handles()
            .await
            .into_iter()
            .filter(|handle| handle != sender)
            .collect();
        self.deliver(targets, content).await
    }

    async fn deliver(&self, targets: Vec<ClientHandle>, content: &str) -> usize {
        if targets.is_empty() {
            return 0;
        }
        match self.pusher.broadcast(targets, content).await {
            Ok(delivered) => delivered,
            Err(e) => {
                tracing::warn!("Failed to deliver relay message: {}", e);
                0
            }
        }
    }

    /// `request_id` 付き currentTrack の応答待ちを登録する
    pub async fn expect_track(&self, request_id: Uuid) -> oneshot::Receiver<TrackSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .await
            .insert(request_id, PendingReply::Track(tx));
        rx
    }

    /// `request_id` 付き requestHandled の応答待ちを登録する
    pub async fn expect_resolved(&self, request_id: Uuid) -> oneshot::Receiver<ResolvedTrack> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .await
            .insert(request_id, PendingReply::Resolved(tx));
        rx
    }

    /// 応答待ちを取り消す（タイムアウト時など）
    pub async fn cancel(&self, request_id: &Uuid) {
        self.pending.lock().await.remove(request_id);
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// currentTrack をスロットに保存し、対応する応答待ちを解決する
    ///
    /// 解決した応答待ちの数を返す。
    pub async fn store_current_track(
        &self,
        snapshot: TrackSnapshot,
        request_id: Option<Uuid>,
    ) -> usize {
        *self.current_track.write().await = Some(snapshot.clone());

        let waiters = self.take_waiters(request_id, true).await;
        let mut resolved = 0;
        for waiter in waiters {
            if let PendingReply::Track(tx) = waiter
                && tx.send(snapshot.clone()).is_ok()
            {
                resolved += 1;
            }
        }
        resolved
    }

    /// requestHandled をスロットに保存し、対応する応答待ちを解決する
    pub async fn store_resolved(&self, track: ResolvedTrack, request_id: Option<Uuid>) -> usize {
        *self.resolved_request.write().await = Some(track.clone());

        let waiters = self.take_waiters(request_id, false).await;
        let mut resolved = 0;
        for waiter in waiters {
            if let PendingReply::Resolved(tx) = waiter
                && tx.send(track.clone()).is_ok()
            {
                resolved += 1;
            }
        }
        resolved
    }

    async fn take_waiters(&self, request_id: Option<Uuid>, track: bool) -> Vec<PendingReply> {
        let mut pending = self.pending.lock().await;
        match request_id {
            Some(id) => match pending.get(&id) {
                Some(waiter) if waiter.is_track() == track => {
                    pending.remove(&id).into_iter().collect()
                }
                _ => Vec::new(),
            },
            None => {
                let ids: Vec<Uuid> = pending
                    .iter()
                    .filter(|(_, waiter)| waiter.is_track() == track)
                    .map(|(id, _)| *id)
                    .collect();
                ids.iter().filter_map(|id| pending.remove(id)).collect()
            }
        }
    }

    pub async fn last_current_track(&self) -> Option<TrackSnapshot> {
        self.current_track.read().await.clone()
    }

    pub async fn last_resolved(&self) -> Option<ResolvedTrack> {
        self.resolved_request.read().await.clone()
    }
}
