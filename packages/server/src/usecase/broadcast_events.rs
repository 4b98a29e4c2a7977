//! UseCase: キューの変更と通知をリレーの全クライアントへ流す
//!
//! オーバーレイページはリレーに接続しているので、`queue` / `notification`
//! コマンドとして受け取る。

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

use super::notification::Notification;
use crate::domain::{Queue, RelayHub};
use crate::infrastructure::dto::{
    http::QueueDto,
    websocket::{OutboundCommand, RelayCommand},
};

pub struct BroadcastEventsUseCase {
    hub: Arc<RelayHub>,
}

impl BroadcastEventsUseCase {
    pub fn new(hub: Arc<RelayHub>) -> Self {
        Self { hub }
    }

    /// 両方のチャンネルが閉じるまで転送を続ける
    pub async fn run(
        self,
        mut queue_events: broadcast::Receiver<Queue>,
        mut notifications: broadcast::Receiver<Notification>,
    ) {
        let mut queue_open = true;
        let mut notifications_open = true;

        while queue_open || notifications_open {
            tokio::select! {
                event = queue_events.recv(), if queue_open => match event {
                    Ok(queue) => {
                        self.push_queue(&queue).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Skipped {} stale queue snapshot(s)", skipped);
                    }
                    Err(RecvError::Closed) => queue_open = false,
                },
                event = notifications.recv(), if notifications_open => match event {
                    Ok(notification) => {
                        self.push_notification(&notification).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Dropped {} notification(s)", skipped);
                    }
                    Err(RecvError::Closed) => notifications_open = false,
                },
            }
        }
    }

    pub async fn push_queue(&self, queue: &Queue) -> usize {
        self.push(RelayCommand::Queue, serde_json::to_value(QueueDto::from(queue)))
            .await
    }

    pub async fn push_notification(&self, notification: &Notification) -> usize {
        self.push(RelayCommand::Notification, serde_json::to_value(notification))
            .await
    }

    async fn push(&self, command: RelayCommand, data: serde_json::Result<Value>) -> usize {
        let json = data.and_then(|data| OutboundCommand::new(command).with_data(data).to_json());
        match json {
            Ok(json) => self.hub.send_to_all(&json).await,
            Err(e) => {
                tracing::warn!("Failed to encode {:?} event: {}", command, e);
                0
            }
        }
    }
}
