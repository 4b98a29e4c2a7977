//! UseCase: リレーの受信メッセージ処理
//!
//! identify はその場で応答し、それ以外は識別済みの送信者からのものだけを
//! 処理して送信者以外の全クライアントへ転送する。未識別クライアントからの
//! メッセージは副作用なしで破棄する。

use std::sync::Arc;

use crate::domain::{
    ArtworkSource, ClientHandle, ClientType, ConnectedClient, RelayHub, ResolvedTrack,
    TrackSnapshot,
};
use crate::infrastructure::dto::websocket::{IdentifyAck, InboundMessage, OutboundCommand};

/// 1 メッセージの処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// identify を受け付けた
    Identified(ConnectedClient),
    /// identify の内容が不正で、エラーを返した
    Rejected(String),
    /// 破棄した（不正な JSON、未識別の送信者、切断済み）
    Dropped,
    /// 他のクライアントへ転送した
    Forwarded { command: String, delivered: usize },
}

/// リレー受信のユースケース
pub struct RelayMessageUseCase {
    hub: Arc<RelayHub>,
    artwork: Arc<dyn ArtworkSource>,
}

impl RelayMessageUseCase {
    pub fn new(hub: Arc<RelayHub>, artwork: Arc<dyn ArtworkSource>) -> Self {
        Self { hub, artwork }
    }

    pub async fn execute(&self, sender: &ClientHandle, text: &str) -> RelayOutcome {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping malformed message from '{}': {}", sender, e);
                return RelayOutcome::Dropped;
            }
        };

        let Some(client) = self.hub.repository().get_client(sender).await else {
            tracing::debug!("Message from disconnected client '{}' ignored", sender);
            return RelayOutcome::Dropped;
        };

        if let InboundMessage::Identify(identify) = &message {
            return self
                .identify(sender, &identify.client_type, identify.version.clone())
                .await;
        }

        if !client.is_identified() {
            tracing::debug!(
                "Dropping '{}' from unidentified client '{}'",
                message.command(),
                sender
            );
            return RelayOutcome::Dropped;
        }

        match &message {
            InboundMessage::CurrentTrack(current) => {
                let mut snapshot = TrackSnapshot::from(current.as_ref());
                if snapshot.cover.is_none()
                    && let Some(path) = current.local_path()
                {
                    snapshot.cover = self.artwork.cover_for(path).await;
                }
                let resolved = self
                    .hub
                    .store_current_track(snapshot, current.request_id())
                    .await;
                tracing::debug!("currentTrack stored ({} waiter(s) resolved)", resolved);
            }
            InboundMessage::RequestHandled(handled) => {
                let track = ResolvedTrack::from(handled);
                let resolved = self.hub.store_resolved(track, handled.request_id()).await;
                tracing::debug!("requestHandled stored ({} waiter(s) resolved)", resolved);
            }
            InboundMessage::Other { command } => {
                tracing::debug!("Relaying unhandled command '{}' from '{}'", command, sender);
            }
            InboundMessage::Identify(_) => {}
        }

        let delivered = self.hub.forward_from(sender, text).await;
        RelayOutcome::Forwarded {
            command: message.command().to_string(),
            delivered,
        }
    }

    async fn identify(
        &self,
        sender: &ClientHandle,
        client_type: &str,
        version: Option<String>,
    ) -> RelayOutcome {
        let client_type = match ClientType::new(client_type) {
            Ok(client_type) => client_type,
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!("Rejecting identify from '{}': {}", sender, reason);
                self.reply(sender, OutboundCommand::error(reason.clone()).to_json())
                    .await;
                return RelayOutcome::Rejected(reason);
            }
        };

        let client = match self
            .hub
            .repository()
            .identify_client(sender, client_type, version)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                tracing::debug!("Identify from '{}' ignored: {}", sender, e);
                return RelayOutcome::Dropped;
            }
        };

        tracing::info!(
            "Client '{}' identified as '{}' (version: {})",
            sender,
            client.client_type,
            client.version.as_deref().unwrap_or("-")
        );
        let ack = serde_json::to_string(&IdentifyAck::new(client.client_type.as_str()));
        self.reply(sender, ack).await;

        RelayOutcome::Identified(client)
    }

    async fn reply(&self, target: &ClientHandle, json: Result<String, serde_json::Error>) {
        let result = match json {
            Ok(json) => self
                .hub
                .pusher()
                .push_to(target, &json)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to reply to '{}': {}", target, e);
        }
    }
}
