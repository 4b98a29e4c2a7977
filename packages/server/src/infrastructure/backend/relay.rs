//! Relay-mediated backend
//!
//! Commands go to every connected bridge of one client type. Queries
//! (`getdata` / `getInfo`) carry a fresh `requestId` and wait for the
//! matching reply with a timeout.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::domain::{
    ClientType, PlaybackBackend, PlaybackCommand, PlaybackError, RelayHub, ResolvedTrack,
    TrackSnapshot,
};
use crate::infrastructure::dto::websocket::{OutboundCommand, RelayCommand};

pub struct RelayBackend {
    hub: Arc<RelayHub>,
    client_type: ClientType,
    timeout: Duration,
}

impl RelayBackend {
    pub fn new(hub: Arc<RelayHub>, client_type: ClientType, timeout: Duration) -> Self {
        Self {
            hub,
            client_type,
            timeout,
        }
    }

    async fn push(&self, command: &OutboundCommand) -> Result<(), PlaybackError> {
        let json = command
            .to_json()
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;
        let delivered = self.hub.send_to_type(&json, &self.client_type).await;
        if delivered == 0 {
            return Err(PlaybackError::NoClient(self.client_type.to_string()));
        }
        tracing::debug!(
            "Sent '{:?}' to {} '{}' client(s)",
            command.command,
            delivered,
            self.client_type
        );
        Ok(())
    }

    async fn await_reply<T>(
        &self,
        request_id: Uuid,
        reply: oneshot::Receiver<T>,
    ) -> Result<T, PlaybackError> {
        match tokio::time::timeout(self.timeout, reply).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) | Err(_) => {
                self.hub.cancel(&request_id).await;
                Err(PlaybackError::NoResponse {
                    client_type: self.client_type.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[async_trait]
impl PlaybackBackend for RelayBackend {
    async fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        self.push(&OutboundCommand::from(&command)).await
    }

    async fn current_track(&self) -> Result<Option<TrackSnapshot>, PlaybackError> {
        let request_id = Uuid::new_v4();
        let reply = self.hub.expect_track(request_id).await;

        let command = OutboundCommand::new(RelayCommand::GetData).with_request_id(request_id);
        if let Err(e) = self.push(&command).await {
            self.hub.cancel(&request_id).await;
            return Err(e);
        }

        let snapshot = self.await_reply(request_id, reply).await?;
        Ok((!snapshot.id.is_empty()).then_some(snapshot))
    }

    async fn resolve(&self, link: &str) -> Result<ResolvedTrack, PlaybackError> {
        let request_id = Uuid::new_v4();
        let reply = self.hub.expect_resolved(request_id).await;

        let command = OutboundCommand::new(RelayCommand::GetInfo)
            .with_data(json!({ "url": link }))
            .with_request_id(request_id);
        if let Err(e) = self.push(&command).await {
            self.hub.cancel(&request_id).await;
            return Err(e);
        }

        let track = self.await_reply(request_id, reply).await?;
        if track.id.is_empty() {
            return Err(PlaybackError::Decode(format!("'{}' did not resolve", link)));
        }
        Ok(track)
    }
}
