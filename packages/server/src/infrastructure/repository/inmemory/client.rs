//! InMemory Client Repository 実装
//!
//! ドメイン層が定義する ClientRepository trait の具体的な実装。
//! 接続順を保つため Vec をインメモリ台帳として使用します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientHandle, ClientRepository, ClientType, ConnectedClient, RepositoryError};

/// インメモリ Client Repository 実装
#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: Arc<Mutex<Vec<ConnectedClient>>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn add_client(&self, client: ConnectedClient) {
        let mut clients = self.clients.lock().await;
        clients.retain(|c| c.handle != client.handle);
        clients.push(client);
    }

    async fn remove_client(&self, handle: &ClientHandle) -> Option<ConnectedClient> {
        let mut clients = self.clients.lock().await;
        let position = clients.iter().position(|c| &c.handle == handle)?;
        Some(clients.remove(position))
    }

    async fn identify_client(
        &self,
        handle: &ClientHandle,
        client_type: ClientType,
        version: Option<String>,
    ) -> Result<ConnectedClient, RepositoryError> {
        let mut clients = self.clients.lock().await;
        let client = clients
            .iter_mut()
            .find(|c| &c.handle == handle)
            .ok_or_else(|| RepositoryError::ClientNotFound(handle.to_string()))?;
        client.identify(client_type, version);
        Ok(client.clone())
    }

    async fn get_client(&self, handle: &ClientHandle) -> Option<ConnectedClient> {
        let clients = self.clients.lock().await;
        clients.iter().find(|c| &c.handle == handle).cloned()
    }

    async fn get_clients(&self) -> Vec<ConnectedClient> {
        self.clients.lock().await.clone()
    }

    async fn handles_of_type(&self, client_type: &ClientType) -> Vec<ClientHandle> {
        let clients = self.clients.lock().await;
        clients
            .iter()
            .filter(|c| &c.client_type == client_type)
            .map(|c| c.handle)
            .collect()
    }

    async fn get_all_handles(&self) -> Vec<ClientHandle> {
        let clients = self.clients.lock().await;
        clients.iter().map(|c| c.handle).collect()
    }

    async fn count_connected_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}
