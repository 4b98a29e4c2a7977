//! Repository trait 定義
//!
//! ドメイン層が必要とする接続クライアント台帳へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ClientHandle, ClientType, ConnectedClient, RepositoryError};

/// 接続クライアント台帳
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// 接続直後のクライアントを登録
    async fn add_client(&self, client: ConnectedClient);

    /// クライアントを削除（存在しなければ None）
    async fn remove_client(&self, handle: &ClientHandle) -> Option<ConnectedClient>;

    /// 種別とバージョンを記録する
    async fn identify_client(
        &self,
        handle: &ClientHandle,
        client_type: ClientType,
        version: Option<String>,
    ) -> Result<ConnectedClient, RepositoryError>;

    /// クライアントを取得
    async fn get_client(&self, handle: &ClientHandle) -> Option<ConnectedClient>;

    /// 接続中の全クライアント（接続時刻順）
    async fn get_clients(&self) -> Vec<ConnectedClient>;

    /// 指定種別のクライアントのハンドル
    async fn handles_of_type(&self, client_type: &ClientType) -> Vec<ClientHandle>;

    /// 接続中の全ハンドル
    async fn get_all_handles(&self) -> Vec<ClientHandle>;

    /// 接続中のクライアント数
    async fn count_connected_clients(&self) -> usize;
}
