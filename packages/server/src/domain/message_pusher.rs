//! MessagePusher trait 定義
//!
//! リレークライアントへのメッセージ送信を抽象化します。
//! 配信は fire-and-forget で、到達の保証はしない。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ClientHandle, MessagePushError};

/// クライアントの送信タスクへつながるチャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, handle: ClientHandle, sender: PusherChannel);

    /// クライアントの送信チャンネルを削除
    async fn unregister_client(&self, handle: &ClientHandle);

    /// 特定のクライアントへ送信
    async fn push_to(&self, handle: &ClientHandle, content: &str) -> Result<(), MessagePushError>;

    /// 複数のクライアントへ送信し、実際に書き込めた数を返す
    ///
    /// 閉じたチャンネルや未登録のクライアントは読み飛ばす。
    async fn broadcast(
        &self,
        targets: Vec<ClientHandle>,
        content: &str,
    ) -> Result<usize, MessagePushError>;
}
