//! Infrastructure layer
//!
//! ドメイン層が定義した trait の具体的な実装と、外部とのデータ形式（DTO）を置きます。

pub mod artwork;
pub mod backend;
pub mod dto;
pub mod message_pusher;
pub mod repository;

pub use artwork::EmbeddedArtworkSource;
pub use backend::{DefaultBackendProvider, HttpEndpoint};
pub use message_pusher::WebSocketMessagePusher;
pub use repository::InMemoryClientRepository;
