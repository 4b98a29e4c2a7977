//! Request handlers.

mod http;
mod websocket;

pub use http::{
    add_queue_item, clear_queue, get_clients, get_now_playing, get_queue, health_check,
    issue_playback_command, post_chat, remove_queue_item, update_backend,
};
pub use websocket::websocket_handler;
