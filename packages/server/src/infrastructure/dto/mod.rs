//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: relay wire protocol
//! - `http`: local HTTP API request/response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
