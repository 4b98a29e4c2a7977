//! Error types for the development bridge.

use thiserror::Error;

/// Bridge-specific errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The relay could not be reached or the socket broke
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The relay refused the identify handshake
    #[error("Relay rejected identify: {0}")]
    Rejected(String),
}
