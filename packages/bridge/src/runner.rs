//! Bridge execution logic with reconnection support.

use std::time::Duration;

use super::{error::BridgeError, session::run_bridge_session};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the bridge, reconnecting after connection loss.
///
/// A rejected identify is not retried. Gives up after
/// `MAX_RECONNECT_ATTEMPTS` consecutive failures.
pub async fn run_bridge(
    url: String,
    client_type: String,
    version: String,
) -> Result<(), BridgeError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            url,
            client_type,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_bridge_session(&url, &client_type, &version).await {
            Ok(()) => {
                tracing::info!("Bridge session ended normally");
                return Ok(());
            }
            Err(e @ BridgeError::Rejected(_)) => return Err(e),
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    tracing::error!(
                        "Failed to reconnect after {} attempts",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
