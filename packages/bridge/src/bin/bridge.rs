//! Development bridge for the Encore relay.
//!
//! Connects to the relay, identifies with the given client type and answers
//! `getdata` / `getInfo` from a simulated player. Raw JSON typed at the prompt
//! is sent as-is. Reconnects on disconnection (max 5 attempts).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin encore-bridge
//! cargo run --bin encore-bridge -- --type youtube-bridge --url ws://127.0.0.1:8080/ws
//! ```

use clap::Parser;

use encore_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "encore-bridge")]
#[command(about = "Simulated player bridge for the Encore relay", long_about = None)]
struct Args {
    /// Relay WebSocket URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Client type sent with identify
    #[arg(short = 't', long = "type", default_value = "spotify-bridge")]
    client_type: String,

    /// Version sent with identify
    #[arg(short = 'v', long, default_value = env!("CARGO_PKG_VERSION"))]
    version: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = encore_bridge::run_bridge(args.url, args.client_type, args.version).await {
        tracing::error!("Bridge error: {}", e);
        std::process::exit(1);
    }
}
