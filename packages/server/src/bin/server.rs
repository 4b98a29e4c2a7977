//! Encore relay server.
//!
//! Accepts bridge connections on `/ws`, keeps the request queue and advances it
//! when the current song is about to end.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin encore-server
//! cargo run --bin encore-server -- --config encore.toml --platform cider
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use encore_server::{app::App, config::Settings, domain::Platform, ui::Server};
use encore_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "encore-server")]
#[command(about = "Local relay and song request queue for Encore", long_about = None)]
struct Args {
    /// Host address to bind the server to (overrides the settings file)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port number to bind the server to (overrides the settings file)
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Path to a TOML settings file
    #[arg(short = 'c', long, env = "ENCORE_CONFIG")]
    config: Option<PathBuf>,

    /// Active playback platform, e.g. "spotify-bridge", "ytmdesktop" or "cider"
    #[arg(long)]
    platform: Option<Platform>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    if let Some(host) = args.host {
        settings.relay.host = host;
    }
    if let Some(port) = args.port {
        settings.relay.port = port;
    }
    if let Some(platform) = args.platform {
        settings.playback.platform = platform;
    }
    tracing::info!("Active platform: {}", settings.playback.platform);

    let app = match App::build(&settings, Arc::new(SystemClock)) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };
    let (state, tasks) = app.start();

    let result = Server::new(state)
        .run(&settings.relay.host, settings.relay.port)
        .await;

    for task in tasks {
        task.abort();
    }
    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
