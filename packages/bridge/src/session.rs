//! Relay session management.

use std::sync::Arc;

use encore_server::infrastructure::dto::websocket::OutboundCommand;
use encore_shared::time::{SystemClock, get_timestamp};
use futures_util::{SinkExt, StreamExt};
use rustyline::{DefaultEditor, error::ReadlineError};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use super::{
    error::BridgeError, formatter::FrameFormatter, simulator::SimulatedPlayer,
    ui::redisplay_prompt,
};

/// What the bridge does with one incoming frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameAction {
    /// Send `body` back to the relay without operator input
    Reply { command: String, body: String },
    /// A playback command was applied to the simulated player
    Applied(String),
    /// The relay refused the identify handshake
    Rejected(String),
    /// Nothing to do but show it
    Display,
}

/// Per-connection state shared by the read loop
pub struct BridgeState {
    pub client_type: String,
    pub version: String,
    pub identified: bool,
    pub player: SimulatedPlayer,
}

impl BridgeState {
    pub fn new(client_type: &str, version: &str, player: SimulatedPlayer) -> Self {
        Self {
            client_type: client_type.to_string(),
            version: version.to_string(),
            identified: false,
            player,
        }
    }

    /// Decide how to react to a frame from the relay
    pub fn handle_frame(&mut self, text: &str) -> FrameAction {
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            return FrameAction::Display;
        };

        if value.get("acknowledged").and_then(Value::as_bool) == Some(true) {
            self.identified = true;
            return FrameAction::Display;
        }

        let Some(command) = value.get("command").and_then(Value::as_str) else {
            return FrameAction::Display;
        };
        let request_id = value.get("requestId");

        let body = match command {
            "identify" => json!({
                "command": "identify",
                "type": self.client_type,
                "version": self.version,
            }),
            "getdata" => self.player.current_track_message(request_id),
            "getInfo" => {
                let url = value
                    .get("data")
                    .and_then(|data| data.get("url"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                self.player.request_handled_message(url, request_id)
            }
            "error" if !self.identified => {
                let reason = value.get("data").and_then(Value::as_str).unwrap_or("-");
                return FrameAction::Rejected(reason.to_string());
            }
            _ => {
                return match serde_json::from_value::<OutboundCommand>(value.clone()) {
                    Ok(outbound) if self.player.apply(&outbound) => {
                        FrameAction::Applied(command.to_string())
                    }
                    _ => FrameAction::Display,
                };
            }
        };

        FrameAction::Reply {
            command: command.to_string(),
            body: body.to_string(),
        }
    }
}

/// Run one relay session until the operator exits or the socket breaks
pub async fn run_bridge_session(
    url: &str,
    client_type: &str,
    version: &str,
) -> Result<(), BridgeError> {
    let (ws_stream, _) = connect_async(url)
        .await
        .map_err(|e| BridgeError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to relay!");
    println!(
        "\nBridging as '{}'. Type raw JSON frames and press Enter to send. Press Ctrl+C to exit.\n",
        client_type
    );

    let (mut write, mut read) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    let mut state = BridgeState::new(
        client_type,
        version,
        SimulatedPlayer::new(Arc::new(SystemClock)),
    );

    // Spawn a task to handle incoming frames
    let prompt_for_read = client_type.to_string();
    let reply_tx = out_tx.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let action = state.handle_frame(text.as_str());
                    match action {
                        FrameAction::Reply { command, body } => {
                            if reply_tx.send(body).is_err() {
                                break;
                            }
                            tracing::debug!("{}", FrameFormatter::format_auto_reply(&command));
                        }
                        FrameAction::Rejected(reason) => {
                            return Err(BridgeError::Rejected(reason));
                        }
                        FrameAction::Applied(command) => {
                            tracing::info!("Applied '{}' to the simulated player", command);
                        }
                        FrameAction::Display => {
                            print!("{}", FrameFormatter::format_frame(text.as_str()));
                            redisplay_prompt(&prompt_for_read);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Relay closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        Err(BridgeError::ConnectionError("Connection lost".to_string()))
    });

    // Spawn a task to drain outgoing frames into the socket
    let mut write_task = tokio::spawn(async move {
        while let Some(body) = out_rx.recv().await {
            if let Err(e) = write.send(Message::Text(body.into())).await {
                tracing::warn!("Failed to send frame: {}", e);
                return Err(BridgeError::ConnectionError(e.to_string()));
            }
        }
        Ok(())
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt = format!("{}> ", client_type);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Forward typed JSON lines
    let prompt_for_input = client_type.to_string();
    let mut input_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            if let Err(e) = serde_json::from_str::<Value>(&line) {
                println!("Not valid JSON ({}), nothing sent", e);
                redisplay_prompt(&prompt_for_input);
                continue;
            }
            if out_tx.send(line).is_err() {
                break;
            }
            print!("{}", FrameFormatter::format_sent_confirmation(get_timestamp()));
            redisplay_prompt(&prompt_for_input);
        }
    });

    // If any one of the tasks completes, abort the others
    let result = tokio::select! {
        read_result = &mut read_task => read_result
            .unwrap_or_else(|e| Err(BridgeError::ConnectionError(e.to_string()))),
        write_result = &mut write_task => write_result
            .unwrap_or_else(|e| Err(BridgeError::ConnectionError(e.to_string()))),
        _ = &mut input_task => Ok(()),
    };
    read_task.abort();
    write_task.abort();
    input_task.abort();

    result
}
