//! Frame formatting for the bridge console.

use encore_shared::time::{format_duration_millis, get_timestamp, timestamp_to_rfc3339};
use serde_json::Value;

/// Message formatter for bridge display
pub struct FrameFormatter;

impl FrameFormatter {
    /// Format an incoming relay frame.
    ///
    /// Known shapes get a one-line summary; anything else is shown raw.
    pub fn format_frame(text: &str) -> String {
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            return Self::format_raw_message(text);
        };

        if value.get("acknowledged").and_then(Value::as_bool) == Some(true) {
            let client_type = value.get("type").and_then(Value::as_str).unwrap_or("?");
            return format!("\n✓ Identified as '{}'\n", client_type);
        }

        let Some(command) = value.get("command").and_then(Value::as_str) else {
            return Self::format_raw_message(text);
        };
        let data = value.get("data").unwrap_or(&Value::Null);

        match command {
            "error" => format!("\n! Relay error: {}\n", data.as_str().unwrap_or("-")),
            "queue" => Self::format_queue(data),
            "notification" => format!(
                "\n[{}] {}\n",
                data.get("level").and_then(Value::as_str).unwrap_or("info"),
                data.get("message").and_then(Value::as_str).unwrap_or("")
            ),
            "currentTrack" => Self::format_current_track(&value),
            _ if data.is_null() => format!("\n← {}\n", command),
            _ => format!("\n← {} {}\n", command, data),
        }
    }

    fn format_queue(data: &Value) -> String {
        let items = data.get("items").and_then(Value::as_array);
        let Some(items) = items.filter(|items| !items.is_empty()) else {
            return "\n♪ Queue is empty\n".to_string();
        };

        let mut output = String::from("\n♪ Queue:\n");
        for (i, item) in items.iter().enumerate() {
            let marker = if item.get("isCurrentlyPlaying").and_then(Value::as_bool) == Some(true) {
                "▶"
            } else {
                " "
            };
            output.push_str(&format!(
                "{} {}. {} - {} ({})\n",
                marker,
                i + 1,
                item.get("title").and_then(Value::as_str).unwrap_or("?"),
                item.get("artist").and_then(Value::as_str).unwrap_or("?"),
                item.get("requestedBy").and_then(Value::as_str).unwrap_or("?"),
            ));
        }
        output
    }

    fn format_current_track(value: &Value) -> String {
        let data = value.get("data").unwrap_or(&Value::Null);
        let progress = value.get("progress").and_then(Value::as_u64).unwrap_or(0);
        let duration = data.get("duration").and_then(Value::as_u64).unwrap_or(0);
        format!(
            "\n♫ {} - {} [{} / {}]\n",
            data.get("title").and_then(Value::as_str).unwrap_or("?"),
            data.get("artist").and_then(Value::as_str).unwrap_or("?"),
            format_duration_millis(progress),
            format_duration_millis(duration),
        )
    }

    /// Format a confirmation after a typed line was sent
    pub fn format_sent_confirmation(sent_at: i64) -> String {
        format!("sent at {}\n", timestamp_to_rfc3339(sent_at))
    }

    /// Format a note about an automatic reply to a relay request
    pub fn format_auto_reply(command: &str) -> String {
        format!(
            "\n→ answered {} at {}\n",
            command,
            timestamp_to_rfc3339(get_timestamp())
        )
    }

    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
