//! UI utilities for the bridge.

use std::io::Write;

/// Redisplay the prompt after printing an incoming frame
pub fn redisplay_prompt(client_type: &str) {
    print!("{}> ", client_type);
    std::io::stdout().flush().ok();
}
