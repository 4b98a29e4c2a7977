//! Encore server library.
//!
//! A local WebSocket relay for browser player bridges, a song request queue
//! with auto-advance, and an HTTP API for overlays and chat bots.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// wiring
pub mod app;
pub mod config;
