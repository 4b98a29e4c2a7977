//! Development bridge for the Encore relay.
//!
//! Behaves like a browser player script: identifies itself, answers snapshot
//! and lookup requests from a simulated player, and forwards raw JSON typed
//! by the operator.

pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod simulator;
pub mod ui;

pub use runner::run_bridge;
