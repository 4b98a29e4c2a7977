//! Utilities shared by the Encore server and the development bridge.

pub mod logger;
pub mod time;
