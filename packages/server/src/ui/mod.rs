//! WebSocket chat relay server.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{ServerArgs, build_app, run};
