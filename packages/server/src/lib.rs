//! Hiroba chat relay server library.
//!
//! Relays chat between WebSocket connections grouped into named rooms, with
//! private messages, display names and delivery receipts.

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use error::ServerError;
pub use ui::{ServerArgs, run};
