//! Shared application state.

use crate::usecase::ConnectionGateway;

/// Shared application state
pub struct AppState {
    /// Entry point for every WebSocket lifecycle event
    pub gateway: ConnectionGateway,
}

impl AppState {
    pub fn new(gateway: ConnectionGateway) -> Self {
        Self { gateway }
    }
}
