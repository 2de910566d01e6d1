//! HTTP API response DTOs for the chat relay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::usecase::RelaySnapshot;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

impl HealthDto {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Relay status for the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDto {
    /// Number of live connections
    pub connections: usize,
    /// Member count per non-empty room
    pub rooms: BTreeMap<String, usize>,
}

impl From<RelaySnapshot> for StatusDto {
    fn from(snapshot: RelaySnapshot) -> Self {
        Self {
            connections: snapshot.connections,
            rooms: snapshot.room_sizes,
        }
    }
}
