//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::ConnectionId;

/// Errors from ConnectParticipantUseCase
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The connection id is already registered
    #[error("Connection '{0}' is already registered")]
    DuplicateConnectionId(ConnectionId),
}

/// Errors from DisconnectParticipantUseCase
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisconnectError {
    /// The connection was never registered or has already been cleaned up
    #[error("Connection '{0}' is not registered")]
    NotConnected(ConnectionId),
}
