//! Repository trait for the relay state.
//!
//! The domain layer owns the abstraction; the infrastructure layer provides
//! the implementation (dependency inversion).

use async_trait::async_trait;
use tokio::sync::MutexGuard;

use super::state::ChatState;

/// Exclusive handle on the relay state.
///
/// Holding the guard serializes every read and write across the connection
/// registry, room directory and identity store.
pub type ChatStateGuard<'a> = MutexGuard<'a, ChatState>;

#[async_trait]
pub trait ChatStateRepository: Send + Sync {
    /// Acquire exclusive access to the relay state.
    async fn lock(&self) -> ChatStateGuard<'_>;
}
