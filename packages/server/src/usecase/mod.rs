//! UseCase layer: application logic of the relay.

pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod gateway;
pub mod route_event;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, DisconnectError};
pub use gateway::{ConnectionGateway, RelaySnapshot};
pub use route_event::EventRouter;
