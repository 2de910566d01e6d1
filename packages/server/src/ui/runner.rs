//! Server entry point: CLI arguments, routing and the serve loop.

use std::sync::Arc;

use axum::{Router, routing::get};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    error::ServerError,
    infrastructure::repository::InMemoryChatStateRepository,
    ui::{
        handler::{health_check, relay_status, websocket_handler},
        signal::shutdown_signal,
        state::AppState,
    },
    usecase::ConnectionGateway,
};

/// Hiroba chat relay server
#[derive(Debug, Clone, Parser)]
#[command(name = "hiroba-server", version, about)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Development mode: debug logging and startup diagnostics
    #[arg(long)]
    pub dev: bool,
}

impl ServerArgs {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the router around a fresh in-memory state.
pub fn build_app() -> (Router, Arc<AppState>) {
    let repository = Arc::new(InMemoryChatStateRepository::new());
    let state = Arc::new(AppState::new(ConnectionGateway::new(repository)));

    let app = Router::new()
        .route("/", get(websocket_handler))
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/status", get(relay_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    (app, state)
}

/// Bind and serve until a shutdown signal arrives.
pub async fn run(args: ServerArgs) -> Result<(), ServerError> {
    let addr = args.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let (app, state) = build_app();

    tracing::info!("Hiroba chat relay listening on ws://{}", addr);
    if args.dev {
        let snapshot = state.gateway.snapshot().await;
        tracing::info!(
            "Development mode: {} connections, rooms: {:?}",
            snapshot.connections, snapshot.room_sizes
        );
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}
