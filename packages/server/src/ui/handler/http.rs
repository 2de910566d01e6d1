//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{HealthDto, StatusDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto::ok())
}

/// Connection count and room sizes
pub async fn relay_status(State(state): State<Arc<AppState>>) -> Json<StatusDto> {
    Json(state.gateway.snapshot().await.into())
}
