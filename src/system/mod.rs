//! System-level routes and utilities

pub mod health_check;

use axum::routing::get;
use axum::Router;

use crate::InnerState;

/// Creates system routes
#[tracing::instrument(name = "create_system_router", skip(state))]
pub fn create_system_router(state: InnerState) -> Router {
    tracing::info!("Creating system router");

    Router::new()
        .route("/health", get(health_check::health_check))
        .with_state(state)
}
