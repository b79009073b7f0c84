//! API Version 1 endpoints

pub mod ingest;
pub mod members;
pub mod videos;

use axum::routing::{get, post};
use axum::Router;

use crate::InnerState;

/// Creates the V1 API router
#[tracing::instrument(name = "create_v1_router", skip(state))]
pub fn create_v1_router(state: InnerState) -> Router {
    tracing::info!("Creating V1 API router");

    Router::new()
        .route("/api/v1/videos/search", get(videos::search_videos))
        .route("/api/v1/videos/:video_id", get(videos::get_video))
        .route("/api/v1/members", get(members::all_members))
        .route("/api/v1/ingest/official", post(ingest::ingest_official))
        .route("/api/v1/ingest/clips", post(ingest::ingest_clips))
        .route("/api/v1/ingest/batch", post(ingest::ingest_batch))
        .with_state(state)
}
