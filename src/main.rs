mod api;
mod config;
mod db;
mod errors;
mod models;
mod search;
mod store;
mod system;
mod youtube;

use std::error::Error;

use axum::routing::get;
use axum::Router;
use axum_prometheus::PrometheusMetricLayer;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::v1::create_v1_router;
use crate::config::AppConfig;
use crate::db::init_db;
use crate::store::members;
use crate::system::create_system_router;
use crate::youtube::YoutubeClient;

#[derive(Clone)]
pub struct InnerState {
    pub db: SqlitePool,
    pub config: AppConfig,
    pub youtube: Option<YoutubeClient>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_stellaclip=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let db = init_db(&config.database_url).await?;

    let synced = members::sync_roster(&db, &config.roster).await?;
    tracing::info!("Roster ready with {} members", synced);

    let youtube = match config.youtube_api_key.clone() {
        Some(key) => Some(YoutubeClient::new(config.youtube_api_base.clone(), key)?),
        None => {
            tracing::warn!("YOUTUBE_API_KEY is not set, ingest endpoints are disabled");
            None
        }
    };

    let state = InnerState {
        db,
        config: config.clone(),
        youtube,
    };

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::debug!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Full application router: versioned API, system routes, a Prometheus
/// render route and the CORS/trace/metrics layers. Installs the
/// process-global metrics recorder, so call it once per process.
fn build_app(state: InnerState) -> Router {
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    Router::new()
        .merge(create_v1_router(state.clone()))
        .merge(create_system_router(state))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::NewVideo;
    use crate::store::{members, videos};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    async fn serve_app() -> String {
        let db = test_pool().await;
        let config = AppConfig::for_tests("http://unused");
        members::sync_roster(&db, &config.roster).await.unwrap();

        for (video_id, day) in [("jan-3", 3), ("jan-2", 2), ("jan-1", 1)] {
            let record = NewVideo {
                video_id: video_id.to_string(),
                title: format!("video {}", video_id),
                description: None,
                published_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
                thumbnail_default: None,
                thumbnail_medium: None,
                thumbnail_high: None,
                channel_id: "UCseed000000000000000000".to_string(),
                channel_title: "seed".to_string(),
                is_official: true,
                duration: Some("4:13".to_string()),
                view_count: Some(day as i64),
                like_count: None,
                category: None,
                tags: vec![],
                source_query: "channel:KANNA".to_string(),
            };
            videos::upsert_video(&db, &record).await.unwrap();
        }

        let app = build_app(InnerState {
            db,
            config,
            youtube: None,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    // The metrics recorder is process-global, so the whole HTTP surface is
    // exercised from a single server instance.
    #[tokio::test]
    async fn serves_the_api_surface_over_http() {
        let base = serve_app().await;
        let client = reqwest::Client::new();

        let health = client.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(health.status(), 200);

        let search: Value = client
            .get(format!(
                "{}/api/v1/videos/search?stella=ALL&isOfficial=true&maxResult=2&page=1",
                base
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(search["success"], true);
        assert_eq!(search["data"][0]["videoId"], "jan-3");
        assert_eq!(search["data"][1]["videoId"], "jan-2");
        assert_eq!(search["pagination"]["total"], 3);
        assert_eq!(search["pagination"]["totalPages"], 2);

        let invalid = client
            .get(format!("{}/api/v1/videos/search", base))
            .send()
            .await
            .unwrap();
        assert_eq!(invalid.status(), 400);
        let body: Value = invalid.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("stella or gen"));

        let hinted = client
            .get(format!("{}/api/v1/videos/search?stella=NOBODY", base))
            .send()
            .await
            .unwrap();
        assert_eq!(hinted.status(), 400);
        let body: Value = hinted.json().await.unwrap();
        assert!(body["data"]["availableMembers"].is_array());

        let missing = client
            .get(format!("{}/api/v1/videos/does-not-exist", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);

        let catalog: Value = client
            .get(format!("{}/api/v1/members", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(catalog["success"], true);
        assert_eq!(catalog["data"].as_array().unwrap().len(), 10);

        let metrics = client.get(format!("{}/metrics", base)).send().await.unwrap();
        assert_eq!(metrics.status(), 200);
    }
}
