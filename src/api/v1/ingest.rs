use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::common::ApiResponse;
use crate::errors::AppError;
use crate::youtube::ingest::{
    BatchSummary, IngestService, IngestSummary, BATCH_MAX_CHANNELS, CLIP_DEFAULT_MAX_RESULTS,
    CLIP_MAX_RESULTS,
};
use crate::InnerState;

#[derive(Debug, Deserialize)]
pub struct OfficialIngestRequest {
    pub stella: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipIngestRequest {
    pub stella: Option<String>,
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BatchIngestRequest {
    #[serde(default)]
    pub stellas: Vec<String>,
}

/// Ingestion runs only when an API key was configured at startup.
fn ingest_service(inner: &InnerState) -> Result<IngestService, AppError> {
    let youtube = inner
        .youtube
        .clone()
        .ok_or_else(|| AppError::Configuration("YOUTUBE_API_KEY is not configured".to_string()))?;

    Ok(IngestService::new(
        inner.db.clone(),
        youtube,
        inner.config.clone(),
    ))
}

fn required_stella(raw: &Option<String>) -> Result<String, AppError> {
    match raw.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(AppError::Validation("stella is required".to_string())),
    }
}

#[tracing::instrument(name = "Official ingest request", skip(inner, payload))]
pub async fn ingest_official(
    State(inner): State<InnerState>,
    Json(payload): Json<OfficialIngestRequest>,
) -> Result<Json<ApiResponse<IngestSummary>>, AppError> {
    let stella = required_stella(&payload.stella)?;
    let service = ingest_service(&inner)?;

    tracing::info!("ingest_official: requested for {}", stella);
    let summary = service.ingest_official(&stella).await?;

    Ok(Json(ApiResponse::success(summary)))
}

#[tracing::instrument(name = "Clip ingest request", skip(inner, payload))]
pub async fn ingest_clips(
    State(inner): State<InnerState>,
    Json(payload): Json<ClipIngestRequest>,
) -> Result<Json<ApiResponse<IngestSummary>>, AppError> {
    let stella = required_stella(&payload.stella)?;

    let max_results = match payload.max_results {
        None => CLIP_DEFAULT_MAX_RESULTS,
        Some(v) if (1..=CLIP_MAX_RESULTS).contains(&v) => v,
        Some(_) => {
            return Err(AppError::Validation(format!(
                "maxResults must be between 1 and {}",
                CLIP_MAX_RESULTS
            )))
        }
    };

    let service = ingest_service(&inner)?;

    tracing::info!(
        "ingest_clips: requested for {} with maxResults {}",
        stella,
        max_results
    );
    let summary = service.ingest_clips(&stella, max_results).await?;

    Ok(Json(ApiResponse::success(summary)))
}

#[tracing::instrument(name = "Batch ingest request", skip(inner, payload))]
pub async fn ingest_batch(
    State(inner): State<InnerState>,
    Json(payload): Json<BatchIngestRequest>,
) -> Result<Json<ApiResponse<BatchSummary>>, AppError> {
    if payload.stellas.is_empty() {
        return Err(AppError::Validation(
            "stellas must contain at least one name".to_string(),
        ));
    }
    if payload.stellas.len() > BATCH_MAX_CHANNELS {
        return Err(AppError::Validation(format!(
            "stellas cannot list more than {} channels",
            BATCH_MAX_CHANNELS
        )));
    }

    let service = ingest_service(&inner)?;

    tracing::info!("ingest_batch: requested for {} channels", payload.stellas.len());
    let summary = service.ingest_batch(&payload.stellas).await?;

    Ok(Json(ApiResponse::success(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::test_pool;
    use crate::store::members;

    async fn state_without_key() -> InnerState {
        let db = test_pool().await;
        let config = AppConfig::for_tests("http://unused");
        members::sync_roster(&db, &config.roster).await.unwrap();

        InnerState {
            db,
            config,
            youtube: None,
        }
    }

    #[tokio::test]
    async fn official_requires_a_stella_name() {
        let state = state_without_key().await;

        for stella in [None, Some("".to_string()), Some("   ".to_string())] {
            let err = ingest_official(
                State(state.clone()),
                Json(OfficialIngestRequest { stella: stella.clone() }),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?}", stella);
        }
    }

    #[tokio::test]
    async fn official_fails_without_an_api_key() {
        let state = state_without_key().await;

        let err = ingest_official(
            State(state),
            Json(OfficialIngestRequest {
                stella: Some("KANNA".to_string()),
            }),
        )
        .await
        .unwrap_err();

        match err {
            AppError::Configuration(message) => assert!(message.contains("YOUTUBE_API_KEY")),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn clips_rejects_an_out_of_range_cap() {
        let state = state_without_key().await;

        for cap in [0, CLIP_MAX_RESULTS + 1] {
            let err = ingest_clips(
                State(state.clone()),
                Json(ClipIngestRequest {
                    stella: Some("RIN".to_string()),
                    max_results: Some(cap),
                }),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "cap {}", cap);
        }
    }

    #[tokio::test]
    async fn batch_rejects_empty_and_oversized_requests() {
        let state = state_without_key().await;

        let err = ingest_batch(
            State(state.clone()),
            Json(BatchIngestRequest { stellas: vec![] }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let too_many: Vec<String> = (0..=BATCH_MAX_CHANNELS).map(|i| format!("S{}", i)).collect();
        let err = ingest_batch(
            State(state),
            Json(BatchIngestRequest { stellas: too_many }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
