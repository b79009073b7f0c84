use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::store::{timeout_query, QUERY_TIMEOUT};
use crate::InnerState;

/// Liveness probe that also verifies the database still answers.
#[tracing::instrument(name = "Health check", skip(inner))]
pub async fn health_check(State(inner): State<InnerState>) -> impl IntoResponse {
    let InnerState { db, .. } = inner;

    let probe = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&db),
    )
    .await;

    match probe {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Health check database probe failed: {:?}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::test_pool;

    async fn test_state() -> InnerState {
        InnerState {
            db: test_pool().await,
            config: AppConfig::for_tests("http://unused"),
            youtube: None,
        }
    }

    #[tokio::test]
    async fn reports_ok_while_the_database_answers() {
        let state = test_state().await;

        let response = health_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn reports_unavailable_once_the_pool_is_closed() {
        let state = test_state().await;
        state.db.close().await;

        let response = health_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
