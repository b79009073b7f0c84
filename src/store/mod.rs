//! Storage layer: typed queries over the videos, members and appearance
//! tables. Every query runs under a bounded timeout.

pub mod appearances;
pub mod members;
pub mod videos;

use std::time::Duration;

use crate::errors::AppError;

pub(crate) const QUERY_TIMEOUT: Duration = Duration::from_millis(10_000);

pub(crate) async fn timeout_query<T, F>(duration: Duration, fut: F) -> Result<T, AppError>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(Ok(res)) => Ok(res),
        Ok(Err(e)) => Err(AppError::from(e)),
        Err(e) => {
            tracing::error!("Query timed out after {:?}", duration);
            Err(AppError::Timeout(e))
        }
    }
}
