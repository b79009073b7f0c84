use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::{serialize_tags, NewVideo, Video};
use crate::store::{timeout_query, QUERY_TIMEOUT};

const UPSERT_VIDEO: &str = "INSERT INTO videos (
        id, video_id, title, description, published_at,
        thumbnail_default, thumbnail_medium, thumbnail_high,
        channel_id, channel_title, is_official, duration,
        view_count, like_count, category, tags, source_query,
        created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (video_id) DO UPDATE SET
        title = excluded.title,
        description = excluded.description,
        published_at = excluded.published_at,
        thumbnail_default = excluded.thumbnail_default,
        thumbnail_medium = excluded.thumbnail_medium,
        thumbnail_high = excluded.thumbnail_high,
        channel_id = excluded.channel_id,
        channel_title = excluded.channel_title,
        is_official = excluded.is_official,
        duration = excluded.duration,
        view_count = excluded.view_count,
        like_count = excluded.like_count,
        category = excluded.category,
        tags = excluded.tags,
        source_query = excluded.source_query,
        updated_at = excluded.updated_at
    RETURNING *";

/// Inserts a video or, when the external video id already exists, refreshes
/// its fields. The internal id and `created_at` of an existing row survive
/// the update.
pub async fn upsert_video(db: &SqlitePool, record: &NewVideo) -> Result<Video, AppError> {
    let now = Utc::now();
    let id = uuid::Uuid::new_v4().to_string();

    let video = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Video>(UPSERT_VIDEO)
            .bind(&id)
            .bind(&record.video_id)
            .bind(&record.title)
            .bind(&record.description)
            .bind(record.published_at)
            .bind(&record.thumbnail_default)
            .bind(&record.thumbnail_medium)
            .bind(&record.thumbnail_high)
            .bind(&record.channel_id)
            .bind(&record.channel_title)
            .bind(record.is_official)
            .bind(&record.duration)
            .bind(record.view_count)
            .bind(record.like_count)
            .bind(record.category)
            .bind(serialize_tags(&record.tags))
            .bind(&record.source_query)
            .bind(now)
            .bind(now)
            .fetch_one(db),
    )
    .await?;

    Ok(video)
}

pub async fn find_by_video_id(
    db: &SqlitePool,
    video_id: &str,
) -> Result<Option<Video>, AppError> {
    timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE video_id = ?")
            .bind(video_id)
            .fetch_optional(db),
    )
    .await
}
