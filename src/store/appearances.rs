use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::Member;
use crate::store::{timeout_query, QUERY_TIMEOUT};

/// Records that a member appears in a video. Returns `true` when a new
/// appearance row was created. The composite primary key on
/// (video_id, member_id) is the real uniqueness guarantee; the existence
/// probe only feeds the log.
pub async fn link_member(
    db: &SqlitePool,
    video_pk: &str,
    member_pk: &str,
) -> Result<bool, AppError> {
    let existing: i64 = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_scalar("SELECT COUNT(*) FROM video_members WHERE video_id = ? AND member_id = ?")
            .bind(video_pk)
            .bind(member_pk)
            .fetch_one(db),
    )
    .await?;

    if existing > 0 {
        tracing::debug!(
            "Appearance already recorded for video {} and member {}",
            video_pk,
            member_pk
        );
    }

    let result = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query(
            "INSERT OR IGNORE INTO video_members (video_id, member_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(video_pk)
        .bind(member_pk)
        .bind(Utc::now())
        .execute(db),
    )
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Drops every appearance row for a video and recreates the given set.
pub async fn replace_links(
    db: &SqlitePool,
    video_pk: &str,
    member_pks: &[String],
) -> Result<(), AppError> {
    timeout_query(
        QUERY_TIMEOUT,
        sqlx::query("DELETE FROM video_members WHERE video_id = ?")
            .bind(video_pk)
            .execute(db),
    )
    .await?;

    for member_pk in member_pks {
        link_member(db, video_pk, member_pk).await?;
    }

    Ok(())
}

pub async fn members_for_video(db: &SqlitePool, video_pk: &str) -> Result<Vec<Member>, AppError> {
    timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Member>(
            "SELECT m.* FROM members m
             INNER JOIN video_members vm ON vm.member_id = m.id
             WHERE vm.video_id = ?
             ORDER BY m.name",
        )
        .bind(video_pk)
        .fetch_all(db),
    )
    .await
}
