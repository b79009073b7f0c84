use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::config::StellaEntry;
use crate::errors::AppError;
use crate::models::{normalize_member_name, serialize_tags, Member};
use crate::store::{timeout_query, QUERY_TIMEOUT};

const UPSERT_MEMBER: &str = "INSERT INTO members (
        id, name, display_name, generation, tags, created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (name) DO UPDATE SET
        display_name = excluded.display_name,
        generation = excluded.generation,
        tags = excluded.tags,
        updated_at = excluded.updated_at";

/// Looks up one member by name, normalizing first.
pub async fn find_by_name(db: &SqlitePool, raw_name: &str) -> Result<Option<Member>, AppError> {
    let name = normalize_member_name(raw_name);

    timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE name = ?")
            .bind(name)
            .fetch_optional(db),
    )
    .await
}

/// Resolves a list of free-text names into member records. Names are
/// normalized and deduplicated first; names with no matching member are
/// dropped with a warning.
pub async fn resolve_members(db: &SqlitePool, names: &[String]) -> Result<Vec<Member>, AppError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut members = Vec::new();

    for raw in names {
        let name = normalize_member_name(raw);
        if name.is_empty() || !seen.insert(name.clone()) {
            continue;
        }

        match find_by_name(db, &name).await? {
            Some(member) => members.push(member),
            None => tracing::warn!("Unknown member name skipped: {}", raw),
        }
    }

    Ok(members)
}

/// Mirrors the configured roster into the members table. Existing rows are
/// refreshed by name; rows for entries no longer configured are left alone.
pub async fn sync_roster(db: &SqlitePool, roster: &[StellaEntry]) -> Result<usize, AppError> {
    let mut synced = 0;

    for entry in roster {
        let now = Utc::now();
        timeout_query(
            QUERY_TIMEOUT,
            sqlx::query(UPSERT_MEMBER)
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(normalize_member_name(&entry.name))
                .bind(&entry.display_name)
                .bind(entry.generation)
                .bind(serialize_tags(&entry.tags))
                .bind(now)
                .bind(now)
                .execute(db),
        )
        .await?;
        synced += 1;
    }

    tracing::info!("Roster sync touched {} members", synced);

    Ok(synced)
}

pub async fn all_members(db: &SqlitePool) -> Result<Vec<Member>, AppError> {
    timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY name").fetch_all(db),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_roster;
    use crate::db::test_pool;
    use crate::models::Generation;

    #[tokio::test]
    async fn lookup_is_insensitive_to_case_and_whitespace() {
        let db = test_pool().await;
        sync_roster(&db, &default_roster()).await.unwrap();

        let lower = find_by_name(&db, "rin").await.unwrap().unwrap();
        let upper = find_by_name(&db, "RIN").await.unwrap().unwrap();
        let padded = find_by_name(&db, " Rin ").await.unwrap().unwrap();

        assert_eq!(lower.id, upper.id);
        assert_eq!(lower.id, padded.id);
        assert_eq!(lower.generation, Generation::Cliche);
    }

    #[tokio::test]
    async fn sync_roster_is_idempotent_and_preserves_ids() {
        let db = test_pool().await;
        let roster = default_roster();

        sync_roster(&db, &roster).await.unwrap();
        let before = find_by_name(&db, "KANNA").await.unwrap().unwrap();

        sync_roster(&db, &roster).await.unwrap();
        let after = find_by_name(&db, "KANNA").await.unwrap().unwrap();

        assert_eq!(before.id, after.id);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(total, roster.len() as i64);
    }

    #[tokio::test]
    async fn resolve_members_dedups_and_drops_unknown_names() {
        let db = test_pool().await;
        sync_roster(&db, &default_roster()).await.unwrap();

        let names = vec![
            "rin".to_string(),
            "RIN".to_string(),
            " Rin ".to_string(),
            "NOBODY".to_string(),
            "kanna".to_string(),
        ];

        let resolved = resolve_members(&db, &names).await.unwrap();
        let resolved_names: Vec<&str> = resolved.iter().map(|m| m.name.as_str()).collect();

        assert_eq!(resolved_names, vec!["RIN", "KANNA"]);
    }

    #[tokio::test]
    async fn all_members_sorts_by_name() {
        let db = test_pool().await;
        sync_roster(&db, &default_roster()).await.unwrap();

        let members = all_members(&db).await.unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(members.len(), 10);
    }
}
