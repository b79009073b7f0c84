//! Video search resolver: builds one filtered, ordered, paginated query from
//! a validated filter and returns the page plus a total count.

use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::{normalize_member_name, Generation, Video};
use crate::store::{timeout_query, QUERY_TIMEOUT};

/// Exactly one axis is active per search. `None` is the `ALL` sentinel,
/// meaning no filter on that axis.
#[derive(Debug, Clone)]
pub enum SearchAxis {
    Member(Option<String>),
    Generation(Option<Generation>),
}

#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub axis: SearchAxis,
    pub official_only: Option<bool>,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug)]
pub struct SearchPage {
    pub videos: Vec<Video>,
    pub total: i64,
}

const MEMBER_CONDITION: &str = "EXISTS (
        SELECT 1 FROM video_members vm
        INNER JOIN members m ON m.id = vm.member_id
        WHERE vm.video_id = v.id AND m.name = ?
    )";

const GENERATION_CONDITION: &str = "EXISTS (
        SELECT 1 FROM video_members vm
        INNER JOIN members m ON m.id = vm.member_id
        WHERE vm.video_id = v.id AND m.generation = ?
    )";

/// Runs the search. Ordering is publication timestamp descending with view
/// count descending as the tie-break, on every axis. An empty result is not
/// an error.
#[tracing::instrument(name = "Resolve video search", skip(db))]
pub async fn find_videos(db: &SqlitePool, filter: &SearchFilter) -> Result<SearchPage, AppError> {
    let mut conditions: Vec<&str> = Vec::new();
    let mut member_name: Option<String> = None;
    let mut generation: Option<Generation> = None;

    match &filter.axis {
        SearchAxis::Member(Some(name)) => {
            conditions.push(MEMBER_CONDITION);
            member_name = Some(normalize_member_name(name));
        }
        SearchAxis::Generation(Some(gen)) => {
            conditions.push(GENERATION_CONDITION);
            generation = Some(*gen);
        }
        SearchAxis::Member(None) | SearchAxis::Generation(None) => {}
    }

    if filter.official_only.is_some() {
        conditions.push("v.is_official = ?");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let select_sql = format!(
        "SELECT v.* FROM videos v{} ORDER BY v.published_at DESC, v.view_count DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let count_sql = format!("SELECT COUNT(*) FROM videos v{}", where_clause);

    let limit = filter.page_size as i64;
    let offset = (filter.page.saturating_sub(1) as i64) * limit;

    let mut select = sqlx::query_as::<_, Video>(&select_sql);
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);

    if let Some(name) = &member_name {
        select = select.bind(name.clone());
        count = count.bind(name.clone());
    }
    if let Some(gen) = generation {
        select = select.bind(gen);
        count = count.bind(gen);
    }
    if let Some(official) = filter.official_only {
        select = select.bind(official);
        count = count.bind(official);
    }
    select = select.bind(limit).bind(offset);

    let videos = timeout_query(QUERY_TIMEOUT, select.fetch_all(db)).await?;
    let total = timeout_query(QUERY_TIMEOUT, count.fetch_one(db)).await?;

    tracing::debug!("Search matched {} rows, returning {}", total, videos.len());

    Ok(SearchPage { videos, total })
}
