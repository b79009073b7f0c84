//! Ingestion pipeline: enumerate candidates (official channel uploads or
//! free-text clip searches), fetch details, normalize, persist and attach
//! member appearances.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::{AppConfig, StellaEntry};
use crate::errors::AppError;
use crate::models::{NewVideo, VideoCategory, VideoDto};
use crate::store::{appearances, members, videos};
use crate::youtube::duration::{format_duration, parse_seconds};
use crate::youtube::{SearchTarget, VideoItem, YoutubeClient};

/// Upload cap for one official-channel run.
pub const OFFICIAL_MAX_RESULTS: u32 = 50;
pub const CLIP_DEFAULT_MAX_RESULTS: u32 = 20;
pub const CLIP_MAX_RESULTS: u32 = 50;
pub const BATCH_MAX_CHANNELS: usize = 10;

/// Official uploads that run at most a minute are labeled SHORTS.
const SHORTS_MAX_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    Official,
    Clips,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub stella_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub videos_found: usize,
    pub videos_processed: usize,
    pub videos: Vec<VideoDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub summary: BatchTotals,
    pub results: Vec<ChannelIngestOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTotals {
    pub total_channels: usize,
    pub successful_channels: usize,
    pub failed_channels: usize,
    pub total_videos_processed: usize,
    pub duplicates_removed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelIngestOutcome {
    pub stella_name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos_found: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn clip_queries(display_name: &str) -> Vec<String> {
    vec![
        format!("{} 클립", display_name),
        format!("{} 하이라이트", display_name),
        format!("{} 키리누키", display_name),
    ]
}

pub struct IngestService {
    db: SqlitePool,
    youtube: YoutubeClient,
    config: AppConfig,
}

impl IngestService {
    pub fn new(db: SqlitePool, youtube: YoutubeClient, config: AppConfig) -> Self {
        Self {
            db,
            youtube,
            config,
        }
    }

    /// Ingests a performer's official channel uploads. Enumeration and
    /// detail-fetch failures abort the run; there is no sibling work to
    /// continue with.
    #[tracing::instrument(name = "Ingest official uploads", skip(self))]
    pub async fn ingest_official(&self, stella_name: &str) -> Result<IngestSummary, AppError> {
        let mut seen = HashSet::new();
        let (summary, _) = self.run_official(stella_name, &mut seen).await?;
        Ok(summary)
    }

    /// Discovers fan clips through templated free-text searches. Variant
    /// searches run sequentially so first-occurrence dedup is stable; a
    /// failed variant or a failed detail fetch is logged and absorbed into
    /// the found/processed gap.
    #[tracing::instrument(name = "Ingest clip search", skip(self))]
    pub async fn ingest_clips(
        &self,
        stella_name: &str,
        max_results: u32,
    ) -> Result<IngestSummary, AppError> {
        let stella = self.require_stella(stella_name)?;

        tracing::info!(
            "Ingesting clips for {} with a cap of {}",
            stella.name,
            max_results
        );

        let mut seen: HashSet<String> = HashSet::new();
        let mut video_ids: Vec<String> = Vec::new();

        for query in clip_queries(&stella.display_name) {
            match self
                .youtube
                .search_videos(&SearchTarget::Query(query.clone()), max_results)
                .await
            {
                Ok(ids) => {
                    for id in ids {
                        if seen.insert(id.clone()) {
                            video_ids.push(id);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Clip search failed for query {}: {:?}", query, e);
                }
            }
        }

        video_ids.truncate(max_results as usize);
        let videos_found = video_ids.len();

        let items = match self.youtube.list_videos(&video_ids).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Detail fetch failed for {} clips: {:?}", stella.name, e);
                Vec::new()
            }
        };

        let records = self.normalize_items(items, IngestMode::Clips, &stella);
        let stored = self.persist(&stella, records).await?;

        tracing::info!(
            "Clip ingest for {}: {} found, {} stored",
            stella.name,
            videos_found,
            stored.len()
        );

        Ok(IngestSummary {
            stella_name: stella.name.clone(),
            channel_id: None,
            videos_found,
            videos_processed: stored.len(),
            videos: stored,
        })
    }

    /// Runs official ingestion for several performers, isolating failures
    /// per channel. Candidate ids already ingested by an earlier channel in
    /// the same batch are dropped and counted as duplicates.
    #[tracing::instrument(name = "Ingest batch", skip(self))]
    pub async fn ingest_batch(&self, stella_names: &[String]) -> Result<BatchSummary, AppError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut results: Vec<ChannelIngestOutcome> = Vec::new();
        let mut totals = BatchTotals {
            total_channels: stella_names.len(),
            successful_channels: 0,
            failed_channels: 0,
            total_videos_processed: 0,
            duplicates_removed: 0,
        };

        for raw_name in stella_names {
            match self.run_official(raw_name, &mut seen).await {
                Ok((summary, duplicates)) => {
                    totals.successful_channels += 1;
                    totals.total_videos_processed += summary.videos_processed;
                    totals.duplicates_removed += duplicates;
                    results.push(ChannelIngestOutcome {
                        stella_name: summary.stella_name,
                        ok: true,
                        videos_found: Some(summary.videos_found),
                        videos_processed: Some(summary.videos_processed),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::error!("Batch ingest failed for {}: {:?}", raw_name, e);
                    totals.failed_channels += 1;
                    results.push(ChannelIngestOutcome {
                        stella_name: raw_name.clone(),
                        ok: false,
                        videos_found: None,
                        videos_processed: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        tracing::info!(
            "Batch ingest finished: {}/{} channels ok, {} videos stored, {} duplicates removed",
            totals.successful_channels,
            totals.total_channels,
            totals.total_videos_processed,
            totals.duplicates_removed
        );

        Ok(BatchSummary {
            summary: totals,
            results,
        })
    }

    async fn run_official(
        &self,
        raw_name: &str,
        seen: &mut HashSet<String>,
    ) -> Result<(IngestSummary, usize), AppError> {
        let stella = self.require_stella(raw_name)?;
        let channel_id = stella.channel_id.clone().ok_or_else(|| {
            AppError::Configuration(format!(
                "No official channel configured for {}",
                stella.name
            ))
        })?;

        tracing::info!(
            "Ingesting official uploads for {} ({})",
            stella.name,
            channel_id
        );

        let video_ids = self
            .youtube
            .search_videos(&SearchTarget::Channel(channel_id.clone()), OFFICIAL_MAX_RESULTS)
            .await?;
        let videos_found = video_ids.len();

        let fresh: Vec<String> = video_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        let duplicates = videos_found - fresh.len();

        let items = self.youtube.list_videos(&fresh).await?;
        let records = self.normalize_items(items, IngestMode::Official, &stella);
        let stored = self.persist(&stella, records).await?;

        tracing::info!(
            "Official ingest for {}: {} found, {} stored, {} duplicates",
            stella.name,
            videos_found,
            stored.len(),
            duplicates
        );

        Ok((
            IngestSummary {
                stella_name: stella.name.clone(),
                channel_id: Some(channel_id),
                videos_found,
                videos_processed: stored.len(),
                videos: stored,
            },
            duplicates,
        ))
    }

    fn require_stella(&self, raw_name: &str) -> Result<StellaEntry, AppError> {
        self.config
            .find_stella(raw_name)
            .cloned()
            .ok_or_else(|| AppError::Validation(format!("Unknown member: {}", raw_name)))
    }

    fn normalize_items(
        &self,
        items: Vec<VideoItem>,
        mode: IngestMode,
        stella: &StellaEntry,
    ) -> Vec<NewVideo> {
        let official_ids = self.config.official_channel_ids();
        let fetched = items.len();

        let records: Vec<NewVideo> = items
            .into_iter()
            .filter_map(|item| normalize_item(item, mode, stella, &official_ids))
            .collect();

        tracing::debug!(
            "{} of {} candidates survived validation for {}",
            records.len(),
            fetched,
            stella.name
        );

        records
    }

    /// Upserts each record individually, then attaches the performer
    /// appearance. Item-level failures are logged and skipped; the rest of
    /// the batch continues.
    async fn persist(
        &self,
        stella: &StellaEntry,
        records: Vec<NewVideo>,
    ) -> Result<Vec<VideoDto>, AppError> {
        let linked = members::resolve_members(&self.db, &[stella.name.clone()]).await?;

        let mut stored = Vec::new();

        for record in records {
            match videos::upsert_video(&self.db, &record).await {
                Ok(video) => {
                    for member in &linked {
                        if let Err(e) =
                            appearances::link_member(&self.db, &video.id, &member.id).await
                        {
                            tracing::error!(
                                "Failed to link member {} to video {}: {:?}",
                                member.name,
                                video.video_id,
                                e
                            );
                        }
                    }
                    stored.push(VideoDto::from(video));
                }
                Err(e) => {
                    tracing::error!("Failed to store video {}: {:?}", record.video_id, e);
                }
            }
        }

        Ok(stored)
    }
}

/// Maps one external item to the internal record shape. Items missing a
/// required field are dropped with a warning, as are official-channel
/// videos in clip mode.
fn normalize_item(
    item: VideoItem,
    mode: IngestMode,
    stella: &StellaEntry,
    official_ids: &HashSet<String>,
) -> Option<NewVideo> {
    let snippet = match item.snippet {
        Some(snippet) => snippet,
        None => {
            tracing::warn!("Video {} missing snippet, skipped", item.id);
            return None;
        }
    };

    let title = match snippet.title {
        Some(title) => title,
        None => {
            tracing::warn!("Video {} missing title, skipped", item.id);
            return None;
        }
    };

    let channel_id = match snippet.channel_id {
        Some(channel_id) => channel_id,
        None => {
            tracing::warn!("Video {} missing channel id, skipped", item.id);
            return None;
        }
    };

    let published_at = match snippet
        .published_at
        .as_deref()
        .map(DateTime::parse_from_rfc3339)
    {
        Some(Ok(ts)) => ts.with_timezone(&Utc),
        _ => {
            tracing::warn!("Video {} missing or invalid publishedAt, skipped", item.id);
            return None;
        }
    };

    if mode == IngestMode::Clips && official_ids.contains(&channel_id) {
        tracing::debug!(
            "Video {} comes from an official channel, excluded from clip ingest",
            item.id
        );
        return None;
    }

    let is_official = official_ids.contains(&channel_id);

    let raw_duration = item
        .content_details
        .as_ref()
        .and_then(|cd| cd.duration.as_deref());
    let seconds = raw_duration.and_then(parse_seconds);
    let duration = raw_duration.and_then(format_duration);

    let category = match mode {
        IngestMode::Clips => Some(VideoCategory::Clip),
        IngestMode::Official => match seconds {
            Some(s) if (1..=SHORTS_MAX_SECONDS).contains(&s) => Some(VideoCategory::Shorts),
            _ => None,
        },
    };

    let view_count = item
        .statistics
        .as_ref()
        .and_then(|s| s.view_count.as_ref())
        .and_then(|v| v.parse::<i64>().ok());
    let like_count = item
        .statistics
        .as_ref()
        .and_then(|s| s.like_count.as_ref())
        .and_then(|v| v.parse::<i64>().ok());

    let thumbnails = snippet.thumbnails.unwrap_or_default();

    let source_query = match mode {
        IngestMode::Official => format!("channel:{}", stella.name),
        IngestMode::Clips => format!("clip:{}", stella.name),
    };

    Some(NewVideo {
        video_id: item.id,
        title,
        description: snippet.description,
        published_at,
        thumbnail_default: thumbnails.default.map(|t| t.url),
        thumbnail_medium: thumbnails.medium.map(|t| t.url),
        thumbnail_high: thumbnails.high.map(|t| t.url),
        channel_id,
        channel_title: snippet.channel_title.unwrap_or_default(),
        is_official,
        duration,
        view_count,
        like_count,
        category,
        tags: snippet.tags,
        source_query,
    })
}
