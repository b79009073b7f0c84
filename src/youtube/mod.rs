//! YouTube Data API client: candidate enumeration (search) and batched
//! detail fetch (videos.list). Both call shapes require an API key, which is
//! carried in the request query string and must stay out of the logs.

pub mod duration;
pub mod ingest;

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use url::Url;

use crate::errors::AppError;

/// Largest id batch the videos.list endpoint accepts per call.
const DETAIL_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub enum SearchTarget {
    /// Enumerate a channel's uploads, newest first.
    Channel(String),
    /// Free-text relevance search.
    Query(String),
}

#[derive(Clone)]
pub struct YoutubeClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl YoutubeClient {
    pub fn new(base_url: String, api_key: Secret<String>) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    /// Enumerates candidate video ids for a target, following the API's own
    /// page tokens until `max_results` ids are collected or pages run out.
    #[tracing::instrument(name = "YouTube search", skip(self))]
    pub async fn search_videos(
        &self,
        target: &SearchTarget,
        max_results: u32,
    ) -> Result<Vec<String>, AppError> {
        let mut video_ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let remaining = max_results.saturating_sub(video_ids.len() as u32);
            if remaining == 0 {
                break;
            }

            let mut params: Vec<(&str, String)> = vec![
                ("part", "snippet".to_string()),
                ("type", "video".to_string()),
                ("maxResults", remaining.min(50).to_string()),
            ];
            match target {
                SearchTarget::Channel(channel_id) => {
                    params.push(("channelId", channel_id.clone()));
                    params.push(("order", "date".to_string()));
                }
                SearchTarget::Query(query) => {
                    params.push(("q", query.clone()));
                }
            }
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            params.push(("key", self.api_key.expose_secret().clone()));

            let url = Url::parse_with_params(&format!("{}/search", self.base_url), &params)?;

            tracing::debug!("Fetching search page, {} ids collected so far", video_ids.len());

            let response = self.http_client.get(url).send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                tracing::error!("YouTube search API error ({}): {}", status, error_text);
                return Err(AppError::ExternalService(anyhow::anyhow!(
                    "YouTube search API error ({}): {}",
                    status,
                    error_text
                )));
            }

            let page: SearchListResponse = response.json().await?;

            for item in page.items {
                if let Some(id) = item.id.video_id {
                    video_ids.push(id);
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        video_ids.truncate(max_results as usize);
        tracing::info!("Search returned {} video ids", video_ids.len());

        Ok(video_ids)
    }

    /// Fetches full metadata (snippet, duration, statistics) for a list of
    /// video ids, batching by the API's per-call id limit.
    #[tracing::instrument(name = "YouTube video details", skip(self, video_ids), fields(requested = video_ids.len()))]
    pub async fn list_videos(&self, video_ids: &[String]) -> Result<Vec<VideoItem>, AppError> {
        let mut items = Vec::new();

        for chunk in video_ids.chunks(DETAIL_BATCH_SIZE) {
            let params = [
                ("part", "snippet,contentDetails,statistics".to_string()),
                ("id", chunk.join(",")),
                ("key", self.api_key.expose_secret().clone()),
            ];
            let url = Url::parse_with_params(&format!("{}/videos", self.base_url), &params)?;

            let response = self.http_client.get(url).send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                tracing::error!("YouTube videos API error ({}): {}", status, error_text);
                return Err(AppError::ExternalService(anyhow::anyhow!(
                    "YouTube videos API error ({}): {}",
                    status,
                    error_text
                )));
            }

            let page: VideoListResponse = response.json().await?;
            items.extend(page.items);
        }

        tracing::info!("Fetched details for {} videos", items.len());

        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchResultId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub snippet: Option<VideoSnippet>,
    pub content_details: Option<ContentDetails>,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub published_at: Option<String>,
    pub channel_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnails: Option<Thumbnails>,
    pub channel_title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
}
