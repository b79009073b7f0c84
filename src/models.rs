//! Core record types shared between storage, ingestion and the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Performer cohort. Stored and compared in uppercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Generation {
    Mystic,
    Universe,
    Cliche,
}

impl Generation {
    pub const VARIANTS: [Generation; 3] =
        [Generation::Mystic, Generation::Universe, Generation::Cliche];

    pub fn as_str(&self) -> &'static str {
        match self {
            Generation::Mystic => "MYSTIC",
            Generation::Universe => "UNIVERSE",
            Generation::Cliche => "CLICHE",
        }
    }

    /// Parses a query parameter value, ignoring case and surrounding whitespace.
    pub fn from_param(raw: &str) -> Option<Generation> {
        match raw.trim().to_uppercase().as_str() {
            "MYSTIC" => Some(Generation::Mystic),
            "UNIVERSE" => Some(Generation::Universe),
            "CLICHE" => Some(Generation::Cliche),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum VideoCategory {
    Clip,
    Shorts,
}

/// Video row as stored. `tags` holds a JSON array serialized to text.
#[derive(Debug, Clone, FromRow)]
pub struct Video {
    pub id: String,
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub thumbnail_default: Option<String>,
    pub thumbnail_medium: Option<String>,
    pub thumbnail_high: Option<String>,
    pub channel_id: String,
    pub channel_title: String,
    pub is_official: bool,
    pub duration: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub category: Option<VideoCategory>,
    pub tags: String,
    pub source_query: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub generation: Generation,
    pub tags: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized ingestion record, ready to be upserted by external video id.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub thumbnail_default: Option<String>,
    pub thumbnail_medium: Option<String>,
    pub thumbnail_high: Option<String>,
    pub channel_id: String,
    pub channel_title: String,
    pub is_official: bool,
    pub duration: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub category: Option<VideoCategory>,
    pub tags: Vec<String>,
    pub source_query: String,
}

/// Wire shape for a video, with tags parsed back into a list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    pub id: String,
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub thumbnail_default: Option<String>,
    pub thumbnail_medium: Option<String>,
    pub thumbnail_high: Option<String>,
    pub channel_id: String,
    pub channel_title: String,
    pub is_official: bool,
    pub duration: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub category: Option<VideoCategory>,
    pub tags: Vec<String>,
    pub source_query: Option<String>,
}

impl From<Video> for VideoDto {
    fn from(video: Video) -> Self {
        let tags = parse_tags(&video.tags);
        Self {
            id: video.id,
            video_id: video.video_id,
            title: video.title,
            description: video.description,
            published_at: video.published_at,
            thumbnail_default: video.thumbnail_default,
            thumbnail_medium: video.thumbnail_medium,
            thumbnail_high: video.thumbnail_high,
            channel_id: video.channel_id,
            channel_title: video.channel_title,
            is_official: video.is_official,
            duration: video.duration,
            view_count: video.view_count,
            like_count: video.like_count,
            category: video.category,
            tags,
            source_query: video.source_query,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub generation: Generation,
    pub tags: Vec<String>,
}

impl From<Member> for MemberDto {
    fn from(member: Member) -> Self {
        let tags = parse_tags(&member.tags);
        Self {
            id: member.id,
            name: member.name,
            display_name: member.display_name,
            generation: member.generation,
            tags,
        }
    }
}

/// Canonical form for member names: trimmed, uppercased.
pub fn normalize_member_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub fn serialize_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}
