//! Runtime configuration, including the performer roster and the official
//! channel mapping used by the ingestion pipeline.

use std::collections::HashSet;

use secrecy::Secret;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{normalize_member_name, Generation};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// One roster entry. `channel_id` is the performer's official channel, when
/// one is configured; entries without a channel cannot be ingested in
/// official mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StellaEntry {
    pub name: String,
    pub display_name: String,
    pub generation: Generation,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub youtube_api_key: Option<Secret<String>>,
    pub youtube_api_base: String,
    pub roster: Vec<StellaEntry>,
}

impl AppConfig {
    pub fn from_env() -> Result<AppConfig, AppError> {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:stella.db".to_string());
        let youtube_api_key = std::env::var("YOUTUBE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Secret::new);
        let youtube_api_base =
            std::env::var("YOUTUBE_API_BASE").unwrap_or_else(|_| YOUTUBE_API_BASE.to_string());

        let roster = match std::env::var("STELLA_ROSTER") {
            Ok(raw) => parse_roster(&raw)?,
            Err(_) => default_roster(),
        };

        Ok(AppConfig {
            bind_addr,
            database_url,
            youtube_api_key,
            youtube_api_base,
            roster,
        })
    }

    /// Channel ids of every configured official channel.
    pub fn official_channel_ids(&self) -> HashSet<String> {
        self.roster
            .iter()
            .filter_map(|entry| entry.channel_id.clone())
            .collect()
    }

    /// Looks up a roster entry by name, applying the canonical normalization
    /// so `"rin"`, `"RIN"` and `" Rin "` all match the same entry.
    pub fn find_stella(&self, raw_name: &str) -> Option<&StellaEntry> {
        let name = normalize_member_name(raw_name);
        self.roster.iter().find(|entry| entry.name == name)
    }

    #[cfg(test)]
    pub fn for_tests(youtube_api_base: &str) -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            youtube_api_key: Some(Secret::new("test-key".to_string())),
            youtube_api_base: youtube_api_base.to_string(),
            roster: default_roster(),
        }
    }
}

/// Parses an explicit roster override from the `STELLA_ROSTER` environment
/// variable (a JSON array of entries). A malformed roster is fatal.
pub(crate) fn parse_roster(raw: &str) -> Result<Vec<StellaEntry>, AppError> {
    let mut roster: Vec<StellaEntry> = serde_json::from_str(raw).map_err(|e| {
        AppError::Configuration(format!("STELLA_ROSTER is not a valid roster: {}", e))
    })?;

    if roster.is_empty() {
        return Err(AppError::Configuration(
            "STELLA_ROSTER must contain at least one entry".to_string(),
        ));
    }

    for entry in &mut roster {
        entry.name = normalize_member_name(&entry.name);
    }

    Ok(roster)
}

fn stella(
    name: &str,
    display_name: &str,
    generation: Generation,
    channel_id: &str,
) -> StellaEntry {
    StellaEntry {
        name: name.to_string(),
        display_name: display_name.to_string(),
        generation,
        channel_id: Some(channel_id.to_string()),
        tags: vec!["스텔라이브".to_string()],
    }
}

/// Built-in roster, used when no `STELLA_ROSTER` override is present.
pub fn default_roster() -> Vec<StellaEntry> {
    vec![
        stella("KANNA", "아이리 칸나", Generation::Mystic, "UCN9aCZa1e3CDLDr5IgAVvJg"),
        stella("YUNI", "아야츠노 유니", Generation::Mystic, "UCLq7ConsfKKk82vcYXpOs6w"),
        stella("HINA", "시라유키 히나", Generation::Universe, "UCtV5G1Ab3WUyorAQ6hg1NXA"),
        stella("MASHIRO", "네네코 마시로", Generation::Universe, "UC4tcbTM9_opW3BjQ1DSyEsw"),
        stella("LIZE", "아카네 리제", Generation::Universe, "UCdRKcbH1mdLP7uVrRe5dBFw"),
        stella("TABI", "아라하시 타비", Generation::Universe, "UCAHVQ44O81aehLWfZYTkMsQ"),
        stella("SHIBUKI", "텐코 시부키", Generation::Cliche, "UCPeRWjnzyLvrVdLBxB9g3Sw"),
        stella("RIN", "아오쿠모 린", Generation::Cliche, "UCmKrp3Wgyx3ECD8kQnAU_3A"),
        stella("NANA", "하나코 나나", Generation::Cliche, "UCe1Ex3O1HYwJGJWUt2DDfhg"),
        stella("RIKO", "유즈하 리코", Generation::Cliche, "UCEuKkHrBcTVrcd29DRmVTeg"),
    ]
}
