use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::common::{ApiResponse, PaginatedResponse, PaginationInfo};
use crate::errors::AppError;
use crate::models::{Generation, MemberDto, VideoDto};
use crate::search::{self, SearchAxis, SearchFilter};
use crate::store::{appearances, members, videos};
use crate::InnerState;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw query parameters. Numbers arrive as strings so out-of-range and
/// malformed values both surface as the same validation envelope.
#[derive(Debug, Deserialize)]
pub struct VideoSearchParams {
    pub stella: Option<String>,
    pub gen: Option<String>,
    #[serde(rename = "isOfficial")]
    pub is_official: Option<String>,
    #[serde(rename = "maxResult")]
    pub max_result: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: VideoDto,
    pub members: Vec<MemberDto>,
}

#[tracing::instrument(name = "Search videos", skip(inner))]
pub async fn search_videos(
    State(inner): State<InnerState>,
    Query(params): Query<VideoSearchParams>,
) -> Result<Json<PaginatedResponse<VideoDto>>, AppError> {
    let InnerState { db, .. } = inner;

    tracing::debug!("search_videos: validating request parameters");

    let official_only = match params.is_official.as_deref() {
        None => None,
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                return Err(AppError::Validation(
                    "isOfficial must be \"true\" or \"false\"".to_string(),
                ))
            }
        },
    };

    let limit = match params.max_result.as_deref() {
        None => DEFAULT_PAGE_SIZE,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(v) if (1..=MAX_PAGE_SIZE).contains(&v) => v,
            _ => {
                return Err(AppError::Validation(format!(
                    "maxResult must be an integer between 1 and {}",
                    MAX_PAGE_SIZE
                )))
            }
        },
    };

    let page = match params.page.as_deref() {
        None => 1,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(v) if v >= 1 => v,
            _ => {
                return Err(AppError::Validation(
                    "page must be a positive integer".to_string(),
                ))
            }
        },
    };

    let axis = match (params.stella.as_deref(), params.gen.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "stella and gen are mutually exclusive, provide exactly one".to_string(),
            ))
        }
        (None, None) => {
            return Err(AppError::Validation(
                "Either stella or gen is required".to_string(),
            ))
        }
        (Some(stella), None) => {
            if stella.trim().eq_ignore_ascii_case("all") {
                SearchAxis::Member(None)
            } else {
                match members::find_by_name(&db, stella).await? {
                    Some(member) => SearchAxis::Member(Some(member.name)),
                    None => {
                        tracing::warn!("search_videos: unknown stella {}", stella);
                        let mut available: Vec<String> = members::all_members(&db)
                            .await?
                            .into_iter()
                            .map(|m| m.name)
                            .collect();
                        available.push("ALL".to_string());
                        return Err(AppError::ValidationHint {
                            message: format!("Unknown stella: {}", stella),
                            hint: json!({
                                "example": "?stella=KANNA",
                                "availableMembers": available
                            }),
                        });
                    }
                }
            }
        }
        (None, Some(gen)) => {
            if gen.trim().eq_ignore_ascii_case("all") {
                SearchAxis::Generation(None)
            } else {
                match Generation::from_param(gen) {
                    Some(parsed) => SearchAxis::Generation(Some(parsed)),
                    None => {
                        tracing::warn!("search_videos: unknown gen {}", gen);
                        let mut available: Vec<String> = Generation::VARIANTS
                            .iter()
                            .map(|g| g.as_str().to_string())
                            .collect();
                        available.push("ALL".to_string());
                        return Err(AppError::ValidationHint {
                            message: format!("Unknown gen: {}", gen),
                            hint: json!({
                                "example": "?gen=MYSTIC",
                                "availableGens": available
                            }),
                        });
                    }
                }
            }
        }
    };

    let filter = SearchFilter {
        axis,
        official_only,
        page,
        page_size: limit,
    };
    let result = search::find_videos(&db, &filter).await?;

    let dtos: Vec<VideoDto> = result.videos.into_iter().map(VideoDto::from).collect();
    let pagination = PaginationInfo::new(result.total, page, limit);

    tracing::info!(
        "search_videos: returning {} of {} matching videos (page {})",
        dtos.len(),
        result.total,
        page
    );

    Ok(Json(PaginatedResponse::new(dtos, pagination)))
}

#[tracing::instrument(name = "Get video by external id", skip(inner))]
pub async fn get_video(
    State(inner): State<InnerState>,
    Path(video_id): Path<String>,
) -> Result<Json<ApiResponse<VideoDetail>>, AppError> {
    let InnerState { db, .. } = inner;

    let video = videos::find_by_video_id(&db, &video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", video_id)))?;

    let linked = appearances::members_for_video(&db, &video.id).await?;

    tracing::info!(
        "get_video: {} resolved with {} appearances",
        video_id,
        linked.len()
    );

    let detail = VideoDetail {
        video: VideoDto::from(video),
        members: linked.into_iter().map(MemberDto::from).collect(),
    };

    Ok(Json(ApiResponse::success(detail)))
}
