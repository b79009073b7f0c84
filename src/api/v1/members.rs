use axum::extract::State;
use axum::Json;

use crate::api::common::ApiResponse;
use crate::errors::AppError;
use crate::models::MemberDto;
use crate::store::members;
use crate::InnerState;

#[tracing::instrument(name = "List members", skip(inner))]
pub async fn all_members(
    State(inner): State<InnerState>,
) -> Result<Json<ApiResponse<Vec<MemberDto>>>, AppError> {
    let InnerState { db, .. } = inner;

    let rows = members::all_members(&db).await?;
    tracing::info!("all_members: returning {} members", rows.len());

    let dtos: Vec<MemberDto> = rows.into_iter().map(MemberDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}
