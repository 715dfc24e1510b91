//! Dorm endpoints.
//!
//! - `GET /dorms/` - list dorms (`?active=&page=&page_size=`)
//! - `POST /dorms/` - create a dorm
//! - `GET /dorms/:dorm_id/` - dorm details
//! - `PATCH /dorms/:dorm_id/` - update a dorm

use super::page;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::state::AppState;
use accommodation_core::input::{ActiveFilter, DormPatch, NewDorm, PageRequest, Paginated};
use accommodation_core::{Dorm, DormId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// `GET /dorms/`
///
/// # Errors
///
/// 400 for invalid pagination.
pub async fn list_dorms(
    State(state): State<AppState>,
    Query(filter): Query<ActiveFilter>,
    Query(paging): Query<PageRequest>,
) -> Result<Json<Paginated<Dorm>>, AppError> {
    let dorms = state.service.list_dorms(filter, page(paging)?).await?;
    Ok(Json(dorms))
}

/// `GET /dorms/:dorm_id/`
///
/// # Errors
///
/// 404 "Dorm not found".
pub async fn get_dorm(
    State(state): State<AppState>,
    Path(dorm_id): Path<DormId>,
) -> Result<Json<Dorm>, AppError> {
    Ok(Json(state.service.get_dorm(dorm_id).await?))
}

/// `POST /dorms/`
///
/// # Errors
///
/// 400 "Dorm already exists" or an invalid payload.
pub async fn create_dorm(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewDorm>,
) -> Result<(StatusCode, Json<Dorm>), AppError> {
    let dorm = state.service.create_dorm(input).await?;
    Ok((StatusCode::CREATED, Json(dorm)))
}

/// `PATCH /dorms/:dorm_id/`
///
/// # Errors
///
/// 404 for an unknown dorm, 400 when renaming onto an existing name.
pub async fn update_dorm(
    State(state): State<AppState>,
    Path(dorm_id): Path<DormId>,
    JsonBody(patch): JsonBody<DormPatch>,
) -> Result<Json<Dorm>, AppError> {
    Ok(Json(state.service.update_dorm(dorm_id, patch).await?))
}
