//! Bed endpoints, nested under `/dorms/:dorm_id/rooms/:room_id/beds/`.

use super::page;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::state::AppState;
use accommodation_core::input::{ActiveFilter, BedPatch, NewBed, PageRequest, Paginated};
use accommodation_core::{Bed, BedId, DormId, RoomId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// `GET /dorms/:dorm_id/rooms/:room_id/beds/`
///
/// # Errors
///
/// 404 for an unknown dorm or room, 400 for invalid pagination.
pub async fn list_beds(
    State(state): State<AppState>,
    Path((dorm_id, room_id)): Path<(DormId, RoomId)>,
    Query(filter): Query<ActiveFilter>,
    Query(paging): Query<PageRequest>,
) -> Result<Json<Paginated<Bed>>, AppError> {
    let beds = state
        .service
        .list_beds(dorm_id, room_id, filter, page(paging)?)
        .await?;
    Ok(Json(beds))
}

/// `GET /dorms/:dorm_id/rooms/:room_id/beds/:bed_id/`
///
/// # Errors
///
/// 404 for an unknown dorm, room or bed.
pub async fn get_bed(
    State(state): State<AppState>,
    Path((dorm_id, room_id, bed_id)): Path<(DormId, RoomId, BedId)>,
) -> Result<Json<Bed>, AppError> {
    Ok(Json(state.service.get_bed(dorm_id, room_id, bed_id).await?))
}

/// `POST /dorms/:dorm_id/rooms/:room_id/beds/`
///
/// # Errors
///
/// 404 for an unknown dorm or room, 400 "Bed already exists".
pub async fn create_bed(
    State(state): State<AppState>,
    Path((dorm_id, room_id)): Path<(DormId, RoomId)>,
    JsonBody(input): JsonBody<NewBed>,
) -> Result<(StatusCode, Json<Bed>), AppError> {
    let bed = state.service.create_bed(dorm_id, room_id, input).await?;
    Ok((StatusCode::CREATED, Json(bed)))
}

/// `PATCH /dorms/:dorm_id/rooms/:room_id/beds/:bed_id/`
///
/// `blocked` and `allocated` are rejected as unknown fields.
///
/// # Errors
///
/// 404 for an unknown dorm, room or bed, 400 for a duplicate number.
pub async fn update_bed(
    State(state): State<AppState>,
    Path((dorm_id, room_id, bed_id)): Path<(DormId, RoomId, BedId)>,
    JsonBody(patch): JsonBody<BedPatch>,
) -> Result<Json<Bed>, AppError> {
    Ok(Json(
        state
            .service
            .update_bed(dorm_id, room_id, bed_id, patch)
            .await?,
    ))
}
