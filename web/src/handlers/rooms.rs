//! Room endpoints, nested under `/dorms/:dorm_id/rooms/`.
//!
//! Every handler checks the dorm first, so an unknown dorm is always
//! "Dorm not found" even when the room id is also wrong.

use super::page;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::state::AppState;
use accommodation_core::input::{ActiveFilter, NewRoom, PageRequest, Paginated, RoomPatch};
use accommodation_core::{DormId, Room, RoomId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// `GET /dorms/:dorm_id/rooms/`
///
/// # Errors
///
/// 404 for an unknown dorm, 400 for invalid pagination.
pub async fn list_rooms(
    State(state): State<AppState>,
    Path(dorm_id): Path<DormId>,
    Query(filter): Query<ActiveFilter>,
    Query(paging): Query<PageRequest>,
) -> Result<Json<Paginated<Room>>, AppError> {
    let rooms = state
        .service
        .list_rooms(dorm_id, filter, page(paging)?)
        .await?;
    Ok(Json(rooms))
}

/// `GET /dorms/:dorm_id/rooms/:room_id/`
///
/// # Errors
///
/// 404 for an unknown dorm or room.
pub async fn get_room(
    State(state): State<AppState>,
    Path((dorm_id, room_id)): Path<(DormId, RoomId)>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(state.service.get_room(dorm_id, room_id).await?))
}

/// `POST /dorms/:dorm_id/rooms/`
///
/// # Errors
///
/// 404 for an unknown dorm, 400 "Room already exists".
pub async fn create_room(
    State(state): State<AppState>,
    Path(dorm_id): Path<DormId>,
    JsonBody(input): JsonBody<NewRoom>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let room = state.service.create_room(dorm_id, input).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// `PATCH /dorms/:dorm_id/rooms/:room_id/`
///
/// # Errors
///
/// 404 for an unknown dorm or room, 400 for a duplicate name.
pub async fn update_room(
    State(state): State<AppState>,
    Path((dorm_id, room_id)): Path<(DormId, RoomId)>,
    JsonBody(patch): JsonBody<RoomPatch>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(
        state.service.update_room(dorm_id, room_id, patch).await?,
    ))
}
