//! Allocation endpoints, including the soft-allocation workflow.
//!
//! - `GET /allocations/` - list (`?bed_id=&reg=&partner=&page=&page_size=`)
//! - `POST /allocations/` - allocate one bed directly
//! - `GET /allocations/:allocation_id/` - allocation details
//! - `PATCH /allocations/:allocation_id/` - update, repairing bed occupancy
//! - `POST /allocations/soft-allocate/` - hold a batch of beds for a party
//! - `POST /allocations/confirm-soft-allocation/` - confirm a party's holds

use super::page;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::state::AppState;
use accommodation_core::input::{
    AllocationFilter, AllocationPatch, ConfirmSoftAllocation, NewAllocation, PageRequest,
    Paginated, SoftAllocationRequest,
};
use accommodation_core::{Allocation, AllocationId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;

/// Body of the workflow endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Outcome summary
    pub message: String,
}

/// `GET /allocations/`
///
/// # Errors
///
/// 400 for invalid pagination.
pub async fn list_allocations(
    State(state): State<AppState>,
    Query(filter): Query<AllocationFilter>,
    Query(paging): Query<PageRequest>,
) -> Result<Json<Paginated<Allocation>>, AppError> {
    let allocations = state
        .service
        .list_allocations(filter, page(paging)?)
        .await?;
    Ok(Json(allocations))
}

/// `GET /allocations/:allocation_id/`
///
/// # Errors
///
/// 404 "Allocation not found".
pub async fn get_allocation(
    State(state): State<AppState>,
    Path(allocation_id): Path<AllocationId>,
) -> Result<Json<Allocation>, AppError> {
    Ok(Json(state.service.get_allocation(allocation_id).await?))
}

/// `POST /allocations/`
///
/// # Errors
///
/// 404 "Bed not found", 400 when the bed cannot be allocated.
pub async fn create_allocation(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewAllocation>,
) -> Result<(StatusCode, Json<Allocation>), AppError> {
    let allocation = state.service.create_allocation(input).await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}

/// `PATCH /allocations/:allocation_id/`
///
/// # Errors
///
/// 404 for an unknown allocation or target bed, 400 when the target bed is
/// not available.
pub async fn update_allocation(
    State(state): State<AppState>,
    Path(allocation_id): Path<AllocationId>,
    JsonBody(patch): JsonBody<AllocationPatch>,
) -> Result<Json<Allocation>, AppError> {
    Ok(Json(
        state
            .service
            .update_allocation(allocation_id, patch)
            .await?,
    ))
}

/// `POST /allocations/soft-allocate/`
///
/// # Errors
///
/// 400 for an empty batch or an unavailable bed (the message names it),
/// 404 for an unknown bed.
pub async fn soft_allocate(
    State(state): State<AppState>,
    JsonBody(requests): JsonBody<Vec<SoftAllocationRequest>>,
) -> Result<Json<MessageResponse>, AppError> {
    let outcome = state.service.soft_allocate(requests).await?;
    Ok(Json(MessageResponse {
        message: outcome.message(),
    }))
}

/// `POST /allocations/confirm-soft-allocation/`
///
/// # Errors
///
/// 400 when nothing is pending for the PNR.
pub async fn confirm_soft_allocation(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ConfirmSoftAllocation>,
) -> Result<Json<MessageResponse>, AppError> {
    let outcome = state.service.confirm_soft_allocation(input).await?;
    Ok(Json(MessageResponse {
        message: outcome.message(),
    }))
}
