//! Route table.

use crate::handlers::{allocations, beds, dorms, health, rooms};
use crate::middleware::{correlation_id_layer, require_identity};
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// `/`, `/checkdb`, `/health` and `/ready` are public; every `/dorms/**` and
/// `/allocations/**` route goes through [`require_identity`]. CORS is left to
/// the binary.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        // Dorms
        .route("/dorms/", get(dorms::list_dorms).post(dorms::create_dorm))
        .route(
            "/dorms/:dorm_id/",
            get(dorms::get_dorm).patch(dorms::update_dorm),
        )
        // Rooms
        .route(
            "/dorms/:dorm_id/rooms/",
            get(rooms::list_rooms).post(rooms::create_room),
        )
        .route(
            "/dorms/:dorm_id/rooms/:room_id/",
            get(rooms::get_room).patch(rooms::update_room),
        )
        // Beds
        .route(
            "/dorms/:dorm_id/rooms/:room_id/beds/",
            get(beds::list_beds).post(beds::create_bed),
        )
        .route(
            "/dorms/:dorm_id/rooms/:room_id/beds/:bed_id/",
            get(beds::get_bed).patch(beds::update_bed),
        )
        // Allocations
        .route(
            "/allocations/",
            get(allocations::list_allocations).post(allocations::create_allocation),
        )
        .route(
            "/allocations/soft-allocate/",
            post(allocations::soft_allocate),
        )
        .route(
            "/allocations/confirm-soft-allocation/",
            post(allocations::confirm_soft_allocation),
        )
        .route(
            "/allocations/:allocation_id/",
            get(allocations::get_allocation).patch(allocations::update_allocation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    Router::new()
        .route("/", get(health::root))
        .route("/checkdb", get(health::check_db))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
