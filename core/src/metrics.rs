//! Business metrics for the allocation workflow.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `accommodation_soft_allocations_total` - Soft allocations created
//! - `accommodation_confirmations_total` - Soft allocations confirmed
//! - `accommodation_released_holds_total` - Party holds released on re-request
//! - `accommodation_rejected_batches_total` - Soft-allocate batches rejected

use ::metrics::describe_counter;

/// Soft allocations created.
pub const SOFT_ALLOCATIONS_TOTAL: &str = "accommodation_soft_allocations_total";
/// Soft allocations confirmed.
pub const CONFIRMATIONS_TOTAL: &str = "accommodation_confirmations_total";
/// Party holds released before a new soft allocation.
pub const RELEASED_HOLDS_TOTAL: &str = "accommodation_released_holds_total";
/// Soft-allocate batches rejected.
pub const REJECTED_BATCHES_TOTAL: &str = "accommodation_rejected_batches_total";

/// Register metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        SOFT_ALLOCATIONS_TOTAL,
        "Total number of soft allocations (payment pending holds) created"
    );
    describe_counter!(
        CONFIRMATIONS_TOTAL,
        "Total number of soft allocations converted into permanent allocations"
    );
    describe_counter!(
        RELEASED_HOLDS_TOTAL,
        "Total number of prior party allocations released by a new soft-allocate request"
    );
    describe_counter!(
        REJECTED_BATCHES_TOTAL,
        "Total number of soft-allocate batches rejected (validation or unavailable bed)"
    );

    tracing::info!("Accommodation metrics registered");
}
