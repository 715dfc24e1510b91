//! Property-based testing utilities using proptest.

use accommodation_core::{Allocation, Bed};
use proptest::prelude::*;
use std::collections::HashMap;

/// Number of distinct parties generated operations draw from.
pub const PARTY_COUNT: usize = 3;

/// One step of a generated workflow run. Indices refer to a seeded bed pool
/// and to parties `P{n}` / `R{n}`.
#[derive(Debug, Clone)]
pub enum WorkflowOp {
    /// Soft-allocate the listed beds for a party
    SoftAllocate {
        /// Party index
        party: usize,
        /// Bed indices (may repeat, which the service rejects)
        beds: Vec<usize>,
    },
    /// Confirm a party's pending soft allocations
    Confirm {
        /// Party index
        party: usize,
    },
}

impl WorkflowOp {
    /// `(pnr, reg)` of a party index.
    #[must_use]
    pub fn party_identity(party: usize) -> (String, String) {
        (format!("P{party}"), format!("R{party}"))
    }
}

/// Strategy for a single operation over `bed_count` beds.
pub fn workflow_op(bed_count: usize) -> impl Strategy<Value = WorkflowOp> {
    prop_oneof![
        3 => (0..PARTY_COUNT, prop::collection::vec(0..bed_count, 1..=3))
            .prop_map(|(party, beds)| WorkflowOp::SoftAllocate { party, beds }),
        2 => (0..PARTY_COUNT).prop_map(|party| WorkflowOp::Confirm { party }),
    ]
}

/// Strategy for a run of up to `max_len` operations.
pub fn workflow_ops(bed_count: usize, max_len: usize) -> impl Strategy<Value = Vec<WorkflowOp>> {
    prop::collection::vec(workflow_op(bed_count), 1..=max_len)
}

/// Check that beds and allocations agree.
///
/// - no bed is both held and allocated
/// - no bed has more than one active allocation
/// - a bed is held exactly when its active allocation is soft, and allocated
///   exactly when its active allocation is confirmed
///
/// # Errors
///
/// Returns a description of the first violation.
pub fn check_occupancy(beds: &[Bed], allocations: &[Allocation]) -> Result<(), String> {
    let mut active: HashMap<_, Vec<&Allocation>> = HashMap::new();
    for allocation in allocations.iter().filter(|allocation| allocation.active) {
        active.entry(allocation.bed_id).or_default().push(allocation);
    }

    for bed in beds {
        if bed.blocked && bed.allocated {
            return Err(format!("bed {} is both blocked and allocated", bed.id));
        }
        let current = active.get(&bed.id).map_or(&[][..], Vec::as_slice);
        if current.len() > 1 {
            return Err(format!(
                "bed {} has {} active allocations",
                bed.id,
                current.len()
            ));
        }
        let soft = current.first().map(|allocation| allocation.is_soft_allocation);
        match (soft, bed.blocked, bed.allocated) {
            (None, false, false) | (Some(true), true, false) | (Some(false), false, true) => {},
            _ => {
                return Err(format!(
                    "bed {} (blocked={}, allocated={}) disagrees with its allocation {:?}",
                    bed.id, bed.blocked, bed.allocated, soft
                ));
            },
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::{allocation_input, bed_input};
    use crate::test_clock;
    use accommodation_core::{Clock, RoomId};

    #[test]
    fn free_bed_without_allocations_is_consistent() {
        let bed = bed_input(1).into_bed(RoomId::new(), test_clock().now());
        assert!(check_occupancy(&[bed], &[]).is_ok());
    }

    #[test]
    fn held_bed_without_allocation_is_reported() {
        let mut bed = bed_input(1).into_bed(RoomId::new(), test_clock().now());
        bed.blocked = true;
        assert!(check_occupancy(&[bed], &[]).is_err());
    }

    #[test]
    fn two_active_allocations_are_reported() {
        let now = test_clock().now();
        let mut bed = bed_input(1).into_bed(RoomId::new(), now);
        bed.allocated = true;
        let first = allocation_input(bed.id, false).into_allocation(now).unwrap();
        let second = allocation_input(bed.id, false).into_allocation(now).unwrap();
        let err = check_occupancy(&[bed], &[first, second]).unwrap_err();
        assert!(err.contains("2 active allocations"));
    }
}
