//! Soft allocation and confirmation against the in-memory store.
//!
//! Covers the reserve / commit lifecycle of a bed:
//!
//! - a party's hold moves when it re-requests beds
//! - an unavailable bed rejects the whole batch
//! - confirmation attaches payment to the newest hold and finalizes every bed

#![allow(clippy::unwrap_used, clippy::expect_used)]

use accommodation_core::{AccommodationError, ReleasePolicy};
use accommodation_testing::fixtures::{TestHarness, confirmation, soft_request};
use accommodation_testing::properties::check_occupancy;

async fn assert_consistent(harness: &TestHarness) {
    let beds = harness.store.beds().await;
    let allocations = harness.store.allocations().await;
    check_occupancy(&beds, &allocations).expect("beds and allocations agree");
}

/// A free bed becomes held by a new soft allocation.
#[tokio::test]
async fn test_soft_allocate_holds_free_bed() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let b1 = harness.beds[0].id;

    let outcome = harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();

    assert_eq!(outcome.allocated, 1);
    assert_eq!(outcome.released, 0);
    let bed = harness.bed(b1).await.unwrap();
    assert!(bed.blocked);
    assert!(!bed.allocated);

    let allocations = harness.store.allocations().await;
    assert_eq!(allocations.len(), 1);
    assert!(allocations[0].is_soft_allocation);
    assert!(allocations[0].active);
    assert_eq!(allocations[0].pnr.as_deref(), Some("P1"));
    assert_consistent(&harness).await;
}

/// The same party re-requesting another bed releases its hold.
#[tokio::test]
async fn test_rerequest_moves_party_hold() {
    let harness = TestHarness::with_beds(2).await.unwrap();
    let (b1, b2) = (harness.beds[0].id, harness.beds[1].id);
    harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();

    let outcome = harness
        .service
        .soft_allocate(vec![soft_request(b2, "P1", "R1")])
        .await
        .unwrap();

    assert_eq!(outcome.released, 1);
    let old_bed = harness.bed(b1).await.unwrap();
    assert!(old_bed.is_available());
    let new_bed = harness.bed(b2).await.unwrap();
    assert!(new_bed.blocked);

    let allocations = harness.store.allocations().await;
    assert_eq!(allocations.len(), 2);
    let old = allocations.iter().find(|a| a.bed_id == b1).unwrap();
    let new = allocations.iter().find(|a| a.bed_id == b2).unwrap();
    assert!(!old.active);
    assert!(new.active && new.is_soft_allocation);
    assert_consistent(&harness).await;
}

/// A party may re-request the very bed it already holds.
#[tokio::test]
async fn test_rerequest_same_bed_succeeds() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let b1 = harness.beds[0].id;
    harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();

    let outcome = harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();

    assert_eq!(outcome.released, 1);
    assert!(harness.bed(b1).await.unwrap().blocked);
    let active = harness
        .store
        .allocations()
        .await
        .into_iter()
        .filter(|a| a.active)
        .count();
    assert_eq!(active, 1);
    assert_consistent(&harness).await;
}

/// Two parties each asking for the other's bed are both rejected and keep
/// their own holds.
#[tokio::test]
async fn test_crossed_rerequests_keep_both_holds() {
    let harness = TestHarness::with_beds(2).await.unwrap();
    let (b1, b2) = (harness.beds[0].id, harness.beds[1].id);
    harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();
    harness
        .service
        .soft_allocate(vec![soft_request(b2, "P2", "R2")])
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        harness.service.soft_allocate(vec![soft_request(b2, "P1", "R1")]),
        harness.service.soft_allocate(vec![soft_request(b1, "P2", "R2")]),
    );
    assert!(matches!(first.unwrap_err(), AccommodationError::BedUnavailable { bed_id } if bed_id == b2));
    assert!(matches!(second.unwrap_err(), AccommodationError::BedUnavailable { bed_id } if bed_id == b1));

    let allocations = harness.store.allocations().await;
    assert_eq!(allocations.iter().filter(|a| a.active).count(), 2);
    assert!(harness.bed(b1).await.unwrap().blocked);
    assert!(harness.bed(b2).await.unwrap().blocked);
    assert_consistent(&harness).await;
}

/// A released bed that the party does not re-request is written back free.
#[tokio::test]
async fn test_released_bed_outside_batch_is_freed() {
    let harness = TestHarness::with_beds(3).await.unwrap();
    let (b1, b2, b3) = (harness.beds[0].id, harness.beds[1].id, harness.beds[2].id);
    harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();

    let outcome = harness
        .service
        .soft_allocate(vec![soft_request(b2, "P1", "R1"), soft_request(b3, "P1", "R9")])
        .await
        .unwrap();

    assert_eq!(outcome.released, 1);
    assert!(harness.bed(b1).await.unwrap().is_available());
    assert!(harness.bed(b2).await.unwrap().blocked);
    assert!(harness.bed(b3).await.unwrap().blocked);
    assert_consistent(&harness).await;
}

/// Another party's hold is not released.
#[tokio::test]
async fn test_other_party_hold_blocks_bed() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let b1 = harness.beds[0].id;
    harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();

    let err = harness
        .service
        .soft_allocate(vec![soft_request(b1, "P2", "R2")])
        .await
        .unwrap_err();

    assert!(matches!(err, AccommodationError::BedUnavailable { bed_id } if bed_id == b1));
    assert_eq!(harness.store.allocations().await.len(), 1);
}

/// Confirmation makes the hold permanent and records payment.
#[tokio::test]
async fn test_confirm_finalizes_hold() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let b1 = harness.beds[0].id;
    harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();

    let outcome = harness
        .service
        .confirm_soft_allocation(confirmation("P1", "RCPT1", 100.0))
        .await
        .unwrap();

    assert_eq!(outcome.confirmed, 1);
    let allocations = harness.store.allocations().await;
    assert!(!allocations[0].is_soft_allocation);
    assert_eq!(allocations[0].receipt.as_deref(), Some("RCPT1"));
    assert_eq!(allocations[0].amount_paid, Some(100.0));
    let bed = harness.bed(b1).await.unwrap();
    assert!(bed.allocated);
    assert!(!bed.blocked);
    assert_consistent(&harness).await;
}

/// A held bed rejects the batch and nothing is created.
#[tokio::test]
async fn test_blocked_bed_rejects_batch() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let b3 = harness.beds[0].id;
    harness.block_bed(b3).await;

    let err = harness
        .service
        .soft_allocate(vec![soft_request(b3, "P2", "R2")])
        .await
        .unwrap_err();

    assert!(matches!(err, AccommodationError::BedUnavailable { bed_id } if bed_id == b3));
    assert!(err.to_string().contains(&b3.to_string()));
    assert!(harness.store.allocations().await.is_empty());
}

#[tokio::test]
async fn test_inactive_or_allocated_bed_rejects_batch() {
    let harness = TestHarness::with_beds(3).await.unwrap();
    let (free, inactive, taken) = (harness.beds[0].id, harness.beds[1].id, harness.beds[2].id);
    harness.deactivate_bed(inactive).await;
    harness
        .service
        .soft_allocate(vec![soft_request(taken, "P9", "R9")])
        .await
        .unwrap();
    harness
        .service
        .confirm_soft_allocation(confirmation("P9", "RCPT9", 10.0))
        .await
        .unwrap();

    for unavailable in [inactive, taken] {
        let err = harness
            .service
            .soft_allocate(vec![
                soft_request(free, "P1", "R1"),
                soft_request(unavailable, "P1", "R2"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, AccommodationError::BedUnavailable { .. }));
    }

    // The free bed in the rejected batches stays free
    assert!(harness.bed(free).await.unwrap().is_available());
    assert_eq!(harness.store.allocations().await.len(), 1);
}

#[tokio::test]
async fn test_unknown_bed_rejects_batch() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let missing = accommodation_core::BedId::new();

    let err = harness
        .service
        .soft_allocate(vec![
            soft_request(harness.beds[0].id, "P1", "R1"),
            soft_request(missing, "P1", "R2"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, AccommodationError::BedNotFound { bed_id } if bed_id == missing));
    assert!(err.to_string().contains(&missing.to_string()));
    assert!(harness.store.allocations().await.is_empty());
    assert!(harness.bed(harness.beds[0].id).await.unwrap().is_available());
}

#[tokio::test]
async fn test_empty_batch_is_a_validation_error() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let err = harness.service.soft_allocate(Vec::new()).await.unwrap_err();
    assert!(matches!(err, AccommodationError::Validation(_)));
}

#[tokio::test]
async fn test_confirm_without_pending_holds_has_no_side_effects() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let before = harness.store.beds().await;

    let err = harness
        .service
        .confirm_soft_allocation(confirmation("NOPE", "RCPT", 50.0))
        .await
        .unwrap_err();

    assert!(matches!(err, AccommodationError::NoSoftAllocations { ref pnr } if pnr == "NOPE"));
    assert_eq!(err.to_string(), "No soft allocated beds found for PNR NOPE");
    assert_eq!(harness.store.beds().await, before);
    assert!(harness.store.allocations().await.is_empty());
}

#[tokio::test]
async fn test_confirm_twice_fails_second_time() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    harness
        .service
        .soft_allocate(vec![soft_request(harness.beds[0].id, "P1", "R1")])
        .await
        .unwrap();
    harness
        .service
        .confirm_soft_allocation(confirmation("P1", "RCPT1", 100.0))
        .await
        .unwrap();

    let err = harness
        .service
        .confirm_soft_allocation(confirmation("P1", "RCPT2", 100.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AccommodationError::NoSoftAllocations { .. }));
}

/// The newest pending allocation of the party carries the payment record.
#[tokio::test]
async fn test_payment_attaches_to_latest_allocation() {
    let harness = TestHarness::with_beds(3).await.unwrap();
    let ids: Vec<_> = harness.beds.iter().map(|bed| bed.id).collect();
    harness
        .service
        .soft_allocate(vec![
            soft_request(ids[0], "P1", "R1"),
            soft_request(ids[1], "P1", "R2"),
            soft_request(ids[2], "P1", "R3"),
        ])
        .await
        .unwrap();

    let outcome = harness
        .service
        .confirm_soft_allocation(confirmation("P1", "RCPT1", 300.0))
        .await
        .unwrap();
    assert_eq!(outcome.confirmed, 3);

    let allocations = harness.store.allocations().await;
    let paid: Vec<_> = allocations
        .iter()
        .filter(|a| a.receipt.is_some())
        .collect();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].bed_id, ids[2]);
    assert_eq!(paid[0].amount_paid, Some(300.0));
    assert!(allocations.iter().all(|a| !a.is_soft_allocation));
    for id in ids {
        let bed = harness.bed(id).await.unwrap();
        assert!(bed.allocated && !bed.blocked);
    }
    assert_consistent(&harness).await;
}

/// Round trip: soft-allocate, confirm, re-fetch.
#[tokio::test]
async fn test_round_trip_through_service_reads() {
    let harness = TestHarness::with_beds(1).await.unwrap();
    let bed_id = harness.beds[0].id;
    harness
        .service
        .soft_allocate(vec![soft_request(bed_id, "P1", "R1")])
        .await
        .unwrap();
    harness
        .service
        .confirm_soft_allocation(confirmation("P1", "RCPT1", 100.0))
        .await
        .unwrap();

    let bed = harness
        .service
        .get_bed(harness.dorm.id, harness.room.id, bed_id)
        .await
        .unwrap();
    assert!(bed.allocated);
    assert!(!bed.blocked);

    let allocation_id = harness.store.allocations().await[0].id;
    let allocation = harness.service.get_allocation(allocation_id).await.unwrap();
    assert!(!allocation.is_soft_allocation);
}

// ============================================================================
// Release policy
// ============================================================================

/// Under the atomic policy a rejected batch keeps the party's previous hold.
#[tokio::test]
async fn test_atomic_policy_keeps_previous_hold_on_failure() {
    let harness = TestHarness::with_policy(2, ReleasePolicy::Atomic).await.unwrap();
    let (b1, b2) = (harness.beds[0].id, harness.beds[1].id);
    harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();
    harness.block_bed(b2).await;

    harness
        .service
        .soft_allocate(vec![soft_request(b2, "P1", "R1")])
        .await
        .unwrap_err();

    assert!(harness.bed(b1).await.unwrap().blocked);
    let allocations = harness.store.allocations().await;
    assert_eq!(allocations.len(), 1);
    assert!(allocations[0].active);
}

/// Under the commit-first policy the release survives a rejected batch.
#[tokio::test]
async fn test_commit_first_policy_releases_before_validation() {
    let harness = TestHarness::with_policy(2, ReleasePolicy::CommitFirst)
        .await
        .unwrap();
    let (b1, b2) = (harness.beds[0].id, harness.beds[1].id);
    harness
        .service
        .soft_allocate(vec![soft_request(b1, "P1", "R1")])
        .await
        .unwrap();
    harness.block_bed(b2).await;

    harness
        .service
        .soft_allocate(vec![soft_request(b2, "P1", "R1")])
        .await
        .unwrap_err();

    assert!(harness.bed(b1).await.unwrap().is_available());
    let allocations = harness.store.allocations().await;
    assert_eq!(allocations.len(), 1);
    assert!(!allocations[0].active);
}
