//! Payload builders and a seeded service harness.

use crate::{InMemoryRecordStore, test_clock};
use accommodation_core::input::{
    ConfirmSoftAllocation, NewAllocation, NewBed, NewDorm, NewRoom, SoftAllocationRequest,
};
use accommodation_core::{
    AccommodationService, AmountFor, Bed, BedId, BedLevel, BedType, Dorm, Floor, ParticipantType,
    ReleasePolicy, Result, Room,
};
use std::sync::Arc;

/// A dorm payload with the given name.
#[must_use]
pub fn dorm_input(name: &str) -> NewDorm {
    NewDorm {
        name: name.to_string(),
        description: None,
        amount: 1500,
        amount_for: AmountFor::Event,
        active: true,
    }
}

/// A room payload with the given name.
#[must_use]
pub fn room_input(name: &str) -> NewRoom {
    NewRoom {
        name: name.to_string(),
        room_identifier: 101,
        ac_available: false,
        floor: Floor::Gf,
        close_to_dorm_entrance: false,
        close_to_bath: true,
        percent_released: Some(100),
        bed_type: BedType::Bunk,
        is_multibatch: false,
        participant_type: ParticipantType::General,
        reset_allowed: false,
        active: true,
    }
}

/// A bed payload with the given number.
#[must_use]
pub const fn bed_input(number: i32) -> NewBed {
    NewBed {
        number: Some(number),
        level: BedLevel::Lower,
        close_to_dorm_entrance: false,
        close_to_bath: false,
        active: true,
    }
}

/// A soft-allocate entry for one bed.
#[must_use]
pub fn soft_request(bed_id: BedId, pnr: &str, reg: &str) -> SoftAllocationRequest {
    SoftAllocationRequest {
        bed_id,
        pnr: pnr.to_string(),
        reg: reg.to_string(),
        partner: None,
        name: None,
        receipt: None,
        amount_paid: None,
        checkin_date: None,
        checkout_date: None,
    }
}

/// A confirmation payload.
#[must_use]
pub fn confirmation(pnr: &str, receipt: &str, amount_paid: f64) -> ConfirmSoftAllocation {
    ConfirmSoftAllocation {
        pnr: pnr.to_string(),
        receipt: receipt.to_string(),
        amount_paid,
    }
}

/// A simple allocation payload for one bed.
#[must_use]
pub const fn allocation_input(bed_id: BedId, is_soft_allocation: bool) -> NewAllocation {
    NewAllocation {
        bed_id,
        pnr: None,
        reg: None,
        partner: None,
        name: None,
        is_soft_allocation,
        receipt: None,
        amount_paid: None,
        checkin_date: None,
        checkout_date: None,
        active: true,
    }
}

/// An in-memory service seeded with one dorm, one room and some free beds.
///
/// # Example
///
/// ```
/// use accommodation_testing::fixtures::{TestHarness, soft_request};
///
/// # async fn example() -> accommodation_core::Result<()> {
/// let harness = TestHarness::with_beds(2).await?;
/// harness
///     .service
///     .soft_allocate(vec![soft_request(harness.beds[0].id, "P1", "R1")])
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestHarness {
    /// Backing store, for direct inspection
    pub store: InMemoryRecordStore,
    /// Service under test
    pub service: AccommodationService,
    /// Seeded dorm
    pub dorm: Dorm,
    /// Seeded room
    pub room: Room,
    /// Seeded beds, numbered from 1
    pub beds: Vec<Bed>,
}

impl TestHarness {
    /// Seed `count` free beds with the default release policy.
    ///
    /// # Errors
    ///
    /// Propagates service errors while seeding.
    pub async fn with_beds(count: usize) -> Result<Self> {
        Self::with_policy(count, ReleasePolicy::default()).await
    }

    /// Seed `count` free beds with the given release policy.
    ///
    /// # Errors
    ///
    /// Propagates service errors while seeding.
    pub async fn with_policy(count: usize, policy: ReleasePolicy) -> Result<Self> {
        let store = InMemoryRecordStore::new();
        let service = AccommodationService::new(Arc::new(store.clone()), Arc::new(test_clock()))
            .with_release_policy(policy);

        let dorm = service.create_dorm(dorm_input("Main Dorm")).await?;
        let room = service.create_room(dorm.id, room_input("Room 1")).await?;
        let mut beds = Vec::with_capacity(count);
        for number in (1..).take(count) {
            beds.push(service.create_bed(dorm.id, room.id, bed_input(number)).await?);
        }

        Ok(Self {
            store,
            service,
            dorm,
            room,
            beds,
        })
    }

    /// Committed state of a bed.
    pub async fn bed(&self, id: BedId) -> Option<Bed> {
        self.store.bed(id).await
    }

    /// Mark a seeded bed as held without going through the workflow.
    pub async fn block_bed(&self, id: BedId) {
        if let Some(mut bed) = self.store.bed(id).await {
            bed.blocked = true;
            self.store.put_bed(bed).await;
        }
    }

    /// Deactivate a seeded bed without going through the workflow.
    pub async fn deactivate_bed(&self, id: BedId) {
        if let Some(mut bed) = self.store.bed(id).await {
            bed.active = false;
            self.store.put_bed(bed).await;
        }
    }
}
