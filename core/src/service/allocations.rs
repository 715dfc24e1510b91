//! Single allocation operations.
//!
//! Creating or updating an allocation keeps the bed's occupancy flags in step
//! with it inside the same transaction.

use super::AccommodationService;
use crate::error::{AccommodationError, Entity, Result};
use crate::input::{AllocationFilter, AllocationPatch, NewAllocation, Page, Paginated};
use crate::types::{Allocation, AllocationId};

impl AccommodationService {
    /// List allocations, newest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn list_allocations(
        &self,
        filter: AllocationFilter,
        page: Page,
    ) -> Result<Paginated<Allocation>> {
        let mut tx = self.begin().await?;
        let allocations = tx.list_allocations(filter, page).await?;
        tx.commit().await?;
        Ok(allocations)
    }

    /// Fetch an allocation.
    ///
    /// # Errors
    ///
    /// `NotFound` if the allocation does not exist.
    pub async fn get_allocation(&self, allocation_id: AllocationId) -> Result<Allocation> {
        let mut tx = self.begin().await?;
        let allocation = tx
            .allocation(allocation_id)
            .await?
            .ok_or_else(|| AccommodationError::not_found(Entity::Allocation, allocation_id))?;
        tx.commit().await?;
        Ok(allocation)
    }

    /// Allocate a single bed.
    ///
    /// The bed becomes held when the allocation is soft and allocated
    /// otherwise. An inactive allocation records history only and leaves the
    /// bed untouched.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bed does not exist
    /// - `BedUnavailable` if the bed is inactive, held or allocated
    /// - `Validation` for an invalid payload
    #[tracing::instrument(skip(self, input), fields(bed_id = %input.bed_id))]
    pub async fn create_allocation(&self, input: NewAllocation) -> Result<Allocation> {
        let now = self.clock.now();
        let allocation = input.into_allocation(now)?;

        let mut tx = self.begin().await?;
        let mut bed = tx
            .lock_bed(allocation.bed_id)
            .await?
            .ok_or_else(|| AccommodationError::not_found(Entity::Bed, allocation.bed_id))?;
        if !bed.is_available() {
            tracing::warn!("Bed cannot be allocated");
            return Err(AccommodationError::BedUnavailable { bed_id: bed.id });
        }

        tx.insert_allocations(vec![allocation.clone()]).await?;
        if allocation.active {
            bed.occupy_for(&allocation, now);
            tx.update_bed(bed).await?;
        }
        tx.commit().await?;

        tracing::info!(
            allocation_id = %allocation.id,
            soft = allocation.is_soft_allocation,
            "Allocation created"
        );
        Ok(allocation)
    }

    /// Apply a patch to an allocation, repairing bed state.
    ///
    /// When the bed or the `active` flag changes, the previously occupied bed
    /// is released and, if the allocation is still active, the target bed
    /// must be available and takes the occupancy implied by the allocation.
    /// The allocation's own bed counts as available once released.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the allocation or target bed does not exist
    /// - `BedUnavailable` if the target bed cannot be occupied
    /// - `Validation` for an invalid patch
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_allocation(
        &self,
        allocation_id: AllocationId,
        patch: AllocationPatch,
    ) -> Result<Allocation> {
        let now = self.clock.now();

        let mut tx = self.begin().await?;
        let existing = tx
            .lock_allocation(allocation_id)
            .await?
            .ok_or_else(|| AccommodationError::not_found(Entity::Allocation, allocation_id))?;

        let mut updated = existing.clone();
        patch.apply_to(&mut updated, now)?;

        let bed_changed = updated.bed_id != existing.bed_id;
        let activity_changed = updated.active != existing.active;
        if bed_changed || activity_changed {
            let mut bed_ids = vec![existing.bed_id, updated.bed_id];
            bed_ids.dedup();
            let mut beds = tx.lock_beds(bed_ids).await?;
            if !beds.iter().any(|bed| bed.id == updated.bed_id) {
                return Err(AccommodationError::not_found(Entity::Bed, updated.bed_id));
            }

            if existing.active {
                if let Some(previous) = beds.iter_mut().find(|bed| bed.id == existing.bed_id) {
                    previous.release(now);
                    tracing::info!(bed_id = %previous.id, "Released previous bed");
                }
            }

            if updated.active {
                if let Some(target) = beds.iter_mut().find(|bed| bed.id == updated.bed_id) {
                    if !target.is_available() {
                        tracing::warn!(bed_id = %target.id, "Target bed cannot be allocated");
                        return Err(AccommodationError::BedUnavailable { bed_id: target.id });
                    }
                    target.occupy_for(&updated, now);
                }
            }

            for bed in beds {
                tx.update_bed(bed).await?;
            }
        }

        tx.update_allocation(updated.clone()).await?;
        tx.commit().await?;

        tracing::info!(bed_changed, activity_changed, "Allocation updated");
        Ok(updated)
    }
}
