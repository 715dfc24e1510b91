//! Soft allocation and confirmation.
//!
//! ```text
//! soft_allocate(batch)
//!   1. lock held and requested beds together, release every active
//!      allocation of each (pnr, reg) party in the batch
//!   2. require each requested bed to exist and be available
//!   3. insert one soft allocation per request
//!   4. hold every requested bed
//!
//! confirm_soft_allocation(pnr, receipt, amount)
//!   1. lock the party's active soft allocations, oldest first
//!   2. attach the payment to the most recently created one
//!   3. flip all of them to confirmed in one statement
//!   4. finalize their beds
//! ```
//!
//! Each phase runs in one transaction and locks its beds in one call. Under
//! [`ReleasePolicy::CommitFirst`] step 1 of `soft_allocate` is committed on
//! its own before the requested beds are locked.

use super::{AccommodationService, ConfirmationOutcome, ReleasePolicy, SoftAllocationOutcome};
use crate::error::{AccommodationError, Result};
use crate::input::{ConfirmSoftAllocation, SoftAllocationRequest};
use crate::metrics::{
    CONFIRMATIONS_TOTAL, REJECTED_BATCHES_TOTAL, RELEASED_HOLDS_TOTAL, SOFT_ALLOCATIONS_TOTAL,
};
use crate::store::StoreTransaction;
use crate::types::{Allocation, Bed, BedId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};

/// Reject empty batches, blank party identity and repeated beds.
fn validate_batch(requests: &[SoftAllocationRequest]) -> Result<()> {
    if requests.is_empty() {
        return Err(AccommodationError::validation(
            "at least one allocation request is required",
        ));
    }
    let mut seen = HashSet::with_capacity(requests.len());
    for request in requests {
        request.validate()?;
        if !seen.insert(request.bed_id) {
            return Err(AccommodationError::validation(format!(
                "Bed {} is requested more than once",
                request.bed_id
            )));
        }
    }
    Ok(())
}

/// Every active allocation held by the given parties, oldest party first.
async fn party_holds(
    tx: &mut dyn StoreTransaction,
    parties: &BTreeSet<(String, String)>,
) -> Result<Vec<Allocation>> {
    let mut holds = Vec::new();
    for (pnr, reg) in parties {
        holds.extend(
            tx.active_allocations_for_party(pnr.clone(), reg.clone())
                .await?,
        );
    }
    Ok(holds)
}

/// Deactivate `holds` and free their beds within the locked set `beds`.
///
/// Released beds stay in `beds` so a bed released and re-requested in the
/// same batch is validated against its freed state.
async fn release_holds(
    tx: &mut dyn StoreTransaction,
    holds: Vec<Allocation>,
    beds: &mut [Bed],
    now: DateTime<Utc>,
) -> Result<()> {
    for mut allocation in holds {
        if let Some(bed) = beds.iter_mut().find(|bed| bed.id == allocation.bed_id) {
            bed.release(now);
            tracing::info!(
                bed_id = %bed.id,
                pnr = allocation.pnr.as_deref().unwrap_or_default(),
                reg = allocation.reg.as_deref().unwrap_or_default(),
                "Released previous hold"
            );
        }
        allocation.deactivate(now);
        tx.update_allocation(allocation).await?;
    }
    Ok(())
}

impl AccommodationService {
    /// Place payment-pending holds on a batch of beds for one or more parties.
    ///
    /// Any allocation a party in the batch already holds is released first,
    /// so a party re-requesting beds moves rather than accumulates holds. The
    /// batch is all-or-nothing for the new holds; whether the releases survive
    /// a rejected batch depends on the [`ReleasePolicy`].
    ///
    /// # Errors
    ///
    /// - `Validation`: empty batch, blank `pnr` / `reg`, repeated bed
    /// - `BedNotFound`: a requested bed does not exist
    /// - `BedUnavailable`: a requested bed is inactive, held or allocated
    #[tracing::instrument(skip(self, requests), fields(batch_size = requests.len()))]
    pub async fn soft_allocate(
        &self,
        requests: Vec<SoftAllocationRequest>,
    ) -> Result<SoftAllocationOutcome> {
        let result = self.run_soft_allocate(requests).await;
        match &result {
            Ok(outcome) => {
                ::metrics::counter!(SOFT_ALLOCATIONS_TOTAL).increment(outcome.allocated as u64);
                ::metrics::counter!(RELEASED_HOLDS_TOTAL).increment(outcome.released as u64);
                tracing::info!(
                    allocated = outcome.allocated,
                    released = outcome.released,
                    "Soft allocation batch accepted"
                );
            },
            Err(error) => {
                ::metrics::counter!(REJECTED_BATCHES_TOTAL).increment(1);
                tracing::warn!(%error, "Soft allocation batch rejected");
            },
        }
        result
    }

    async fn run_soft_allocate(
        &self,
        requests: Vec<SoftAllocationRequest>,
    ) -> Result<SoftAllocationOutcome> {
        validate_batch(&requests)?;
        let now = self.clock.now();

        let parties: BTreeSet<(String, String)> = requests
            .iter()
            .map(|request| (request.pnr.clone(), request.reg.clone()))
            .collect();

        // Step 1: release stale holds
        let mut tx = self.begin().await?;
        let holds = party_holds(tx.as_mut(), &parties).await?;
        let released = holds.len();
        let held_beds: BTreeSet<BedId> = holds.iter().map(|allocation| allocation.bed_id).collect();
        let requested: BTreeSet<BedId> = requests.iter().map(|request| request.bed_id).collect();

        let mut beds = if released > 0 && self.release_policy == ReleasePolicy::CommitFirst {
            let mut freed = tx.lock_beds(held_beds.iter().copied().collect()).await?;
            release_holds(tx.as_mut(), holds, &mut freed, now).await?;
            for bed in freed {
                tx.update_bed(bed).await?;
            }
            tx.commit().await?;
            tracing::debug!(released, "Committed releases ahead of validation");

            tx = self.begin().await?;
            tx.lock_beds(requested.iter().copied().collect()).await?
        } else {
            // One lock call over held and requested beds keeps the lock order global
            let mut beds = tx
                .lock_beds(held_beds.union(&requested).copied().collect())
                .await?;
            release_holds(tx.as_mut(), holds, &mut beds, now).await?;
            beds
        };

        // Step 2: validate availability, in request order
        for request in &requests {
            match beds.iter().find(|bed| bed.id == request.bed_id) {
                None => return Err(AccommodationError::BedNotFound { bed_id: request.bed_id }),
                Some(bed) if !bed.is_available() => {
                    return Err(AccommodationError::BedUnavailable { bed_id: bed.id });
                },
                Some(_) => {},
            }
        }

        // Step 3: create reservation records
        let allocations: Vec<Allocation> = requests
            .into_iter()
            .map(|request| request.into_soft_allocation(now))
            .collect();
        let allocated = allocations.len();
        tx.insert_allocations(allocations).await?;

        // Step 4: hold the beds, writing back any freed ones not re-requested
        for bed in &mut beds {
            if requested.contains(&bed.id) {
                bed.hold(now);
            }
        }
        for bed in beds {
            tx.update_bed(bed).await?;
        }
        tx.commit().await?;

        Ok(SoftAllocationOutcome {
            allocated,
            released,
        })
    }

    /// Confirm every pending soft allocation of a party after payment.
    ///
    /// The most recently created pending allocation receives the payment
    /// record (`receipt`, `amount_paid`) for the whole party; the others keep
    /// their payment fields. All of them become permanent and their beds move
    /// from held to allocated.
    ///
    /// # Errors
    ///
    /// - `Validation`: blank `pnr` / `receipt` or negative amount
    /// - `NoSoftAllocations`: nothing pending for the PNR (no side effects)
    #[tracing::instrument(skip(self, input), fields(pnr = %input.pnr))]
    pub async fn confirm_soft_allocation(
        &self,
        input: ConfirmSoftAllocation,
    ) -> Result<ConfirmationOutcome> {
        input.validate()?;
        let now = self.clock.now();

        let mut tx = self.begin().await?;
        let mut pending = tx.pending_soft_allocations(input.pnr.clone()).await?;

        // Step 2: the most recently created allocation carries the payment
        let Some(latest) = pending.last_mut() else {
            tracing::warn!("No soft allocations to confirm");
            return Err(AccommodationError::NoSoftAllocations { pnr: input.pnr });
        };
        latest.receipt = Some(input.receipt);
        latest.amount_paid = Some(input.amount_paid);
        latest.updated_at = now;
        tx.update_allocation(latest.clone()).await?;

        // Step 3: flip the reservation flag in one statement
        let ids = pending.iter().map(|allocation| allocation.id).collect();
        tx.confirm_allocations(ids, now).await?;

        // Step 4: finalize the beds
        let beds = tx
            .lock_beds(pending.iter().map(|allocation| allocation.bed_id).collect())
            .await?;
        for mut bed in beds {
            bed.finalize(now);
            tx.update_bed(bed).await?;
        }
        tx.commit().await?;

        let outcome = ConfirmationOutcome {
            confirmed: pending.len(),
        };
        ::metrics::counter!(CONFIRMATIONS_TOTAL).increment(outcome.confirmed as u64);
        tracing::info!(confirmed = outcome.confirmed, "Soft allocations confirmed");
        Ok(outcome)
    }
}
