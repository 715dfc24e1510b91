//! The accommodation service.
//!
//! [`AccommodationService`] is the only component that mutates records. It
//! owns no state besides its collaborators: a [`RecordStore`], a [`Clock`] and
//! the configured [`ReleasePolicy`]. Each public operation runs in its own
//! store transaction.
//!
//! - `inventory`: dorm / room / bed operations
//! - `allocations`: single allocation operations (get, list, create, update)
//! - `workflow`: soft allocation and confirmation

mod allocations;
mod inventory;
mod workflow;

use crate::environment::Clock;
use crate::store::{RecordStore, StoreTransaction};
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How soft-allocate handles releasing a party's previous holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleasePolicy {
    /// Releases and new holds share one transaction. A rejected batch leaves
    /// the party's previous holds untouched.
    #[default]
    Atomic,
    /// Releases are committed before the batch is validated. A rejected batch
    /// still releases the party's previous holds.
    CommitFirst,
}

impl ReleasePolicy {
    /// Configuration representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Atomic => "atomic",
            Self::CommitFirst => "commit-first",
        }
    }
}

impl fmt::Display for ReleasePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleasePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(Self::Atomic),
            "commit-first" | "commit_first" => Ok(Self::CommitFirst),
            other => Err(format!(
                "unknown release policy '{other}' (expected 'atomic' or 'commit-first')"
            )),
        }
    }
}

/// Result of a successful soft-allocate batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoftAllocationOutcome {
    /// Soft allocations created
    pub allocated: usize,
    /// Previous party allocations released
    pub released: usize,
}

impl SoftAllocationOutcome {
    /// Human readable summary.
    #[must_use]
    pub fn message(&self) -> String {
        format!("{} beds soft allocated successfully", self.allocated)
    }
}

/// Result of a successful confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfirmationOutcome {
    /// Allocations confirmed
    pub confirmed: usize,
}

impl ConfirmationOutcome {
    /// Human readable summary.
    #[must_use]
    pub fn message(&self) -> String {
        format!("{} soft allocated beds confirmed successfully", self.confirmed)
    }
}

/// CRUD operations and the soft-allocation workflow.
#[derive(Clone)]
pub struct AccommodationService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    release_policy: ReleasePolicy,
}

impl AccommodationService {
    /// Create a service with the default (atomic) release policy.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            release_policy: ReleasePolicy::default(),
        }
    }

    /// Override the release policy.
    #[must_use]
    pub const fn with_release_policy(mut self, release_policy: ReleasePolicy) -> Self {
        self.release_policy = release_policy;
        self
    }

    /// The configured release policy.
    #[must_use]
    pub const fn release_policy(&self) -> ReleasePolicy {
        self.release_policy
    }

    /// Check that the record store is reachable.
    ///
    /// # Errors
    ///
    /// Returns the store error if the ping fails.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(self.store.begin().await?)
    }
}

impl fmt::Debug for AccommodationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccommodationService")
            .field("release_policy", &self.release_policy)
            .finish_non_exhaustive()
    }
}
