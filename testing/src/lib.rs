//! # Accommodation Testing
//!
//! Testing utilities for the accommodation service.
//!
//! This crate provides:
//! - [`InMemoryRecordStore`]: a transactional in-memory `RecordStore`
//! - [`StaticIdentityVerifier`]: an `IdentityVerifier` with a fixed answer
//! - [`FixedClock`] / [`test_clock`]: deterministic time
//! - [`fixtures`]: payload builders and a seeded [`TestHarness`](fixtures::TestHarness)
//! - [`properties`]: proptest strategies and occupancy invariants
//!
//! ## Example
//!
//! ```
//! use accommodation_testing::fixtures::{TestHarness, confirmation, soft_request};
//!
//! # async fn example() -> accommodation_core::Result<()> {
//! let harness = TestHarness::with_beds(1).await?;
//! let bed_id = harness.beds[0].id;
//!
//! harness.service.soft_allocate(vec![soft_request(bed_id, "P1", "R1")]).await?;
//! harness.service.confirm_soft_allocation(confirmation("P1", "RCPT1", 100.0)).await?;
//!
//! let bed = harness.bed(bed_id).await;
//! assert!(bed.is_some_and(|bed| bed.allocated && !bed.blocked));
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod identity;
pub mod properties;
pub mod store;

/// Mock implementations of environment traits.
pub mod mocks {
    use accommodation_core::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use accommodation_testing::mocks::FixedClock;
    /// use accommodation_core::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use identity::StaticIdentityVerifier;
pub use mocks::{FixedClock, test_clock};
pub use store::InMemoryRecordStore;

#[cfg(test)]
mod tests {
    use super::*;
    use accommodation_core::Clock;

    #[test]
    fn test_clock_is_new_year_2025() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
