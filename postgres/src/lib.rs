//! `PostgreSQL` record store for the accommodation service.
//!
//! Implements [`RecordStore`](accommodation_core::RecordStore) over a `sqlx`
//! connection pool:
//!
//! - One database transaction per [`StoreTransaction`](accommodation_core::StoreTransaction)
//! - Row locks (`SELECT ... FOR UPDATE`) for bed and allocation reads that
//!   precede a write
//! - A partial unique index so a bed has at most one active allocation
//! - Embedded migrations (`migrations/`)
//!
//! # Example
//!
//! ```no_run
//! use accommodation_core::{AccommodationService, SystemClock};
//! use accommodation_postgres::{PoolSettings, PostgresRecordStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresRecordStore::connect("postgres://localhost/accommodation", &PoolSettings::default()).await?;
//! store.migrate().await?;
//! let service = AccommodationService::new(Arc::new(store), Arc::new(SystemClock));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod error;
mod rows;
mod store;

pub use store::{PoolSettings, PostgresRecordStore};
