//! # Accommodation Core
//!
//! Domain types, storage abstractions and the allocation workflow for the
//! accommodation service.
//!
//! Sleeping accommodation is modelled as a four-level hierarchy:
//!
//! ```text
//! Dorm ─┬─ Room ─┬─ Bed ─┬─ Allocation (current, active)
//!       │        │       └─ Allocation (history, inactive)
//!       │        └─ Bed
//!       └─ Room
//! ```
//!
//! A [`Bed`](types::Bed) owns the *current occupancy state* (`blocked` /
//! `allocated`), an [`Allocation`](types::Allocation) owns the *booking record*.
//! The two are kept consistent by [`AccommodationService`], which runs every
//! state-changing operation inside a single [`StoreTransaction`].
//!
//! ## Soft allocation workflow
//!
//! ```text
//!                 soft_allocate              confirm_soft_allocation
//!  available ──────────────────▶ blocked ─────────────────────────▶ allocated
//!      ▲                            │
//!      └────────────────────────────┘
//!        party re-requests other beds
//! ```
//!
//! ## Crate layout
//!
//! - [`types`]: identifiers, enums and entities
//! - [`input`]: client-supplied payloads with explicit field whitelists
//! - [`store`]: the transactional record store abstraction
//! - [`identity`]: caller verification against an external identity service
//! - [`environment`]: injected clock
//! - [`service`]: CRUD operations and the soft-allocation workflow
//! - [`error`]: domain errors
//! - [`metrics`]: metric names and descriptions

pub mod environment;
pub mod error;
pub mod identity;
pub mod input;
pub mod metrics;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use environment::{Clock, SystemClock};
pub use error::{AccommodationError, Entity, Result};
pub use identity::{CallerCredentials, IdentityError, IdentityVerifier};
pub use service::{
    AccommodationService, ConfirmationOutcome, ReleasePolicy, SoftAllocationOutcome,
};
pub use store::{RecordStore, StoreError, StoreTransaction};
pub use types::{
    Allocation, AllocationId, AmountFor, Bed, BedId, BedLevel, BedType, Dorm, DormId, Floor,
    ParticipantType, Room, RoomId,
};
