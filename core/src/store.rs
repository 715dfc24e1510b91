//! Transactional record store abstraction.
//!
//! The service never talks to a database directly. Every operation opens a
//! [`StoreTransaction`] through a [`RecordStore`], performs its reads and
//! writes on it, and commits. A transaction that is dropped without
//! [`commit`](StoreTransaction::commit) is rolled back.
//!
//! # Locking
//!
//! The `lock_*` methods read rows *for update*: no other transaction may
//! modify (or lock) the returned rows until this transaction ends. Callers
//! that lock several beds must pass all of them in one
//! [`lock_beds`](StoreTransaction::lock_beds) call; implementations acquire the
//! locks in ascending id order so concurrent batches cannot deadlock.
//!
//! # Implementations
//!
//! - `PostgresRecordStore` (in `accommodation-postgres`): production implementation
//! - `InMemoryRecordStore` (in `accommodation-testing`): fast, deterministic testing

use crate::input::{ActiveFilter, AllocationFilter, Page, Paginated};
use crate::types::{Allocation, AllocationId, Bed, BedId, Dorm, DormId, Room, RoomId};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A row expected to exist was missing (e.g. a dangling foreign key).
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The transaction lost a lock or serialization race and should be retried.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// Connection or query failure.
    #[error("Database error: {0}")]
    Database(String),
}

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Entry point to the record store.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so the store can be shared as
/// `Arc<dyn RecordStore>`.
pub trait RecordStore: Send + Sync {
    /// Open a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if no connection is available.
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>>;

    /// Check connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the store is unreachable.
    fn ping(&self) -> StoreFuture<'_, ()>;
}

/// One unit of work against the record store.
///
/// Listing methods return rows ordered by `created_at` descending.
pub trait StoreTransaction: Send {
    // ---- dorms ----

    /// Insert a dorm.
    fn insert_dorm(&mut self, dorm: Dorm) -> StoreFuture<'_, ()>;
    /// Overwrite a dorm.
    fn update_dorm(&mut self, dorm: Dorm) -> StoreFuture<'_, ()>;
    /// Fetch a dorm by id.
    fn dorm(&mut self, id: DormId) -> StoreFuture<'_, Option<Dorm>>;
    /// Fetch a dorm by its unique name.
    fn dorm_by_name(&mut self, name: String) -> StoreFuture<'_, Option<Dorm>>;
    /// List dorms.
    fn list_dorms(&mut self, filter: ActiveFilter, page: Page)
    -> StoreFuture<'_, Paginated<Dorm>>;

    // ---- rooms ----

    /// Insert a room.
    fn insert_room(&mut self, room: Room) -> StoreFuture<'_, ()>;
    /// Overwrite a room.
    fn update_room(&mut self, room: Room) -> StoreFuture<'_, ()>;
    /// Fetch a room by id.
    fn room(&mut self, id: RoomId) -> StoreFuture<'_, Option<Room>>;
    /// Fetch a room by name within a dorm.
    fn room_by_name(&mut self, dorm_id: DormId, name: String) -> StoreFuture<'_, Option<Room>>;
    /// List the rooms of a dorm.
    fn list_rooms(
        &mut self,
        dorm_id: DormId,
        filter: ActiveFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Room>>;

    // ---- beds ----

    /// Insert a bed.
    fn insert_bed(&mut self, bed: Bed) -> StoreFuture<'_, ()>;
    /// Overwrite a bed.
    fn update_bed(&mut self, bed: Bed) -> StoreFuture<'_, ()>;
    /// Fetch a bed by id without locking it.
    fn bed(&mut self, id: BedId) -> StoreFuture<'_, Option<Bed>>;
    /// Fetch and lock the given beds. Missing ids are absent from the result,
    /// which is ordered by id.
    fn lock_beds(&mut self, ids: Vec<BedId>) -> StoreFuture<'_, Vec<Bed>>;
    /// Fetch a bed by number within a room.
    fn bed_by_number(&mut self, room_id: RoomId, number: i32) -> StoreFuture<'_, Option<Bed>>;
    /// List the beds of a room.
    fn list_beds(
        &mut self,
        room_id: RoomId,
        filter: ActiveFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Bed>>;

    /// Fetch and lock a single bed.
    fn lock_bed(&mut self, id: BedId) -> StoreFuture<'_, Option<Bed>> {
        Box::pin(async move { Ok(self.lock_beds(vec![id]).await?.into_iter().next()) })
    }

    // ---- allocations ----

    /// Insert allocations in order (bulk insert).
    fn insert_allocations(&mut self, allocations: Vec<Allocation>) -> StoreFuture<'_, ()>;
    /// Overwrite an allocation.
    fn update_allocation(&mut self, allocation: Allocation) -> StoreFuture<'_, ()>;
    /// Fetch an allocation by id.
    fn allocation(&mut self, id: AllocationId) -> StoreFuture<'_, Option<Allocation>>;
    /// Fetch and lock an allocation by id.
    fn lock_allocation(&mut self, id: AllocationId) -> StoreFuture<'_, Option<Allocation>>;
    /// Lock the active allocations of a `(pnr, reg)` party.
    fn active_allocations_for_party(
        &mut self,
        pnr: String,
        reg: String,
    ) -> StoreFuture<'_, Vec<Allocation>>;
    /// Lock the active soft allocations for `pnr`, oldest first (creation time,
    /// then insertion order).
    fn pending_soft_allocations(&mut self, pnr: String) -> StoreFuture<'_, Vec<Allocation>>;
    /// Set `is_soft_allocation = false` on every listed allocation in one
    /// statement. Returns the number of rows changed.
    fn confirm_allocations(
        &mut self,
        ids: Vec<AllocationId>,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, u64>;
    /// List allocations.
    fn list_allocations(
        &mut self,
        filter: AllocationFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Allocation>>;

    // ---- lifecycle ----

    /// Make every write of this transaction durable.
    fn commit(self: Box<Self>) -> StoreFuture<'static, ()>;
    /// Discard every write of this transaction.
    fn rollback(self: Box<Self>) -> StoreFuture<'static, ()>;
}
