//! In-memory record store for fast, deterministic testing.
//!
//! Transactions are fully serialised: [`begin`](RecordStore::begin) takes an
//! owned lock on the tables and works on a copy, [`commit`] writes the copy
//! back and dropping the transaction discards it. The constraints the
//! Postgres schema enforces are checked on every write:
//!
//! - unique dorm name, unique room name per dorm, unique bed number per room
//! - parent rows must exist
//! - at most one active allocation per bed
//!
//! [`commit`]: StoreTransaction::commit

use accommodation_core::input::{ActiveFilter, AllocationFilter, Page, Paginated};
use accommodation_core::store::{RecordStore, StoreError, StoreFuture, StoreTransaction};
use accommodation_core::{
    Allocation, AllocationId, Bed, BedId, DateTime, Dorm, DormId, Room, RoomId, Utc,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table contents. Rows are kept in insertion order.
#[derive(Debug, Clone, Default)]
struct Tables {
    dorms: Vec<Dorm>,
    rooms: Vec<Room>,
    beds: Vec<Bed>,
    allocations: Vec<Allocation>,
}

impl Tables {
    fn check_dorm(&self, dorm: &Dorm) -> Result<(), StoreError> {
        if self
            .dorms
            .iter()
            .any(|other| other.id != dorm.id && other.name == dorm.name)
        {
            return Err(StoreError::UniqueViolation("dorm_name_key".into()));
        }
        Ok(())
    }

    fn check_room(&self, room: &Room) -> Result<(), StoreError> {
        if !self.dorms.iter().any(|dorm| dorm.id == room.dorm_id) {
            return Err(StoreError::NotFound(format!("dorm {}", room.dorm_id)));
        }
        if self.rooms.iter().any(|other| {
            other.id != room.id && other.dorm_id == room.dorm_id && other.name == room.name
        }) {
            return Err(StoreError::UniqueViolation("room_dorm_id_name_key".into()));
        }
        Ok(())
    }

    fn check_bed(&self, bed: &Bed) -> Result<(), StoreError> {
        if !self.rooms.iter().any(|room| room.id == bed.room_id) {
            return Err(StoreError::NotFound(format!("room {}", bed.room_id)));
        }
        if bed.number.is_some()
            && self.beds.iter().any(|other| {
                other.id != bed.id && other.room_id == bed.room_id && other.number == bed.number
            })
        {
            return Err(StoreError::UniqueViolation("bed_room_id_number_key".into()));
        }
        Ok(())
    }

    fn check_allocation(&self, allocation: &Allocation) -> Result<(), StoreError> {
        if !self.beds.iter().any(|bed| bed.id == allocation.bed_id) {
            return Err(StoreError::NotFound(format!("bed {}", allocation.bed_id)));
        }
        if allocation.active
            && self.allocations.iter().any(|other| {
                other.id != allocation.id && other.active && other.bed_id == allocation.bed_id
            })
        {
            return Err(StoreError::UniqueViolation(
                "allocation_one_active_per_bed".into(),
            ));
        }
        Ok(())
    }
}

fn replace<T>(
    rows: &mut [T],
    is_target: impl Fn(&T) -> bool,
    row: T,
    what: &str,
) -> Result<(), StoreError> {
    let slot = rows
        .iter_mut()
        .find(|existing| is_target(existing))
        .ok_or_else(|| StoreError::NotFound(what.to_string()))?;
    *slot = row;
    Ok(())
}

/// Newest first; among equal timestamps, the later inserted row first.
fn paginate<T: Clone>(
    rows: impl DoubleEndedIterator<Item = T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
    page: Page,
) -> Paginated<T> {
    let mut rows: Vec<T> = rows.rev().collect();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    Paginated {
        count: rows.len() as u64,
        results: rows.into_iter().skip(offset).take(limit).collect(),
    }
}

/// In-memory [`RecordStore`].
///
/// # Example
///
/// ```
/// use accommodation_testing::InMemoryRecordStore;
/// use accommodation_core::RecordStore;
///
/// # async fn example() -> Result<(), accommodation_core::StoreError> {
/// let store = InMemoryRecordStore::new();
/// let tx = store.begin().await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while set, `begin` and `ping` fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Overwrite (or insert) a bed directly, bypassing the service.
    ///
    /// Useful to put a bed into a state the workflow would not produce.
    pub async fn put_bed(&self, bed: Bed) {
        let mut tables = self.tables.lock().await;
        match tables.beds.iter_mut().find(|existing| existing.id == bed.id) {
            Some(slot) => *slot = bed,
            None => tables.beds.push(bed),
        }
    }

    /// Committed state of a bed.
    pub async fn bed(&self, id: BedId) -> Option<Bed> {
        self.tables
            .lock()
            .await
            .beds
            .iter()
            .find(|bed| bed.id == id)
            .cloned()
    }

    /// All committed beds, in insertion order.
    pub async fn beds(&self) -> Vec<Bed> {
        self.tables.lock().await.beds.clone()
    }

    /// All committed allocations, in insertion order.
    pub async fn allocations(&self) -> Vec<Allocation> {
        self.tables.lock().await.allocations.clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store unavailable".into()));
        }
        Ok(())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>> {
        Box::pin(async move {
            self.check_available()?;
            let guard = Arc::clone(&self.tables).lock_owned().await;
            let working = (*guard).clone();
            Ok(Box::new(InMemoryTransaction { guard, working }) as Box<dyn StoreTransaction>)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.check_available() })
    }
}

/// A serialised transaction over a working copy of the tables.
struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl StoreTransaction for InMemoryTransaction {
    fn insert_dorm(&mut self, dorm: Dorm) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.working.check_dorm(&dorm)?;
            self.working.dorms.push(dorm);
            Ok(())
        })
    }

    fn update_dorm(&mut self, dorm: Dorm) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.working.check_dorm(&dorm)?;
            let id = dorm.id;
            replace(&mut self.working.dorms, |row| row.id == id, dorm, "dorm")
        })
    }

    fn dorm(&mut self, id: DormId) -> StoreFuture<'_, Option<Dorm>> {
        Box::pin(async move { Ok(self.working.dorms.iter().find(|dorm| dorm.id == id).cloned()) })
    }

    fn dorm_by_name(&mut self, name: String) -> StoreFuture<'_, Option<Dorm>> {
        Box::pin(async move {
            Ok(self
                .working
                .dorms
                .iter()
                .find(|dorm| dorm.name == name)
                .cloned())
        })
    }

    fn list_dorms(
        &mut self,
        filter: ActiveFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Dorm>> {
        Box::pin(async move {
            let rows = self
                .working
                .dorms
                .iter()
                .filter(|dorm| filter.matches(dorm.active))
                .cloned()
                .collect::<Vec<_>>();
            Ok(paginate(rows.into_iter(), |dorm| dorm.created_at, page))
        })
    }

    fn insert_room(&mut self, room: Room) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.working.check_room(&room)?;
            self.working.rooms.push(room);
            Ok(())
        })
    }

    fn update_room(&mut self, room: Room) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.working.check_room(&room)?;
            let id = room.id;
            replace(&mut self.working.rooms, |row| row.id == id, room, "room")
        })
    }

    fn room(&mut self, id: RoomId) -> StoreFuture<'_, Option<Room>> {
        Box::pin(async move { Ok(self.working.rooms.iter().find(|room| room.id == id).cloned()) })
    }

    fn room_by_name(&mut self, dorm_id: DormId, name: String) -> StoreFuture<'_, Option<Room>> {
        Box::pin(async move {
            Ok(self
                .working
                .rooms
                .iter()
                .find(|room| room.dorm_id == dorm_id && room.name == name)
                .cloned())
        })
    }

    fn list_rooms(
        &mut self,
        dorm_id: DormId,
        filter: ActiveFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Room>> {
        Box::pin(async move {
            let rows = self
                .working
                .rooms
                .iter()
                .filter(|room| room.dorm_id == dorm_id && filter.matches(room.active))
                .cloned()
                .collect::<Vec<_>>();
            Ok(paginate(rows.into_iter(), |room| room.created_at, page))
        })
    }

    fn insert_bed(&mut self, bed: Bed) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.working.check_bed(&bed)?;
            self.working.beds.push(bed);
            Ok(())
        })
    }

    fn update_bed(&mut self, bed: Bed) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.working.check_bed(&bed)?;
            let id = bed.id;
            replace(&mut self.working.beds, |row| row.id == id, bed, "bed")
        })
    }

    fn bed(&mut self, id: BedId) -> StoreFuture<'_, Option<Bed>> {
        Box::pin(async move { Ok(self.working.beds.iter().find(|bed| bed.id == id).cloned()) })
    }

    fn lock_beds(&mut self, mut ids: Vec<BedId>) -> StoreFuture<'_, Vec<Bed>> {
        Box::pin(async move {
            ids.sort_unstable();
            ids.dedup();
            Ok(ids
                .into_iter()
                .filter_map(|id| self.working.beds.iter().find(|bed| bed.id == id).cloned())
                .collect())
        })
    }

    fn bed_by_number(&mut self, room_id: RoomId, number: i32) -> StoreFuture<'_, Option<Bed>> {
        Box::pin(async move {
            Ok(self
                .working
                .beds
                .iter()
                .find(|bed| bed.room_id == room_id && bed.number == Some(number))
                .cloned())
        })
    }

    fn list_beds(
        &mut self,
        room_id: RoomId,
        filter: ActiveFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Bed>> {
        Box::pin(async move {
            let rows = self
                .working
                .beds
                .iter()
                .filter(|bed| bed.room_id == room_id && filter.matches(bed.active))
                .cloned()
                .collect::<Vec<_>>();
            Ok(paginate(rows.into_iter(), |bed| bed.created_at, page))
        })
    }

    fn insert_allocations(&mut self, allocations: Vec<Allocation>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            for allocation in allocations {
                self.working.check_allocation(&allocation)?;
                self.working.allocations.push(allocation);
            }
            Ok(())
        })
    }

    fn update_allocation(&mut self, allocation: Allocation) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.working.check_allocation(&allocation)?;
            let id = allocation.id;
            replace(
                &mut self.working.allocations,
                |row| row.id == id,
                allocation,
                "allocation",
            )
        })
    }

    fn allocation(&mut self, id: AllocationId) -> StoreFuture<'_, Option<Allocation>> {
        Box::pin(async move {
            Ok(self
                .working
                .allocations
                .iter()
                .find(|allocation| allocation.id == id)
                .cloned())
        })
    }

    fn lock_allocation(&mut self, id: AllocationId) -> StoreFuture<'_, Option<Allocation>> {
        self.allocation(id)
    }

    fn active_allocations_for_party(
        &mut self,
        pnr: String,
        reg: String,
    ) -> StoreFuture<'_, Vec<Allocation>> {
        Box::pin(async move {
            Ok(self
                .working
                .allocations
                .iter()
                .filter(|allocation| {
                    allocation.active
                        && allocation.pnr.as_deref() == Some(pnr.as_str())
                        && allocation.reg.as_deref() == Some(reg.as_str())
                })
                .cloned()
                .collect())
        })
    }

    fn pending_soft_allocations(&mut self, pnr: String) -> StoreFuture<'_, Vec<Allocation>> {
        Box::pin(async move {
            let mut pending: Vec<Allocation> = self
                .working
                .allocations
                .iter()
                .filter(|allocation| {
                    allocation.active
                        && allocation.is_soft_allocation
                        && allocation.pnr.as_deref() == Some(pnr.as_str())
                })
                .cloned()
                .collect();
            pending.sort_by_key(|allocation| allocation.created_at);
            Ok(pending)
        })
    }

    fn confirm_allocations(
        &mut self,
        ids: Vec<AllocationId>,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let mut changed = 0;
            for allocation in &mut self.working.allocations {
                if ids.contains(&allocation.id) {
                    allocation.is_soft_allocation = false;
                    allocation.updated_at = at;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    fn list_allocations(
        &mut self,
        filter: AllocationFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Allocation>> {
        Box::pin(async move {
            let rows = self
                .working
                .allocations
                .iter()
                .filter(|allocation| filter.matches(allocation))
                .cloned()
                .collect::<Vec<_>>();
            Ok(paginate(
                rows.into_iter(),
                |allocation| allocation.created_at,
                page,
            ))
        })
    }

    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move {
            let Self { mut guard, working } = *self;
            *guard = working;
            Ok(())
        })
    }

    fn rollback(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move {
            drop(self);
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::test_clock;
    use accommodation_core::Clock;

    fn dorm(name: &str) -> Dorm {
        fixtures::dorm_input(name).into_dorm(test_clock().now()).unwrap()
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryRecordStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_dorm(dorm("North")).await.unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        assert!(tx.dorm_by_name("North".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = InMemoryRecordStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_dorm(dorm("North")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.dorm_by_name("North".into()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_dorm_name_violates_uniqueness() {
        let store = InMemoryRecordStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_dorm(dorm("North")).await.unwrap();
        let err = tx.insert_dorm(dorm("North")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn room_requires_its_dorm() {
        let store = InMemoryRecordStore::new();
        let room = fixtures::room_input("A1")
            .into_room(DormId::new(), test_clock().now())
            .unwrap();
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.insert_room(room).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn unavailable_store_fails_ping() {
        let store = InMemoryRecordStore::new();
        store.set_unavailable(true);
        assert!(tokio_test::block_on(store.ping()).is_err());
        store.set_unavailable(false);
        assert!(tokio_test::block_on(store.ping()).is_ok());
    }

    #[test]
    fn pagination_orders_newest_first() {
        let base = test_clock().now();
        let rows = vec![
            (1, base),
            (2, base + chrono::Duration::seconds(1)),
            (3, base + chrono::Duration::seconds(2)),
        ];
        let page = Page::new(accommodation_core::input::PageRequest {
            page: Some(1),
            page_size: Some(2),
        })
        .unwrap();
        let result = paginate(rows.into_iter(), |row| row.1, page);
        assert_eq!(result.count, 3);
        assert_eq!(
            result.results.iter().map(|row| row.0).collect::<Vec<_>>(),
            vec![3, 2]
        );
    }
}
