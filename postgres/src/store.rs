//! `PostgresRecordStore` and its transaction type.

use crate::error::store_error;
use crate::rows::{self, allocation_columns, bed_columns, dorm_columns, room_columns};
use accommodation_core::input::{ActiveFilter, AllocationFilter, Page, Paginated};
use accommodation_core::store::{RecordStore, StoreError, StoreFuture, StoreTransaction};
use accommodation_core::{
    Allocation, AllocationId, Bed, BedId, DateTime, Dorm, DormId, Room, RoomId, Utc,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};
use std::time::Duration;
use uuid::Uuid;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum pool size
    pub max_connections: u32,
    /// Minimum idle connections
    pub min_connections: u32,
    /// Time allowed to acquire a connection
    pub connect_timeout: Duration,
    /// Idle time before a connection is closed
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn uuids<T>(ids: &[T], as_uuid: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    ids.iter().map(as_uuid).collect()
}

/// `PostgreSQL` implementation of [`RecordStore`].
///
/// # Example
///
/// ```no_run
/// use accommodation_postgres::PostgresRecordStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresRecordStore::connect("postgres://localhost/accommodation", &Default::default()).await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.connect_timeout)
            .idle_timeout(settings.idle_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;

        tracing::info!(
            max_connections = settings.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RecordStore for PostgresRecordStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>> {
        Box::pin(async move {
            let tx = self.pool.begin().await.map_err(store_error)?;
            Ok(Box::new(PostgresTransaction { tx }) as Box<dyn StoreTransaction>)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(())
        })
    }
}

/// A database transaction. Dropping it without commit rolls back.
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl StoreTransaction for PostgresTransaction {
    // ---- dorms ----

    fn insert_dorm(&mut self, dorm: Dorm) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO dorm (id, name, description, amount, amount_for, active, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(dorm.id.as_uuid())
            .bind(&dorm.name)
            .bind(&dorm.description)
            .bind(dorm.amount)
            .bind(dorm.amount_for.as_str())
            .bind(dorm.active)
            .bind(dorm.created_at)
            .bind(dorm.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
            Ok(())
        })
    }

    fn update_dorm(&mut self, dorm: Dorm) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE dorm
                SET name = $2, description = $3, amount = $4, amount_for = $5,
                    active = $6, updated_at = $7
                WHERE id = $1
                ",
            )
            .bind(dorm.id.as_uuid())
            .bind(&dorm.name)
            .bind(&dorm.description)
            .bind(dorm.amount)
            .bind(dorm.amount_for.as_str())
            .bind(dorm.active)
            .bind(dorm.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("dorm {}", dorm.id)));
            }
            Ok(())
        })
    }

    fn dorm(&mut self, id: DormId) -> StoreFuture<'_, Option<Dorm>> {
        Box::pin(async move {
            sqlx::query(concat!("SELECT ", dorm_columns!(), " FROM dorm WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(store_error)?
                .as_ref()
                .map(rows::dorm)
                .transpose()
        })
    }

    fn dorm_by_name(&mut self, name: String) -> StoreFuture<'_, Option<Dorm>> {
        Box::pin(async move {
            sqlx::query(concat!("SELECT ", dorm_columns!(), " FROM dorm WHERE name = $1"))
                .bind(name)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(store_error)?
                .as_ref()
                .map(rows::dorm)
                .transpose()
        })
    }

    fn list_dorms(
        &mut self,
        filter: ActiveFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Dorm>> {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM dorm WHERE ($1::BOOLEAN IS NULL OR active = $1)",
            )
            .bind(filter.active)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(store_error)?;

            let results = sqlx::query(concat!(
                "SELECT ",
                dorm_columns!(),
                " FROM dorm WHERE ($1::BOOLEAN IS NULL OR active = $1)",
                " ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
            ))
            .bind(filter.active)
            .bind(to_i64(page.limit()))
            .bind(to_i64(page.offset()))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(store_error)?
            .iter()
            .map(rows::dorm)
            .collect::<Result<_, _>>()?;

            Ok(Paginated {
                count: to_u64(count),
                results,
            })
        })
    }

    // ---- rooms ----

    fn insert_room(&mut self, room: Room) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO room (
                    id, dorm_id, name, room_identifier, ac_available, floor,
                    close_to_dorm_entrance, close_to_bath, percent_released, bed_type,
                    is_multibatch, participant_type, reset_allowed, active, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                ",
            )
            .bind(room.id.as_uuid())
            .bind(room.dorm_id.as_uuid())
            .bind(&room.name)
            .bind(room.room_identifier)
            .bind(room.ac_available)
            .bind(room.floor.as_str())
            .bind(room.close_to_dorm_entrance)
            .bind(room.close_to_bath)
            .bind(room.percent_released)
            .bind(room.bed_type.as_str())
            .bind(room.is_multibatch)
            .bind(room.participant_type.as_str())
            .bind(room.reset_allowed)
            .bind(room.active)
            .bind(room.created_at)
            .bind(room.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
            Ok(())
        })
    }

    fn update_room(&mut self, room: Room) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE room
                SET name = $2, room_identifier = $3, ac_available = $4, floor = $5,
                    close_to_dorm_entrance = $6, close_to_bath = $7, percent_released = $8,
                    bed_type = $9, is_multibatch = $10, participant_type = $11,
                    reset_allowed = $12, active = $13, updated_at = $14
                WHERE id = $1
                ",
            )
            .bind(room.id.as_uuid())
            .bind(&room.name)
            .bind(room.room_identifier)
            .bind(room.ac_available)
            .bind(room.floor.as_str())
            .bind(room.close_to_dorm_entrance)
            .bind(room.close_to_bath)
            .bind(room.percent_released)
            .bind(room.bed_type.as_str())
            .bind(room.is_multibatch)
            .bind(room.participant_type.as_str())
            .bind(room.reset_allowed)
            .bind(room.active)
            .bind(room.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("room {}", room.id)));
            }
            Ok(())
        })
    }

    fn room(&mut self, id: RoomId) -> StoreFuture<'_, Option<Room>> {
        Box::pin(async move {
            sqlx::query(concat!("SELECT ", room_columns!(), " FROM room WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(store_error)?
                .as_ref()
                .map(rows::room)
                .transpose()
        })
    }

    fn room_by_name(&mut self, dorm_id: DormId, name: String) -> StoreFuture<'_, Option<Room>> {
        Box::pin(async move {
            sqlx::query(concat!(
                "SELECT ",
                room_columns!(),
                " FROM room WHERE dorm_id = $1 AND name = $2"
            ))
            .bind(dorm_id.as_uuid())
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_error)?
            .as_ref()
            .map(rows::room)
            .transpose()
        })
    }

    fn list_rooms(
        &mut self,
        dorm_id: DormId,
        filter: ActiveFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Room>> {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM room \
                 WHERE dorm_id = $1 AND ($2::BOOLEAN IS NULL OR active = $2)",
            )
            .bind(dorm_id.as_uuid())
            .bind(filter.active)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(store_error)?;

            let results = sqlx::query(concat!(
                "SELECT ",
                room_columns!(),
                " FROM room WHERE dorm_id = $1 AND ($2::BOOLEAN IS NULL OR active = $2)",
                " ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
            ))
            .bind(dorm_id.as_uuid())
            .bind(filter.active)
            .bind(to_i64(page.limit()))
            .bind(to_i64(page.offset()))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(store_error)?
            .iter()
            .map(rows::room)
            .collect::<Result<_, _>>()?;

            Ok(Paginated {
                count: to_u64(count),
                results,
            })
        })
    }

    // ---- beds ----

    fn insert_bed(&mut self, bed: Bed) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO bed (
                    id, room_id, number, level, close_to_dorm_entrance, close_to_bath,
                    blocked, allocated, active, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ",
            )
            .bind(bed.id.as_uuid())
            .bind(bed.room_id.as_uuid())
            .bind(bed.number)
            .bind(bed.level.as_str())
            .bind(bed.close_to_dorm_entrance)
            .bind(bed.close_to_bath)
            .bind(bed.blocked)
            .bind(bed.allocated)
            .bind(bed.active)
            .bind(bed.created_at)
            .bind(bed.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
            Ok(())
        })
    }

    fn update_bed(&mut self, bed: Bed) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE bed
                SET number = $2, level = $3, close_to_dorm_entrance = $4, close_to_bath = $5,
                    blocked = $6, allocated = $7, active = $8, updated_at = $9
                WHERE id = $1
                ",
            )
            .bind(bed.id.as_uuid())
            .bind(bed.number)
            .bind(bed.level.as_str())
            .bind(bed.close_to_dorm_entrance)
            .bind(bed.close_to_bath)
            .bind(bed.blocked)
            .bind(bed.allocated)
            .bind(bed.active)
            .bind(bed.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("bed {}", bed.id)));
            }
            Ok(())
        })
    }

    fn bed(&mut self, id: BedId) -> StoreFuture<'_, Option<Bed>> {
        Box::pin(async move {
            sqlx::query(concat!("SELECT ", bed_columns!(), " FROM bed WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(store_error)?
                .as_ref()
                .map(rows::bed)
                .transpose()
        })
    }

    fn lock_beds(&mut self, ids: Vec<BedId>) -> StoreFuture<'_, Vec<Bed>> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            // Ascending id order keeps concurrent lockers from deadlocking
            sqlx::query(concat!(
                "SELECT ",
                bed_columns!(),
                " FROM bed WHERE id = ANY($1) ORDER BY id FOR UPDATE"
            ))
            .bind(uuids(&ids, |id| *id.as_uuid()))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(store_error)?
            .iter()
            .map(rows::bed)
            .collect()
        })
    }

    fn bed_by_number(&mut self, room_id: RoomId, number: i32) -> StoreFuture<'_, Option<Bed>> {
        Box::pin(async move {
            sqlx::query(concat!(
                "SELECT ",
                bed_columns!(),
                " FROM bed WHERE room_id = $1 AND number = $2"
            ))
            .bind(room_id.as_uuid())
            .bind(number)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_error)?
            .as_ref()
            .map(rows::bed)
            .transpose()
        })
    }

    fn list_beds(
        &mut self,
        room_id: RoomId,
        filter: ActiveFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Bed>> {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM bed \
                 WHERE room_id = $1 AND ($2::BOOLEAN IS NULL OR active = $2)",
            )
            .bind(room_id.as_uuid())
            .bind(filter.active)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(store_error)?;

            let results = sqlx::query(concat!(
                "SELECT ",
                bed_columns!(),
                " FROM bed WHERE room_id = $1 AND ($2::BOOLEAN IS NULL OR active = $2)",
                " ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
            ))
            .bind(room_id.as_uuid())
            .bind(filter.active)
            .bind(to_i64(page.limit()))
            .bind(to_i64(page.offset()))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(store_error)?
            .iter()
            .map(rows::bed)
            .collect::<Result<_, _>>()?;

            Ok(Paginated {
                count: to_u64(count),
                results,
            })
        })
    }

    // ---- allocations ----

    fn insert_allocations(&mut self, allocations: Vec<Allocation>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if allocations.is_empty() {
                return Ok(());
            }

            let mut builder = QueryBuilder::<Postgres>::new(concat!(
                "INSERT INTO allocation (",
                allocation_columns!(),
                ") "
            ));
            builder.push_values(&allocations, |mut row, allocation| {
                row.push_bind(*allocation.id.as_uuid())
                    .push_bind(*allocation.bed_id.as_uuid())
                    .push_bind(allocation.pnr.clone())
                    .push_bind(allocation.reg.clone())
                    .push_bind(allocation.partner)
                    .push_bind(allocation.name.clone())
                    .push_bind(allocation.is_soft_allocation)
                    .push_bind(allocation.receipt.clone())
                    .push_bind(allocation.amount_paid)
                    .push_bind(allocation.checkin_date)
                    .push_bind(allocation.checkout_date)
                    .push_bind(allocation.active)
                    .push_bind(allocation.created_at)
                    .push_bind(allocation.updated_at);
            });

            builder
                .build()
                .execute(&mut *self.tx)
                .await
                .map_err(store_error)?;
            tracing::debug!(count = allocations.len(), "Inserted allocations");
            Ok(())
        })
    }

    fn update_allocation(&mut self, allocation: Allocation) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE allocation
                SET bed_id = $2, pnr = $3, reg = $4, partner = $5, name = $6,
                    is_soft_allocation = $7, receipt = $8, amount_paid = $9,
                    checkin_date = $10, checkout_date = $11, active = $12, updated_at = $13
                WHERE id = $1
                ",
            )
            .bind(allocation.id.as_uuid())
            .bind(allocation.bed_id.as_uuid())
            .bind(&allocation.pnr)
            .bind(&allocation.reg)
            .bind(allocation.partner)
            .bind(&allocation.name)
            .bind(allocation.is_soft_allocation)
            .bind(&allocation.receipt)
            .bind(allocation.amount_paid)
            .bind(allocation.checkin_date)
            .bind(allocation.checkout_date)
            .bind(allocation.active)
            .bind(allocation.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("allocation {}", allocation.id)));
            }
            Ok(())
        })
    }

    fn allocation(&mut self, id: AllocationId) -> StoreFuture<'_, Option<Allocation>> {
        Box::pin(async move {
            sqlx::query(concat!(
                "SELECT ",
                allocation_columns!(),
                " FROM allocation WHERE id = $1"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_error)?
            .as_ref()
            .map(rows::allocation)
            .transpose()
        })
    }

    fn lock_allocation(&mut self, id: AllocationId) -> StoreFuture<'_, Option<Allocation>> {
        Box::pin(async move {
            sqlx::query(concat!(
                "SELECT ",
                allocation_columns!(),
                " FROM allocation WHERE id = $1 FOR UPDATE"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_error)?
            .as_ref()
            .map(rows::allocation)
            .transpose()
        })
    }

    fn active_allocations_for_party(
        &mut self,
        pnr: String,
        reg: String,
    ) -> StoreFuture<'_, Vec<Allocation>> {
        Box::pin(async move {
            sqlx::query(concat!(
                "SELECT ",
                allocation_columns!(),
                " FROM allocation WHERE pnr = $1 AND reg = $2 AND active",
                " ORDER BY created_at, seq FOR UPDATE"
            ))
            .bind(pnr)
            .bind(reg)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(store_error)?
            .iter()
            .map(rows::allocation)
            .collect()
        })
    }

    fn pending_soft_allocations(&mut self, pnr: String) -> StoreFuture<'_, Vec<Allocation>> {
        Box::pin(async move {
            sqlx::query(concat!(
                "SELECT ",
                allocation_columns!(),
                " FROM allocation WHERE pnr = $1 AND is_soft_allocation AND active",
                " ORDER BY created_at, seq FOR UPDATE"
            ))
            .bind(pnr)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(store_error)?
            .iter()
            .map(rows::allocation)
            .collect()
        })
    }

    fn confirm_allocations(
        &mut self,
        ids: Vec<AllocationId>,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE allocation
                SET is_soft_allocation = FALSE, updated_at = $2
                WHERE id = ANY($1)
                ",
            )
            .bind(uuids(&ids, |id| *id.as_uuid()))
            .bind(at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
            Ok(result.rows_affected())
        })
    }

    fn list_allocations(
        &mut self,
        filter: AllocationFilter,
        page: Page,
    ) -> StoreFuture<'_, Paginated<Allocation>> {
        Box::pin(async move {
            let bed_id = filter.bed_id.map(|id| *id.as_uuid());
            let count: i64 = sqlx::query_scalar(
                r"
                SELECT COUNT(*) FROM allocation
                WHERE ($1::UUID IS NULL OR bed_id = $1)
                  AND ($2::TEXT IS NULL OR reg = $2)
                  AND ($3::INTEGER IS NULL OR partner = $3)
                ",
            )
            .bind(bed_id)
            .bind(filter.reg.clone())
            .bind(filter.partner)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(store_error)?;

            let results = sqlx::query(concat!(
                "SELECT ",
                allocation_columns!(),
                " FROM allocation",
                " WHERE ($1::UUID IS NULL OR bed_id = $1)",
                " AND ($2::TEXT IS NULL OR reg = $2)",
                " AND ($3::INTEGER IS NULL OR partner = $3)",
                " ORDER BY created_at DESC, seq DESC LIMIT $4 OFFSET $5"
            ))
            .bind(bed_id)
            .bind(filter.reg)
            .bind(filter.partner)
            .bind(to_i64(page.limit()))
            .bind(to_i64(page.offset()))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(store_error)?
            .iter()
            .map(rows::allocation)
            .collect::<Result<_, _>>()?;

            Ok(Paginated {
                count: to_u64(count),
                results,
            })
        })
    }

    // ---- lifecycle ----

    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move { self.tx.commit().await.map_err(store_error) })
    }

    fn rollback(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move { self.tx.rollback().await.map_err(store_error) })
    }
}
