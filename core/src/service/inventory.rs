//! Dorm, room and bed operations.
//!
//! Rooms and beds are always addressed through their parents: a room that
//! exists but belongs to another dorm is reported as not found.

use super::AccommodationService;
use crate::error::{AccommodationError, Entity, Result};
use crate::input::{
    ActiveFilter, BedPatch, DormPatch, NewBed, NewDorm, NewRoom, Page, Paginated, RoomPatch,
};
use crate::store::StoreTransaction;
use crate::types::{Bed, BedId, Dorm, DormId, Room, RoomId};

async fn require_dorm(tx: &mut dyn StoreTransaction, dorm_id: DormId) -> Result<Dorm> {
    tx.dorm(dorm_id)
        .await?
        .ok_or_else(|| AccommodationError::not_found(Entity::Dorm, dorm_id))
}

async fn require_room(
    tx: &mut dyn StoreTransaction,
    dorm_id: DormId,
    room_id: RoomId,
) -> Result<Room> {
    require_dorm(tx, dorm_id).await?;
    tx.room(room_id)
        .await?
        .filter(|room| room.dorm_id == dorm_id)
        .ok_or_else(|| AccommodationError::not_found(Entity::Room, room_id))
}

async fn require_bed(
    tx: &mut dyn StoreTransaction,
    dorm_id: DormId,
    room_id: RoomId,
    bed_id: BedId,
) -> Result<Bed> {
    require_room(tx, dorm_id, room_id).await?;
    tx.bed(bed_id)
        .await?
        .filter(|bed| bed.room_id == room_id)
        .ok_or_else(|| AccommodationError::not_found(Entity::Bed, bed_id))
}

impl AccommodationService {
    // ========================================================================
    // Dorms
    // ========================================================================

    /// List dorms, newest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn list_dorms(&self, filter: ActiveFilter, page: Page) -> Result<Paginated<Dorm>> {
        let mut tx = self.begin().await?;
        let dorms = tx.list_dorms(filter, page).await?;
        tx.commit().await?;
        Ok(dorms)
    }

    /// Fetch a dorm.
    ///
    /// # Errors
    ///
    /// `NotFound` if the dorm does not exist.
    pub async fn get_dorm(&self, dorm_id: DormId) -> Result<Dorm> {
        let mut tx = self.begin().await?;
        let dorm = require_dorm(tx.as_mut(), dorm_id).await?;
        tx.commit().await?;
        Ok(dorm)
    }

    /// Create a dorm.
    ///
    /// # Errors
    ///
    /// `Validation` for an invalid payload, `Duplicate` if the name is taken.
    pub async fn create_dorm(&self, input: NewDorm) -> Result<Dorm> {
        let dorm = input.into_dorm(self.clock.now())?;

        let mut tx = self.begin().await?;
        if tx.dorm_by_name(dorm.name.clone()).await?.is_some() {
            return Err(AccommodationError::Duplicate(Entity::Dorm));
        }
        tx.insert_dorm(dorm.clone()).await?;
        tx.commit().await?;

        tracing::info!(dorm_id = %dorm.id, name = %dorm.name, "Dorm created");
        Ok(dorm)
    }

    /// Apply a patch to a dorm.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation`, or `Duplicate` when renaming onto a taken name.
    pub async fn update_dorm(&self, dorm_id: DormId, patch: DormPatch) -> Result<Dorm> {
        let mut tx = self.begin().await?;
        let mut dorm = require_dorm(tx.as_mut(), dorm_id).await?;

        patch.apply_to(&mut dorm, self.clock.now())?;
        if let Some(existing) = tx.dorm_by_name(dorm.name.clone()).await? {
            if existing.id != dorm.id {
                return Err(AccommodationError::Duplicate(Entity::Dorm));
            }
        }
        tx.update_dorm(dorm.clone()).await?;
        tx.commit().await?;

        tracing::info!(dorm_id = %dorm.id, "Dorm updated");
        Ok(dorm)
    }

    // ========================================================================
    // Rooms
    // ========================================================================

    /// List the rooms of a dorm, newest first.
    ///
    /// # Errors
    ///
    /// `NotFound` if the dorm does not exist.
    pub async fn list_rooms(
        &self,
        dorm_id: DormId,
        filter: ActiveFilter,
        page: Page,
    ) -> Result<Paginated<Room>> {
        let mut tx = self.begin().await?;
        require_dorm(tx.as_mut(), dorm_id).await?;
        let rooms = tx.list_rooms(dorm_id, filter, page).await?;
        tx.commit().await?;
        Ok(rooms)
    }

    /// Fetch a room of a dorm.
    ///
    /// # Errors
    ///
    /// `NotFound` if the dorm or room does not exist.
    pub async fn get_room(&self, dorm_id: DormId, room_id: RoomId) -> Result<Room> {
        let mut tx = self.begin().await?;
        let room = require_room(tx.as_mut(), dorm_id, room_id).await?;
        tx.commit().await?;
        Ok(room)
    }

    /// Create a room in a dorm.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown dorm, `Validation`, or `Duplicate` if the
    /// name is taken within the dorm.
    pub async fn create_room(&self, dorm_id: DormId, input: NewRoom) -> Result<Room> {
        let room = input.into_room(dorm_id, self.clock.now())?;

        let mut tx = self.begin().await?;
        require_dorm(tx.as_mut(), dorm_id).await?;
        if tx.room_by_name(dorm_id, room.name.clone()).await?.is_some() {
            return Err(AccommodationError::Duplicate(Entity::Room));
        }
        tx.insert_room(room.clone()).await?;
        tx.commit().await?;

        tracing::info!(dorm_id = %dorm_id, room_id = %room.id, name = %room.name, "Room created");
        Ok(room)
    }

    /// Apply a patch to a room.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation`, or `Duplicate` when renaming onto a taken name.
    pub async fn update_room(
        &self,
        dorm_id: DormId,
        room_id: RoomId,
        patch: RoomPatch,
    ) -> Result<Room> {
        let mut tx = self.begin().await?;
        let mut room = require_room(tx.as_mut(), dorm_id, room_id).await?;

        patch.apply_to(&mut room, self.clock.now())?;
        if let Some(existing) = tx.room_by_name(dorm_id, room.name.clone()).await? {
            if existing.id != room.id {
                return Err(AccommodationError::Duplicate(Entity::Room));
            }
        }
        tx.update_room(room.clone()).await?;
        tx.commit().await?;

        tracing::info!(room_id = %room.id, "Room updated");
        Ok(room)
    }

    // ========================================================================
    // Beds
    // ========================================================================

    /// List the beds of a room, newest first.
    ///
    /// # Errors
    ///
    /// `NotFound` if the dorm or room does not exist.
    pub async fn list_beds(
        &self,
        dorm_id: DormId,
        room_id: RoomId,
        filter: ActiveFilter,
        page: Page,
    ) -> Result<Paginated<Bed>> {
        let mut tx = self.begin().await?;
        require_room(tx.as_mut(), dorm_id, room_id).await?;
        let beds = tx.list_beds(room_id, filter, page).await?;
        tx.commit().await?;
        Ok(beds)
    }

    /// Fetch a bed of a room.
    ///
    /// # Errors
    ///
    /// `NotFound` if the dorm, room or bed does not exist.
    pub async fn get_bed(&self, dorm_id: DormId, room_id: RoomId, bed_id: BedId) -> Result<Bed> {
        let mut tx = self.begin().await?;
        let bed = require_bed(tx.as_mut(), dorm_id, room_id, bed_id).await?;
        tx.commit().await?;
        Ok(bed)
    }

    /// Create a bed in a room. New beds are free.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown dorm or room, `Duplicate` if the number is
    /// taken within the room.
    pub async fn create_bed(&self, dorm_id: DormId, room_id: RoomId, input: NewBed) -> Result<Bed> {
        let bed = input.into_bed(room_id, self.clock.now());

        let mut tx = self.begin().await?;
        require_room(tx.as_mut(), dorm_id, room_id).await?;
        if let Some(number) = bed.number {
            if tx.bed_by_number(room_id, number).await?.is_some() {
                return Err(AccommodationError::Duplicate(Entity::Bed));
            }
        }
        tx.insert_bed(bed.clone()).await?;
        tx.commit().await?;

        tracing::info!(room_id = %room_id, bed_id = %bed.id, "Bed created");
        Ok(bed)
    }

    /// Apply a patch to a bed. Occupancy flags are not patchable.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Duplicate` when renumbering onto a taken number.
    pub async fn update_bed(
        &self,
        dorm_id: DormId,
        room_id: RoomId,
        bed_id: BedId,
        patch: BedPatch,
    ) -> Result<Bed> {
        let mut tx = self.begin().await?;
        require_room(tx.as_mut(), dorm_id, room_id).await?;
        let mut bed = tx
            .lock_bed(bed_id)
            .await?
            .filter(|bed| bed.room_id == room_id)
            .ok_or_else(|| AccommodationError::not_found(Entity::Bed, bed_id))?;

        patch.apply_to(&mut bed, self.clock.now());
        if let Some(number) = bed.number {
            if let Some(existing) = tx.bed_by_number(room_id, number).await? {
                if existing.id != bed.id {
                    return Err(AccommodationError::Duplicate(Entity::Bed));
                }
            }
        }
        tx.update_bed(bed.clone()).await?;
        tx.commit().await?;

        tracing::info!(bed_id = %bed.id, active = bed.active, "Bed updated");
        Ok(bed)
    }
}
