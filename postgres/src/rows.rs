//! Row to entity mapping.

use crate::error::store_error;
use accommodation_core::StoreError;
use accommodation_core::types::{
    Allocation, AllocationId, Bed, BedId, Dorm, DormId, ParseEnumError, Room, RoomId,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! dorm_columns {
    () => {
        "id, name, description, amount, amount_for, active, created_at, updated_at"
    };
}

macro_rules! room_columns {
    () => {
        "id, dorm_id, name, room_identifier, ac_available, floor, close_to_dorm_entrance, \
         close_to_bath, percent_released, bed_type, is_multibatch, participant_type, \
         reset_allowed, active, created_at, updated_at"
    };
}

macro_rules! bed_columns {
    () => {
        "id, room_id, number, level, close_to_dorm_entrance, close_to_bath, blocked, \
         allocated, active, created_at, updated_at"
    };
}

macro_rules! allocation_columns {
    () => {
        "id, bed_id, pnr, reg, partner, name, is_soft_allocation, receipt, amount_paid, \
         checkin_date, checkout_date, active, created_at, updated_at"
    };
}

pub(crate) use allocation_columns;
pub(crate) use bed_columns;
pub(crate) use dorm_columns;
pub(crate) use room_columns;

fn text_enum<T>(row: &PgRow, column: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = ParseEnumError>,
{
    let value: String = row.try_get(column).map_err(store_error)?;
    value
        .parse()
        .map_err(|error: ParseEnumError| StoreError::Database(error.to_string()))
}

fn uuid(row: &PgRow, column: &str) -> Result<Uuid, StoreError> {
    row.try_get(column).map_err(store_error)
}

pub(crate) fn dorm(row: &PgRow) -> Result<Dorm, StoreError> {
    Ok(Dorm {
        id: DormId::from_uuid(uuid(row, "id")?),
        name: row.try_get("name").map_err(store_error)?,
        description: row.try_get("description").map_err(store_error)?,
        amount: row.try_get("amount").map_err(store_error)?,
        amount_for: text_enum(row, "amount_for")?,
        active: row.try_get("active").map_err(store_error)?,
        created_at: row.try_get("created_at").map_err(store_error)?,
        updated_at: row.try_get("updated_at").map_err(store_error)?,
    })
}

pub(crate) fn room(row: &PgRow) -> Result<Room, StoreError> {
    Ok(Room {
        id: RoomId::from_uuid(uuid(row, "id")?),
        dorm_id: DormId::from_uuid(uuid(row, "dorm_id")?),
        name: row.try_get("name").map_err(store_error)?,
        room_identifier: row.try_get("room_identifier").map_err(store_error)?,
        ac_available: row.try_get("ac_available").map_err(store_error)?,
        floor: text_enum(row, "floor")?,
        close_to_dorm_entrance: row.try_get("close_to_dorm_entrance").map_err(store_error)?,
        close_to_bath: row.try_get("close_to_bath").map_err(store_error)?,
        percent_released: row.try_get("percent_released").map_err(store_error)?,
        bed_type: text_enum(row, "bed_type")?,
        is_multibatch: row.try_get("is_multibatch").map_err(store_error)?,
        participant_type: text_enum(row, "participant_type")?,
        reset_allowed: row.try_get("reset_allowed").map_err(store_error)?,
        active: row.try_get("active").map_err(store_error)?,
        created_at: row.try_get("created_at").map_err(store_error)?,
        updated_at: row.try_get("updated_at").map_err(store_error)?,
    })
}

pub(crate) fn bed(row: &PgRow) -> Result<Bed, StoreError> {
    Ok(Bed {
        id: BedId::from_uuid(uuid(row, "id")?),
        room_id: RoomId::from_uuid(uuid(row, "room_id")?),
        number: row.try_get("number").map_err(store_error)?,
        level: text_enum(row, "level")?,
        close_to_dorm_entrance: row.try_get("close_to_dorm_entrance").map_err(store_error)?,
        close_to_bath: row.try_get("close_to_bath").map_err(store_error)?,
        blocked: row.try_get("blocked").map_err(store_error)?,
        allocated: row.try_get("allocated").map_err(store_error)?,
        active: row.try_get("active").map_err(store_error)?,
        created_at: row.try_get("created_at").map_err(store_error)?,
        updated_at: row.try_get("updated_at").map_err(store_error)?,
    })
}

pub(crate) fn allocation(row: &PgRow) -> Result<Allocation, StoreError> {
    Ok(Allocation {
        id: AllocationId::from_uuid(uuid(row, "id")?),
        bed_id: BedId::from_uuid(uuid(row, "bed_id")?),
        pnr: row.try_get("pnr").map_err(store_error)?,
        reg: row.try_get("reg").map_err(store_error)?,
        partner: row.try_get("partner").map_err(store_error)?,
        name: row.try_get("name").map_err(store_error)?,
        is_soft_allocation: row.try_get("is_soft_allocation").map_err(store_error)?,
        receipt: row.try_get("receipt").map_err(store_error)?,
        amount_paid: row.try_get("amount_paid").map_err(store_error)?,
        checkin_date: row.try_get("checkin_date").map_err(store_error)?,
        checkout_date: row.try_get("checkout_date").map_err(store_error)?,
        active: row.try_get("active").map_err(store_error)?,
        created_at: row.try_get("created_at").map_err(store_error)?,
        updated_at: row.try_get("updated_at").map_err(store_error)?,
    })
}
