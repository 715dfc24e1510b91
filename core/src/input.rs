//! Client-supplied payloads.
//!
//! Creation payloads (`New*`) carry every client-settable field; patch
//! payloads (`*Patch`) carry an explicit whitelist of mutable fields and
//! reject anything else (`deny_unknown_fields`). Server-managed fields such as
//! `id`, timestamps, and a bed's `blocked` / `allocated` flags are never
//! writable through a patch.

use crate::error::{AccommodationError, Result};
use crate::types::{
    Allocation, AllocationId, AmountFor, Bed, BedId, BedLevel, BedType, Dorm, DormId, Floor,
    ParticipantType, Room, RoomId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AccommodationError::validation(format!(
            "{field} must not be blank"
        )));
    }
    Ok(())
}

fn require_non_negative_amount(amount: Option<f64>) -> Result<()> {
    match amount {
        Some(value) if !value.is_finite() || value < 0.0 => Err(AccommodationError::validation(
            "amount_paid must be a non-negative number",
        )),
        _ => Ok(()),
    }
}

fn require_stay_order(
    checkin: Option<DateTime<Utc>>,
    checkout: Option<DateTime<Utc>>,
) -> Result<()> {
    if let (Some(checkin), Some(checkout)) = (checkin, checkout) {
        if checkout < checkin {
            return Err(AccommodationError::validation(
                "checkout_date must not be before checkin_date",
            ));
        }
    }
    Ok(())
}

fn require_percent(percent: Option<i32>) -> Result<()> {
    match percent {
        Some(value) if !(0..=100).contains(&value) => Err(AccommodationError::validation(
            "percent_released must be between 0 and 100",
        )),
        _ => Ok(()),
    }
}

// ============================================================================
// Dorm
// ============================================================================

/// Payload to create a dorm.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NewDorm {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Amount charged
    pub amount: i32,
    /// What the amount is charged for
    pub amount_for: AmountFor,
    /// Active flag
    #[serde(default = "default_true")]
    pub active: bool,
}

impl NewDorm {
    /// Validate and build the dorm.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the name is blank or the amount negative.
    pub fn into_dorm(self, now: DateTime<Utc>) -> Result<Dorm> {
        require_non_blank("name", &self.name)?;
        if self.amount < 0 {
            return Err(AccommodationError::validation("amount must not be negative"));
        }
        Ok(Dorm {
            id: DormId::new(),
            name: self.name,
            description: self.description,
            amount: self.amount,
            amount_for: self.amount_for,
            active: self.active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Mutable dorm fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DormPatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New amount
    pub amount: Option<i32>,
    /// New amount basis
    pub amount_for: Option<AmountFor>,
    /// New active flag
    pub active: Option<bool>,
}

impl DormPatch {
    /// Apply the present fields to `dorm`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or negative amount.
    pub fn apply_to(self, dorm: &mut Dorm, now: DateTime<Utc>) -> Result<()> {
        if let Some(name) = self.name {
            require_non_blank("name", &name)?;
            dorm.name = name;
        }
        if let Some(amount) = self.amount {
            if amount < 0 {
                return Err(AccommodationError::validation("amount must not be negative"));
            }
            dorm.amount = amount;
        }
        if let Some(description) = self.description {
            dorm.description = Some(description);
        }
        if let Some(amount_for) = self.amount_for {
            dorm.amount_for = amount_for;
        }
        if let Some(active) = self.active {
            dorm.active = active;
        }
        dorm.updated_at = now;
        Ok(())
    }
}

// ============================================================================
// Room
// ============================================================================

/// Payload to create a room.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct NewRoom {
    /// Name, unique within the dorm
    pub name: String,
    /// Numeric room identifier
    pub room_identifier: i32,
    /// Air conditioning
    #[serde(default)]
    pub ac_available: bool,
    /// Floor
    pub floor: Floor,
    /// Close to the entrance
    #[serde(default)]
    pub close_to_dorm_entrance: bool,
    /// Close to the bathrooms
    #[serde(default)]
    pub close_to_bath: bool,
    /// Percentage released
    #[serde(default)]
    pub percent_released: Option<i32>,
    /// Bed kind
    pub bed_type: BedType,
    /// Multi-batch room
    #[serde(default)]
    pub is_multibatch: bool,
    /// Participant policy
    pub participant_type: ParticipantType,
    /// Reset allowed
    #[serde(default)]
    pub reset_allowed: bool,
    /// Active flag
    #[serde(default = "default_true")]
    pub active: bool,
}

impl NewRoom {
    /// Validate and build the room under `dorm_id`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or out-of-range percentage.
    pub fn into_room(self, dorm_id: DormId, now: DateTime<Utc>) -> Result<Room> {
        require_non_blank("name", &self.name)?;
        require_percent(self.percent_released)?;
        Ok(Room {
            id: RoomId::new(),
            dorm_id,
            name: self.name,
            room_identifier: self.room_identifier,
            ac_available: self.ac_available,
            floor: self.floor,
            close_to_dorm_entrance: self.close_to_dorm_entrance,
            close_to_bath: self.close_to_bath,
            percent_released: self.percent_released,
            bed_type: self.bed_type,
            is_multibatch: self.is_multibatch,
            participant_type: self.participant_type,
            reset_allowed: self.reset_allowed,
            active: self.active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Mutable room fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoomPatch {
    /// New name
    pub name: Option<String>,
    /// New room identifier
    pub room_identifier: Option<i32>,
    /// Air conditioning
    pub ac_available: Option<bool>,
    /// Floor
    pub floor: Option<Floor>,
    /// Close to the entrance
    pub close_to_dorm_entrance: Option<bool>,
    /// Close to the bathrooms
    pub close_to_bath: Option<bool>,
    /// Percentage released
    pub percent_released: Option<i32>,
    /// Bed kind
    pub bed_type: Option<BedType>,
    /// Multi-batch room
    pub is_multibatch: Option<bool>,
    /// Participant policy
    pub participant_type: Option<ParticipantType>,
    /// Reset allowed
    pub reset_allowed: Option<bool>,
    /// Active flag
    pub active: Option<bool>,
}

impl RoomPatch {
    /// Apply the present fields to `room`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or out-of-range percentage.
    pub fn apply_to(self, room: &mut Room, now: DateTime<Utc>) -> Result<()> {
        if let Some(name) = self.name {
            require_non_blank("name", &name)?;
            room.name = name;
        }
        if self.percent_released.is_some() {
            require_percent(self.percent_released)?;
            room.percent_released = self.percent_released;
        }
        if let Some(value) = self.room_identifier {
            room.room_identifier = value;
        }
        if let Some(value) = self.ac_available {
            room.ac_available = value;
        }
        if let Some(value) = self.floor {
            room.floor = value;
        }
        if let Some(value) = self.close_to_dorm_entrance {
            room.close_to_dorm_entrance = value;
        }
        if let Some(value) = self.close_to_bath {
            room.close_to_bath = value;
        }
        if let Some(value) = self.bed_type {
            room.bed_type = value;
        }
        if let Some(value) = self.is_multibatch {
            room.is_multibatch = value;
        }
        if let Some(value) = self.participant_type {
            room.participant_type = value;
        }
        if let Some(value) = self.reset_allowed {
            room.reset_allowed = value;
        }
        if let Some(value) = self.active {
            room.active = value;
        }
        room.updated_at = now;
        Ok(())
    }
}

// ============================================================================
// Bed
// ============================================================================

/// Payload to create a bed.
///
/// New beds always start free (`blocked = false`, `allocated = false`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NewBed {
    /// Bed number, unique within the room
    #[serde(default)]
    pub number: Option<i32>,
    /// Lower or upper
    pub level: BedLevel,
    /// Close to the entrance
    #[serde(default)]
    pub close_to_dorm_entrance: bool,
    /// Close to the bathrooms
    #[serde(default)]
    pub close_to_bath: bool,
    /// Active flag
    #[serde(default = "default_true")]
    pub active: bool,
}

impl NewBed {
    /// Build the bed under `room_id`.
    #[must_use]
    pub fn into_bed(self, room_id: RoomId, now: DateTime<Utc>) -> Bed {
        Bed {
            id: BedId::new(),
            room_id,
            number: self.number,
            level: self.level,
            close_to_dorm_entrance: self.close_to_dorm_entrance,
            close_to_bath: self.close_to_bath,
            blocked: false,
            allocated: false,
            active: self.active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Mutable bed fields. Occupancy flags are owned by the allocation workflow.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BedPatch {
    /// Bed number
    pub number: Option<i32>,
    /// Lower or upper
    pub level: Option<BedLevel>,
    /// Close to the entrance
    pub close_to_dorm_entrance: Option<bool>,
    /// Close to the bathrooms
    pub close_to_bath: Option<bool>,
    /// Active flag
    pub active: Option<bool>,
}

impl BedPatch {
    /// Apply the present fields to `bed`.
    pub fn apply_to(self, bed: &mut Bed, now: DateTime<Utc>) {
        if self.number.is_some() {
            bed.number = self.number;
        }
        if let Some(level) = self.level {
            bed.level = level;
        }
        if let Some(value) = self.close_to_dorm_entrance {
            bed.close_to_dorm_entrance = value;
        }
        if let Some(value) = self.close_to_bath {
            bed.close_to_bath = value;
        }
        if let Some(value) = self.active {
            bed.active = value;
        }
        bed.updated_at = now;
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// Payload for the simple (single bed) allocate path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NewAllocation {
    /// Bed to allocate
    pub bed_id: BedId,
    /// Party reference
    #[serde(default)]
    pub pnr: Option<String>,
    /// Registration id
    #[serde(default)]
    pub reg: Option<String>,
    /// Partner id
    #[serde(default)]
    pub partner: Option<i32>,
    /// Participant name
    #[serde(default)]
    pub name: Option<String>,
    /// Payment pending
    #[serde(default)]
    pub is_soft_allocation: bool,
    /// Receipt
    #[serde(default)]
    pub receipt: Option<String>,
    /// Amount paid
    #[serde(default)]
    pub amount_paid: Option<f64>,
    /// Stay start
    #[serde(default)]
    pub checkin_date: Option<DateTime<Utc>>,
    /// Stay end
    #[serde(default)]
    pub checkout_date: Option<DateTime<Utc>>,
    /// Active flag
    #[serde(default = "default_true")]
    pub active: bool,
}

impl NewAllocation {
    /// Validate and build the allocation.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a negative amount or inverted stay dates.
    pub fn into_allocation(self, now: DateTime<Utc>) -> Result<Allocation> {
        require_non_negative_amount(self.amount_paid)?;
        require_stay_order(self.checkin_date, self.checkout_date)?;
        Ok(Allocation {
            id: AllocationId::new(),
            bed_id: self.bed_id,
            pnr: self.pnr,
            reg: self.reg,
            partner: self.partner,
            name: self.name,
            is_soft_allocation: self.is_soft_allocation,
            receipt: self.receipt,
            amount_paid: self.amount_paid,
            checkin_date: self.checkin_date,
            checkout_date: self.checkout_date,
            active: self.active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Mutable allocation fields.
///
/// `is_soft_allocation` is owned by the soft-allocation workflow and cannot be
/// patched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AllocationPatch {
    /// Move to another bed
    pub bed_id: Option<BedId>,
    /// Party reference
    pub pnr: Option<String>,
    /// Registration id
    pub reg: Option<String>,
    /// Partner id
    pub partner: Option<i32>,
    /// Participant name
    pub name: Option<String>,
    /// Receipt
    pub receipt: Option<String>,
    /// Amount paid
    pub amount_paid: Option<f64>,
    /// Stay start
    pub checkin_date: Option<DateTime<Utc>>,
    /// Stay end
    pub checkout_date: Option<DateTime<Utc>>,
    /// Active flag
    pub active: Option<bool>,
}

impl AllocationPatch {
    /// Apply the present fields to `allocation`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a negative amount or inverted stay dates.
    pub fn apply_to(self, allocation: &mut Allocation, now: DateTime<Utc>) -> Result<()> {
        require_non_negative_amount(self.amount_paid)?;
        if let Some(bed_id) = self.bed_id {
            allocation.bed_id = bed_id;
        }
        if self.pnr.is_some() {
            allocation.pnr = self.pnr;
        }
        if self.reg.is_some() {
            allocation.reg = self.reg;
        }
        if self.partner.is_some() {
            allocation.partner = self.partner;
        }
        if self.name.is_some() {
            allocation.name = self.name;
        }
        if self.receipt.is_some() {
            allocation.receipt = self.receipt;
        }
        if self.amount_paid.is_some() {
            allocation.amount_paid = self.amount_paid;
        }
        if self.checkin_date.is_some() {
            allocation.checkin_date = self.checkin_date;
        }
        if self.checkout_date.is_some() {
            allocation.checkout_date = self.checkout_date;
        }
        if let Some(active) = self.active {
            allocation.active = active;
        }
        require_stay_order(allocation.checkin_date, allocation.checkout_date)?;
        allocation.updated_at = now;
        Ok(())
    }
}

/// One entry of a soft-allocate batch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SoftAllocationRequest {
    /// Bed to hold
    pub bed_id: BedId,
    /// Party reference (required)
    pub pnr: String,
    /// Registration id (required)
    pub reg: String,
    /// Partner id
    #[serde(default)]
    pub partner: Option<i32>,
    /// Participant name
    #[serde(default)]
    pub name: Option<String>,
    /// Receipt
    #[serde(default)]
    pub receipt: Option<String>,
    /// Amount paid
    #[serde(default)]
    pub amount_paid: Option<f64>,
    /// Stay start
    #[serde(default)]
    pub checkin_date: Option<DateTime<Utc>>,
    /// Stay end
    #[serde(default)]
    pub checkout_date: Option<DateTime<Utc>>,
}

impl SoftAllocationRequest {
    /// Check the request in isolation.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank `pnr` / `reg`, a negative amount
    /// or inverted stay dates.
    pub fn validate(&self) -> Result<()> {
        require_non_blank("pnr", &self.pnr)?;
        require_non_blank("reg", &self.reg)?;
        require_non_negative_amount(self.amount_paid)?;
        require_stay_order(self.checkin_date, self.checkout_date)
    }

    /// Build the pending reservation record for this request.
    #[must_use]
    pub fn into_soft_allocation(self, now: DateTime<Utc>) -> Allocation {
        Allocation {
            id: AllocationId::new(),
            bed_id: self.bed_id,
            pnr: Some(self.pnr),
            reg: Some(self.reg),
            partner: self.partner,
            name: self.name,
            is_soft_allocation: true,
            receipt: self.receipt,
            amount_paid: self.amount_paid,
            checkin_date: self.checkin_date,
            checkout_date: self.checkout_date,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload confirming a party's soft allocations after payment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfirmSoftAllocation {
    /// Party reference
    pub pnr: String,
    /// Payment receipt
    pub receipt: String,
    /// Amount paid for the whole party
    pub amount_paid: f64,
}

impl ConfirmSoftAllocation {
    /// Check the payload.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank PNR or receipt, or a negative amount.
    pub fn validate(&self) -> Result<()> {
        require_non_blank("pnr", &self.pnr)?;
        require_non_blank("receipt", &self.receipt)?;
        require_non_negative_amount(Some(self.amount_paid))
    }
}

// ============================================================================
// Listing
// ============================================================================

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Page size used when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Raw pagination query (`?page=2&page_size=50`).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page
    pub page_size: Option<u32>,
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    page_size: u32,
}

impl Page {
    /// Validate a page request.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `page` is 0 or `page_size` is outside
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(request: PageRequest) -> Result<Self> {
        let page = request.page.unwrap_or(1);
        let page_size = request.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 {
            return Err(AccommodationError::validation("page must be greater than 0"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AccommodationError::validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    /// Rows to return.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Matching rows before pagination
    pub count: u64,
    /// Rows on this page
    pub results: Vec<T>,
}

/// Filter on the `active` flag.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct ActiveFilter {
    /// Only rows with this `active` value
    pub active: Option<bool>,
}

impl ActiveFilter {
    /// Whether a row with the given flag passes the filter.
    #[must_use]
    pub fn matches(&self, active: bool) -> bool {
        self.active.is_none_or(|wanted| wanted == active)
    }
}

/// Filters for listing allocations.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AllocationFilter {
    /// Only allocations on this bed
    pub bed_id: Option<BedId>,
    /// Only allocations with this registration id
    pub reg: Option<String>,
    /// Only allocations with this partner id
    pub partner: Option<i32>,
}

impl AllocationFilter {
    /// Whether `allocation` passes the filter.
    #[must_use]
    pub fn matches(&self, allocation: &Allocation) -> bool {
        self.bed_id.is_none_or(|bed_id| allocation.bed_id == bed_id)
            && self
                .reg
                .as_deref()
                .is_none_or(|reg| allocation.reg.as_deref() == Some(reg))
            && self
                .partner
                .is_none_or(|partner| allocation.partner == Some(partner))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_offsets() {
        let page = Page::new(PageRequest::default()).unwrap();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 20);

        let third = Page::new(PageRequest {
            page: Some(3),
            page_size: Some(10),
        })
        .unwrap();
        assert_eq!(third.offset(), 20);
        assert_eq!(third.limit(), 10);
    }

    #[test]
    fn page_bounds_are_enforced() {
        assert!(Page::new(PageRequest { page: Some(0), page_size: None }).is_err());
        assert!(Page::new(PageRequest { page: None, page_size: Some(0) }).is_err());
        assert!(Page::new(PageRequest { page: None, page_size: Some(101) }).is_err());
        assert!(Page::new(PageRequest { page: None, page_size: Some(100) }).is_ok());
    }

    #[test]
    fn bed_patch_rejects_occupancy_flags() {
        let result: std::result::Result<BedPatch, _> =
            serde_json::from_str(r#"{"blocked": false, "allocated": false}"#);
        assert!(result.is_err());
    }

    #[test]
    fn allocation_patch_rejects_server_managed_fields() {
        assert!(serde_json::from_str::<AllocationPatch>(r#"{"id": "x"}"#).is_err());
        assert!(serde_json::from_str::<AllocationPatch>(r#"{"is_soft_allocation": false}"#).is_err());
        assert!(serde_json::from_str::<AllocationPatch>(r#"{"created_at": "2025-01-01T00:00:00Z"}"#).is_err());
    }

    #[test]
    fn dorm_patch_only_touches_present_fields() {
        let now = Utc::now();
        let mut dorm = NewDorm {
            name: "North".into(),
            description: Some("by the lake".into()),
            amount: 500,
            amount_for: AmountFor::Event,
            active: true,
        }
        .into_dorm(now)
        .unwrap();
        let id = dorm.id;

        DormPatch {
            amount: Some(650),
            ..DormPatch::default()
        }
        .apply_to(&mut dorm, now)
        .unwrap();

        assert_eq!(dorm.id, id);
        assert_eq!(dorm.amount, 650);
        assert_eq!(dorm.name, "North");
        assert_eq!(dorm.description.as_deref(), Some("by the lake"));
    }

    #[test]
    fn soft_request_requires_party_identity() {
        let request: SoftAllocationRequest = serde_json::from_value(serde_json::json!({
            "bed_id": BedId::new(),
            "pnr": "  ",
            "reg": "R1",
        }))
        .unwrap();
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "pnr must not be blank");
    }

    #[test]
    fn soft_request_without_reg_does_not_deserialize() {
        let result = serde_json::from_value::<SoftAllocationRequest>(serde_json::json!({
            "bed_id": BedId::new(),
            "pnr": "P1",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn inverted_stay_dates_are_rejected() {
        let now = Utc::now();
        let request = NewAllocation {
            bed_id: BedId::new(),
            pnr: None,
            reg: None,
            partner: None,
            name: None,
            is_soft_allocation: false,
            receipt: None,
            amount_paid: None,
            checkin_date: Some(now),
            checkout_date: Some(now - chrono::Duration::days(1)),
            active: true,
        };
        assert!(request.into_allocation(now).is_err());
    }

    #[test]
    fn allocation_filter_matches_all_criteria() {
        let now = Utc::now();
        let bed_id = BedId::new();
        let allocation = SoftAllocationRequest {
            bed_id,
            pnr: "P1".into(),
            reg: "R1".into(),
            partner: Some(7),
            name: None,
            receipt: None,
            amount_paid: None,
            checkin_date: None,
            checkout_date: None,
        }
        .into_soft_allocation(now);

        assert!(AllocationFilter::default().matches(&allocation));
        assert!(AllocationFilter {
            bed_id: Some(bed_id),
            reg: Some("R1".into()),
            partner: Some(7),
        }
        .matches(&allocation));
        assert!(!AllocationFilter {
            reg: Some("R2".into()),
            ..AllocationFilter::default()
        }
        .matches(&allocation));
    }
}
