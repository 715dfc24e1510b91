//! Domain types for the accommodation hierarchy.
//!
//! Contains identifiers, enumerations and the four entities: [`Dorm`],
//! [`Room`], [`Bed`] and [`Allocation`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create the identifier from a `Uuid`
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a dorm
    DormId
);
uuid_id!(
    /// Unique identifier for a room
    RoomId
);
uuid_id!(
    /// Unique identifier for a bed
    BedId
);
uuid_id!(
    /// Unique identifier for an allocation
    AllocationId
);

// ============================================================================
// Enumerations
// ============================================================================

/// Error returned when a stored or submitted enum value is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Name of the enum being parsed
    pub kind: &'static str,
    /// The rejected value
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Database / wire representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// What a dorm's `amount` is charged for.
    AmountFor, "amount_for" {
        /// Flat amount for the whole event
        Event => "event",
        /// Amount per day of stay
        Day => "day",
    }
);

string_enum!(
    /// Floor a room is located on.
    Floor, "floor" {
        /// Ground floor
        Gf => "gf",
        /// First floor
        Ff => "ff",
        /// Second floor
        Sf => "sf",
        /// Third floor
        Tf => "tf",
    }
);

string_enum!(
    /// Kind of beds in a room.
    BedType, "bed_type" {
        /// Bunk beds
        Bunk => "bunk",
        /// Metal frame beds
        Metal => "metal",
        /// Wooden beds
        Wood => "wood",
    }
);

string_enum!(
    /// Which participants a room may be released to.
    ParticipantType, "participant_type" {
        /// Open to everyone
        General => "general",
        /// Reserved for sisters
        SistersOnly => "sisters_only",
        /// Reserved for overseas participants
        OverseasOnly => "overseas_only",
    }
);

string_enum!(
    /// Position of a bed (relevant for bunks).
    BedLevel, "level" {
        /// Lower bunk / floor level
        Lower => "lower",
        /// Upper bunk
        Upper => "upper",
    }
);

// ============================================================================
// Entities
// ============================================================================

/// A building (or amount category) grouping rooms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dorm {
    /// Dorm ID
    pub id: DormId,
    /// Unique display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Price charged per `amount_for`
    pub amount: i32,
    /// What the amount is charged for
    pub amount_for: AmountFor,
    /// Whether the dorm is in use
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// A subdivision of a dorm grouping beds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Room {
    /// Room ID
    pub id: RoomId,
    /// Owning dorm
    pub dorm_id: DormId,
    /// Name, unique within the dorm
    pub name: String,
    /// Numeric room identifier (door number)
    pub room_identifier: i32,
    /// Air conditioning available
    pub ac_available: bool,
    /// Floor the room is on
    pub floor: Floor,
    /// Close to the dorm entrance
    pub close_to_dorm_entrance: bool,
    /// Close to the bathrooms
    pub close_to_bath: bool,
    /// Percentage of beds released for allocation
    pub percent_released: Option<i32>,
    /// Kind of beds in the room
    pub bed_type: BedType,
    /// Room can host several batches
    pub is_multibatch: bool,
    /// Which participants the room is released to
    pub participant_type: ParticipantType,
    /// Room may be reset between batches
    pub reset_allowed: bool,
    /// Whether the room is in use
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// The smallest allocable sleeping unit.
///
/// # Occupancy state
///
/// | `blocked` | `allocated` | Meaning |
/// |-----------|-------------|---------|
/// | false | false | free (eligible when `active`) |
/// | true | false | held by a soft allocation, payment pending |
/// | false | true | permanently allocated |
///
/// `blocked && allocated` is never produced by the workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Bed {
    /// Bed ID
    pub id: BedId,
    /// Owning room
    pub room_id: RoomId,
    /// Bed number, unique within the room when set
    pub number: Option<i32>,
    /// Lower or upper
    pub level: BedLevel,
    /// Close to the dorm entrance
    pub close_to_dorm_entrance: bool,
    /// Close to the bathrooms
    pub close_to_bath: bool,
    /// Temporarily held by a soft allocation
    pub blocked: bool,
    /// Permanently assigned
    pub allocated: bool,
    /// Available at all (beds are soft-deactivated, never deleted)
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Bed {
    /// Whether the bed may receive a new allocation.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.active && !self.blocked && !self.allocated
    }

    /// Place a temporary hold on the bed.
    pub const fn hold(&mut self, at: DateTime<Utc>) {
        self.blocked = true;
        self.allocated = false;
        self.updated_at = at;
    }

    /// Turn a hold into a permanent allocation.
    pub const fn finalize(&mut self, at: DateTime<Utc>) {
        self.allocated = true;
        self.blocked = false;
        self.updated_at = at;
    }

    /// Drop any hold or allocation.
    pub const fn release(&mut self, at: DateTime<Utc>) {
        self.blocked = false;
        self.allocated = false;
        self.updated_at = at;
    }

    /// Occupy the bed the way `allocation` requires: held while the
    /// allocation is soft, allocated once it is confirmed.
    pub const fn occupy_for(&mut self, allocation: &Allocation, at: DateTime<Utc>) {
        if allocation.is_soft_allocation {
            self.hold(at);
        } else {
            self.finalize(at);
        }
    }
}

/// One party's claim on one bed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Allocation ID
    pub id: AllocationId,
    /// The bed claimed
    pub bed_id: BedId,
    /// Party / booking reference
    pub pnr: Option<String>,
    /// Registration id of the participant
    pub reg: Option<String>,
    /// Partner id
    pub partner: Option<i32>,
    /// Participant name
    pub name: Option<String>,
    /// Payment pending
    pub is_soft_allocation: bool,
    /// Payment receipt identifier
    pub receipt: Option<String>,
    /// Amount paid
    pub amount_paid: Option<f64>,
    /// Stay start
    pub checkin_date: Option<DateTime<Utc>>,
    /// Stay end
    pub checkout_date: Option<DateTime<Utc>>,
    /// Whether this is the bed's current booking
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Allocation {
    /// Deactivate the booking (history is kept).
    pub const fn deactivate(&mut self, at: DateTime<Utc>) {
        self.active = false;
        self.updated_at = at;
    }
}
