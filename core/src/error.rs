//! Domain errors raised by [`AccommodationService`](crate::AccommodationService).

use crate::store::StoreError;
use crate::types::BedId;
use std::fmt;
use thiserror::Error;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, AccommodationError>;

/// Entity kinds, used to name what was missing or duplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A dorm
    Dorm,
    /// A room
    Room,
    /// A bed
    Bed,
    /// An allocation
    Allocation,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dorm => "Dorm",
            Self::Room => "Room",
            Self::Bed => "Bed",
            Self::Allocation => "Allocation",
        })
    }
}

/// Errors that can occur in accommodation operations.
#[derive(Error, Debug)]
pub enum AccommodationError {
    /// The referenced entity does not exist (or is not under the given parent).
    #[error("{entity} not found")]
    NotFound {
        /// Kind of entity
        entity: Entity,
        /// Identifier that was looked up
        id: String,
    },

    /// A bed named in an allocation batch does not exist.
    #[error("Bed {bed_id} not found")]
    BedNotFound {
        /// The missing bed
        bed_id: BedId,
    },

    /// The bed is inactive, held or already allocated.
    #[error("Bed {bed_id} cannot be allocated")]
    BedUnavailable {
        /// The offending bed
        bed_id: BedId,
    },

    /// A uniquely named entity already exists.
    #[error("{0} already exists")]
    Duplicate(Entity),

    /// The request payload is invalid.
    #[error("{0}")]
    Validation(String),

    /// Confirmation found nothing to confirm.
    #[error("No soft allocated beds found for PNR {pnr}")]
    NoSoftAllocations {
        /// The PNR that was looked up
        pnr: String,
    },

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccommodationError {
    /// Shorthand for [`AccommodationError::NotFound`].
    pub fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`AccommodationError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_entity() {
        let err = AccommodationError::not_found(Entity::Bed, "b-1");
        assert_eq!(err.to_string(), "Bed not found");
    }

    #[test]
    fn missing_batch_bed_is_named() {
        let bed_id = BedId::new();
        let err = AccommodationError::BedNotFound { bed_id };
        assert_eq!(err.to_string(), format!("Bed {bed_id} not found"));
    }

    #[test]
    fn unavailable_bed_is_named() {
        let bed_id = BedId::new();
        let err = AccommodationError::BedUnavailable { bed_id };
        assert!(err.to_string().contains(&bed_id.to_string()));
    }

    #[test]
    fn store_errors_are_transparent() {
        let err: AccommodationError = StoreError::Database("connection reset".into()).into();
        assert_eq!(err.to_string(), "Database error: connection reset");
    }
}
