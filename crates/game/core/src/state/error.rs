//! Level state errors.
//!
//! Raised when objects are placed into a level with data that would break the
//! occupancy grid: duplicate ids, tiles outside the map, or two blockers on one tile.

use crate::error::{ErrorSeverity, GameError};
use crate::state::{EntityId, Position};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    /// An object with this id is already on the level.
    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),

    /// Position is outside the map bounds.
    #[error("entity {entity} placed at out-of-bounds tile {position}")]
    PositionOutOfBounds {
        entity: EntityId,
        position: Position,
    },

    /// Position is already held by another blocking object.
    #[error("entity {entity} placed on {position}, already held by {occupant}")]
    PositionOccupied {
        entity: EntityId,
        position: Position,
        occupant: EntityId,
    },

    /// A pending path leaves the map.
    #[error("entity {entity} has out-of-bounds path tile {position}")]
    PathOutOfBounds {
        entity: EntityId,
        position: Position,
    },

    /// Referenced entity does not exist.
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
}

impl GameError for StateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            StateError::EntityNotFound(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            StateError::DuplicateEntity(_) => "STATE_DUPLICATE_ENTITY",
            StateError::PositionOutOfBounds { .. } => "STATE_POSITION_OUT_OF_BOUNDS",
            StateError::PositionOccupied { .. } => "STATE_POSITION_OCCUPIED",
            StateError::PathOutOfBounds { .. } => "STATE_PATH_OUT_OF_BOUNDS",
            StateError::EntityNotFound(_) => "STATE_ENTITY_NOT_FOUND",
        }
    }
}
