//! Map data errors.
//!
//! Raised while building or parsing static map descriptions.

use crate::error::{ErrorSeverity, GameError};
use crate::state::Position;

/// Errors that occur when building or reading map data.
///
/// A level cannot be loaded from a map that fails these checks, so the
/// occupancy grid is never built from inconsistent layout data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    /// Position is outside the map bounds.
    #[error("position {0} is out of map bounds")]
    PositionOutOfBounds(Position),

    /// A layout row does not match the declared width.
    #[error("layout row {row} has width {found}, expected {expected}")]
    MalformedLayout {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A layout glyph has no terrain mapping.
    #[error("unknown terrain glyph {glyph:?} at {position}")]
    UnknownGlyph { glyph: char, position: Position },

    /// A zone references a tile outside the map.
    #[error("zone '{zone}' covers out-of-bounds tile {position}")]
    ZoneOutOfBounds { zone: String, position: Position },

    /// The map document could not be decoded.
    #[error("invalid map document: {0}")]
    InvalidDocument(String),
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            PositionOutOfBounds(_) => "ORACLE_POSITION_OUT_OF_BOUNDS",
            MalformedLayout { .. } => "ORACLE_MALFORMED_LAYOUT",
            UnknownGlyph { .. } => "ORACLE_UNKNOWN_GLYPH",
            ZoneOutOfBounds { .. } => "ORACLE_ZONE_OUT_OF_BOUNDS",
            InvalidDocument(_) => "ORACLE_INVALID_DOCUMENT",
        }
    }
}
