//! Common error infrastructure for wasteland-core.
//!
//! Gameplay failures (no path, occupied tile, rejected action) are reported as
//! booleans or events and never reach these types. The errors defined across
//! the crate cover data that cannot be trusted: missing map data, broken
//! diplomacy tables, and inconsistent level state.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition; the caller may retry or pick an alternative.
    Recoverable,

    /// Invalid input, should be rejected without retry.
    ///
    /// Examples: unknown faction name, position outside the map
    Validation,

    /// Unexpected state inconsistency that indicates a bug.
    ///
    /// Examples: occupancy desync, dangling faction reference
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

/// Common trait for all wasteland-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
