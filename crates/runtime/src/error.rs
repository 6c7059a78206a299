//! Errors surfaced by the level session.
//!
//! Gameplay failures never show up here; they are reported as `false` or as
//! events. These variants cover loading, restoring, and saving.

use thiserror::Error;
use wasteland_core::{DiplomacyError, OracleError, StateError};

pub use crate::persistence::{RepositoryError, SnapshotError};

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Map(#[from] OracleError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Diplomacy(#[from] DiplomacyError),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("no save found for level '{0}'")]
    MissingSave(String),
}
