//! Persistence layer for level state.
//!
//! [`LevelSnapshot`] captures what changes during play: object positions and
//! routes, blocking flags, action points, diplomacy, and zones. Static map
//! data is reloaded from the map oracle instead.

mod repository;
mod snapshot;

pub use repository::{
    FileSaveRepository, InMemorySaveRepository, RepositoryError, SaveFormat, SaveRepository,
};
pub use snapshot::{
    CharacterRecord, LevelSnapshot, ObjectRecord, SNAPSHOT_VERSION, SnapshotError, ZoneRecord,
};
