//! Deterministic level simulation types for the wasteland RPG.
//!
//! `wasteland-core` defines the occupancy grid and its pathfinding, trigger
//! zones, dynamic objects and their combat state, per-character action queues,
//! faction diplomacy, and the encounter roster. It performs no scripting and
//! publishes no events; the runtime crate drives these types and reports what
//! happened.
pub mod config;
pub mod diplomacy;
pub mod encounter;
pub mod env;
pub mod error;
pub mod grid;
pub mod object;
pub mod state;

pub use config::GameConfig;
pub use diplomacy::{Affiliation, Diplomacy, DiplomacyError, Escalation, Faction, FactionId};
pub use encounter::Encounter;
pub use env::{
    CharacterSpec, InitialObjectSpec, MapDimensions, MapOracle, OracleError, StaticMap, StaticTile,
    TerrainKind, ZoneSpec,
};
pub use error::{ErrorSeverity, GameError};
pub use grid::{OccupancyGrid, Zone, ZoneId, ZoneKind, ZoneOwner, ZoneTransition};
pub use object::{
    ActionQueue, Animation, CharacterState, DamageOutcome, DynamicObject, InteractionKind,
    LifeState, ObjectFlags, ObjectKind, QueuedAction, QueuedCommand, skill_callback,
};
pub use state::{
    CardinalDirection, EntityId, LevelState, Position, RenderPosition, ResourceMeter, StateError,
};
