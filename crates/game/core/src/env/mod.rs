//! Read-only world data.
//!
//! The [`MapOracle`] exposes static map geometry, declared zones, and the
//! objects a level starts with. [`StaticMap`] is the owned implementation used
//! by tests and JSON map documents.
mod error;
mod map;
mod static_map;

pub use error::OracleError;
pub use map::{
    CharacterSpec, InitialObjectSpec, MapDimensions, MapOracle, StaticTile, TerrainKind, ZoneSpec,
};
pub use static_map::StaticMap;
