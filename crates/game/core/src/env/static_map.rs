//! In-memory [`MapOracle`] built from a text layout.

use super::{
    InitialObjectSpec, MapDimensions, MapOracle, OracleError, StaticTile, TerrainKind, ZoneSpec,
};
use crate::state::Position;

/// Owned map description. Row `y` of a layout is the tile row with that
/// y-coordinate; glyphs map to terrain via [`TerrainKind::from_glyph`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticMap {
    name: String,
    dimensions: MapDimensions,
    tiles: Vec<StaticTile>,
    layers: Vec<String>,
    zones: Vec<ZoneSpec>,
    objects: Vec<InitialObjectSpec>,
}

impl StaticMap {
    /// Creates an all-floor map.
    pub fn open(name: impl Into<String>, dimensions: MapDimensions) -> Self {
        Self {
            name: name.into(),
            dimensions,
            tiles: vec![StaticTile::new(TerrainKind::Floor); dimensions.area()],
            layers: Vec::new(),
            zones: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn from_layout<S: AsRef<str>>(
        name: impl Into<String>,
        rows: &[S],
    ) -> Result<Self, OracleError> {
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        let dimensions = MapDimensions::new(width as u32, rows.len() as u32);
        let mut tiles = Vec::with_capacity(dimensions.area());

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(OracleError::MalformedLayout {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let terrain = TerrainKind::from_glyph(glyph).ok_or(OracleError::UnknownGlyph {
                    glyph,
                    position: Position::new(x as i32, y as i32),
                })?;
                tiles.push(StaticTile::new(terrain));
            }
        }

        Ok(Self {
            name: name.into(),
            dimensions,
            tiles,
            layers: Vec::new(),
            zones: Vec::new(),
            objects: Vec::new(),
        })
    }

    pub fn set_terrain(&mut self, position: Position, terrain: TerrainKind) -> Result<(), OracleError> {
        let index = self
            .dimensions
            .index_of(position)
            .ok_or(OracleError::PositionOutOfBounds(position))?;
        self.tiles[index] = StaticTile::new(terrain);
        Ok(())
    }

    pub fn with_layer(mut self, name: impl Into<String>) -> Self {
        self.layers.push(name.into());
        self
    }

    pub fn with_zone(mut self, zone: ZoneSpec) -> Result<Self, OracleError> {
        if let Some(position) = zone.tiles.iter().find(|tile| !self.dimensions.contains(**tile)) {
            return Err(OracleError::ZoneOutOfBounds {
                zone: zone.name,
                position: *position,
            });
        }
        self.zones.push(zone);
        Ok(self)
    }

    pub fn with_object(mut self, object: InitialObjectSpec) -> Result<Self, OracleError> {
        if !self.dimensions.contains(object.position) {
            return Err(OracleError::PositionOutOfBounds(object.position));
        }
        self.objects.push(object);
        Ok(self)
    }
}

#[cfg(feature = "serde")]
mod document {
    use super::*;

    #[derive(serde::Deserialize)]
    struct MapDocument {
        name: String,
        layout: Vec<String>,
        #[serde(default)]
        layers: Vec<String>,
        #[serde(default)]
        zones: Vec<ZoneSpec>,
        #[serde(default)]
        objects: Vec<InitialObjectSpec>,
    }

    impl StaticMap {
        /// Parses a JSON map document:
        ///
        /// ```json
        /// { "name": "den", "layout": ["#####", "#...#", "#####"],
        ///   "zones": [{ "name": "exit", "kind": "exit", "target": "town", "tiles": [{"x": 1, "y": 1}] }] }
        /// ```
        pub fn from_json(json: &str) -> Result<Self, OracleError> {
            let document: MapDocument = serde_json::from_str(json)
                .map_err(|error| OracleError::InvalidDocument(error.to_string()))?;

            let mut map = StaticMap::from_layout(document.name, &document.layout)?;
            map.layers = document.layers;
            for zone in document.zones {
                map = map.with_zone(zone)?;
            }
            for object in document.objects {
                map = map.with_object(object)?;
            }
            Ok(map)
        }
    }
}

impl MapOracle for StaticMap {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    fn tile(&self, position: Position) -> Option<StaticTile> {
        self.dimensions
            .index_of(position)
            .and_then(|index| self.tiles.get(index).copied())
    }

    fn layer_names(&self) -> Vec<String> {
        self.layers.clone()
    }

    fn zones(&self) -> Vec<ZoneSpec> {
        self.zones.clone()
    }

    fn initial_objects(&self) -> Vec<InitialObjectSpec> {
        self.objects.clone()
    }
}
