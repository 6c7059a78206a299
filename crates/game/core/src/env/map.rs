use crate::grid::ZoneKind;
use crate::state::Position;

/// Static map oracle exposing immutable layout information, zones, and initial
/// object placement. The level never mutates it.
pub trait MapOracle {
    /// Level name used for saves and diagnostics.
    fn name(&self) -> &str;

    fn dimensions(&self) -> MapDimensions;
    fn tile(&self, position: Position) -> Option<StaticTile>;

    /// Named render layers in draw order.
    fn layer_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Zones declared by the map itself (exits, scripted triggers).
    fn zones(&self) -> Vec<ZoneSpec> {
        Vec::new()
    }

    /// Returns the objects that should exist when the level is first loaded.
    fn initial_objects(&self) -> Vec<InitialObjectSpec> {
        Vec::new()
    }

    fn contains(&self, position: Position) -> bool {
        self.dimensions().contains(position)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDimensions {
    pub width: u32,
    pub height: u32,
}

impl MapDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }

    /// Row-major index of an in-bounds position.
    pub fn index_of(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.y as usize * self.width as usize + position.x as usize)
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Immutable descriptor for a tile in the static layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticTile {
    terrain: TerrainKind,
}

impl StaticTile {
    pub const fn new(terrain: TerrainKind) -> Self {
        Self { terrain }
    }

    pub fn terrain(self) -> TerrainKind {
        self.terrain
    }

    pub fn is_walkable(self) -> bool {
        self.terrain.is_walkable()
    }
}

/// Canonical terrain classes for static map tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerrainKind {
    Floor,
    Wall,
    Void,
    Water,
}

impl TerrainKind {
    pub fn is_walkable(self) -> bool {
        matches!(self, TerrainKind::Floor)
    }

    /// Glyph used by text layouts.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(TerrainKind::Floor),
            '#' => Some(TerrainKind::Wall),
            '~' => Some(TerrainKind::Water),
            ' ' => Some(TerrainKind::Void),
            _ => None,
        }
    }
}

/// Zone declared by a map layer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneSpec {
    pub name: String,
    pub kind: ZoneKind,
    /// Level or script reference the zone points at (e.g. the destination of an exit).
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: Option<String>,
    pub tiles: Vec<Position>,
}

/// Blueprint describing an object that should exist when a level is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitialObjectSpec {
    pub name: String,
    pub position: Position,
    #[cfg_attr(feature = "serde", serde(default))]
    pub script: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub blocking: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub floating: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub character: Option<CharacterSpec>,
}

impl InitialObjectSpec {
    pub fn prop(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            script: None,
            blocking: false,
            floating: false,
            character: None,
        }
    }

    pub fn character(name: impl Into<String>, position: Position, spec: CharacterSpec) -> Self {
        Self {
            blocking: true,
            character: Some(spec),
            ..Self::prop(name, position)
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn floating(mut self, floating: bool) -> Self {
        self.floating = floating;
        self
    }
}

/// Combat-capable part of an [`InitialObjectSpec`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterSpec {
    pub hit_points: u32,
    /// Per-turn maximum; the configured default applies when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub action_points: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub faction: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_player: bool,
}

impl CharacterSpec {
    pub fn new(hit_points: u32) -> Self {
        Self {
            hit_points,
            action_points: None,
            faction: None,
            is_player: false,
        }
    }

    pub fn player(hit_points: u32) -> Self {
        Self {
            is_player: true,
            ..Self::new(hit_points)
        }
    }

    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.faction = Some(faction.into());
        self
    }

    pub fn with_action_points(mut self, action_points: u32) -> Self {
        self.action_points = Some(action_points);
        self
    }
}
