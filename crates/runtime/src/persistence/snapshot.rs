//! Serializable image of a level's dynamic state.
//!
//! Terrain is not stored: a snapshot is always restored on top of the map it
//! was taken from, and [`LevelSnapshot::validate`] rejects records that do not
//! fit that map before anything touches the occupancy grid.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasteland_core::{
    Affiliation, Animation, CharacterState, Diplomacy, DynamicObject, EntityId, LevelState,
    LifeState, MapDimensions, ObjectFlags, ObjectKind, Position, ResourceMeter, Zone, ZoneId,
    ZoneKind, ZoneOwner,
};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub version: u32,
    pub level: String,
    pub player: Option<EntityId>,
    pub objects: Vec<ObjectRecord>,
    pub zones: Vec<ZoneRecord>,
    pub diplomacy: Diplomacy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: EntityId,
    pub name: String,
    /// Tile held in the grid. A step in flight counts as landed.
    pub position: Position,
    /// Route left after `position`.
    pub pending_path: Vec<Position>,
    pub flags: ObjectFlags,
    pub script: Option<String>,
    pub control_zone: Option<ZoneId>,
    pub character: Option<CharacterRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub hit_points: ResourceMeter,
    pub action_points: u32,
    pub max_action_points: u32,
    pub affiliation: Affiliation,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub id: ZoneId,
    pub name: String,
    pub kind: ZoneKind,
    pub target: Option<String>,
    pub tiles: Vec<Position>,
    pub owner: ZoneOwner,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {found} (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("snapshot of level '{found}' cannot restore level '{expected}'")]
    LevelMismatch { expected: String, found: String },

    #[error("object {object} is at out-of-bounds tile {position}")]
    ObjectOutOfBounds { object: EntityId, position: Position },

    #[error("object {object} has out-of-bounds path tile {position}")]
    PathOutOfBounds { object: EntityId, position: Position },

    #[error("objects {first} and {second} both block tile {position}")]
    TileConflict {
        first: EntityId,
        second: EntityId,
        position: Position,
    },

    #[error("object {0} appears twice")]
    DuplicateObject(EntityId),

    #[error("zone {0} appears twice")]
    DuplicateZone(ZoneId),

    #[error("zone '{zone}' covers out-of-bounds tile {position}")]
    ZoneOutOfBounds { zone: String, position: Position },

    #[error("object {object} references missing control zone {zone}")]
    MissingControlZone { object: EntityId, zone: ZoneId },

    #[error("object {object} references an unknown faction")]
    UnknownFaction { object: EntityId },

    #[error("player {0} is not a character in the snapshot")]
    MissingPlayer(EntityId),
}

impl LevelSnapshot {
    pub fn capture(state: &LevelState) -> Self {
        let objects = state.objects.values().map(ObjectRecord::capture).collect();
        let zones = state
            .grid
            .zones()
            .map(|(id, zone)| ZoneRecord::capture(id, zone))
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            level: state.name.clone(),
            player: state.player,
            objects,
            zones,
            diplomacy: state.diplomacy.clone(),
        }
    }

    /// Checks every record against the map it will be restored onto.
    pub fn validate(&self, level: &str, dimensions: MapDimensions) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: self.version,
            });
        }
        if self.level != level {
            return Err(SnapshotError::LevelMismatch {
                expected: level.to_string(),
                found: self.level.clone(),
            });
        }

        let mut zone_ids = BTreeSet::new();
        for zone in &self.zones {
            if !zone_ids.insert(zone.id) {
                return Err(SnapshotError::DuplicateZone(zone.id));
            }
            if let Some(position) = zone.tiles.iter().find(|tile| !dimensions.contains(**tile)) {
                return Err(SnapshotError::ZoneOutOfBounds {
                    zone: zone.name.clone(),
                    position: *position,
                });
            }
        }

        let mut ids = BTreeSet::new();
        let mut blockers: BTreeMap<Position, EntityId> = BTreeMap::new();
        for object in &self.objects {
            if !ids.insert(object.id) {
                return Err(SnapshotError::DuplicateObject(object.id));
            }
            if !dimensions.contains(object.position) {
                return Err(SnapshotError::ObjectOutOfBounds {
                    object: object.id,
                    position: object.position,
                });
            }
            if let Some(position) = object.pending_path.iter().find(|tile| !dimensions.contains(**tile)) {
                return Err(SnapshotError::PathOutOfBounds {
                    object: object.id,
                    position: *position,
                });
            }
            if let Some(zone) = object.control_zone
                && !zone_ids.contains(&zone)
            {
                return Err(SnapshotError::MissingControlZone {
                    object: object.id,
                    zone,
                });
            }
            if let Some(character) = &object.character
                && let Some(faction) = character.affiliation.faction
                && self.diplomacy.faction(faction).is_none()
            {
                return Err(SnapshotError::UnknownFaction { object: object.id });
            }
            if object.occupies_tile()
                && let Some(first) = blockers.insert(object.position, object.id)
            {
                return Err(SnapshotError::TileConflict {
                    first,
                    second: object.id,
                    position: object.position,
                });
            }
        }

        if let Some(player) = self.player
            && !self
                .objects
                .iter()
                .any(|object| object.id == player && object.character.is_some())
        {
            return Err(SnapshotError::MissingPlayer(player));
        }
        Ok(())
    }
}

impl ObjectRecord {
    pub fn capture(object: &DynamicObject) -> Self {
        Self {
            id: object.id,
            name: object.name.clone(),
            position: object.planned_position(),
            pending_path: object.path.iter().copied().collect(),
            flags: object.flags,
            script: object.script.clone(),
            control_zone: object.control_zone,
            character: object.as_character().map(CharacterRecord::capture),
        }
    }

    /// Living blockers hold a tile in the grid.
    pub fn occupies_tile(&self) -> bool {
        self.flags.contains(ObjectFlags::BLOCKING)
            && self.character.as_ref().is_none_or(|character| character.alive)
    }

    /// Rebuilds the object. Its route is kept but no step is in flight.
    pub fn into_object(self) -> DynamicObject {
        let kind = match self.character {
            Some(record) => ObjectKind::Character(record.into_state()),
            None => ObjectKind::Prop,
        };
        let animation = match &kind {
            ObjectKind::Character(state) if !state.is_alive() => Animation::Death,
            _ => Animation::Idle,
        };

        DynamicObject {
            id: self.id,
            name: self.name,
            position: self.position,
            in_flight: None,
            path: self.pending_path.into(),
            flags: self.flags,
            script: self.script,
            animation,
            render_position: None,
            control_zone: self.control_zone,
            kind,
        }
    }
}

impl CharacterRecord {
    pub fn capture(state: &CharacterState) -> Self {
        Self {
            hit_points: state.hit_points,
            action_points: state.action_points,
            max_action_points: state.max_action_points,
            affiliation: state.affiliation,
            alive: state.is_alive(),
        }
    }

    fn into_state(self) -> CharacterState {
        let mut state = CharacterState::new(
            self.hit_points.maximum,
            self.max_action_points,
            self.affiliation,
        );
        state.hit_points = self.hit_points;
        state.action_points = self.action_points.min(self.max_action_points);
        state.life = if self.alive {
            LifeState::Alive
        } else {
            LifeState::Dead
        };
        state
    }
}

impl ZoneRecord {
    pub fn capture(id: ZoneId, zone: &Zone) -> Self {
        Self {
            id,
            name: zone.name.clone(),
            kind: zone.kind,
            target: zone.target.clone(),
            tiles: zone.tiles.iter().copied().collect(),
            owner: zone.owner,
        }
    }

    pub fn into_zone(self) -> (ZoneId, Zone) {
        let zone = Zone {
            name: self.name,
            kind: self.kind,
            target: self.target,
            tiles: self.tiles.into_iter().collect(),
            owner: self.owner,
        };
        (self.id, zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, position: Position) -> ObjectRecord {
        ObjectRecord {
            id: EntityId(id),
            name: "guard".into(),
            position,
            pending_path: Vec::new(),
            flags: ObjectFlags::BLOCKING,
            script: None,
            control_zone: None,
            character: Some(CharacterRecord {
                hit_points: ResourceMeter::full(10),
                action_points: 8,
                max_action_points: 8,
                affiliation: Affiliation::default(),
                alive: true,
            }),
        }
    }

    fn snapshot(objects: Vec<ObjectRecord>) -> LevelSnapshot {
        LevelSnapshot {
            version: SNAPSHOT_VERSION,
            level: "bunker".into(),
            player: None,
            objects,
            zones: Vec::new(),
            diplomacy: Diplomacy::new(),
        }
    }

    const DIMS: MapDimensions = MapDimensions::new(5, 5);

    #[test]
    fn valid_snapshot_passes() {
        let snapshot = snapshot(vec![record(1, Position::new(0, 0)), record(2, Position::new(1, 0))]);
        assert_eq!(snapshot.validate("bunker", DIMS), Ok(()));
    }

    #[test]
    fn out_of_bounds_object_is_rejected() {
        let snapshot = snapshot(vec![record(1, Position::new(5, 0))]);
        assert!(matches!(
            snapshot.validate("bunker", DIMS),
            Err(SnapshotError::ObjectOutOfBounds { .. })
        ));
    }

    #[test]
    fn two_blockers_on_one_tile_are_rejected() {
        let snapshot = snapshot(vec![record(1, Position::new(2, 2)), record(2, Position::new(2, 2))]);
        assert!(matches!(
            snapshot.validate("bunker", DIMS),
            Err(SnapshotError::TileConflict { .. })
        ));
    }

    #[test]
    fn dead_body_shares_tile_with_blocker() {
        let mut body = record(2, Position::new(2, 2));
        if let Some(character) = body.character.as_mut() {
            character.alive = false;
        }
        let snapshot = snapshot(vec![record(1, Position::new(2, 2)), body]);
        assert_eq!(snapshot.validate("bunker", DIMS), Ok(()));
    }

    #[test]
    fn wrong_level_or_version_is_rejected() {
        let mut snapshot = snapshot(Vec::new());
        assert!(matches!(
            snapshot.validate("vault", DIMS),
            Err(SnapshotError::LevelMismatch { .. })
        ));
        snapshot.version = 99;
        assert!(matches!(
            snapshot.validate("bunker", DIMS),
            Err(SnapshotError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn missing_player_and_control_zone_are_rejected() {
        let mut with_player = snapshot(Vec::new());
        with_player.player = Some(EntityId::PLAYER);
        assert_eq!(
            with_player.validate("bunker", DIMS),
            Err(SnapshotError::MissingPlayer(EntityId::PLAYER))
        );

        let mut guard = record(1, Position::new(0, 0));
        guard.control_zone = Some(ZoneId(3));
        assert!(matches!(
            snapshot(vec![guard]).validate("bunker", DIMS),
            Err(SnapshotError::MissingControlZone { .. })
        ));
    }

    #[test]
    fn records_rebuild_dead_characters() {
        let mut body = record(4, Position::new(1, 1));
        body.pending_path = vec![Position::new(2, 1)];
        if let Some(character) = body.character.as_mut() {
            character.alive = false;
        }

        let object = body.into_object();
        assert!(!object.is_alive());
        assert_eq!(object.animation, Animation::Death);
        assert_eq!(object.pending_path(), vec![Position::new(2, 1)]);
    }
}
