//! Authoritative level state.
//!
//! [`LevelState`] owns every dynamic object of a loaded level together with the
//! occupancy grid, the diplomacy tables, and the encounter roster. Objects are
//! addressed by [`EntityId`]; nothing outside the level holds references to them.
mod common;
mod error;

pub use common::{CardinalDirection, EntityId, Position, RenderPosition, ResourceMeter};
pub use error::StateError;

use std::collections::BTreeMap;

use crate::diplomacy::Diplomacy;
use crate::encounter::Encounter;
use crate::grid::OccupancyGrid;
use crate::object::{CharacterState, DynamicObject};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelState {
    pub name: String,
    pub objects: BTreeMap<EntityId, DynamicObject>,
    pub grid: OccupancyGrid,
    pub diplomacy: Diplomacy,
    pub encounter: Encounter,
    pub player: Option<EntityId>,

    /// Sequential id allocator. Never reuses ids.
    next_entity_id: u32,
}

impl LevelState {
    pub fn new(name: impl Into<String>, grid: OccupancyGrid) -> Self {
        Self {
            name: name.into(),
            objects: BTreeMap::new(),
            grid,
            diplomacy: Diplomacy::new(),
            encounter: Encounter::new(),
            player: None,
            next_entity_id: EntityId::PLAYER.0 + 1,
        }
    }

    /// Allocates a fresh id. [`EntityId::PLAYER`] is never handed out.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Adds an object and, if it blocks and is alive, claims its tile.
    ///
    /// Rejects placements that would corrupt the grid. Zone membership is not
    /// evaluated here.
    pub fn insert_object(&mut self, object: DynamicObject) -> Result<(), StateError> {
        let id = object.id;
        if self.objects.contains_key(&id) {
            return Err(StateError::DuplicateEntity(id));
        }
        if !self.grid.contains(object.position) {
            return Err(StateError::PositionOutOfBounds {
                entity: id,
                position: object.position,
            });
        }
        if let Some(position) = object.pending_path().into_iter().find(|p| !self.grid.contains(*p)) {
            return Err(StateError::PathOutOfBounds {
                entity: id,
                position,
            });
        }
        if object.is_blocking() && object.is_alive() {
            if let Some(occupant) = self.grid.occupant(object.position)
                && occupant != id
            {
                return Err(StateError::PositionOccupied {
                    entity: id,
                    position: object.position,
                    occupant,
                });
            }
            self.grid.move_object(id, object.position);
        }

        self.next_entity_id = self.next_entity_id.max(id.0 + 1);
        self.objects.insert(id, object);
        Ok(())
    }

    /// Removes an object and releases its tile and zone memberships.
    pub fn remove_object(&mut self, id: EntityId) -> Option<DynamicObject> {
        let mut object = self.objects.remove(&id)?;
        self.grid.remove_object(id);
        self.grid.forget_object(id);
        self.encounter.leave(id);
        if let Some(state) = object.as_character_mut() {
            self.diplomacy.leave(id, &mut state.affiliation);
        }
        if self.player == Some(id) {
            self.player = None;
        }
        Some(object)
    }

    pub fn object(&self, id: EntityId) -> Option<&DynamicObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: EntityId) -> Option<&mut DynamicObject> {
        self.objects.get_mut(&id)
    }

    pub fn character(&self, id: EntityId) -> Option<&CharacterState> {
        self.object(id).and_then(DynamicObject::as_character)
    }

    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut CharacterState> {
        self.object_mut(id).and_then(DynamicObject::as_character_mut)
    }

    pub fn player_object(&self) -> Option<&DynamicObject> {
        self.player.and_then(|id| self.object(id))
    }

    /// Objects whose logical position is `position`, blocking occupant first.
    pub fn objects_at(&self, position: Position) -> Vec<EntityId> {
        let occupant = self.grid.occupant(position);
        occupant
            .into_iter()
            .chain(
                self.objects
                    .values()
                    .filter(|object| object.position == position && Some(object.id) != occupant)
                    .map(|object| object.id),
            )
            .collect()
    }

    pub fn is_in_combat(&self, id: EntityId) -> bool {
        self.encounter.contains(id)
    }

    pub fn is_ally(&self, a: EntityId, b: EntityId) -> bool {
        match (self.character(a), self.character(b)) {
            (Some(a), Some(b)) => self.diplomacy.is_ally(&a.affiliation, &b.affiliation),
            _ => false,
        }
    }

    pub fn is_enemy(&self, a: EntityId, b: EntityId) -> bool {
        match (self.character(a), self.character(b)) {
            (Some(a), Some(b)) => self.diplomacy.is_enemy(&a.affiliation, &b.affiliation),
            _ => false,
        }
    }
}
