//! Dynamic objects: anything placed on a level that can move, be scripted, or
//! fight. Combat-capable objects carry a [`CharacterState`]; callers reach it
//! through [`DynamicObject::as_character`] rather than assuming it exists.
mod character;
mod interaction;
mod queue;

pub use character::{CharacterState, DamageOutcome, LifeState};
pub use interaction::{InteractionKind, skill_callback};
pub use queue::{ActionQueue, QueuedAction, QueuedCommand};

use std::collections::VecDeque;

use bitflags::bitflags;

use crate::grid::ZoneId;
use crate::state::{EntityId, Position, RenderPosition};

bitflags! {
    /// Placement behaviour of a dynamic object.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ObjectFlags: u8 {
        /// Holds its tile in the occupancy grid.
        const BLOCKING = 1 << 0;
        /// Render placement is owned by the presentation layer.
        const FLOATING = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Animation {
    #[default]
    Idle,
    Walk,
    Damaged,
    Death,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    Prop,
    Character(CharacterState),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamicObject {
    pub id: EntityId,
    pub name: String,
    /// Last tile the object fully reached.
    pub position: Position,
    /// Tile of the step currently being animated.
    pub in_flight: Option<Position>,
    /// Tiles still to traverse after `in_flight`.
    pub path: VecDeque<Position>,
    pub flags: ObjectFlags,
    pub script: Option<String>,
    pub animation: Animation,
    pub render_position: Option<RenderPosition>,
    pub control_zone: Option<ZoneId>,
    pub kind: ObjectKind,
}

impl DynamicObject {
    pub fn prop(id: EntityId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            in_flight: None,
            path: VecDeque::new(),
            flags: ObjectFlags::empty(),
            script: None,
            animation: Animation::Idle,
            render_position: None,
            control_zone: None,
            kind: ObjectKind::Prop,
        }
    }

    pub fn character(
        id: EntityId,
        name: impl Into<String>,
        position: Position,
        state: CharacterState,
    ) -> Self {
        Self {
            flags: ObjectFlags::BLOCKING,
            kind: ObjectKind::Character(state),
            ..Self::prop(id, name, position)
        }
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn as_character(&self) -> Option<&CharacterState> {
        match &self.kind {
            ObjectKind::Character(state) => Some(state),
            ObjectKind::Prop => None,
        }
    }

    pub fn as_character_mut(&mut self) -> Option<&mut CharacterState> {
        match &mut self.kind {
            ObjectKind::Character(state) => Some(state),
            ObjectKind::Prop => None,
        }
    }

    pub fn is_character(&self) -> bool {
        matches!(self.kind, ObjectKind::Character(_))
    }

    pub fn is_blocking(&self) -> bool {
        self.flags.contains(ObjectFlags::BLOCKING)
    }

    pub fn is_floating(&self) -> bool {
        self.flags.contains(ObjectFlags::FLOATING)
    }

    pub fn is_moving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Dead characters stay on the level as non-blocking bodies.
    pub fn is_alive(&self) -> bool {
        self.as_character().is_none_or(CharacterState::is_alive)
    }

    /// Tile the object will occupy once its current step lands.
    pub fn planned_position(&self) -> Position {
        self.in_flight.unwrap_or(self.position)
    }

    /// Remaining route, including the step in flight.
    pub fn pending_path(&self) -> Vec<Position> {
        self.in_flight.iter().chain(self.path.iter()).copied().collect()
    }

    /// Drops the remaining route. A step already in flight still lands.
    pub fn clear_path(&mut self) {
        self.path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diplomacy::Affiliation;

    #[test]
    fn capability_check_replaces_downcast() {
        let crate_prop = DynamicObject::prop(EntityId(1), "crate", Position::ORIGIN);
        let raider = DynamicObject::character(
            EntityId(2),
            "raider",
            Position::ORIGIN,
            CharacterState::new(5, 4, Affiliation::default()),
        );

        assert!(crate_prop.as_character().is_none());
        assert!(!crate_prop.is_blocking());
        assert!(raider.as_character().is_some());
        assert!(raider.is_blocking());
    }

    #[test]
    fn pending_path_starts_with_step_in_flight() {
        let mut object = DynamicObject::prop(EntityId(1), "cart", Position::ORIGIN);
        object.in_flight = Some(Position::new(1, 0));
        object.path.push_back(Position::new(2, 0));

        assert_eq!(object.planned_position(), Position::new(1, 0));
        assert_eq!(
            object.pending_path(),
            vec![Position::new(1, 0), Position::new(2, 0)]
        );
    }
}
