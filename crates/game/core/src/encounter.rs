//! Turn order of an active fight.

use crate::state::EntityId;

/// Combatants act in join order. An empty roster means no combat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encounter {
    combatants: Vec<EntityId>,
    turn: Option<usize>,
    round: u32,
}

impl Encounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.combatants.is_empty()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.combatants.contains(&entity)
    }

    pub fn combatants(&self) -> &[EntityId] {
        &self.combatants
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Whose turn it is.
    pub fn current(&self) -> Option<EntityId> {
        self.turn.and_then(|index| self.combatants.get(index).copied())
    }

    /// Adds `entity` at the end of the turn order. The first combatant to join
    /// opens round one on its own turn.
    pub fn join(&mut self, entity: EntityId) -> bool {
        if self.contains(entity) {
            return false;
        }
        self.combatants.push(entity);
        if self.turn.is_none() {
            self.turn = Some(0);
            self.round = 1;
        }
        true
    }

    /// Removes `entity`. If it was acting, the next combatant inherits the turn.
    pub fn leave(&mut self, entity: EntityId) -> bool {
        let Some(index) = self.combatants.iter().position(|id| *id == entity) else {
            return false;
        };
        self.combatants.remove(index);

        self.turn = match self.turn {
            _ if self.combatants.is_empty() => None,
            Some(turn) if index < turn => Some(turn - 1),
            Some(turn) if turn >= self.combatants.len() => Some(0),
            other => other,
        };
        true
    }

    /// Passes the turn to the next combatant accepted by `can_act`, wrapping
    /// into a new round. Returns the new current combatant.
    pub fn advance(&mut self, mut can_act: impl FnMut(EntityId) -> bool) -> Option<EntityId> {
        let start = self.turn?;
        let len = self.combatants.len();

        for offset in 1..=len {
            let index = (start + offset) % len;
            if can_act(self.combatants[index]) {
                if index <= start {
                    self.round += 1;
                }
                self.turn = Some(index);
                return Some(self.combatants[index]);
            }
        }
        None
    }

    /// Clears the roster and returns who was in it.
    pub fn end(&mut self) -> Vec<EntityId> {
        self.turn = None;
        self.round = 0;
        std::mem::take(&mut self.combatants)
    }
}
