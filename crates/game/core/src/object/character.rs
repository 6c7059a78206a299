use super::ActionQueue;
use crate::diplomacy::Affiliation;
use crate::state::ResourceMeter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum LifeState {
    #[default]
    Alive,
    /// Terminal.
    Dead,
}

/// Outcome of [`CharacterState::take_damage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Already dead; nothing changed.
    Ignored,
    Survived { hit_points: u32 },
    Killed,
}

/// Combat-capable part of a dynamic object.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterState {
    pub hit_points: ResourceMeter,
    pub action_points: u32,
    pub max_action_points: u32,
    pub affiliation: Affiliation,
    pub life: LifeState,
    pub queue: ActionQueue,
}

impl CharacterState {
    pub fn new(hit_points: u32, max_action_points: u32, affiliation: Affiliation) -> Self {
        Self {
            hit_points: ResourceMeter::full(hit_points),
            action_points: max_action_points,
            max_action_points,
            affiliation,
            life: LifeState::Alive,
            queue: ActionQueue::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }

    /// Start-of-turn refill.
    pub fn reset_action_points(&mut self) {
        self.action_points = self.max_action_points;
    }

    /// Spends `amount` action points if the balance allows it.
    ///
    /// Outside combat nothing is deducted and living characters always succeed.
    /// A rejected request leaves the balance untouched.
    pub fn use_action_points(&mut self, amount: u32, in_combat: bool) -> bool {
        if !in_combat || !self.is_alive() {
            return self.is_alive();
        }
        match self.action_points.checked_sub(amount) {
            Some(remaining) => {
                self.action_points = remaining;
                true
            }
            None => false,
        }
    }

    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::Ignored;
        }
        self.hit_points.current = self.hit_points.current.saturating_sub(amount);
        if self.hit_points.is_depleted() {
            self.life = LifeState::Dead;
            self.action_points = 0;
            self.queue.reset();
            DamageOutcome::Killed
        } else {
            DamageOutcome::Survived {
                hit_points: self.hit_points.current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> CharacterState {
        CharacterState::new(10, 6, Affiliation::default())
    }

    #[test]
    fn spending_is_gated_in_combat() {
        let mut character = fighter();

        assert!(character.use_action_points(4, true));
        assert!(!character.use_action_points(3, true));
        assert_eq!(character.action_points, 2);
        assert!(character.use_action_points(2, true));
        assert_eq!(character.action_points, 0);

        character.reset_action_points();
        assert_eq!(character.action_points, 6);
    }

    #[test]
    fn exploration_is_free() {
        let mut character = fighter();
        assert!(character.use_action_points(100, false));
        assert_eq!(character.action_points, 6);
    }

    #[test]
    fn dead_characters_cannot_act() {
        let mut character = fighter();
        character.take_damage(10);
        assert!(!character.use_action_points(0, false));
        assert!(!character.use_action_points(0, true));
    }

    #[test]
    fn death_happens_once() {
        let mut character = fighter();

        assert_eq!(
            character.take_damage(4),
            DamageOutcome::Survived { hit_points: 6 }
        );
        assert_eq!(character.take_damage(6), DamageOutcome::Killed);
        assert_eq!(character.take_damage(6), DamageOutcome::Ignored);
        assert_eq!(character.life, LifeState::Dead);
        assert_eq!(character.hit_points.current, 0);
    }

    #[test]
    fn overkill_saturates() {
        let mut character = fighter();
        assert_eq!(character.take_damage(50), DamageOutcome::Killed);
        assert_eq!(character.hit_points.current, 0);
    }
}
