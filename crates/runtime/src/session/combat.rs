//! Damage, death, action points, and the encounter roster.

use tracing::{debug, trace};
use wasteland_core::{
    Animation, DamageOutcome, DynamicObject, EntityId, Escalation, ObjectFlags, Position,
};

use super::LevelSession;
use crate::events::LevelEvent;
use crate::script::{ScriptValue, hooks};

impl LevelSession {
    /// Applies damage to a character.
    ///
    /// A survivor that was neither ally nor enemy of the dealer turns hostile
    /// towards it and both are pulled into combat. A kill releases the tile,
    /// drops the queue, and fires the death hook exactly once.
    pub fn take_damage(
        &mut self,
        victim: EntityId,
        amount: u32,
        dealer: Option<EntityId>,
    ) -> DamageOutcome {
        let Some(character) = self.state.character_mut(victim) else {
            return DamageOutcome::Ignored;
        };
        let outcome = character.take_damage(amount);

        match outcome {
            DamageOutcome::Ignored => trace!(%victim, "damage on a dead character"),
            DamageOutcome::Survived { hit_points } => {
                {
                    let (_, mut cx) = self.split();
                    cx.set_animation(victim, Animation::Damaged);
                }
                self.bus.publish(LevelEvent::Damaged {
                    victim,
                    dealer,
                    amount,
                    remaining: hit_points,
                });
                self.call_hook(
                    victim,
                    hooks::ON_DAMAGE_TAKEN,
                    &[ScriptValue::from(amount), ScriptValue::from(dealer)],
                );
                if let Some(dealer) = dealer
                    && dealer != victim
                    && !self.state.is_ally(victim, dealer)
                    && !self.state.is_enemy(victim, dealer)
                {
                    self.escalate(victim, dealer);
                }
            }
            DamageOutcome::Killed => self.kill(victim, amount, dealer),
        }

        self.settle();
        outcome
    }

    fn kill(&mut self, victim: EntityId, amount: u32, dealer: Option<EntityId>) {
        self.bus.publish(LevelEvent::Damaged {
            victim,
            dealer,
            amount,
            remaining: 0,
        });
        if let Some(object) = self.state.object_mut(victim) {
            object.flags.remove(ObjectFlags::BLOCKING);
        }
        {
            let (orchestrator, mut cx) = self.split();
            cx.set_animation(victim, Animation::Death);
            orchestrator.on_character_died(&mut cx, victim);
        }
        debug!(%victim, ?dealer, "character killed");
        self.bus.publish(LevelEvent::Killed { victim, dealer });
        self.call_hook(victim, hooks::ON_DIED, &[ScriptValue::from(dealer)]);

        if self.pending_interaction.as_ref().is_some_and(|p| p.target == victim) {
            self.pending_interaction = None;
        }
        let was_acting = self.state.encounter.current() == Some(victim);
        self.state.encounter.leave(victim);
        self.check_combat_end();
        if was_acting && let Some(next) = self.state.encounter.current() {
            self.start_turn(next);
        }
    }

    /// First hit between strangers: the victim records the dealer as an enemy
    /// and both are asked to join combat, even when no flag is left to record it.
    fn escalate(&mut self, victim: EntityId, dealer: EntityId) {
        let (Some(mut subject), Some(mut other)) = (
            self.state.character(victim).map(|c| c.affiliation),
            self.state.character(dealer).map(|c| c.affiliation),
        ) else {
            return;
        };

        let escalation = self.state.diplomacy.set_as_enemy(&mut subject, &mut other);
        if escalation == Escalation::Impossible {
            debug!(%victim, %dealer, "hostility could not be recorded");
        } else {
            if let Some(character) = self.state.character_mut(victim) {
                character.affiliation = subject;
            }
            if let Some(character) = self.state.character_mut(dealer) {
                character.affiliation = other;
            }
            debug!(%victim, %dealer, ?escalation, "first hit escalated to hostility");
        }

        self.bus.publish(LevelEvent::RequiresJoinCombat {
            object: victim,
            opponent: Some(dealer),
        });
    }

    // ========================================================================
    // Action points
    // ========================================================================

    /// Spends action points. Always succeeds outside combat; in combat an
    /// over-budget request is rejected and the balance stays unchanged.
    pub fn use_action_points(&mut self, actor: EntityId, amount: u32) -> bool {
        let spent = self.spend_action_points(actor, amount);
        self.settle();
        spent
    }

    pub(crate) fn spend_action_points(&mut self, actor: EntityId, amount: u32) -> bool {
        let in_combat = self.state.is_in_combat(actor);
        let Some(character) = self.state.character_mut(actor) else {
            return false;
        };
        if !character.use_action_points(amount, in_combat) {
            return false;
        }
        if in_combat && amount > 0 {
            let remaining = character.action_points;
            self.bus.publish(LevelEvent::ActionPointsChanged {
                object: actor,
                remaining,
            });
        }
        true
    }

    // ========================================================================
    // Encounter
    // ========================================================================

    pub fn is_in_combat(&self, actor: EntityId) -> bool {
        self.state.is_in_combat(actor)
    }

    pub fn join_combat(&mut self, actor: EntityId) -> bool {
        let joined = self.enter_combat(actor);
        self.settle();
        joined
    }

    pub(crate) fn enter_combat(&mut self, actor: EntityId) -> bool {
        if !self.state.character(actor).is_some_and(|c| c.is_alive()) {
            return false;
        }
        if !self.state.encounter.join(actor) {
            return false;
        }
        debug!(%actor, "joined combat");
        self.bus.publish(LevelEvent::CombatJoined { object: actor });
        if self.state.encounter.current() == Some(actor) {
            self.start_turn(actor);
        }
        true
    }

    /// Passes the turn to the next living combatant.
    pub fn end_turn(&mut self) -> Option<EntityId> {
        let objects = &self.state.objects;
        let next = self
            .state
            .encounter
            .advance(|id| objects.get(&id).is_some_and(DynamicObject::is_alive))?;
        self.start_turn(next);
        self.settle();
        Some(next)
    }

    fn start_turn(&mut self, actor: EntityId) {
        let round = self.state.encounter.round();
        let Some(character) = self.state.character_mut(actor) else {
            return;
        };
        character.reset_action_points();
        let remaining = character.action_points;

        self.bus.publish(LevelEvent::TurnStarted {
            object: actor,
            round,
        });
        self.bus.publish(LevelEvent::ActionPointsChanged {
            object: actor,
            remaining,
        });
        self.call_hook(actor, hooks::ON_TURN_STARTED, &[ScriptValue::from(round)]);
    }

    /// Ends the encounter once no two living combatants are hostile.
    pub(crate) fn check_combat_end(&mut self) {
        if !self.state.encounter.is_active() {
            return;
        }
        let living: Vec<EntityId> = self
            .state
            .encounter
            .combatants()
            .iter()
            .copied()
            .filter(|id| self.state.character(*id).is_some_and(|c| c.is_alive()))
            .collect();

        let hostile = living.iter().enumerate().any(|(index, a)| {
            living[index + 1..]
                .iter()
                .any(|b| self.state.is_enemy(*a, *b))
        });
        if hostile {
            return;
        }

        for id in self.state.encounter.end() {
            if let Some(character) = self.state.character_mut(id)
                && character.is_alive()
            {
                character.reset_action_points();
            }
        }
        debug!(level = %self.state.name, "combat ended");
        self.bus.publish(LevelEvent::CombatEnded);
    }

    /// Pulls idle characters into combat when a living enemy comes within
    /// the detection radius.
    pub(crate) fn detect_hostiles(&mut self) {
        let radius = self.config.game.detection_radius;
        let living: Vec<(EntityId, Position)> = self
            .state
            .objects
            .values()
            .filter(|object| object.is_character() && object.is_alive())
            .map(|object| (object.id, object.position))
            .collect();

        let mut pairs = Vec::new();
        for (watcher, position) in &living {
            if self.state.player == Some(*watcher) || self.state.is_in_combat(*watcher) {
                continue;
            }
            let spotted = living.iter().find(|(other, other_position)| {
                other != watcher
                    && position.chebyshev_distance(*other_position) <= radius
                    && self.state.is_enemy(*watcher, *other)
            });
            if let Some((other, _)) = spotted {
                pairs.push((*watcher, *other));
            }
        }

        for (watcher, other) in pairs {
            debug!(%watcher, %other, "hostile in sight");
            self.enter_combat(watcher);
            self.enter_combat(other);
        }
    }
}
