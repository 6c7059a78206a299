//! Player input: tile clicks and interaction menus.

use std::str::FromStr;

use tracing::debug;
use wasteland_core::{EntityId, GameConfig, InteractionKind, Position, QueuedCommand};

use super::LevelSession;
use crate::events::LevelEvent;
use crate::script::{ScriptValue, hooks};

/// Interaction menu waiting for the player's choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInteraction {
    pub target: EntityId,
    pub interactions: Vec<InteractionKind>,
}

/// What a tile click turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No player, no usable tile, or the session is not running.
    Ignored,
    /// An open interaction menu was dismissed.
    Cancelled,
    /// The only available interaction was ordered.
    Interacted(InteractionKind),
    /// Several interactions are available; a menu was opened.
    MenuOpened,
    /// The target is scripted but offers nothing.
    NoInteraction,
    MoveOrdered,
}

impl LevelSession {
    pub fn tile_clicked(&mut self, position: Position) -> ClickOutcome {
        if !self.accepts_input() {
            return ClickOutcome::Ignored;
        }
        if let Some(pending) = self.pending_interaction.take() {
            self.bus.publish(LevelEvent::InteractionCancelled {
                target: pending.target,
            });
            return ClickOutcome::Cancelled;
        }
        let Some(player) = self.state.player else {
            return ClickOutcome::Ignored;
        };
        if !self.state.object(player).is_some_and(|object| object.is_alive()) {
            return ClickOutcome::Ignored;
        }

        let outcome = if let Some(target) = self.interactable_at(position, player) {
            let interactions = self.available_interactions(target);
            match interactions.as_slice() {
                [] => {
                    debug!(%target, "no interactions available");
                    ClickOutcome::NoInteraction
                }
                [kind] => {
                    let kind = *kind;
                    self.interact_order_received(target, kind);
                    ClickOutcome::Interacted(kind)
                }
                _ => {
                    self.bus.publish(LevelEvent::InteractionRequired {
                        target,
                        interactions: interactions.clone(),
                    });
                    self.pending_interaction = Some(PendingInteraction {
                        target,
                        interactions,
                    });
                    ClickOutcome::MenuOpened
                }
            }
        } else if self.state.grid.is_walkable(position)
            && !self.state.grid.is_occupied(position)
            && self.order_move(player, position)
        {
            ClickOutcome::MoveOrdered
        } else {
            ClickOutcome::Ignored
        };

        self.settle();
        outcome
    }

    /// Resolves an interaction: the player walks next to the target, then the
    /// target's interaction hook runs. Any open menu is closed either way.
    pub fn interact_order_received(&mut self, target: EntityId, kind: InteractionKind) -> bool {
        self.pending_interaction = None;
        let Some(player) = self.state.player else {
            return false;
        };
        if self.state.object(target).is_none() {
            return false;
        }

        self.reset_queue(player);
        let Some(character) = self.state.character_mut(player) else {
            return false;
        };
        character.queue.push(QueuedCommand::Reach(target));
        character.queue.push(QueuedCommand::Interact { target, kind });
        self.run_queue(player);
        self.settle();
        true
    }

    /// Interactions offered by `target`'s script, deduplicated and capped.
    pub fn available_interactions(&mut self, target: EntityId) -> Vec<InteractionKind> {
        let player = ScriptValue::from(self.state.player);
        let Some(value) = self.call_hook(target, hooks::GET_AVAILABLE_INTERACTIONS, &[player])
        else {
            return Vec::new();
        };

        let mut interactions = Vec::new();
        for entry in value.as_list().unwrap_or_default() {
            let Some(name) = entry.as_str() else {
                debug!(%target, ?entry, "ignoring non-string interaction");
                continue;
            };
            match InteractionKind::from_str(name) {
                Ok(kind) if !interactions.contains(&kind) => interactions.push(kind),
                Ok(_) => {}
                Err(_) => debug!(%target, name, "ignoring unknown interaction"),
            }
        }
        interactions.truncate(GameConfig::MAX_INTERACTIONS);
        interactions
    }

    /// First scripted object on the tile other than the player.
    fn interactable_at(&self, position: Position, player: EntityId) -> Option<EntityId> {
        self.state.objects_at(position).into_iter().find(|id| {
            *id != player
                && self
                    .state
                    .object(*id)
                    .is_some_and(|object| object.script.is_some())
        })
    }
}
