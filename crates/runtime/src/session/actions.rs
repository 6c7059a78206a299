//! Action queue processing.
//!
//! Each character consumes its queue strictly in order. An entry either
//! finishes on the spot, waits for an external completion (a step landing or
//! the next frame), or fails and aborts the rest of the queue.

use tracing::debug;
use wasteland_core::{EntityId, Position, QueuedAction, QueuedCommand, skill_callback};

use super::LevelSession;
use crate::events::LevelEvent;
use crate::script::ScriptValue;

/// How starting a queue entry went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStart {
    Done,
    /// Completion arrives later through `movement_finished` or a frame update.
    Waiting,
    Failed,
}

impl LevelSession {
    /// Appends an entry to a character's queue and starts it if the queue was idle.
    pub fn enqueue(&mut self, actor: EntityId, action: impl Into<QueuedAction>) -> bool {
        let Some(character) = self.state.character_mut(actor) else {
            return false;
        };
        if !character.is_alive() {
            return false;
        }
        character.queue.push(action);
        self.run_queue(actor);
        self.settle();
        true
    }

    /// Drops every queued entry. A step already in flight still lands.
    pub fn reset_queue(&mut self, actor: EntityId) -> bool {
        let had_work = self
            .state
            .character_mut(actor)
            .is_some_and(|character| character.queue.reset());
        if let Some(object) = self.state.object_mut(actor) {
            object.clear_path();
        }
        had_work
    }

    /// Replaces whatever `actor` was doing with a walk to `target`.
    pub(crate) fn order_move(&mut self, actor: EntityId, target: Position) -> bool {
        self.reset_queue(actor);
        let Some(character) = self.state.character_mut(actor) else {
            return false;
        };
        character.queue.push(QueuedCommand::MoveTo(target));
        self.run_queue(actor);
        self.state
            .object(actor)
            .is_some_and(|object| object.is_moving() || object.position == target)
    }

    /// Starts queued entries until one has to wait or the queue runs dry.
    pub(crate) fn run_queue(&mut self, actor: EntityId) {
        loop {
            let Some(action) = self
                .state
                .character_mut(actor)
                .and_then(|character| character.queue.begin_next().cloned())
            else {
                return;
            };

            match self.start_action(actor, &action.command) {
                ActionStart::Done => self.complete_current(actor),
                ActionStart::Waiting => return,
                ActionStart::Failed => {
                    debug!(%actor, command = ?action.command, "queued action failed");
                    self.abort_queue(actor);
                    return;
                }
            }
        }
    }

    fn start_action(&mut self, actor: EntityId, command: &QueuedCommand) -> ActionStart {
        match command {
            QueuedCommand::MoveTo(target) => self.start_walk(actor, *target),
            QueuedCommand::Reach(target) => match self.interaction_position_for(actor, *target) {
                Some(tile) => self.start_walk(actor, tile),
                None => ActionStart::Failed,
            },
            QueuedCommand::Interact { target, kind } => {
                if self.state.object(*target).is_none() {
                    return ActionStart::Failed;
                }
                if !self.pay_for(actor, command) {
                    return ActionStart::Failed;
                }
                self.bus.publish(LevelEvent::InteractionTriggered {
                    actor,
                    target: *target,
                    kind: *kind,
                });
                self.call_hook(*target, kind.callback(), &[ScriptValue::Object(actor)]);
                ActionStart::Done
            }
            QueuedCommand::UseSkill { target, skill } => {
                let Some(name) = self.state.object(*target).map(|object| object.name.clone()) else {
                    return ActionStart::Failed;
                };
                if !self.pay_for(actor, command) {
                    return ActionStart::Failed;
                }
                let method = skill_callback(skill);
                if self.scripts.has_method(*target, &method) {
                    self.call_hook(*target, &method, &[ScriptValue::Object(actor)]);
                } else {
                    self.console(format!("You use {skill} on {name}. It does nothing."));
                }
                ActionStart::Done
            }
            QueuedCommand::Wait => ActionStart::Waiting,
        }
    }

    fn start_walk(&mut self, actor: EntityId, target: Position) -> ActionStart {
        let started = {
            let (orchestrator, mut cx) = self.split();
            orchestrator.move_to(&mut cx, actor, target)
        };
        match self.state.object(actor) {
            Some(object) if started && object.is_moving() => ActionStart::Waiting,
            Some(_) if started => ActionStart::Done,
            _ => ActionStart::Failed,
        }
    }

    fn pay_for(&mut self, actor: EntityId, command: &QueuedCommand) -> bool {
        let cost = command.ap_cost(&self.config.game);
        if self.spend_action_points(actor, cost) {
            return true;
        }
        if self.state.player == Some(actor) {
            self.console("Not enough action points.".to_string());
        }
        false
    }

    /// Retires the running entry, runs its completion callback, and reports
    /// the queue as completed once nothing is left.
    pub(crate) fn complete_current(&mut self, actor: EntityId) {
        let Some(action) = self
            .state
            .character_mut(actor)
            .and_then(|character| character.queue.finish_current())
        else {
            return;
        };
        self.bus.publish(LevelEvent::ActionCompleted {
            object: actor,
            command: action.command,
        });
        if let Some(method) = action.on_complete {
            self.call_hook(actor, &method, &[]);
        }

        let idle = self
            .state
            .character(actor)
            .is_some_and(|character| character.queue.is_idle());
        if idle {
            let (orchestrator, mut cx) = self.split();
            orchestrator.announce_queue_completed(&mut cx, actor);
        }
    }

    fn abort_queue(&mut self, actor: EntityId) {
        if let Some(character) = self.state.character_mut(actor) {
            character.queue.reset();
        }
        let (orchestrator, mut cx) = self.split();
        orchestrator.announce_queue_completed(&mut cx, actor);
    }

    pub(crate) fn current_action_is_movement(&self, actor: EntityId) -> bool {
        self.state
            .character(actor)
            .and_then(|character| character.queue.current())
            .is_some_and(|action| {
                matches!(
                    action.command,
                    QueuedCommand::MoveTo(_) | QueuedCommand::Reach(_)
                )
            })
    }

    /// Completes `Wait` entries; runs once per frame.
    pub(crate) fn finish_waits(&mut self) {
        let waiting: Vec<EntityId> = self
            .state
            .objects
            .values()
            .filter(|object| {
                object
                    .as_character()
                    .and_then(|character| character.queue.current())
                    .is_some_and(|action| action.command == QueuedCommand::Wait)
            })
            .map(|object| object.id)
            .collect();

        for actor in waiting {
            self.complete_current(actor);
            self.run_queue(actor);
        }
    }

    pub(crate) fn console(&mut self, text: String) {
        self.bus.publish(LevelEvent::ConsoleMessage { text });
    }
}
