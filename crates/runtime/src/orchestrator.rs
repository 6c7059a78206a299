//! Grid orchestrator: turns discrete step completions into path traversal and
//! zone membership changes into script hooks.
//!
//! The orchestrator holds ids only. All object, grid, and zone data lives in the
//! [`LevelState`] owned by the session and is lent to each call through a
//! [`LevelContext`].

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};
use wasteland_core::{
    Animation, EntityId, LevelState, Position, Zone, ZoneId, ZoneTransition,
};

use crate::config::SessionConfig;
use crate::events::{EventBus, LevelEvent, PathStopReason};
use crate::script::{ScriptEngine, ScriptValue, hooks, invoke};

/// Mutable view of a level lent to orchestrator and session helpers.
pub struct LevelContext<'a> {
    pub state: &'a mut LevelState,
    pub bus: &'a mut EventBus,
    pub scripts: &'a mut dyn ScriptEngine,
    pub config: &'a SessionConfig,
}

impl LevelContext<'_> {
    pub fn call_hook(
        &mut self,
        object: EntityId,
        method: &str,
        args: &[ScriptValue],
    ) -> Option<ScriptValue> {
        invoke(&mut *self.scripts, object, method, args)
    }

    pub fn set_animation(&mut self, object: EntityId, animation: Animation) {
        if let Some(entry) = self.state.object_mut(object)
            && entry.animation != animation
        {
            entry.animation = animation;
            self.bus
                .publish(LevelEvent::AnimationChanged { object, animation });
        }
    }
}

/// Result of delivering a step completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The object is unknown, unobserved, or had no step in flight.
    Ignored,
    /// Landed and started the next step.
    Continued,
    /// Landed on the last tile of the path.
    Arrived,
    /// Landed, but the next step could not start; the queue was reset.
    Stopped(PathStopReason),
}

#[derive(Debug, Default)]
pub struct GridOrchestrator {
    observed: BTreeSet<EntityId>,
}

impl GridOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts observing movement and death of a character. Props are not observed.
    pub fn register_dynamic_object(&mut self, state: &LevelState, object: EntityId) -> bool {
        if state.character(object).is_some() {
            self.observed.insert(object)
        } else {
            false
        }
    }

    /// Stops observing `object`, drops its route, and returns it to idle.
    ///
    /// A step already in flight is landed on the spot since its tile is
    /// already held in the grid. Calling it again is a no-op.
    pub fn unregister_dynamic_object(&mut self, cx: &mut LevelContext<'_>, object: EntityId) {
        if !self.observed.remove(&object) {
            return;
        }
        if let Some(entry) = cx.state.object_mut(object) {
            entry.path.clear();
            if let Some(tile) = entry.in_flight.take() {
                entry.position = tile;
            }
        }
        cx.set_animation(object, Animation::Idle);
    }

    pub fn is_observed(&self, object: EntityId) -> bool {
        self.observed.contains(&object)
    }

    pub fn observed(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.observed.iter().copied()
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Routes `object` to `target`.
    ///
    /// The new route is computed from the tile the object will stand on once
    /// its current step lands, and replaces whatever was queued after that
    /// step. An idle object starts walking at once; an empty route reports
    /// arrival immediately. Returns `false` if there is no route or the first
    /// step cannot start.
    pub fn move_to(&mut self, cx: &mut LevelContext<'_>, object: EntityId, target: Position) -> bool {
        if !self.is_observed(object) {
            debug!(%object, "move_to on unobserved object");
            return false;
        }
        let Some(entry) = cx.state.object(object) else {
            return false;
        };
        let origin = entry.planned_position();
        let moving = entry.is_moving();

        let Some(path) = cx.state.grid.find_path(origin, target) else {
            debug!(%object, from = %origin, to = %target, "no path");
            cx.bus.publish(LevelEvent::PathBlocked {
                object,
                at: origin,
                reason: PathStopReason::NoPath,
            });
            return false;
        };

        let Some(entry) = cx.state.object_mut(object) else {
            return false;
        };
        entry.path = path.into();

        if moving {
            return true;
        }
        if entry.path.is_empty() {
            cx.bus.publish(LevelEvent::DestinationReached {
                object,
                position: origin,
            });
            return true;
        }

        match self.start_next_step(cx, object) {
            Ok(()) => true,
            Err(reason) => {
                if let Some(entry) = cx.state.object_mut(object) {
                    entry.path.clear();
                }
                cx.bus.publish(LevelEvent::PathBlocked {
                    object,
                    at: origin,
                    reason,
                });
                false
            }
        }
    }

    /// Claims the next tile of the route and hands the step to the presentation layer.
    fn start_next_step(
        &mut self,
        cx: &mut LevelContext<'_>,
        object: EntityId,
    ) -> Result<(), PathStopReason> {
        let in_combat = cx.state.is_in_combat(object);
        let step_cost = cx.config.game.movement_ap_cost;

        let Some(entry) = cx.state.object(object) else {
            return Err(PathStopReason::Blocked);
        };
        let Some(next) = entry.path.front().copied() else {
            return Err(PathStopReason::Blocked);
        };
        if !entry.is_alive() {
            return Err(PathStopReason::Blocked);
        }
        if in_combat
            && entry
                .as_character()
                .is_some_and(|character| character.action_points < step_cost)
        {
            return Err(PathStopReason::OutOfActionPoints);
        }
        if entry.is_blocking() && !cx.state.grid.move_object(object, next) {
            debug!(%object, tile = %next, "next tile is occupied");
            return Err(PathStopReason::Blocked);
        }

        let render = cx.config.render_position(next);
        let Some(entry) = cx.state.object_mut(object) else {
            return Err(PathStopReason::Blocked);
        };
        let from = entry.position;
        entry.path.pop_front();
        entry.in_flight = Some(next);

        if in_combat && let Some(character) = entry.as_character_mut() {
            character.use_action_points(step_cost, true);
            let remaining = character.action_points;
            cx.bus.publish(LevelEvent::ActionPointsChanged { object, remaining });
        }
        cx.set_animation(object, Animation::Walk);
        cx.bus.publish(LevelEvent::MoveStarted {
            object,
            from,
            to: next,
            render,
        });
        Ok(())
    }

    /// Handles the presentation layer reporting that a step has landed.
    pub fn on_movement_finished(
        &mut self,
        cx: &mut LevelContext<'_>,
        object: EntityId,
    ) -> StepOutcome {
        if !self.is_observed(object) {
            trace!(%object, "movement finished for unobserved object");
            return StepOutcome::Ignored;
        }
        let Some(entry) = cx.state.object_mut(object) else {
            return StepOutcome::Ignored;
        };
        let Some(tile) = entry.in_flight.take() else {
            trace!(%object, "movement finished with no step in flight");
            return StepOutcome::Ignored;
        };
        entry.position = tile;
        if !entry.is_floating() {
            entry.render_position = Some(cx.config.render_position(tile));
        }
        let has_more = !entry.path.is_empty();

        self.trigger_zones(cx, object, tile);

        if !has_more {
            cx.set_animation(object, Animation::Idle);
            cx.bus.publish(LevelEvent::DestinationReached {
                object,
                position: tile,
            });
            return StepOutcome::Arrived;
        }

        match self.start_next_step(cx, object) {
            Ok(()) => StepOutcome::Continued,
            Err(reason) => {
                if let Some(entry) = cx.state.object_mut(object) {
                    entry.path.clear();
                }
                if let Some(character) = cx.state.character_mut(object) {
                    character.queue.reset();
                }
                cx.set_animation(object, Animation::Idle);
                self.announce_queue_completed(cx, object);
                cx.bus.publish(LevelEvent::PathBlocked {
                    object,
                    at: tile,
                    reason,
                });
                StepOutcome::Stopped(reason)
            }
        }
    }

    /// Restarts a route left without a step in flight (after a restore).
    pub fn resume_path(&mut self, cx: &mut LevelContext<'_>, object: EntityId) -> bool {
        let stalled = cx
            .state
            .object(object)
            .is_some_and(|entry| !entry.is_moving() && !entry.path.is_empty());
        if !stalled || !self.is_observed(object) {
            return false;
        }
        match self.start_next_step(cx, object) {
            Ok(()) => true,
            Err(reason) => {
                let at = cx.state.object_mut(object).map(|entry| {
                    entry.path.clear();
                    entry.position
                });
                if let Some(at) = at {
                    cx.bus.publish(LevelEvent::PathBlocked { object, at, reason });
                }
                false
            }
        }
    }

    pub fn announce_queue_completed(&mut self, cx: &mut LevelContext<'_>, object: EntityId) {
        cx.bus.publish(LevelEvent::QueueCompleted { object });
        cx.call_hook(object, hooks::ON_ACTION_QUEUE_COMPLETED, &[]);
    }

    // ========================================================================
    // Teleports and death
    // ========================================================================

    /// Unconditional placement that bypasses pathfinding.
    ///
    /// Blocking objects are only moved onto free tiles; the call fails without
    /// changes otherwise. Zones are evaluated at the new tile.
    pub fn set_object_position(
        &mut self,
        cx: &mut LevelContext<'_>,
        object: EntityId,
        position: Position,
    ) -> bool {
        let Some(entry) = cx.state.object(object) else {
            return false;
        };
        if !cx.state.grid.contains(position) {
            warn!(%object, %position, "teleport outside the map");
            return false;
        }
        if entry.is_blocking() && entry.is_alive() && !cx.state.grid.move_object(object, position) {
            warn!(%object, %position, "teleport onto an occupied tile");
            return false;
        }

        let render = cx.config.render_position(position);
        if let Some(entry) = cx.state.object_mut(object) {
            entry.path.clear();
            entry.in_flight = None;
            entry.position = position;
            if !entry.is_floating() {
                entry.render_position = Some(render);
            }
        }
        cx.bus.publish(LevelEvent::Teleported { object, position });
        self.trigger_zones(cx, object, position);
        true
    }

    /// Character teleport: also drops the walk animation of an interrupted route.
    pub fn set_character_position(
        &mut self,
        cx: &mut LevelContext<'_>,
        object: EntityId,
        position: Position,
    ) -> bool {
        let placed = self.set_object_position(cx, object, position);
        if placed {
            cx.set_animation(object, Animation::Idle);
        }
        placed
    }

    /// Releases the tile of a dead character and drops its route and queue.
    pub fn on_character_died(&mut self, cx: &mut LevelContext<'_>, object: EntityId) {
        cx.state.grid.remove_object(object);
        if !self.is_observed(object) {
            return;
        }
        if let Some(entry) = cx.state.object_mut(object) {
            entry.path.clear();
            if let Some(tile) = entry.in_flight.take() {
                entry.position = tile;
            }
        }
        if let Some(character) = cx.state.character_mut(object) {
            character.queue.reset();
        }
    }

    // ========================================================================
    // Zones
    // ========================================================================

    pub fn register_zone(&mut self, cx: &mut LevelContext<'_>, zone: Zone) -> ZoneId {
        let id = cx.state.grid.register_zone(zone);
        debug!(zone = %id, "zone registered");
        id
    }

    pub fn unregister_zone(&mut self, cx: &mut LevelContext<'_>, zone: ZoneId) -> Option<Zone> {
        cx.state.grid.unregister_zone(zone)
    }

    /// Reports zone transitions of `object` standing on `position`.
    ///
    /// Each transition fires the object's hook once. The player entering an
    /// exit zone additionally requests a level transition.
    pub fn trigger_zones(&mut self, cx: &mut LevelContext<'_>, object: EntityId, position: Position) {
        let is_player = cx.state.player == Some(object);

        for transition in cx.state.grid.trigger_zone(object, position) {
            let (zone, entered) = match transition {
                ZoneTransition::Entered(zone) => (zone, true),
                ZoneTransition::Exited(zone) => (zone, false),
            };
            let Some(details) = cx.state.grid.zone(zone) else {
                continue;
            };
            let name = details.name.clone();
            let exit_target = (entered && is_player && details.is_exit()).then(|| details.target.clone());

            let hook = if entered {
                cx.bus.publish(LevelEvent::ZoneEntered {
                    object,
                    zone,
                    name: name.clone(),
                });
                hooks::ON_ZONE_ENTERED
            } else {
                cx.bus.publish(LevelEvent::ZoneExited {
                    object,
                    zone,
                    name: name.clone(),
                });
                hooks::ON_ZONE_EXITED
            };
            cx.call_hook(object, hook, &[ScriptValue::Str(name)]);

            if let Some(target) = exit_target {
                cx.bus.publish(LevelEvent::ExitZoneEntered { zone, target });
            }
        }
    }
}
