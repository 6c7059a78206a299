//! Per-level state machine.
//!
//! A [`LevelSession`] owns everything that lives on one loaded level: the
//! [`LevelState`] arena, the [`GridOrchestrator`], the event bus, and the
//! script engine. It moves through `Loading -> Paused <-> Active -> Unloaded`
//! and is driven from outside by three inputs: `tick`, `tile_clicked`, and
//! `movement_finished`.

mod actions;
mod combat;
mod input;

pub use actions::ActionStart;
pub use input::{ClickOutcome, PendingInteraction};

use tracing::{debug, warn};
use wasteland_core::{
    CharacterState, DynamicObject, EntityId, InitialObjectSpec, LevelState, MapOracle,
    ObjectFlags, OccupancyGrid, OracleError, Position, StateError, Zone, ZoneId, ZoneKind,
    ZoneOwner,
};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::events::{EventBus, LevelEvent, SubscriptionId, Topic};
use crate::orchestrator::{GridOrchestrator, LevelContext, StepOutcome};
use crate::persistence::{LevelSnapshot, SaveRepository};
use crate::script::{ScriptEngine, ScriptValue, hooks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SessionPhase {
    Loading,
    Paused,
    Active,
    /// Terminal.
    Unloaded,
}

/// The player stepped into an exit zone; the owner of the session decides
/// where to go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRequest {
    pub zone: ZoneId,
    pub target: Option<String>,
}

pub struct LevelSession {
    config: SessionConfig,
    phase: SessionPhase,
    state: LevelState,
    layers: Vec<String>,
    orchestrator: GridOrchestrator,
    bus: EventBus,
    scripts: Box<dyn ScriptEngine>,
    pending_interaction: Option<PendingInteraction>,
    exit_request: Option<ExitRequest>,
    frame_elapsed_ms: u64,
    clock_elapsed_ms: u64,
    clock_ticks: u64,
    /// Journal index up to which the session has reacted to its own events.
    cursor: usize,
}

impl LevelSession {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Builds the level from a map and leaves it paused.
    pub fn load(
        map: &dyn MapOracle,
        scripts: Box<dyn ScriptEngine>,
        config: SessionConfig,
    ) -> Result<Self> {
        let dimensions = map.dimensions();
        let mut state = LevelState::new(map.name(), OccupancyGrid::from_map(map));

        for spec in map.zones() {
            if let Some(position) = spec.tiles.iter().find(|tile| !dimensions.contains(**tile)) {
                return Err(OracleError::ZoneOutOfBounds {
                    zone: spec.name.clone(),
                    position: *position,
                }
                .into());
            }
            state.grid.register_zone(Zone::from(spec));
        }

        let mut session = Self::assemble(state, map.layer_names(), scripts, config);
        let mut placed = Vec::new();
        for spec in map.initial_objects() {
            placed.push(session.place_object(spec)?);
        }
        for id in placed {
            session.attach_object(id);
        }

        session.finish_loading();
        Ok(session)
    }

    /// Rebuilds a level from a snapshot taken on the same map.
    ///
    /// The snapshot is validated before anything is placed. Every object and
    /// zone is re-registered before the session enters `Paused`; routes that
    /// were in progress resume on the first unpause.
    pub fn restore(
        map: &dyn MapOracle,
        scripts: Box<dyn ScriptEngine>,
        config: SessionConfig,
        snapshot: LevelSnapshot,
    ) -> Result<Self> {
        snapshot.validate(map.name(), map.dimensions())?;

        let mut state = LevelState::new(map.name(), OccupancyGrid::from_map(map));
        state.diplomacy = snapshot.diplomacy;
        for record in snapshot.zones {
            let (id, zone) = record.into_zone();
            state.grid.restore_zone(id, zone);
        }

        let mut restored = Vec::with_capacity(snapshot.objects.len());
        for record in snapshot.objects {
            let object = record.into_object();
            if let Some(character) = object.as_character() {
                state.diplomacy.restore_member(object.id, &character.affiliation);
            }
            restored.push(object.id);
            state.insert_object(object)?;
        }
        state.player = snapshot.player;

        let mut session = Self::assemble(state, map.layer_names(), scripts, config);
        for id in restored {
            session.attach_object(id);
        }

        session.finish_loading();
        Ok(session)
    }

    pub fn restore_from(
        repository: &dyn SaveRepository,
        map: &dyn MapOracle,
        scripts: Box<dyn ScriptEngine>,
        config: SessionConfig,
    ) -> Result<Self> {
        let snapshot = repository
            .load(map.name())?
            .ok_or_else(|| SessionError::MissingSave(map.name().to_string()))?;
        Self::restore(map, scripts, config, snapshot)
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot::capture(&self.state)
    }

    pub fn save_to(&self, repository: &dyn SaveRepository) -> Result<()> {
        repository.save(&self.snapshot())?;
        Ok(())
    }

    fn assemble(
        state: LevelState,
        layers: Vec<String>,
        scripts: Box<dyn ScriptEngine>,
        config: SessionConfig,
    ) -> Self {
        Self {
            config,
            phase: SessionPhase::Loading,
            state,
            layers,
            orchestrator: GridOrchestrator::new(),
            bus: EventBus::new(),
            scripts,
            pending_interaction: None,
            exit_request: None,
            frame_elapsed_ms: 0,
            clock_elapsed_ms: 0,
            clock_ticks: 0,
            cursor: 0,
        }
    }

    fn finish_loading(&mut self) {
        self.phase = SessionPhase::Paused;
        debug!(
            level = %self.state.name,
            objects = self.state.objects.len(),
            "level loaded"
        );
        self.bus.publish(LevelEvent::LevelLoaded {
            level: self.state.name.clone(),
        });
    }

    /// Tears the level down. Every object is unregistered and detached from
    /// its script; the session accepts no further input.
    pub fn unload(&mut self) {
        if self.phase == SessionPhase::Unloaded {
            return;
        }
        let ids: Vec<EntityId> = self.state.objects.keys().copied().collect();
        {
            let (orchestrator, mut cx) = self.split();
            for id in &ids {
                orchestrator.unregister_dynamic_object(&mut cx, *id);
            }
        }
        for id in ids {
            self.scripts.detach(id);
        }
        self.pending_interaction = None;
        self.phase = SessionPhase::Unloaded;
        debug!(level = %self.state.name, "level unloaded");
        self.bus.publish(LevelEvent::LevelUnloaded {
            level: self.state.name.clone(),
        });
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase == SessionPhase::Paused
    }

    fn accepts_input(&self) -> bool {
        matches!(self.phase, SessionPhase::Paused | SessionPhase::Active)
    }

    pub fn pause(&mut self) -> bool {
        self.set_paused(true)
    }

    pub fn unpause(&mut self) -> bool {
        self.set_paused(false)
    }

    /// Toggles tick delivery. Unpausing restarts routes that were left
    /// without a step in flight.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        let next = match (self.phase, paused) {
            (SessionPhase::Active, true) => SessionPhase::Paused,
            (SessionPhase::Paused, false) => SessionPhase::Active,
            _ => return false,
        };
        self.phase = next;
        debug!(phase = %next, "session phase changed");
        self.bus.publish(LevelEvent::PauseChanged { paused });

        if !paused {
            let observed: Vec<EntityId> = self.orchestrator.observed().collect();
            let (orchestrator, mut cx) = self.split();
            for id in observed {
                orchestrator.resume_path(&mut cx, id);
            }
        }
        self.settle();
        true
    }

    /// Advances the frame and world clocks. Ignored unless active.
    pub fn tick(&mut self, elapsed_ms: u64) {
        if self.phase != SessionPhase::Active {
            return;
        }

        let frame_interval = self.config.frame_interval_ms.max(1);
        let clock_interval = self.config.clock_interval_ms.max(1);

        self.frame_elapsed_ms += elapsed_ms;
        while self.frame_elapsed_ms >= frame_interval {
            self.frame_elapsed_ms -= frame_interval;
            self.update_frame();
        }

        self.clock_elapsed_ms += elapsed_ms;
        while self.clock_elapsed_ms >= clock_interval {
            self.clock_elapsed_ms -= clock_interval;
            self.clock_ticks += 1;
            self.world_clock_tick();
        }
        self.settle();
    }

    fn update_frame(&mut self) {
        self.finish_waits();
        self.detect_hostiles();
        self.check_combat_end();
    }

    fn world_clock_tick(&mut self) {
        let ticks = self.clock_ticks;
        self.bus.publish(LevelEvent::WorldClockTick { ticks });

        let scripted: Vec<EntityId> = self
            .state
            .objects
            .values()
            .filter(|object| object.script.is_some())
            .map(|object| object.id)
            .collect();
        let args = [ScriptValue::Int(i64::try_from(ticks).unwrap_or(i64::MAX))];
        for id in scripted {
            self.call_hook(id, hooks::ON_CLOCK_TICK, &args);
        }
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Reports that the presentation layer finished animating a step.
    pub fn movement_finished(&mut self, object: EntityId) -> StepOutcome {
        let outcome = {
            let (orchestrator, mut cx) = self.split();
            orchestrator.on_movement_finished(&mut cx, object)
        };
        if outcome == StepOutcome::Arrived && self.current_action_is_movement(object) {
            self.complete_current(object);
            self.run_queue(object);
        }
        self.settle();
        outcome
    }

    /// Routes an object directly, outside its action queue.
    pub fn move_to(&mut self, object: EntityId, target: Position) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let moved = {
            let (orchestrator, mut cx) = self.split();
            orchestrator.move_to(&mut cx, object, target)
        };
        self.settle();
        moved
    }

    pub fn set_object_position(&mut self, object: EntityId, position: Position) -> bool {
        let placed = {
            let (orchestrator, mut cx) = self.split();
            orchestrator.set_object_position(&mut cx, object, position)
        };
        self.settle();
        placed
    }

    pub fn set_character_position(&mut self, object: EntityId, position: Position) -> bool {
        let placed = {
            let (orchestrator, mut cx) = self.split();
            orchestrator.set_character_position(&mut cx, object, position)
        };
        self.settle();
        placed
    }

    /// Tile from which the player interacts with `target`.
    ///
    /// That is the tile before the target on the player's path, the player's
    /// own tile when already next to it, or the target's tile when no path
    /// exists.
    pub fn interaction_position(&self, target: EntityId) -> Option<Position> {
        self.interaction_position_for(self.state.player?, target)
    }

    pub(crate) fn interaction_position_for(
        &self,
        actor: EntityId,
        target: EntityId,
    ) -> Option<Position> {
        let origin = self.state.object(actor)?.planned_position();
        let destination = self.state.object(target)?.position;
        if origin.manhattan_distance(destination) <= 1 {
            return Some(origin);
        }
        match self.state.grid.find_path(origin, destination) {
            Some(path) if path.len() >= 2 => Some(path[path.len() - 2]),
            Some(_) => Some(origin),
            None => Some(destination),
        }
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Places a new object during play. Zones under it fire as for any move.
    pub fn spawn_object(&mut self, spec: InitialObjectSpec) -> Result<EntityId> {
        let id = self.place_object(spec)?;
        self.attach_object(id);
        if let Some(position) = self.state.object(id).map(|object| object.position) {
            let (orchestrator, mut cx) = self.split();
            orchestrator.trigger_zones(&mut cx, id, position);
        }
        self.settle();
        Ok(id)
    }

    /// Removes an object together with the zones it owns.
    pub fn remove_object(&mut self, object: EntityId) -> bool {
        if self.state.object(object).is_none() {
            return false;
        }
        {
            let (orchestrator, mut cx) = self.split();
            orchestrator.unregister_dynamic_object(&mut cx, object);
            let owned: Vec<ZoneId> = cx
                .state
                .grid
                .zones()
                .filter(|(_, zone)| zone.owner == ZoneOwner::Object(object))
                .map(|(id, _)| id)
                .collect();
            for zone in owned {
                orchestrator.unregister_zone(&mut cx, zone);
            }
        }
        self.scripts.detach(object);
        self.state.remove_object(object);
        if self
            .pending_interaction
            .as_ref()
            .is_some_and(|pending| pending.target == object)
        {
            self.pending_interaction = None;
        }
        self.check_combat_end();
        self.settle();
        true
    }

    /// Toggles whether an object holds its tile.
    ///
    /// Turning blocking on fails if another blocker already stands there.
    pub fn set_blocking(&mut self, object: EntityId, blocking: bool) -> bool {
        let Some(entry) = self.state.object(object) else {
            return false;
        };
        if entry.is_blocking() == blocking {
            return true;
        }
        let tile = entry.planned_position();
        let alive = entry.is_alive();

        if blocking && alive && !self.state.grid.move_object(object, tile) {
            warn!(%object, %tile, "cannot block an occupied tile");
            return false;
        }
        if !blocking {
            self.state.grid.remove_object(object);
        }
        if let Some(entry) = self.state.object_mut(object) {
            entry.flags.set(ObjectFlags::BLOCKING, blocking);
        }
        true
    }

    /// Registers a control zone owned by `object`, replacing its previous one.
    pub fn add_control_zone(
        &mut self,
        object: EntityId,
        tiles: impl IntoIterator<Item = Position>,
    ) -> Option<ZoneId> {
        let name = format!("{} control", self.state.object(object)?.name);
        let tiles: Vec<Position> = tiles.into_iter().collect();
        if let Some(tile) = tiles.iter().find(|tile| !self.state.grid.contains(**tile)) {
            warn!(%object, %tile, "control zone outside the map");
            return None;
        }
        self.remove_control_zone(object);

        let (orchestrator, mut cx) = self.split();
        let zone = Zone::new(name, ZoneKind::Control, tiles).owned_by(object);
        let id = orchestrator.register_zone(&mut cx, zone);
        if let Some(entry) = cx.state.object_mut(object) {
            entry.control_zone = Some(id);
        }
        Some(id)
    }

    pub fn remove_control_zone(&mut self, object: EntityId) -> bool {
        let Some(zone) = self
            .state
            .object_mut(object)
            .and_then(|entry| entry.control_zone.take())
        else {
            return false;
        };
        let (orchestrator, mut cx) = self.split();
        orchestrator.unregister_zone(&mut cx, zone).is_some()
    }

    /// Builds an object from its spec and inserts it into the level.
    fn place_object(&mut self, spec: InitialObjectSpec) -> Result<EntityId> {
        let is_player = spec.character.as_ref().is_some_and(|character| character.is_player);
        let id = if is_player {
            EntityId::PLAYER
        } else {
            self.state.allocate_id()
        };

        if self.state.object(id).is_some() {
            return Err(StateError::DuplicateEntity(id).into());
        }

        let mut flags = ObjectFlags::empty();
        flags.set(ObjectFlags::BLOCKING, spec.blocking);
        flags.set(ObjectFlags::FLOATING, spec.floating);

        let mut affiliation = match &spec.character {
            Some(character) => Some(
                self.state
                    .diplomacy
                    .affiliate(id, character.faction.as_deref())?,
            ),
            None => None,
        };
        let mut object = match (&spec.character, affiliation) {
            (Some(character), Some(affiliation)) => {
                let action_points = character
                    .action_points
                    .unwrap_or(self.config.game.default_action_points);
                DynamicObject::character(
                    id,
                    spec.name.clone(),
                    spec.position,
                    CharacterState::new(character.hit_points, action_points, affiliation),
                )
            }
            _ => DynamicObject::prop(id, spec.name.clone(), spec.position),
        }
        .with_flags(flags);
        object.script = spec.script;

        if let Err(error) = self.state.insert_object(object) {
            if let Some(affiliation) = affiliation.as_mut() {
                self.state.diplomacy.leave(id, affiliation);
            }
            return Err(error.into());
        }
        if is_player {
            self.state.player = Some(id);
        }
        debug!(object = %id, name = %spec.name, position = %spec.position, "object placed");
        Ok(id)
    }

    /// Hooks a freshly inserted object up to the orchestrator and its script.
    /// Zone membership is refreshed without firing hooks.
    fn attach_object(&mut self, id: EntityId) {
        self.orchestrator.register_dynamic_object(&self.state, id);

        let render = self
            .state
            .object(id)
            .map(|object| self.config.render_position(object.position));
        let Some(object) = self.state.object_mut(id) else {
            return;
        };
        if !object.is_floating() {
            object.render_position = render;
        }
        let position = object.position;
        if let Some(script) = object.script.clone() {
            self.scripts.attach(id, &script);
        }
        self.state.grid.trigger_zone(id, position);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &GridOrchestrator {
        &self.orchestrator
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn player(&self) -> Option<EntityId> {
        self.state.player
    }

    pub fn pending_interaction(&self) -> Option<&PendingInteraction> {
        self.pending_interaction.as_ref()
    }

    pub fn exit_request(&self) -> Option<&ExitRequest> {
        self.exit_request.as_ref()
    }

    pub fn take_exit_request(&mut self) -> Option<ExitRequest> {
        self.exit_request.take()
    }

    pub fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    pub fn subscribe(
        &mut self,
        topic: Topic,
        listener: impl FnMut(&LevelEvent) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(topic, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Events published since the last drain.
    pub fn events(&self) -> &[LevelEvent] {
        self.bus.journal()
    }

    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        self.settle();
        self.cursor = 0;
        self.bus.drain()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn split(&mut self) -> (&mut GridOrchestrator, LevelContext<'_>) {
        (
            &mut self.orchestrator,
            LevelContext {
                state: &mut self.state,
                bus: &mut self.bus,
                scripts: &mut *self.scripts,
                config: &self.config,
            },
        )
    }

    fn call_hook(
        &mut self,
        object: EntityId,
        method: &str,
        args: &[ScriptValue],
    ) -> Option<ScriptValue> {
        crate::script::invoke(&mut *self.scripts, object, method, args)
    }

    /// Reacts to events the session itself has to act on: hostility raised
    /// by a first hit pulls both sides into combat, and the player entering
    /// an exit zone records a level transition request.
    fn settle(&mut self) {
        while let Some(event) = self.bus.journal().get(self.cursor).cloned() {
            self.cursor += 1;
            match event {
                LevelEvent::RequiresJoinCombat { object, opponent } => {
                    self.enter_combat(object);
                    if let Some(opponent) = opponent {
                        self.enter_combat(opponent);
                    }
                }
                LevelEvent::ExitZoneEntered { zone, target } => {
                    debug!(%zone, ?target, "exit requested");
                    self.exit_request = Some(ExitRequest { zone, target });
                }
                _ => {}
            }
        }
    }
}
