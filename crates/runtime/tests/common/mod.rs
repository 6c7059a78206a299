//! Shared fixtures for level session tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use wasteland_core::{
    CharacterSpec, EntityId, InitialObjectSpec, MapDimensions, Position, StaticMap,
};
use wasteland_runtime::{
    LevelEvent, LevelSession, ScriptEngine, ScriptError, ScriptValue, SessionConfig, StepOutcome,
};

#[derive(Debug, Default)]
pub struct ScriptLog {
    pub calls: Vec<(EntityId, String, Vec<ScriptValue>)>,
    pub attached: Vec<(EntityId, String)>,
    pub detached: Vec<EntityId>,
}

impl ScriptLog {
    pub fn count(&self, object: EntityId, method: &str) -> usize {
        self.calls
            .iter()
            .filter(|(id, name, _)| *id == object && name == method)
            .count()
    }

    pub fn args_of(&self, object: EntityId, method: &str) -> Vec<Vec<ScriptValue>> {
        self.calls
            .iter()
            .filter(|(id, name, _)| *id == object && name == method)
            .map(|(_, _, args)| args.clone())
            .collect()
    }
}

/// Script engine with canned responses that records every call.
#[derive(Debug, Default)]
pub struct RecordingScriptEngine {
    methods: BTreeMap<(EntityId, String), Result<ScriptValue, String>>,
    log: Rc<RefCell<ScriptLog>>,
}

impl RecordingScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, object: EntityId, method: &str, value: ScriptValue) -> Self {
        self.methods.insert((object, method.to_string()), Ok(value));
        self
    }

    pub fn with_failing_method(mut self, object: EntityId, method: &str, message: &str) -> Self {
        self.methods
            .insert((object, method.to_string()), Err(message.to_string()));
        self
    }

    pub fn log(&self) -> Rc<RefCell<ScriptLog>> {
        Rc::clone(&self.log)
    }
}

impl ScriptEngine for RecordingScriptEngine {
    fn call(
        &mut self,
        object: EntityId,
        method: &str,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError> {
        self.log
            .borrow_mut()
            .calls
            .push((object, method.to_string(), args.to_vec()));
        match self.methods.get(&(object, method.to_string())) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(ScriptError::Exception {
                object,
                method: method.to_string(),
                message: message.clone(),
            }),
            None => Err(ScriptError::MissingMethod {
                object,
                method: method.to_string(),
            }),
        }
    }

    fn has_method(&self, object: EntityId, method: &str) -> bool {
        self.methods.contains_key(&(object, method.to_string()))
    }

    fn attach(&mut self, object: EntityId, script: &str) {
        self.log
            .borrow_mut()
            .attached
            .push((object, script.to_string()));
    }

    fn detach(&mut self, object: EntityId) {
        self.log.borrow_mut().detached.push(object);
    }
}

pub fn interactions(names: &[&str]) -> ScriptValue {
    ScriptValue::List(names.iter().map(|name| ScriptValue::from(*name)).collect())
}

/// Open corridor `width` tiles long with the player at its west end.
pub fn corridor(width: u32) -> StaticMap {
    StaticMap::open("corridor", MapDimensions::new(width, 1))
        .with_object(InitialObjectSpec::character(
            "player",
            Position::new(0, 0),
            CharacterSpec::player(20),
        ))
        .expect("player should fit the corridor")
}

pub fn load(map: &StaticMap, engine: RecordingScriptEngine) -> LevelSession {
    LevelSession::load(map, Box::new(engine), SessionConfig::default())
        .expect("level should load")
}

/// Delivers step completions until the object stops walking.
pub fn walk(session: &mut LevelSession, object: EntityId) -> StepOutcome {
    for _ in 0..64 {
        match session.movement_finished(object) {
            StepOutcome::Continued => continue,
            outcome => return outcome,
        }
    }
    panic!("{object} never stopped walking");
}

pub fn count(events: &[LevelEvent], predicate: impl Fn(&LevelEvent) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}
