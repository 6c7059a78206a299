//! Scripting contract.
//!
//! The script runtime itself lives outside this crate. The session only calls
//! named methods on an object's script and reads back a [`ScriptValue`]. A
//! [`ScriptError`] is logged and then treated exactly like a missing hook.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use wasteland_core::EntityId;

/// Hook names invoked by the session.
pub mod hooks {
    pub const ON_ZONE_ENTERED: &str = "onZoneEntered";
    pub const ON_ZONE_EXITED: &str = "onZoneExited";
    pub const ON_ACTION_QUEUE_COMPLETED: &str = "onActionQueueCompleted";
    pub const ON_DAMAGE_TAKEN: &str = "onDamageTaken";
    pub const ON_DIED: &str = "onDied";
    pub const ON_TURN_STARTED: &str = "onTurnStarted";
    pub const ON_CLOCK_TICK: &str = "onClockTick";
    pub const GET_AVAILABLE_INTERACTIONS: &str = "getAvailableInteractions";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ScriptValue>),
    Object(EntityId),
}

impl ScriptValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ScriptValue]> {
        match self {
            ScriptValue::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::Str(value.to_string())
    }
}

impl From<EntityId> for ScriptValue {
    fn from(value: EntityId) -> Self {
        ScriptValue::Object(value)
    }
}

impl From<Option<EntityId>> for ScriptValue {
    fn from(value: Option<EntityId>) -> Self {
        value.map_or(ScriptValue::Null, ScriptValue::Object)
    }
}

impl From<u32> for ScriptValue {
    fn from(value: u32) -> Self {
        ScriptValue::Int(i64::from(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("{object} has no method '{method}'")]
    MissingMethod { object: EntityId, method: String },

    #[error("{method} raised on {object}: {message}")]
    Exception {
        object: EntityId,
        method: String,
        message: String,
    },
}

/// Embedded script runtime, one script instance per object.
pub trait ScriptEngine {
    fn call(
        &mut self,
        object: EntityId,
        method: &str,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError>;

    fn has_method(&self, object: EntityId, method: &str) -> bool;

    /// Instantiates `script` for a newly placed object.
    fn attach(&mut self, _object: EntityId, _script: &str) {}

    /// Drops the script instance of an object leaving the level.
    fn detach(&mut self, _object: EntityId) {}
}

/// Engine for levels without scripts. Every hook is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScriptEngine;

impl ScriptEngine for NullScriptEngine {
    fn call(
        &mut self,
        object: EntityId,
        method: &str,
        _args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError> {
        Err(ScriptError::MissingMethod {
            object,
            method: method.to_string(),
        })
    }

    fn has_method(&self, _object: EntityId, _method: &str) -> bool {
        false
    }
}

/// Calls an optional hook. Absent hooks and script errors both yield `None`.
pub(crate) fn invoke(
    scripts: &mut dyn ScriptEngine,
    object: EntityId,
    method: &str,
    args: &[ScriptValue],
) -> Option<ScriptValue> {
    if !scripts.has_method(object, method) {
        return None;
    }
    match scripts.call(object, method, args) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%object, method, %error, "script hook failed");
            None
        }
    }
}
