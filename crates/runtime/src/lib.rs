//! Runtime orchestration for a loaded level.
//!
//! This crate wires the deterministic level state from `wasteland-core` to the
//! outside world: scripts, the presentation layer, and save storage. Consumers
//! create a [`LevelSession`], feed it ticks, clicks, and step completions, and
//! observe the resulting [`LevelEvent`]s.
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the per-level state machine
//! - [`orchestrator`] advances paths step by step and fires zone hooks
//! - [`events`] provides the topic-based event bus
//! - [`script`] defines the contract with the embedded script engine
//! - [`persistence`] captures, validates, and stores level snapshots
pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod persistence;
pub mod script;
pub mod session;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use events::{EventBus, LevelEvent, Listener, PathStopReason, SubscriptionId, Topic};
pub use orchestrator::{GridOrchestrator, LevelContext, StepOutcome};
pub use persistence::{
    CharacterRecord, FileSaveRepository, InMemorySaveRepository, LevelSnapshot, ObjectRecord,
    RepositoryError, SNAPSHOT_VERSION, SaveFormat, SaveRepository, SnapshotError, ZoneRecord,
};
pub use script::{NullScriptEngine, ScriptEngine, ScriptError, ScriptValue, hooks};
pub use session::{
    ActionStart, ClickOutcome, ExitRequest, LevelSession, PendingInteraction, SessionPhase,
};
