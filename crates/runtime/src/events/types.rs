//! Event types published by a level session.

use serde::{Deserialize, Serialize};
use wasteland_core::{
    Animation, EntityId, InteractionKind, Position, QueuedCommand, RenderPosition, ZoneId,
};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Steps, arrivals, blocked paths, teleports, animations
    Movement,
    /// Zone membership changes and level exits
    Zone,
    /// Action queue progress, interactions, console output
    Action,
    /// Damage, death, action points, turn order
    Combat,
    /// Load, pause, world clock, unload
    Session,
}

/// Why a path stopped before its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStopReason {
    /// No route exists.
    NoPath,
    /// The next tile became occupied.
    Blocked,
    /// The walker cannot pay for the next step.
    OutOfActionPoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelEvent {
    // ----- movement -----
    /// A step started; the presentation layer animates it and reports back
    /// through `LevelSession::movement_finished`.
    MoveStarted {
        object: EntityId,
        from: Position,
        to: Position,
        render: RenderPosition,
    },
    DestinationReached {
        object: EntityId,
        position: Position,
    },
    PathBlocked {
        object: EntityId,
        at: Position,
        reason: PathStopReason,
    },
    Teleported {
        object: EntityId,
        position: Position,
    },
    AnimationChanged {
        object: EntityId,
        animation: Animation,
    },

    // ----- zones -----
    ZoneEntered {
        object: EntityId,
        zone: ZoneId,
        name: String,
    },
    ZoneExited {
        object: EntityId,
        zone: ZoneId,
        name: String,
    },
    /// The player stepped into an exit zone.
    ExitZoneEntered {
        zone: ZoneId,
        target: Option<String>,
    },

    // ----- actions -----
    ActionCompleted {
        object: EntityId,
        command: QueuedCommand,
    },
    QueueCompleted {
        object: EntityId,
    },
    /// Several interactions are possible; the UI should offer a menu.
    InteractionRequired {
        target: EntityId,
        interactions: Vec<InteractionKind>,
    },
    InteractionCancelled {
        target: EntityId,
    },
    InteractionTriggered {
        actor: EntityId,
        target: EntityId,
        kind: InteractionKind,
    },
    ConsoleMessage {
        text: String,
    },

    // ----- combat -----
    ActionPointsChanged {
        object: EntityId,
        remaining: u32,
    },
    Damaged {
        victim: EntityId,
        dealer: Option<EntityId>,
        amount: u32,
        remaining: u32,
    },
    Killed {
        victim: EntityId,
        dealer: Option<EntityId>,
    },
    /// A first hit turned two neutral characters hostile.
    RequiresJoinCombat {
        object: EntityId,
        opponent: Option<EntityId>,
    },
    CombatJoined {
        object: EntityId,
    },
    TurnStarted {
        object: EntityId,
        round: u32,
    },
    CombatEnded,

    // ----- session -----
    LevelLoaded {
        level: String,
    },
    PauseChanged {
        paused: bool,
    },
    WorldClockTick {
        ticks: u64,
    },
    LevelUnloaded {
        level: String,
    },
}

impl LevelEvent {
    pub fn topic(&self) -> Topic {
        use LevelEvent::*;
        match self {
            MoveStarted { .. }
            | DestinationReached { .. }
            | PathBlocked { .. }
            | Teleported { .. }
            | AnimationChanged { .. } => Topic::Movement,
            ZoneEntered { .. } | ZoneExited { .. } | ExitZoneEntered { .. } => Topic::Zone,
            ActionCompleted { .. }
            | QueueCompleted { .. }
            | InteractionRequired { .. }
            | InteractionCancelled { .. }
            | InteractionTriggered { .. }
            | ConsoleMessage { .. } => Topic::Action,
            ActionPointsChanged { .. }
            | Damaged { .. }
            | Killed { .. }
            | RequiresJoinCombat { .. }
            | CombatJoined { .. }
            | TurnStarted { .. }
            | CombatEnded => Topic::Combat,
            LevelLoaded { .. } | PauseChanged { .. } | WorldClockTick { .. } | LevelUnloaded { .. } => {
                Topic::Session
            }
        }
    }
}
