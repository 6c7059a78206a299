//! Per-character FIFO of pending commands.

use std::collections::VecDeque;

use super::InteractionKind;
use crate::config::GameConfig;
use crate::state::{EntityId, Position};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueuedCommand {
    /// Walk to a tile.
    MoveTo(Position),
    /// Walk next to an object so it can be interacted with.
    Reach(EntityId),
    Interact {
        target: EntityId,
        kind: InteractionKind,
    },
    UseSkill {
        target: EntityId,
        skill: String,
    },
    /// Idle until the next frame.
    Wait,
}

impl QueuedCommand {
    /// Up-front action point cost. Movement is charged per step instead.
    pub fn ap_cost(&self, config: &GameConfig) -> u32 {
        match self {
            QueuedCommand::Interact { .. } => config.interaction_ap_cost,
            QueuedCommand::UseSkill { .. } => config.skill_ap_cost,
            QueuedCommand::MoveTo(_) | QueuedCommand::Reach(_) | QueuedCommand::Wait => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueuedAction {
    pub command: QueuedCommand,
    /// Script method invoked on the owner once this entry completes.
    pub on_complete: Option<String>,
}

impl QueuedAction {
    pub fn new(command: QueuedCommand) -> Self {
        Self {
            command,
            on_complete: None,
        }
    }

    pub fn with_callback(mut self, method: impl Into<String>) -> Self {
        self.on_complete = Some(method.into());
        self
    }
}

impl From<QueuedCommand> for QueuedAction {
    fn from(command: QueuedCommand) -> Self {
        Self::new(command)
    }
}

/// Entries run one at a time: `begin_next` promotes the front entry to
/// current, `finish_current` retires it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionQueue {
    pending: VecDeque<QueuedAction>,
    current: Option<QueuedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: impl Into<QueuedAction>) {
        self.pending.push_back(action.into());
    }

    /// Drops the current and every pending entry. Returns whether anything was dropped.
    pub fn reset(&mut self) -> bool {
        let had_work = !self.is_idle();
        self.pending.clear();
        self.current = None;
        had_work
    }

    /// Starts the next entry. Returns `None` while one is still running or the queue is empty.
    pub fn begin_next(&mut self) -> Option<&QueuedAction> {
        if self.current.is_some() {
            return None;
        }
        self.current = self.pending.pop_front();
        self.current.as_ref()
    }

    pub fn finish_current(&mut self) -> Option<QueuedAction> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&QueuedAction> {
        self.current.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.is_idle()
    }

    pub fn pending(&self) -> impl Iterator<Item = &QueuedAction> + '_ {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_run_in_fifo_order() {
        let mut queue = ActionQueue::new();
        queue.push(QueuedCommand::MoveTo(Position::new(1, 0)));
        queue.push(QueuedCommand::Wait);

        assert_eq!(
            queue.begin_next().map(|a| &a.command),
            Some(&QueuedCommand::MoveTo(Position::new(1, 0)))
        );
        assert!(queue.begin_next().is_none(), "current entry still running");
        queue.finish_current();
        assert_eq!(
            queue.begin_next().map(|a| &a.command),
            Some(&QueuedCommand::Wait)
        );
        queue.finish_current();
        assert!(queue.is_idle());
    }

    #[test]
    fn reset_reports_dropped_work() {
        let mut queue = ActionQueue::new();
        assert!(!queue.reset());

        queue.push(QueuedAction::new(QueuedCommand::Wait).with_callback("onRested"));
        queue.begin_next();
        queue.push(QueuedCommand::Wait);
        assert_eq!(queue.len(), 2);

        assert!(queue.reset());
        assert!(queue.current().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn only_actions_have_upfront_costs() {
        let config = GameConfig::default();
        let interact = QueuedCommand::Interact {
            target: EntityId(2),
            kind: InteractionKind::Use,
        };
        let skill = QueuedCommand::UseSkill {
            target: EntityId(2),
            skill: "medicine".into(),
        };

        assert_eq!(interact.ap_cost(&config), config.interaction_ap_cost);
        assert_eq!(skill.ap_cost(&config), config.skill_ap_cost);
        assert_eq!(QueuedCommand::Reach(EntityId(2)).ap_cost(&config), 0);
    }
}
