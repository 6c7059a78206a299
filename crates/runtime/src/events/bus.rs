//! Topic-based event bus implementation.
//!
//! Dispatch is synchronous: `publish` runs every listener of the event's topic
//! in subscription order before returning, then appends the event to the
//! journal. Each listener sees each event exactly once.

use std::collections::HashMap;
use std::fmt;

use super::types::{LevelEvent, Topic};

pub type Listener = Box<dyn FnMut(&LevelEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Topic-based event bus
///
/// Listeners only receive events of the topic they subscribed to. Every
/// published event is also kept in a journal until drained.
pub struct EventBus {
    listeners: HashMap<Topic, Vec<(SubscriptionId, Listener)>>,
    journal: Vec<LevelEvent>,
    next_subscription: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            journal: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&mut self, event: LevelEvent) {
        let topic = event.topic();
        match self.listeners.get_mut(&topic) {
            Some(listeners) if !listeners.is_empty() => {
                for (_, listener) in listeners.iter_mut() {
                    listener(&event);
                }
            }
            _ => tracing::trace!("No subscribers for topic {:?}", topic),
        }
        self.journal.push(event);
    }

    /// Subscribe to a specific topic
    pub fn subscribe(
        &mut self,
        topic: Topic,
        listener: impl FnMut(&LevelEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners
            .entry(topic)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Detaches a listener. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for listeners in self.listeners.values_mut() {
            if let Some(index) = listeners.iter().position(|(sid, _)| *sid == id) {
                drop(listeners.remove(index));
                return true;
            }
        }
        false
    }

    /// Events published since the last drain, oldest first.
    pub fn journal(&self) -> &[LevelEvent] {
        &self.journal
    }

    pub fn drain(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.journal)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "listeners",
                &self.listeners.values().map(Vec::len).sum::<usize>(),
            )
            .field("journal", &self.journal.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasteland_core::EntityId;

    #[test]
    fn listeners_only_see_their_topic() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(Topic::Combat, move |event| sink.borrow_mut().push(event.clone()));

        bus.publish(LevelEvent::CombatEnded);
        bus.publish(LevelEvent::PauseChanged { paused: true });

        assert_eq!(*seen.borrow(), vec![LevelEvent::CombatEnded]);
        assert_eq!(bus.journal().len(), 2);
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = Rc::clone(&order);
            bus.subscribe(Topic::Action, move |_| order.borrow_mut().push(tag));
        }

        bus.publish(LevelEvent::QueueCompleted { object: EntityId(1) });
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = bus.subscribe(Topic::Session, move |_| *counter.borrow_mut() += 1);

        bus.publish(LevelEvent::WorldClockTick { ticks: 1 });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(LevelEvent::WorldClockTick { ticks: 2 });

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.drain().len(), 2);
        assert!(bus.journal().is_empty());
    }
}
