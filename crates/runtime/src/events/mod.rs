//! Event system for level observers.
//!
//! Every observable state transition of a level session is published as a
//! [`LevelEvent`] on the [`EventBus`], routed by [`Topic`].

mod bus;
mod types;

pub use bus::{EventBus, Listener, SubscriptionId};
pub use types::{LevelEvent, PathStopReason, Topic};
