//! Domain layer: identities, notification records and the event bus.
//!
//! The [`EventBus`] is the in-process notification channel: handlers
//! publish [`EventRecord`]s after state changes and the long-poll endpoint
//! drains the ones addressed to the caller.

pub mod event;
pub mod event_bus;
pub mod user_id;

pub use event::{DeliveredEvent, EventKind, EventRecord};
pub use event_bus::{EventBus, EventBusOptions};
pub use user_id::UserId;
