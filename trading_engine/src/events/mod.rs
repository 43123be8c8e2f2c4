//! Engine event hooks.
//!
//! A simple stateless pub-sub layer lets collaborators (notification service, market-data feed, audit log)
//! react to order flow events without access to engine internals. Handlers are async and run on their own
//! tasks; publishing never blocks the order flow beyond the channel send.

mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderCancelledEvent, OrderPlacedEvent, TradeExecutedEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
