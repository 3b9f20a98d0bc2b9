//! # Herald
//!
//! An in-process broadcaster hub for long-lived event streams, organised
//! by named channels.
//!
//! ## Core Concepts
//!
//! - **Hub**: a single actor thread owns every channel and subscriber set;
//!   all operations are messages processed one at a time
//! - **Subscriptions**: one client on one channel, with bounded event and
//!   comment queues. A subscriber that falls a full buffer behind is
//!   disconnected rather than allowed to stall publishers
//! - **Repositories**: optional per-channel history, replayed into clients
//!   that resume from a last-seen event id
//! - **Channels**: closed channels turn away new subscribers and ignore
//!   publishes
//!
//! ## Example
//!
//! ```ignore
//! use herald::{Event, Hub, HubConfig, MemoryRepository, SubscribeOutcome};
//! use std::sync::Arc;
//!
//! let hub = Hub::new(HubConfig::default())?;
//!
//! let history = Arc::new(MemoryRepository::new(256));
//! hub.register("time", Arc::clone(&history));
//!
//! // Publisher side
//! let tick = Event::new("1356998400000000000", "Tick", "2013-01-01 00:00:00 +0000 UTC");
//! history.append("time", tick.clone());
//! hub.publish(&["time"], tick);
//!
//! // Connection side
//! match hub.subscribe("time", last_event_id) {
//!     SubscribeOutcome::Subscribed(handle) => {
//!         while let Ok(event) = handle.recv_event() {
//!             println!("{} {} {}", event.id(), event.event(), event.data());
//!         }
//!     }
//!     other => println!("{}", other.message().unwrap_or_default()),
//! }
//! ```

pub mod connection;
pub mod error;
pub mod hub;
pub mod repository;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use connection::{drive, EventSink, StreamEnd};
pub use error::{HubError, Result};
pub use hub::{ChannelStats, Hub, HubConfig, HubStats};
pub use repository::{MemoryRepository, NoopRepository, Repository};
pub use subscriptions::{SubscribeOutcome, SubscriptionHandle, SubscriptionId};
pub use types::{Comment, Event};
