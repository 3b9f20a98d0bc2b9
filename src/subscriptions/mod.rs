//! Subscriptions: per-client delivery contexts.
//!
//! Each subscription is bound to one channel and owns two bounded queues,
//! one for events and one for comments. The hub actor writes with
//! non-blocking sends and disconnects a subscriber whose queue is full;
//! the connection side reads from a [`SubscriptionHandle`].
//!
//! # Example
//!
//! ```ignore
//! let hub = Hub::new(HubConfig::default())?;
//!
//! let handle = match hub.subscribe("news", Some("41")) {
//!     SubscribeOutcome::Subscribed(handle) => handle,
//!     other => return respond_plain(other.message()),
//! };
//!
//! while let Ok(event) = handle.recv_event() {
//!     write_event(&event)?;
//! }
//! ```

mod replay;
mod subscription;
mod types;

pub(crate) use replay::spawn as spawn_replay;
pub(crate) use subscription::{Delivery, Subscription, SubscriptionSink};
pub use types::{SubscribeOutcome, SubscriptionHandle, SubscriptionId};
