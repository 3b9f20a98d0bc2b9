//! Caller-facing subscription types.

use crate::types::{Comment, Event};
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Unique identifier for a subscription within one hub.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle held by the connection side of a subscription.
///
/// Both queues close when the hub destroys the subscription (unregister,
/// channel close, hub shutdown or slow-consumer drop). Events already
/// queued are still delivered before a receive reports disconnection, so a
/// closed queue is the normal end of the stream.
pub struct SubscriptionHandle {
    pub(crate) id: SubscriptionId,
    pub(crate) channel: Arc<str>,
    pub(crate) last_event_id: Option<Arc<str>>,
    pub(crate) events: Receiver<Event>,
    pub(crate) comments: Receiver<Comment>,
    pub(crate) replay_done: Receiver<()>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Channel this subscription is bound to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Last-seen event id supplied at subscribe time.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Event queue, for use with `crossbeam_channel::select!`.
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Comment queue, for use with `crossbeam_channel::select!`.
    pub fn comments(&self) -> &Receiver<Comment> {
        &self.comments
    }

    /// Receive the next event (blocking).
    pub fn recv_event(&self) -> Result<Event, RecvError> {
        self.events.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv_event(&self) -> Result<Event, TryRecvError> {
        self.events.try_recv()
    }

    /// Receive an event with timeout.
    pub fn recv_event_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }

    /// Try to receive a comment (non-blocking).
    pub fn try_recv_comment(&self) -> Result<Comment, TryRecvError> {
        self.comments.try_recv()
    }

    /// Receive a comment with timeout.
    pub fn recv_comment_timeout(&self, timeout: Duration) -> Result<Comment, RecvTimeoutError> {
        self.comments.recv_timeout(timeout)
    }

    /// Wait until replay into this subscription has finished.
    ///
    /// Returns `true` once the replay thread has run to completion or
    /// stopped, or immediately if no replay was scheduled. Returns `false`
    /// if `timeout` elapses first. Live events published after this returns
    /// `true` are queued behind every replayed event.
    pub fn wait_for_replay(&self, timeout: Duration) -> bool {
        // The sender is never used; completion is its drop.
        !matches!(self.replay_done.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("last_event_id", &self.last_event_id)
            .field("queued_events", &self.events.len())
            .field("queued_comments", &self.comments.len())
            .finish()
    }
}

/// Result of a subscribe request.
#[derive(Debug)]
pub enum SubscribeOutcome {
    /// Admitted; the handle's queues are live.
    Subscribed(SubscriptionHandle),
    /// The channel has been closed and accepts no new subscribers.
    ChannelClosed,
    /// The hub has been shut down.
    HubClosed,
}

impl SubscribeOutcome {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, SubscribeOutcome::Subscribed(_))
    }

    pub fn into_subscription(self) -> Option<SubscriptionHandle> {
        match self {
            SubscribeOutcome::Subscribed(handle) => Some(handle),
            _ => None,
        }
    }

    /// Plain-text body to serve instead of a stream, if not subscribed.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SubscribeOutcome::Subscribed(_) => None,
            SubscribeOutcome::ChannelClosed => Some("This event source has been closed"),
            SubscribeOutcome::HubClosed => Some("This event source is no longer available"),
        }
    }
}
