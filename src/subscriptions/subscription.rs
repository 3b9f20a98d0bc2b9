//! Hub-side subscription state.

use super::types::{SubscriptionHandle, SubscriptionId};
use crate::types::{Comment, Event};
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of a non-blocking enqueue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// Queue at capacity (slow consumer).
    Full,
    /// Subscription destroyed or the handle was dropped.
    Disconnected,
}

/// Write side of a subscription's queues.
///
/// Shared between the hub actor and a replay thread. The senders live in
/// slots so that destroying the subscription drops them, which closes the
/// queues for the reader. Writers send under the read lock, so nothing can
/// land in a queue after `close`. A blocked replay send is woken by the
/// `closing` signal before `close` asks for the write lock.
pub(crate) struct SubscriptionSink {
    alive: AtomicBool,
    events: RwLock<Option<Sender<Event>>>,
    comments: RwLock<Option<Sender<Comment>>>,
    closing: Mutex<Option<Sender<()>>>,
    closed: Receiver<()>,
}

impl SubscriptionSink {
    fn new(events: Sender<Event>, comments: Sender<Comment>) -> Self {
        let (closing, closed) = bounded(0);
        Self {
            alive: AtomicBool::new(true),
            events: RwLock::new(Some(events)),
            comments: RwLock::new(Some(comments)),
            closing: Mutex::new(Some(closing)),
            closed,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub(crate) fn try_send_event(&self, event: Event) -> Delivery {
        try_send(&self.events, event)
    }

    pub(crate) fn try_send_comment(&self, comment: Comment) -> Delivery {
        try_send(&self.comments, comment)
    }

    /// Enqueue a replayed event, blocking until there is room.
    ///
    /// Returns false once the subscription is gone.
    pub(crate) fn send_replayed(&self, event: Event) -> bool {
        let events = self.events.read();
        let Some(tx) = events.as_ref() else {
            return false;
        };
        select! {
            send(tx, event) -> result => result.is_ok(),
            recv(self.closed) -> _ => false,
        }
    }

    /// Close both queues. Returns true only for the call that closed them.
    pub(crate) fn close(&self) -> bool {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.closing.lock().take();
        self.events.write().take();
        self.comments.write().take();
        true
    }
}

fn try_send<T>(slot: &RwLock<Option<Sender<T>>>, item: T) -> Delivery {
    match slot.read().as_ref().map(|tx| tx.try_send(item)) {
        Some(Ok(())) => Delivery::Delivered,
        Some(Err(TrySendError::Full(_))) => Delivery::Full,
        Some(Err(TrySendError::Disconnected(_))) | None => Delivery::Disconnected,
    }
}

/// A subscription as owned by the hub actor.
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) channel: Arc<str>,
    pub(crate) last_event_id: Option<Arc<str>>,
    pub(crate) sink: Arc<SubscriptionSink>,
    /// Dropped when replay completes, or at admission if there is none.
    pub(crate) replay_done: Option<Sender<()>>,
}

impl Subscription {
    /// Create the hub-side state and the caller's handle for a new subscription.
    pub(crate) fn open(
        id: SubscriptionId,
        channel: &str,
        last_event_id: Option<&str>,
        buffer_size: usize,
    ) -> (Subscription, SubscriptionHandle) {
        let (event_tx, event_rx) = bounded(buffer_size);
        let (comment_tx, comment_rx) = bounded(buffer_size);
        let (done_tx, done_rx) = bounded(0);
        let channel: Arc<str> = Arc::from(channel);
        let last_event_id: Option<Arc<str>> = last_event_id.map(Arc::from);

        let subscription = Subscription {
            id,
            channel: Arc::clone(&channel),
            last_event_id: last_event_id.clone(),
            sink: Arc::new(SubscriptionSink::new(event_tx, comment_tx)),
            replay_done: Some(done_tx),
        };
        let handle = SubscriptionHandle {
            id,
            channel,
            last_event_id,
            events: event_rx,
            comments: comment_rx,
            replay_done: done_rx,
        };
        (subscription, handle)
    }

    /// Close the queues. Safe to call more than once.
    pub(crate) fn destroy(&self) -> bool {
        self.sink.close()
    }
}
