//! Draining a subscription into a connection.
//!
//! The transport (HTTP response, socket, test buffer) implements
//! [`EventSink`]; [`drive`] pumps both queues into it and takes care of
//! telling the hub when the stream ends from the connection's side.

use crate::hub::Hub;
use crate::subscriptions::SubscriptionHandle;
use crate::types::{Comment, Event};
use crossbeam_channel::{select, Receiver};
use std::io;
use tracing::{debug, warn};

/// Destination for a subscription's stream. Encoding is up to the implementor.
pub trait EventSink {
    fn send_event(&mut self, event: &Event) -> io::Result<()>;

    fn send_comment(&mut self, comment: &Comment) -> io::Result<()>;

    /// Called after each successful write.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Why [`drive`] returned.
#[derive(Debug)]
pub enum StreamEnd {
    /// The hub closed the subscription (unregister, channel close, shutdown
    /// or slow-consumer drop).
    Completed,
    /// The peer went away; the subscription has been unregistered.
    Disconnected,
    /// Writing to the sink failed; the subscription has been unregistered.
    Failed(io::Error),
}

/// Pump `subscription` into `sink` until the stream ends.
///
/// `disconnect` fires (or its sender is dropped) when the peer goes away.
pub fn drive<S: EventSink>(
    hub: &Hub,
    subscription: &SubscriptionHandle,
    sink: &mut S,
    disconnect: &Receiver<()>,
) -> StreamEnd {
    let end = pump(subscription, sink, disconnect);
    match &end {
        StreamEnd::Completed => {
            debug!(subscription = %subscription.id(), channel = subscription.channel(), "stream completed");
        }
        StreamEnd::Disconnected => {
            debug!(subscription = %subscription.id(), channel = subscription.channel(), "peer disconnected");
            hub.unregister(subscription);
        }
        StreamEnd::Failed(e) => {
            warn!(subscription = %subscription.id(), channel = subscription.channel(), "stream write failed: {}", e);
            hub.unregister(subscription);
        }
    }
    end
}

fn pump<S: EventSink>(subscription: &SubscriptionHandle, sink: &mut S, disconnect: &Receiver<()>) -> StreamEnd {
    loop {
        let written = select! {
            recv(disconnect) -> _ => return StreamEnd::Disconnected,
            recv(subscription.events()) -> msg => match msg {
                Ok(event) => sink.send_event(&event),
                Err(_) => return drain_closed(subscription, sink),
            },
            recv(subscription.comments()) -> msg => match msg {
                Ok(comment) => sink.send_comment(&comment),
                Err(_) => return drain_closed(subscription, sink),
            },
        };
        if let Err(e) = written.and_then(|()| sink.flush()) {
            return StreamEnd::Failed(e);
        }
    }
}

/// Both queues close together; write out whatever is still buffered in either.
fn drain_closed<S: EventSink>(subscription: &SubscriptionHandle, sink: &mut S) -> StreamEnd {
    for event in subscription.events().try_iter() {
        if let Err(e) = sink.send_event(&event).and_then(|()| sink.flush()) {
            return StreamEnd::Failed(e);
        }
    }
    for comment in subscription.comments().try_iter() {
        if let Err(e) = sink.send_comment(&comment).and_then(|()| sink.flush()) {
            return StreamEnd::Failed(e);
        }
    }
    StreamEnd::Completed
}
