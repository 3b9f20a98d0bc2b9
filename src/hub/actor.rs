//! The hub actor: sole owner of channel state.
//!
//! Every operation arrives as a [`Command`] on one inbox and runs to
//! completion before the next is taken, so fan-out to a channel can never
//! interleave with a subscribe or unregister on it. Nothing else touches
//! these maps, which is why none of them sit behind a lock.

use super::command::{Admission, Command};
use super::config::HubConfig;
use super::stats::{ChannelStats, HubStats};
use crate::repository::Repository;
use crate::subscriptions::{spawn_replay, Delivery, Subscription, SubscriptionId, SubscriptionSink};
use crate::types::Comment;
use crossbeam_channel::{Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Per-channel state.
#[derive(Default)]
struct ChannelState {
    subscribers: HashMap<SubscriptionId, Subscription>,
    repository: Option<Arc<dyn Repository>>,
    /// One-way: set by `CloseChannel`.
    closed: bool,
}

impl ChannelState {
    /// Nothing worth keeping an entry for.
    fn is_idle(&self) -> bool {
        self.subscribers.is_empty() && self.repository.is_none() && !self.closed
    }

    fn destroy_subscribers(&mut self) -> usize {
        let count = self.subscribers.len();
        for (_, subscription) in self.subscribers.drain() {
            subscription.destroy();
        }
        count
    }
}

pub(crate) struct HubActor {
    inbox: Receiver<Command>,
    channels: HashMap<Arc<str>, ChannelState>,
    replay_all: bool,
    /// Mirrored to hub handles so they can skip work after shutdown.
    dead: Arc<AtomicBool>,
    events_published: u64,
    comments_published: u64,
    slow_consumers_dropped: u64,
}

impl HubActor {
    pub(crate) fn new(config: &HubConfig, inbox: Receiver<Command>, dead: Arc<AtomicBool>) -> Self {
        Self {
            inbox,
            channels: HashMap::new(),
            replay_all: config.replay_all,
            dead,
            events_published: 0,
            comments_published: 0,
            slow_consumers_dropped: 0,
        }
    }

    /// Process commands until shutdown or until every hub handle is gone.
    pub(crate) fn run(mut self) {
        debug!("hub actor running");
        while let Ok(command) = self.inbox.recv() {
            if self.handle(command).is_break() {
                break;
            }
        }
        self.shutdown();
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Register { channel, repository } => self.register(channel, repository),
            Command::Subscribe { subscription, reply } => self.subscribe(subscription, reply),
            Command::Unregister { channel, id } => self.unregister(&channel, id),
            Command::Publish { channels, event } => {
                self.events_published += 1;
                for channel in distinct(channels) {
                    self.fan_out(&channel, |sink| sink.try_send_event(event.clone()));
                }
            }
            Command::PublishComment { channels, comment } => {
                self.comments_published += 1;
                for channel in distinct(channels) {
                    self.fan_out(&channel, |sink| sink.try_send_comment(Comment::clone(&comment)));
                }
            }
            Command::CloseChannel { channel } => self.close_channel(channel),
            Command::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn register(&mut self, channel: Arc<str>, repository: Arc<dyn Repository>) {
        let state = self.channels.entry(Arc::clone(&channel)).or_default();
        if state.closed {
            debug!(channel = %channel, "ignoring repository for closed channel");
            return;
        }
        state.repository = Some(repository);
        debug!(channel = %channel, "repository registered");
    }

    fn subscribe(&mut self, mut subscription: Subscription, reply: Sender<Admission>) {
        let wants_replay = self.replay_all || subscription.last_event_id.is_some();
        let state = self.channels.entry(Arc::clone(&subscription.channel)).or_default();

        if state.closed {
            subscription.destroy();
            let _ = reply.send(Admission::ChannelClosed);
            return;
        }
        if reply.send(Admission::Admitted).is_err() {
            // Caller went away before admission.
            subscription.destroy();
            return;
        }

        match &state.repository {
            Some(repository) if wants_replay => {
                if let Err(e) = spawn_replay(Arc::clone(repository), &mut subscription) {
                    warn!(subscription = %subscription.id, channel = %subscription.channel, "failed to start replay: {}", e);
                }
            }
            _ => {
                subscription.replay_done.take();
            }
        }

        debug!(
            subscription = %subscription.id,
            channel = %subscription.channel,
            last_event_id = subscription.last_event_id.as_deref().unwrap_or(""),
            "subscribed"
        );
        state.subscribers.insert(subscription.id, subscription);
    }

    fn unregister(&mut self, channel: &str, id: SubscriptionId) {
        let Some(state) = self.channels.get_mut(channel) else {
            return;
        };
        if let Some(subscription) = state.subscribers.remove(&id) {
            subscription.destroy();
            debug!(subscription = %id, channel = %channel, "unregistered");
        }
        self.prune(channel);
    }

    /// One delivery attempt per live subscriber of `channel`. Subscribers
    /// that cannot take it are removed and destroyed before returning.
    fn fan_out<F>(&mut self, channel: &str, deliver: F)
    where
        F: Fn(&SubscriptionSink) -> Delivery,
    {
        let Some(state) = self.channels.get_mut(channel) else {
            return;
        };
        if state.closed {
            return;
        }

        let mut delivered = 0usize;
        let mut full = Vec::new();
        let mut gone = Vec::new();
        for (id, subscription) in &state.subscribers {
            match deliver(&subscription.sink) {
                Delivery::Delivered => delivered += 1,
                Delivery::Full => full.push(*id),
                Delivery::Disconnected => gone.push(*id),
            }
        }

        for id in full {
            if let Some(subscription) = state.subscribers.remove(&id) {
                subscription.destroy();
                self.slow_consumers_dropped += 1;
                warn!(subscription = %id, channel = %channel, "queue full, disconnecting slow consumer");
            }
        }
        for id in gone {
            if let Some(subscription) = state.subscribers.remove(&id) {
                subscription.destroy();
                debug!(subscription = %id, channel = %channel, "reader dropped, unregistered");
            }
        }

        trace!(channel = %channel, delivered, "fan-out complete");
        self.prune(channel);
    }

    fn close_channel(&mut self, channel: Arc<str>) {
        let state = self.channels.entry(Arc::clone(&channel)).or_default();
        let destroyed = state.destroy_subscribers();
        state.closed = true;
        state.repository = None;
        info!(channel = %channel, destroyed, "channel closed");
    }

    fn shutdown(&mut self) {
        let destroyed: usize = self
            .channels
            .values_mut()
            .map(ChannelState::destroy_subscribers)
            .sum();
        self.channels.clear();
        self.dead.store(true, Ordering::Release);
        info!(destroyed, "hub shut down");
    }

    fn prune(&mut self, channel: &str) {
        if self.channels.get(channel).is_some_and(ChannelState::is_idle) {
            self.channels.remove(channel);
        }
    }

    fn stats(&self) -> HubStats {
        let channels = self
            .channels
            .iter()
            .map(|(name, state)| {
                let stats = ChannelStats {
                    subscribers: state.subscribers.len(),
                    closed: state.closed,
                    has_repository: state.repository.is_some(),
                };
                (name.to_string(), stats)
            })
            .collect();

        HubStats {
            subscriptions: self.channels.values().map(|s| s.subscribers.len()).sum(),
            channels,
            events_published: self.events_published,
            comments_published: self.comments_published,
            slow_consumers_dropped: self.slow_consumers_dropped,
        }
    }
}

/// Drop repeated channel names, keeping first-seen order.
fn distinct(channels: Vec<Arc<str>>) -> Vec<Arc<str>> {
    let mut seen = HashSet::with_capacity(channels.len());
    channels.into_iter().filter(|c| seen.insert(Arc::clone(c))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use crate::subscriptions::SubscriptionHandle;
    use crate::types::Event;
    use crossbeam_channel::{bounded, TryRecvError};
    use std::time::Duration;

    fn actor(config: HubConfig) -> HubActor {
        let (_tx, rx) = bounded(1);
        HubActor::new(&config, rx, Arc::new(AtomicBool::new(false)))
    }

    fn subscribe(
        actor: &mut HubActor,
        id: u64,
        channel: &str,
        last_event_id: Option<&str>,
        buffer_size: usize,
    ) -> (Admission, SubscriptionHandle) {
        let (subscription, handle) = Subscription::open(SubscriptionId(id), channel, last_event_id, buffer_size);
        let (reply, admission) = bounded(1);
        let flow = actor.handle(Command::Subscribe { subscription, reply });
        assert!(flow.is_continue());
        (admission.recv().unwrap(), handle)
    }

    fn publish(actor: &mut HubActor, channels: &[&str], id: &str) {
        let channels = channels.iter().map(|c| Arc::from(*c)).collect();
        let _ = actor.handle(Command::Publish {
            channels,
            event: Event::new(id, "message", "payload"),
        });
    }

    #[test]
    fn test_fan_out_reaches_every_subscriber() {
        let mut actor = actor(HubConfig::default());
        let (_, a) = subscribe(&mut actor, 1, "t", None, 4);
        let (_, b) = subscribe(&mut actor, 2, "t", None, 4);

        publish(&mut actor, &["t"], "1");

        assert_eq!(a.try_recv_event().unwrap().id(), "1");
        assert_eq!(b.try_recv_event().unwrap().id(), "1");
    }

    #[test]
    fn test_full_queue_disconnects_only_that_subscriber() {
        let mut actor = actor(HubConfig::default());
        let (_, slow) = subscribe(&mut actor, 1, "t", None, 1);
        let (_, fast) = subscribe(&mut actor, 2, "t", None, 4);

        publish(&mut actor, &["t"], "A");
        publish(&mut actor, &["t"], "B");

        assert_eq!(slow.try_recv_event().unwrap().id(), "A");
        assert!(matches!(slow.try_recv_event(), Err(TryRecvError::Disconnected)));
        assert_eq!(fast.try_recv_event().unwrap().id(), "A");
        assert_eq!(fast.try_recv_event().unwrap().id(), "B");

        let stats = actor.stats();
        assert_eq!(stats.subscribers("t"), 1);
        assert_eq!(stats.slow_consumers_dropped, 1);
    }

    #[test]
    fn test_repeated_channel_delivers_once() {
        let mut actor = actor(HubConfig::default());
        let (_, handle) = subscribe(&mut actor, 1, "t", None, 4);

        publish(&mut actor, &["t", "t"], "1");

        assert_eq!(handle.try_recv_event().unwrap().id(), "1");
        assert!(matches!(handle.try_recv_event(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_unregister_twice_is_noop() {
        let mut actor = actor(HubConfig::default());
        let (_, handle) = subscribe(&mut actor, 1, "t", None, 4);

        for _ in 0..2 {
            let _ = actor.handle(Command::Unregister {
                channel: Arc::from("t"),
                id: handle.id(),
            });
        }

        assert!(matches!(handle.try_recv_event(), Err(TryRecvError::Disconnected)));
        assert!(actor.channels.is_empty());
    }

    #[test]
    fn test_closed_channel_rejects_and_ignores() {
        let mut actor = actor(HubConfig::default());
        let (_, before) = subscribe(&mut actor, 1, "t", None, 4);

        let _ = actor.handle(Command::CloseChannel { channel: Arc::from("t") });
        assert!(matches!(before.try_recv_event(), Err(TryRecvError::Disconnected)));

        let (admission, after) = subscribe(&mut actor, 2, "t", None, 4);
        assert_eq!(admission, Admission::ChannelClosed);
        assert!(matches!(after.try_recv_event(), Err(TryRecvError::Disconnected)));

        publish(&mut actor, &["t"], "1");
        assert!(actor.stats().is_closed("t"));
    }

    #[test]
    fn test_replay_only_with_repository_and_resume_point() {
        let mut actor = actor(HubConfig::default());
        let repo = MemoryRepository::new(8);
        repo.append("news", Event::new("1", "headline", "a"));
        let _ = actor.handle(Command::Register {
            channel: Arc::from("news"),
            repository: Arc::new(repo),
        });

        let (_, fresh) = subscribe(&mut actor, 1, "news", None, 4);
        assert!(fresh.wait_for_replay(Duration::from_secs(1)));
        assert!(fresh.try_recv_event().is_err());

        let (_, resumed) = subscribe(&mut actor, 2, "news", Some("0"), 4);
        assert!(resumed.wait_for_replay(Duration::from_secs(2)));
        assert_eq!(resumed.try_recv_event().unwrap().id(), "1");
    }

    #[test]
    fn test_shutdown_breaks_and_destroys() {
        let mut actor = actor(HubConfig::default());
        let (_, a) = subscribe(&mut actor, 1, "a", None, 4);
        let (_, b) = subscribe(&mut actor, 2, "b", None, 4);

        assert!(actor.handle(Command::Shutdown).is_break());
        actor.shutdown();

        assert!(actor.dead.load(Ordering::Acquire));
        assert!(matches!(a.try_recv_event(), Err(TryRecvError::Disconnected)));
        assert!(matches!(b.try_recv_event(), Err(TryRecvError::Disconnected)));
    }
}
