//! The hub: channel fan-out behind a single actor thread.

mod actor;
mod command;
mod config;
mod stats;

pub use config::HubConfig;
pub use stats::{ChannelStats, HubStats};

use crate::error::Result;
use crate::repository::Repository;
use crate::subscriptions::{SubscribeOutcome, Subscription, SubscriptionHandle, SubscriptionId};
use crate::types::{Comment, Event};
use actor::HubActor;
use command::{Admission, Command};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Handle to a running hub.
///
/// Cloning is cheap and every clone talks to the same actor. Operations are
/// queued to the actor and processed one at a time in arrival order. None
/// of them fail: publishing to an unknown or closed channel does nothing,
/// and after [`shutdown`](Hub::shutdown) every call is a no-op.
///
/// The hub shuts itself down when the last clone is dropped.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    inbox: Sender<Command>,
    dead: Arc<AtomicBool>,
    next_id: AtomicU64,
    actor: Mutex<Option<JoinHandle<()>>>,
}

impl Hub {
    /// Validate `config` and start the actor thread.
    pub fn new(config: HubConfig) -> Result<Self> {
        config.validate()?;

        let (inbox, commands) = bounded(config.inbox_capacity);
        let dead = Arc::new(AtomicBool::new(false));
        let actor = HubActor::new(&config, commands, Arc::clone(&dead));
        let handle = thread::Builder::new()
            .name("herald-hub".into())
            .spawn(move || actor.run())?;

        info!(
            buffer_size = config.buffer_size,
            replay_all = config.replay_all,
            "hub started"
        );

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                inbox,
                dead,
                next_id: AtomicU64::new(1),
                actor: Mutex::new(Some(handle)),
            }),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Whether the hub has been shut down.
    pub fn is_shut_down(&self) -> bool {
        self.inner.dead.load(Ordering::Acquire)
    }

    /// Install (or replace) the replay source for `channel`.
    ///
    /// Applies to subscriptions admitted afterwards.
    pub fn register<R: Repository + 'static>(&self, channel: &str, repository: R) {
        self.send(Command::Register {
            channel: Arc::from(channel),
            repository: Arc::new(repository),
        });
    }

    /// Subscribe to `channel`, resuming after `last_event_id` if given.
    ///
    /// An empty id counts as none. When the subscriber resumes (or the hub
    /// replays unconditionally) and the channel has a repository, history
    /// is fed into the new subscription from a separate thread; see
    /// [`SubscriptionHandle::wait_for_replay`].
    pub fn subscribe(&self, channel: &str, last_event_id: Option<&str>) -> SubscribeOutcome {
        if self.is_shut_down() {
            return SubscribeOutcome::HubClosed;
        }

        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let last_event_id = last_event_id.filter(|last| !last.is_empty());
        let (subscription, handle) =
            Subscription::open(id, channel, last_event_id, self.inner.config.buffer_size);

        let (reply, admission) = bounded(1);
        if !self.send(Command::Subscribe { subscription, reply }) {
            return SubscribeOutcome::HubClosed;
        }

        match admission.recv() {
            Ok(Admission::Admitted) => SubscribeOutcome::Subscribed(handle),
            Ok(Admission::ChannelClosed) => SubscribeOutcome::ChannelClosed,
            Err(_) => SubscribeOutcome::HubClosed,
        }
    }

    /// Remove a subscription and close its queues. Repeat calls are no-ops.
    pub fn unregister(&self, handle: &SubscriptionHandle) {
        self.send(Command::Unregister {
            channel: Arc::clone(&handle.channel),
            id: handle.id,
        });
    }

    /// Deliver `event` to every live subscriber of each of `channels`.
    ///
    /// Subscribers whose queue is full are disconnected instead.
    pub fn publish(&self, channels: &[&str], event: Event) {
        self.send(Command::Publish {
            channels: channels.iter().map(|c| Arc::from(*c)).collect(),
            event,
        });
    }

    /// Deliver a comment to every live subscriber of each of `channels`.
    pub fn publish_comment(&self, channels: &[&str], comment: impl Into<Comment>) {
        self.send(Command::PublishComment {
            channels: channels.iter().map(|c| Arc::from(*c)).collect(),
            comment: comment.into(),
        });
    }

    /// Disconnect everyone on `channel` and refuse it from now on.
    pub fn close_channel(&self, channel: &str) {
        self.send(Command::CloseChannel {
            channel: Arc::from(channel),
        });
    }

    /// Snapshot of hub state, or `None` once the hub is shut down.
    pub fn stats(&self) -> Option<HubStats> {
        let (reply, stats) = bounded(1);
        if !self.send(Command::Stats { reply }) {
            return None;
        }
        stats.recv().ok()
    }

    /// Destroy every subscription and stop the actor. Cannot be undone.
    ///
    /// Blocks until the actor has exited, including when another clone is
    /// already shutting it down.
    pub fn shutdown(&self) {
        // Held until the join completes so concurrent callers wait here.
        let mut actor = self.inner.actor.lock();
        if let Some(handle) = actor.take() {
            let _ = self.inner.inbox.send(Command::Shutdown);
            if handle.join().is_err() {
                warn!("hub actor panicked");
            }
        }
    }

    /// Queue a command; false if the actor is gone.
    fn send(&self, command: Command) -> bool {
        if self.is_shut_down() {
            return false;
        }
        self.inner.inbox.send(command).is_ok()
    }
}

impl Drop for HubInner {
    fn drop(&mut self) {
        if let Some(actor) = self.actor.get_mut().take() {
            let _ = self.inbox.send(Command::Shutdown);
            let _ = actor.join();
        }
    }
}
