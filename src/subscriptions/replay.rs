//! Replay of repository history into a newly admitted subscription.
//!
//! Replay runs on its own thread so the hub actor never waits on a
//! repository or on a subscriber's queue. Live events published while a
//! replay is in flight may interleave with replayed ones.

use super::subscription::Subscription;
use crate::repository::Repository;
use std::io;
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Start replaying `repository` history into `subscription`.
///
/// Takes the subscription's replay-done signal; it is released when the
/// thread exits, or right away if the thread cannot be spawned.
pub(crate) fn spawn(repository: Arc<dyn Repository>, subscription: &mut Subscription) -> io::Result<()> {
    let done = subscription.replay_done.take();
    let sink = Arc::clone(&subscription.sink);
    let channel = Arc::clone(&subscription.channel);
    let last_event_id = subscription.last_event_id.clone();
    let id = subscription.id;

    thread::Builder::new()
        .name(format!("herald-replay-{}", id))
        .spawn(move || {
            let _done = done;
            if !sink.is_alive() {
                return;
            }
            let mut replayed = 0usize;
            for event in repository.replay(&channel, last_event_id.as_deref()) {
                if !sink.send_replayed(event) {
                    debug!(subscription = %id, channel = %channel, replayed, "subscription gone, replay stopped");
                    return;
                }
                replayed += 1;
            }
            debug!(subscription = %id, channel = %channel, replayed, "replay finished");
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use crate::subscriptions::SubscriptionId;
    use crate::types::Event;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn news_repository(count: usize) -> Arc<dyn Repository> {
        let repo = MemoryRepository::new(64);
        for i in 1..=count {
            repo.append("news", Event::new(i.to_string(), "headline", "story"));
        }
        Arc::new(repo)
    }

    #[test]
    fn test_replays_in_order() {
        let (mut sub, handle) = Subscription::open(SubscriptionId(1), "news", Some("5"), 16);
        spawn(news_repository(7), &mut sub).unwrap();

        assert!(handle.wait_for_replay(TIMEOUT));
        assert_eq!(handle.try_recv_event().unwrap().id(), "6");
        assert_eq!(handle.try_recv_event().unwrap().id(), "7");
        assert!(handle.try_recv_event().is_err());
    }

    #[test]
    fn test_replay_outlasts_small_queue() {
        let (mut sub, handle) = Subscription::open(SubscriptionId(1), "news", None, 2);
        spawn(news_repository(10), &mut sub).unwrap();

        let ids: Vec<String> = (0..10)
            .map(|_| handle.recv_event_timeout(TIMEOUT).unwrap().id().to_string())
            .collect();
        let expected: Vec<String> = (1..=10).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
        assert!(handle.wait_for_replay(TIMEOUT));
    }

    #[test]
    fn test_destroyed_subscription_stops_replay() {
        let (mut sub, handle) = Subscription::open(SubscriptionId(1), "news", None, 1);
        spawn(news_repository(10), &mut sub).unwrap();

        assert_eq!(handle.recv_event_timeout(TIMEOUT).unwrap().id(), "1");
        sub.destroy();
        assert!(handle.wait_for_replay(TIMEOUT));
    }
}
