//! Per-channel history stores queried for replay.
//!
//! A repository is registered against a channel with
//! [`Hub::register`](crate::Hub::register). When a subscriber resumes with a
//! last-seen id (or the hub replays unconditionally), the hub asks the
//! channel's repository for everything after that id and feeds it into the
//! new subscription from a separate thread.
//!
//! Storing events is up to the caller: publishing through the hub does not
//! write to any repository.

mod memory;

pub use memory::MemoryRepository;

use crate::types::Event;
use std::sync::Arc;

/// History source for a channel.
pub trait Repository: Send + Sync {
    /// Events on `channel` after `last_event_id`, oldest first.
    ///
    /// `None` means the subscriber supplied no id and the hub is configured
    /// to replay anyway. The iterator is consumed lazily on a replay thread
    /// and may be dropped early if the subscription goes away.
    fn replay(&self, channel: &str, last_event_id: Option<&str>) -> Box<dyn Iterator<Item = Event> + '_>;
}

impl<R: Repository + ?Sized> Repository for Arc<R> {
    fn replay(&self, channel: &str, last_event_id: Option<&str>) -> Box<dyn Iterator<Item = Event> + '_> {
        (**self).replay(channel, last_event_id)
    }
}

/// A repository with no history.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRepository;

impl Repository for NoopRepository {
    fn replay(&self, _channel: &str, _last_event_id: Option<&str>) -> Box<dyn Iterator<Item = Event> + '_> {
        Box::new(std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_yields_nothing() {
        let repo = NoopRepository;
        assert_eq!(repo.replay("news", Some("5")).count(), 0);
        assert_eq!(repo.replay("news", None).count(), 0);
    }

    #[test]
    fn test_shared_repository_delegates() {
        let repo = Arc::new(MemoryRepository::new(4));
        repo.append("news", Event::new("1", "headline", "a"));

        let shared: Arc<dyn Repository> = Arc::new(Arc::clone(&repo));
        let ids: Vec<_> = shared.replay("news", None).map(|e| e.id().to_string()).collect();
        assert_eq!(ids, vec!["1"]);
    }
}
