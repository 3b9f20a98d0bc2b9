//! In-memory ring buffer repository.

use super::Repository;
use crate::types::Event;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};

/// Keeps the most recent `capacity` events per channel.
///
/// Replay after an id yields the retained events that follow it. If the id
/// has already rotated out (or no id is given) every retained event is
/// replayed, since the subscriber is further behind than the buffer reaches.
pub struct MemoryRepository {
    capacity: usize,
    channels: RwLock<HashMap<String, VecDeque<Event>>>,
}

impl MemoryRepository {
    /// Create a repository retaining up to `capacity` events per channel.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Record an event for `channel`, evicting the oldest one when full.
    pub fn append(&self, channel: &str, event: Event) {
        let mut channels = self.channels.write();
        let buffer = channels
            .entry(channel.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(event);
    }

    /// Number of events retained for `channel`.
    pub fn len(&self, channel: &str) -> usize {
        self.channels.read().get(channel).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, channel: &str) -> bool {
        self.len(channel) == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all history for `channel`.
    pub fn clear(&self, channel: &str) {
        self.channels.write().remove(channel);
    }
}

impl Repository for MemoryRepository {
    fn replay(&self, channel: &str, last_event_id: Option<&str>) -> Box<dyn Iterator<Item = Event> + '_> {
        // Snapshot under the read lock; the replay thread may block on a
        // full subscriber queue and must not hold up appends meanwhile.
        let snapshot: Vec<Event> = {
            let channels = self.channels.read();
            let Some(buffer) = channels.get(channel) else {
                return Box::new(std::iter::empty());
            };
            let start = last_event_id
                .and_then(|id| buffer.iter().position(|e| e.id() == id))
                .map_or(0, |pos| pos + 1);
            buffer.iter().skip(start).cloned().collect()
        };
        Box::new(snapshot.into_iter())
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new(1024)
    }
}
