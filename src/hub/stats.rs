//! Point-in-time hub statistics.

use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot of hub state, taken by the actor between operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Live subscriptions across all channels.
    pub subscriptions: usize,
    /// Known channels by name.
    pub channels: BTreeMap<String, ChannelStats>,
    /// Publish calls processed.
    pub events_published: u64,
    /// Comment publish calls processed.
    pub comments_published: u64,
    /// Subscribers disconnected because their queue was full.
    pub slow_consumers_dropped: u64,
}

impl HubStats {
    /// Live subscribers on `channel` (zero for unknown channels).
    pub fn subscribers(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, |c| c.subscribers)
    }

    pub fn is_closed(&self, channel: &str) -> bool {
        self.channels.get(channel).is_some_and(|c| c.closed)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub subscribers: usize,
    pub closed: bool,
    pub has_repository: bool,
}
