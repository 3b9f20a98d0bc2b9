//! Messages accepted by the hub actor.

use super::stats::HubStats;
use crate::repository::Repository;
use crate::subscriptions::{Subscription, SubscriptionId};
use crate::types::{Comment, Event};
use crossbeam_channel::Sender;
use std::sync::Arc;

pub(crate) enum Command {
    Register {
        channel: Arc<str>,
        repository: Arc<dyn Repository>,
    },
    Subscribe {
        subscription: Subscription,
        reply: Sender<Admission>,
    },
    Unregister {
        channel: Arc<str>,
        id: SubscriptionId,
    },
    Publish {
        channels: Vec<Arc<str>>,
        event: Event,
    },
    PublishComment {
        channels: Vec<Arc<str>>,
        comment: Comment,
    },
    CloseChannel {
        channel: Arc<str>,
    },
    Stats {
        reply: Sender<HubStats>,
    },
    Shutdown,
}

/// Actor's answer to a subscribe request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Admission {
    Admitted,
    ChannelClosed,
}
