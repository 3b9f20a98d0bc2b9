//! Hub configuration.

use crate::error::{HubError, Result};
use serde::Deserialize;

/// Hub configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Let streams be read from any origin. Only the HTTP layer looks at this.
    pub allow_cors: bool,

    /// Replay the channel repository even when no last event id is supplied.
    pub replay_all: bool,

    /// Capacity of every subscription's event and comment queues; how far a
    /// client may fall behind before it is disconnected.
    /// Default: 128
    pub buffer_size: usize,

    /// Capacity of the hub actor's inbox. Callers block while it is full.
    /// Default: 1024
    pub inbox_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            allow_cors: false,
            replay_all: false,
            buffer_size: 128,
            inbox_capacity: 1024,
        }
    }
}

impl HubConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: HubConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(HubError::InvalidConfig("buffer_size must be positive".into()));
        }
        if self.inbox_capacity == 0 {
            return Err(HubError::InvalidConfig("inbox_capacity must be positive".into()));
        }
        Ok(())
    }
}
