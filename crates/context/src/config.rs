//! Runner configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to a running task when its context wins the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Leave the task running; its result is never observed
    #[default]
    Detach,
    /// Abort the task at its next await point
    Abort,
}

/// Configuration for the context manager and batch helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Simulated processing time per item in `process_items`
    #[serde(with = "millis")]
    pub item_delay: Duration,
    /// Fate of a task whose context is cancelled first
    pub on_cancel: CancelPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(100),
            on_cancel: CancelPolicy::Detach,
        }
    }
}

impl RunnerConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-item delay.
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    /// Set the cancellation policy.
    pub fn with_on_cancel(mut self, policy: CancelPolicy) -> Self {
        self.on_cancel = policy;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
