//! Listener timing configuration.

use std::time::Duration;

/// Configuration for listener pacing.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Pause while the watch set is empty before checking it again.
    pub idle_backoff: Duration,
    /// Pause after each full pass over the watch set.
    pub poll_interval: Duration,
    /// Pause after the exchange fails a request.
    pub failure_backoff: Duration,
    /// How long `stop` waits for an in-flight poll before aborting it.
    pub stop_grace: Duration,
    /// Capacity of the notification channel. Zero is treated as one.
    pub queue_capacity: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            idle_backoff: Duration::from_secs(2),
            poll_interval: Duration::from_secs(30),
            failure_backoff: Duration::from_secs(30),
            stop_grace: Duration::from_secs(5),
            queue_capacity: 64,
        }
    }
}

impl ListenerConfig {
    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}
