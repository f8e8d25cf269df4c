use std::time::Duration;

use crate::config::PollingConfig;

/// Two-speed poll cadence.
///
/// Every update grants `burst_length` cycles at the fast interval; once the
/// budget is spent the loop falls back to the slow interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    fast: Duration,
    slow: Duration,
    burst_length: u32,
    remaining: u32,
}

impl Backoff {
    pub fn new(fast: Duration, slow: Duration, burst_length: u32) -> Self {
        Self {
            fast,
            slow,
            burst_length,
            remaining: 0,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(
            config.fast_interval(),
            config.slow_interval(),
            config.burst_length(),
        )
    }

    pub fn fast(&self) -> Duration {
        self.fast
    }

    pub fn slow(&self) -> Duration {
        self.slow
    }

    pub fn burst_length(&self) -> u32 {
        self.burst_length
    }

    /// Fast cycles left in the current burst.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Delay before the next poll, given whether the last one brought news.
    pub fn next_interval(&mut self, updated: bool) -> Duration {
        if updated {
            self.remaining = self.burst_length;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            self.fast
        } else {
            self.slow
        }
    }

    /// Delay after a failed cycle. The burst budget is left as it was.
    pub fn after_failure(&self) -> Duration {
        self.slow
    }
}
