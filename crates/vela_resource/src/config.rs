//! Resource configuration.
//!
//! [`ResourceConfig`] controls the scheduler's retry, timeout and concurrency
//! behaviour, plus how many state changes observers may fall behind by.
//!
//! # Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | `retries` | 2 (at most 3 attempts per invocation) |
//! | `timeout` | 3000 ms per attempt |
//! | `retry_delay` | none |
//! | `policy` | [`ConcurrencyPolicy::Exhaust`] |
//! | `history_capacity` | 64 |

use core::time::Duration;

use crate::error::ConfigError;

/// Default number of retries after a failed attempt.
pub const DEFAULT_RETRIES: u32 = 2;

/// Default per-attempt deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Default number of buffered state changes per observer.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Largest accepted history capacity.
pub const MAX_HISTORY_CAPACITY: usize = 1 << 16;

/// What the scheduler does with a trigger that arrives while an invocation
/// is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConcurrencyPolicy {
    /// Drop the trigger. At most one invocation exists at a time and
    /// intermediate triggers are lost.
    #[default]
    Exhaust,
    /// Drop the trigger, but remember that one arrived. After the in-flight
    /// invocation settles, exactly one more starts with the request tuple
    /// current at that moment.
    ExhaustLatest,
    /// Supersede the in-flight invocation. Its result is discarded even if it
    /// has already been produced.
    Switch,
}

/// Scheduler and store configuration for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Retries after a failed attempt, within one invocation.
    pub retries: u32,
    /// Deadline for each attempt. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Pause between a failed attempt and its retry.
    pub retry_delay: Duration,
    /// Handling of triggers that arrive while busy.
    pub policy: ConcurrencyPolicy,
    /// State changes buffered per observer before it starts skipping.
    pub history_capacity: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            timeout: Some(DEFAULT_TIMEOUT),
            retry_delay: Duration::ZERO,
            policy: ConcurrencyPolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ResourceConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of retries.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the per-attempt deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disables the per-attempt deadline.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the concurrency policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the per-observer change buffer.
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Total attempts per invocation, the first one included.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Checks that the configuration can be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero timeout or a history capacity
    /// outside `1..=MAX_HISTORY_CAPACITY`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::ZeroTimeout);
        }
        if !(1..=MAX_HISTORY_CAPACITY).contains(&self.history_capacity) {
            return Err(ConfigError::HistoryCapacity {
                capacity: self.history_capacity,
                max: MAX_HISTORY_CAPACITY,
            });
        }
        Ok(())
    }
}
