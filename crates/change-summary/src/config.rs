//! Scheduler configuration.

use change_summary_path::cache::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::source::ChangeStrategy;

/// Passes a checkpoint (or a single observer's `deliver`) runs before it
/// gives up on reaching a fixed point.
pub const MAX_DIRTY_CHECK_CYCLES: usize = 1000;

/// What a checkpoint does when it stops at the cycle cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleLimitPolicy {
    /// Stop and return the report; `cycle_limit_reached` is set.
    #[default]
    Silent,
    /// Like `Silent`, but log a warning.
    Warn,
    /// Log a warning and return [`CheckpointError::CycleLimit`](crate::CheckpointError).
    Error,
}

/// Settings fixed for the lifetime of a [`Scheduler`](crate::Scheduler).
///
/// Every field is optional when deserializing:
///
/// ```
/// use change_summary::{ChangeStrategy, CycleLimitPolicy, SchedulerConfig};
///
/// let config: SchedulerConfig =
///     serde_json::from_str(r#"{"cycle_limit": "warn", "strategy": "records"}"#).unwrap();
/// assert_eq!(config.max_cycles, 1000);
/// assert_eq!(config.cycle_limit, CycleLimitPolicy::Warn);
/// assert_eq!(config.strategy, ChangeStrategy::Records);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on passes per checkpoint; values below 1 behave as 1.
    pub max_cycles: usize,
    pub cycle_limit: CycleLimitPolicy,
    pub strategy: ChangeStrategy,
    /// Distinct path strings kept parsed; 0 disables the cache.
    pub path_cache_capacity: usize,
}

impl SchedulerConfig {
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_cycle_limit(mut self, policy: CycleLimitPolicy) -> Self {
        self.cycle_limit = policy;
        self
    }

    pub fn with_strategy(mut self, strategy: ChangeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_path_cache_capacity(mut self, capacity: usize) -> Self {
        self.path_cache_capacity = capacity;
        self
    }

    pub(crate) fn cycle_cap(&self) -> usize {
        self.max_cycles.max(1)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_cycles: MAX_DIRTY_CHECK_CYCLES,
            cycle_limit: CycleLimitPolicy::Silent,
            strategy: ChangeStrategy::Polling,
            path_cache_capacity: DEFAULT_CAPACITY,
        }
    }
}
