//! Configuration types for the hierarchy mutator.

use std::time::Duration;

/// Configuration for the HierarchyMutator.
#[derive(Debug, Clone)]
pub struct HierarchyConfig {
    /// How many times a mutation is retried after the store reports a
    /// conflicting writer. Zero disables retries.
    pub max_conflict_retries: u32,
    /// Pause between retries.
    pub retry_backoff: Duration,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

impl HierarchyConfig {
    /// Create a config that surfaces the first conflict.
    pub fn no_retry() -> Self {
        Self {
            max_conflict_retries: 0,
            retry_backoff: Duration::ZERO,
        }
    }

    /// Create a config with a custom retry budget.
    pub fn with_retries(max_conflict_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            max_conflict_retries,
            retry_backoff,
        }
    }
}
