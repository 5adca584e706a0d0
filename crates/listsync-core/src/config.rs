//! Sync configuration and the policy objects derived from it.
//!
//! Every delay and limit the engine uses lives here. Durations are
//! expressed in milliseconds on the wire.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::plan::SyncMode;

/// Top-level configuration for a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Which half of the difference to apply.
    pub mode: SyncMode,
    /// Pause after every processed member.
    pub inter_request_delay_ms: u64,
    /// Hard cap on collector iterations.
    pub max_collector_iterations: u32,
    /// Iterations without growth before the collector stops.
    pub stable_iterations_to_stop: u32,
    /// Wait after each reveal for the view to settle.
    pub collector_settle_ms: u64,
    /// Wait after preparing a view, before the first capture.
    pub rewind_settle_ms: u64,
    /// Consecutive failures that trigger the extended backoff.
    pub consecutive_error_threshold: u32,
    /// Length of the extended backoff.
    pub extended_backoff_ms: u64,
    /// Retries for rate-limited or transient lookups.
    pub resolver_max_retries: u32,
    /// Base of the resolver's exponential backoff.
    pub resolver_base_delay_ms: u64,
    /// Optional ceiling on a single resolver backoff.
    pub resolver_max_backoff_ms: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::Full,
            inter_request_delay_ms: 3_000,
            max_collector_iterations: 300,
            stable_iterations_to_stop: 10,
            collector_settle_ms: 800,
            rewind_settle_ms: 1_000,
            consecutive_error_threshold: 3,
            extended_backoff_ms: 60_000,
            resolver_max_retries: 3,
            resolver_base_delay_ms: 30_000,
            resolver_max_backoff_ms: None,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine loop or stall.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_collector_iterations == 0 {
            return Err(ConfigError::invalid("max_collector_iterations", "must be at least 1"));
        }
        if self.stable_iterations_to_stop == 0 {
            return Err(ConfigError::invalid("stable_iterations_to_stop", "must be at least 1"));
        }
        if self.consecutive_error_threshold == 0 {
            return Err(ConfigError::invalid("consecutive_error_threshold", "must be at least 1"));
        }
        if let Some(ceiling) = self.resolver_max_backoff_ms {
            if ceiling == 0 {
                return Err(ConfigError::invalid("resolver_max_backoff_ms", "must be positive when set"));
            }
        }
        Ok(())
    }

    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }

    pub fn extended_backoff(&self) -> Duration {
        Duration::from_millis(self.extended_backoff_ms)
    }

    pub fn rewind_settle(&self) -> Duration {
        Duration::from_millis(self.rewind_settle_ms)
    }

    /// Convergence policy for the collector.
    pub fn collector_policy(&self) -> CollectorPolicy {
        CollectorPolicy {
            max_iterations: self.max_collector_iterations,
            stable_iterations_to_stop: self.stable_iterations_to_stop,
            settle: Duration::from_millis(self.collector_settle_ms),
        }
    }

    /// Retry policy for identifier resolution.
    pub fn resolver_policy(&self) -> ResolverPolicy {
        ResolverPolicy {
            max_retries: self.resolver_max_retries,
            backoff: BackoffPolicy {
                base: Duration::from_millis(self.resolver_base_delay_ms),
                ceiling: self.resolver_max_backoff_ms.map(Duration::from_millis),
            },
        }
    }

    /// Burst-failure circuit breaker settings.
    pub fn burst_policy(&self) -> BurstPolicy {
        BurstPolicy {
            threshold: self.consecutive_error_threshold,
            backoff: self.extended_backoff(),
        }
    }
}

/// When the collector stops asking for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorPolicy {
    pub max_iterations: u32,
    pub stable_iterations_to_stop: u32,
    pub settle: Duration,
}

impl Default for CollectorPolicy {
    fn default() -> Self {
        SyncConfig::default().collector_policy()
    }
}

/// Exponential backoff: `2^(attempt + 1) * base`, optionally capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub ceiling: Option<Duration>,
}

impl BackoffPolicy {
    /// Delay before retry number `attempt + 1` (attempt is zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_add(1));
        let delay = self.base.saturating_mul(factor);
        match self.ceiling {
            Some(ceiling) => delay.min(ceiling),
            None => delay,
        }
    }
}

/// Retry settings for the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverPolicy {
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        SyncConfig::default().resolver_policy()
    }
}

/// Pause after `threshold` consecutive member failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstPolicy {
    pub threshold: u32,
    pub backoff: Duration,
}
