//! Environment-driven configuration for the agent manager.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every configuration variable.
pub const CONFIG_ENV_PREFIX: &str = "AGENT_MANAGER_";

/// Default delay between runtime environment retries, in milliseconds.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1_000;
/// Default number of retries after the first runtime environment attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 30;
/// Default bound on a single agent RPC, in milliseconds.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 30_000;
/// Default time a launched agent has to register, in milliseconds.
pub const DEFAULT_REGISTER_TIMEOUT_MS: u64 = 30_000;
/// Default base interval for restart backoff, in milliseconds.
pub const DEFAULT_RESTART_INTERVAL_MS: u64 = 1_000;
/// Default restart ceiling.
pub const DEFAULT_MAX_RESTART_COUNT: u32 = 5;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was present but could not be parsed.
    #[error("invalid agent manager configuration: {0}")]
    Env(#[from] envy::Error),
}

/// Timing and retry settings for agent supervision and brokering.
///
/// Every field falls back to its default when the matching
/// `AGENT_MANAGER_*` variable is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentManagerConfig {
    /// Delay between runtime environment retries, in milliseconds.
    pub retry_interval_ms: u64,
    /// Retries allowed after the first runtime environment attempt.
    pub max_retries: u32,
    /// Bound on a single agent RPC, in milliseconds.
    pub rpc_timeout_ms: u64,
    /// Time a launched agent has to register before it is killed, in
    /// milliseconds.
    pub register_timeout_ms: u64,
    /// Base interval for restart backoff, in milliseconds.
    pub restart_interval_ms: u64,
    /// Restarts allowed before supervision gives up.
    pub max_restart_count: u32,
}

impl Default for AgentManagerConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
            register_timeout_ms: DEFAULT_REGISTER_TIMEOUT_MS,
            restart_interval_ms: DEFAULT_RESTART_INTERVAL_MS,
            max_restart_count: DEFAULT_MAX_RESTART_COUNT,
        }
    }
}

impl AgentManagerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a variable holds an unparseable
    /// value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(CONFIG_ENV_PREFIX).from_env()?)
    }

    /// Loads configuration from explicit key/value pairs.
    ///
    /// Keys carry the same `AGENT_MANAGER_` prefix as environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a value cannot be parsed.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(CONFIG_ENV_PREFIX).from_iter(vars)?)
    }

    /// Returns the delay between runtime environment retries.
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Returns the bound on a single agent RPC.
    #[must_use]
    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Returns how long a launched agent has to register.
    #[must_use]
    pub const fn register_timeout(&self) -> Duration {
        Duration::from_millis(self.register_timeout_ms)
    }

    /// Returns the wait before restart number `restart_count + 1`.
    ///
    /// The wait is `restart_interval * 2^(restart_count + 1)`, saturating at
    /// the largest representable duration.
    #[must_use]
    pub fn restart_backoff(&self, restart_count: u32) -> Duration {
        let factor = restart_count
            .checked_add(1)
            .and_then(|exponent| 2_u64.checked_pow(exponent))
            .unwrap_or(u64::MAX);
        Duration::from_millis(self.restart_interval_ms.saturating_mul(factor))
    }
}
