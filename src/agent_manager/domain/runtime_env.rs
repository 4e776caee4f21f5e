//! Runtime environment value objects.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters kept when logging a runtime environment digest.
const DIGEST_PREFIX_LEN: usize = 12;

/// Default setup timeout forwarded to the agent, in seconds.
const DEFAULT_SETUP_TIMEOUT_SECONDS: i32 = 600;

/// Per-request runtime environment settings forwarded to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeEnvConfig {
    /// Seconds the agent may spend building the environment; `-1` disables
    /// the limit.
    pub setup_timeout_seconds: i32,
    /// Whether the environment is installed before any worker needs it.
    pub eager_install: bool,
    /// Log files the agent should tail into the job's output.
    pub log_files: Vec<String>,
}

impl Default for RuntimeEnvConfig {
    fn default() -> Self {
        Self {
            setup_timeout_seconds: DEFAULT_SETUP_TIMEOUT_SECONDS,
            eager_install: true,
            log_files: Vec::new(),
        }
    }
}

/// Serialized runtime environment context returned by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeEnvContext(String);

impl RuntimeEnvContext {
    /// Wraps a serialized context.
    #[must_use]
    pub const fn new(serialized: String) -> Self {
        Self(serialized)
    }

    /// Returns the serialized context.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the owned serialized context.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RuntimeEnvContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns a short SHA-256 digest of a serialized runtime environment for
/// log correlation.
#[must_use]
pub fn runtime_env_digest(serialized_runtime_env: &str) -> String {
    format!("{:x}", Sha256::digest(serialized_runtime_env.as_bytes()))
        .chars()
        .take(DIGEST_PREFIX_LEN)
        .collect()
}
