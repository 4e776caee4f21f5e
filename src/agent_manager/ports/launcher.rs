//! Process launch port for the agent subprocess.

use crate::agent_manager::domain::{AgentExitStatus, AgentLaunchSpec};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for agent process operations.
pub type AgentLaunchResult<T> = Result<T, AgentLaunchError>;

/// Spawns agent processes.
///
/// Launching is fire-and-forget: a returned process is only known to have
/// been spawned. Liveness is established later by the registration
/// handshake.
pub trait AgentProcessLauncher: Send + Sync {
    /// Handle type of a spawned process.
    type Process: AgentProcess;

    /// Spawns the process described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentLaunchError`] when the process cannot be spawned.
    fn launch(&self, spec: &AgentLaunchSpec) -> AgentLaunchResult<Self::Process>;
}

/// Handle to a spawned agent process.
#[async_trait]
pub trait AgentProcess: Send + 'static {
    /// Returns the operating system process identifier, if known.
    fn pid(&self) -> Option<u32>;

    /// Waits for the process to exit.
    async fn wait(&mut self) -> AgentLaunchResult<AgentExitStatus>;

    /// Forcibly terminates the process.
    async fn kill(&mut self) -> AgentLaunchResult<()>;
}

/// Errors returned by agent process launchers.
#[derive(Debug, Clone, Error)]
pub enum AgentLaunchError {
    /// No executable was configured.
    #[error("agent command must not be empty")]
    EmptyCommand,

    /// The operating system refused to spawn the process.
    #[error("failed to spawn agent process '{program}': {reason}")]
    Spawn {
        /// Executable that failed to start.
        program: String,
        /// Underlying failure.
        reason: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Waiting on or signalling a spawned process failed.
    #[error("agent process runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl AgentLaunchError {
    /// Wraps a spawn failure for `program`.
    pub fn spawn(
        program: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Spawn {
            program: program.into(),
            reason: Arc::new(err),
        }
    }

    /// Wraps a failure while waiting on or signalling a process.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
