//! Tokio-backed agent process launcher.

use crate::agent_manager::{
    domain::{AgentExitStatus, AgentLaunchSpec},
    ports::{AgentLaunchError, AgentLaunchResult, AgentProcess, AgentProcessLauncher},
};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Launches agents as child processes of the current process.
///
/// Children are killed when their handle is dropped, so an agent never
/// outlives the supervisor that owns it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioAgentProcessLauncher;

impl TokioAgentProcessLauncher {
    /// Creates a launcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AgentProcessLauncher for TokioAgentProcessLauncher {
    type Process = TokioAgentProcess;

    fn launch(&self, spec: &AgentLaunchSpec) -> AgentLaunchResult<TokioAgentProcess> {
        if spec.program().trim().is_empty() {
            return Err(AgentLaunchError::EmptyCommand);
        }

        let child = Command::new(spec.program())
            .args(spec.args())
            .envs(spec.env())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| AgentLaunchError::spawn(spec.program(), err))?;
        Ok(TokioAgentProcess { child })
    }
}

/// Handle to an agent spawned by [`TokioAgentProcessLauncher`].
#[derive(Debug)]
pub struct TokioAgentProcess {
    child: Child,
}

#[async_trait]
impl AgentProcess for TokioAgentProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> AgentLaunchResult<AgentExitStatus> {
        let status = self.child.wait().await.map_err(AgentLaunchError::runtime)?;
        Ok(AgentExitStatus::from(status))
    }

    async fn kill(&mut self) -> AgentLaunchResult<()> {
        self.child.kill().await.map_err(AgentLaunchError::runtime)
    }
}
