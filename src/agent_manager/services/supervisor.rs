//! Agent process supervision: launch, registration deadline and restarts.

use super::error::AgentManagerResult;
use super::manager::AgentManager;
use crate::agent_manager::{
    domain::{AgentExitStatus, AgentId, LaunchContext, SupervisionStatus},
    ports::{
        AgentLaunchError, AgentLaunchResult, AgentProcess, AgentProcessLauncher, RetryScheduler,
        RuntimeEnvAgentClientFactory,
    },
};
use mockable::Clock;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

impl<L, F, S, C> AgentManager<L, F, S, C>
where
    L: AgentProcessLauncher + 'static,
    F: RuntimeEnvAgentClientFactory + 'static,
    S: RetryScheduler + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Launches the agent and starts supervising it.
    ///
    /// Only the first call inside a tokio runtime has any effect. With no
    /// agent command configured the manager records `NotConfigured` and
    /// every runtime environment request fails fast.
    ///
    /// # Errors
    ///
    /// Returns [`super::AgentManagerError::NoRuntime`] when called outside a
    /// tokio runtime; nothing is launched and a later call may still start
    /// the agent. Returns [`super::AgentManagerError::Launch`] when the agent
    /// cannot be spawned. That failure is final: supervision moves to
    /// `Failed` and no relaunch is attempted.
    pub fn start_agent(self: &Arc<Self>) -> AgentManagerResult<()> {
        let runtime = Handle::try_current()?;
        if self.start_requested.swap(true, Ordering::AcqRel) {
            warn!(
                node_id = %self.options.node_id(),
                "runtime env agent start already requested; ignoring"
            );
            return Ok(());
        }

        if !self.options.should_start_agent() {
            self.lock_state()
                .agent
                .set_supervision(SupervisionStatus::NotConfigured);
            info!(
                node_id = %self.options.node_id(),
                "no runtime env agent command configured; runtime env requests will be rejected"
            );
            return Ok(());
        }

        self.launch_agent(&runtime)
    }

    fn launch_agent(self: &Arc<Self>, runtime: &Handle) -> AgentManagerResult<()> {
        let (agent_id, restart_count) = {
            let mut state = self.lock_state();
            let id = state.id_allocator.allocate();
            state.agent.expect_agent(id);
            state.client = None;
            (id, state.restart_count)
        };

        let context = LaunchContext {
            supervisor_pid: std::process::id(),
            restart_count,
            max_restart_count: self.config.max_restart_count,
        };
        let launched = self
            .options
            .launch_spec(agent_id, context)
            .ok_or(AgentLaunchError::EmptyCommand)
            .and_then(|launch_spec| self.launcher.launch(&launch_spec));

        match launched {
            Ok(process) => {
                self.lock_state()
                    .agent
                    .set_supervision(SupervisionStatus::Running);
                info!(
                    agent_id = agent_id.get(),
                    pid = process.pid(),
                    restart_count,
                    "launched runtime env agent"
                );
                runtime.spawn(Arc::clone(self).monitor_agent(
                    runtime.clone(),
                    agent_id,
                    process,
                ));
                Ok(())
            }
            Err(err) => {
                self.lock_state()
                    .agent
                    .set_supervision(SupervisionStatus::Failed);
                error!(
                    agent_id = agent_id.get(),
                    error = %err,
                    "failed to launch runtime env agent"
                );
                Err(err.into())
            }
        }
    }

    async fn monitor_agent(
        self: Arc<Self>,
        runtime: Handle,
        agent_id: AgentId,
        mut process: L::Process,
    ) {
        let register_timeout = self.config.register_timeout();
        let exit = tokio::select! {
            status = process.wait() => status,
            () = tokio::time::sleep(register_timeout) => {
                self.enforce_registration_deadline(agent_id, &mut process).await
            }
        };
        self.handle_agent_exit(&runtime, agent_id, exit).await;
    }

    async fn enforce_registration_deadline(
        &self,
        agent_id: AgentId,
        process: &mut L::Process,
    ) -> AgentLaunchResult<AgentExitStatus> {
        let registered = self.lock_state().agent.is_registered_as(agent_id);
        if !registered {
            warn!(
                agent_id = agent_id.get(),
                register_timeout_ms = self.config.register_timeout_ms,
                "runtime env agent did not register in time; killing it"
            );
            if let Err(err) = process.kill().await {
                warn!(
                    agent_id = agent_id.get(),
                    error = %err,
                    "failed to kill unregistered runtime env agent"
                );
            }
        }
        process.wait().await
    }

    async fn handle_agent_exit(
        self: &Arc<Self>,
        runtime: &Handle,
        agent_id: AgentId,
        exit: AgentLaunchResult<AgentExitStatus>,
    ) {
        match exit {
            Ok(status) => warn!(
                agent_id = agent_id.get(),
                status = %status,
                "runtime env agent exited"
            ),
            Err(err) => error!(
                agent_id = agent_id.get(),
                error = %err,
                "lost track of runtime env agent process"
            ),
        }

        let next_restart = {
            let mut state = self.lock_state();
            if !state.agent.forget_agent(agent_id) {
                debug!(
                    agent_id = agent_id.get(),
                    "exited runtime env agent was already superseded"
                );
                return;
            }
            state.client = None;
            if state.restart_count >= self.config.max_restart_count {
                state.agent.set_supervision(SupervisionStatus::Failed);
                None
            } else {
                let completed = state.restart_count;
                state.restart_count = completed.saturating_add(1);
                Some(completed)
            }
        };

        let Some(completed_restarts) = next_restart else {
            error!(
                agent_id = agent_id.get(),
                max_restart_count = self.config.max_restart_count,
                "runtime env agent exceeded its restart limit; runtime env requests will be rejected"
            );
            return;
        };

        let backoff = self.config.restart_backoff(completed_restarts);
        warn!(
            agent_id = agent_id.get(),
            restart = completed_restarts.saturating_add(1),
            backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
            "restarting runtime env agent"
        );
        tokio::time::sleep(backoff).await;
        if let Err(err) = self.launch_agent(runtime) {
            debug!(error = %err, "runtime env agent supervision stopped");
        }
    }
}
