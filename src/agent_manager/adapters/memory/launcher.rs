//! In-memory agent process launcher for supervision tests.

use crate::agent_manager::{
    domain::{AgentExitStatus, AgentId, AgentLaunchSpec},
    ports::{AgentLaunchError, AgentLaunchResult, AgentProcess, AgentProcessLauncher},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Base for the fake process identifiers handed out by the launcher.
const FAKE_PID_BASE: u32 = 40_000;

type ExitSender = Arc<watch::Sender<Option<AgentExitStatus>>>;

/// Launcher that records launch specifications instead of spawning
/// processes.
///
/// Every launch yields an [`InMemoryAgentProcess`] that stays alive until
/// the test calls [`InMemoryAgentProcessLauncher::exit`] or the manager
/// kills it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentProcessLauncher {
    state: Arc<Mutex<LauncherState>>,
}

#[derive(Debug, Default)]
struct LauncherState {
    launches: Vec<LaunchRecord>,
    pending_failures: usize,
}

#[derive(Debug)]
struct LaunchRecord {
    spec: AgentLaunchSpec,
    exit: ExitSender,
    killed: Arc<AtomicBool>,
}

impl InMemoryAgentProcessLauncher {
    /// Creates a launcher with no recorded launches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LauncherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `count` launches fail to spawn.
    pub fn fail_next_launches(&self, count: usize) {
        self.lock().pending_failures = count;
    }

    /// Returns how many processes were spawned.
    #[must_use]
    pub fn launch_count(&self) -> usize {
        self.lock().launches.len()
    }

    /// Returns the specifications of all spawned processes, oldest first.
    #[must_use]
    pub fn launched_specs(&self) -> Vec<AgentLaunchSpec> {
        self.lock()
            .launches
            .iter()
            .map(|record| record.spec.clone())
            .collect()
    }

    /// Returns the agent id passed to the most recent launch.
    #[must_use]
    pub fn latest_agent_id(&self) -> Option<AgentId> {
        self.lock()
            .launches
            .last()
            .and_then(|record| record.spec.agent_id())
    }

    /// Ends the process at `index` with `status`.
    ///
    /// Returns `false` when no such launch exists.
    pub fn exit(&self, index: usize, status: AgentExitStatus) -> bool {
        self.lock().launches.get(index).is_some_and(|record| {
            record.exit.send_replace(Some(status));
            true
        })
    }

    /// Returns whether the process at `index` was killed by its supervisor.
    #[must_use]
    pub fn was_killed(&self, index: usize) -> bool {
        self.lock()
            .launches
            .get(index)
            .is_some_and(|record| record.killed.load(Ordering::Acquire))
    }
}

impl AgentProcessLauncher for InMemoryAgentProcessLauncher {
    type Process = InMemoryAgentProcess;

    fn launch(&self, spec: &AgentLaunchSpec) -> AgentLaunchResult<InMemoryAgentProcess> {
        let mut state = self.lock();
        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            return Err(AgentLaunchError::spawn(
                spec.program(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "scripted launch failure"),
            ));
        }

        let (sender, _) = watch::channel(None);
        let exit = Arc::new(sender);
        let killed = Arc::new(AtomicBool::new(false));
        let offset = u32::try_from(state.launches.len()).unwrap_or(u32::MAX);
        state.launches.push(LaunchRecord {
            spec: spec.clone(),
            exit: Arc::clone(&exit),
            killed: Arc::clone(&killed),
        });

        Ok(InMemoryAgentProcess {
            pid: FAKE_PID_BASE.saturating_add(offset),
            exit,
            killed,
        })
    }
}

/// Process handle produced by [`InMemoryAgentProcessLauncher`].
#[derive(Debug)]
pub struct InMemoryAgentProcess {
    pid: u32,
    exit: ExitSender,
    killed: Arc<AtomicBool>,
}

#[async_trait]
impl AgentProcess for InMemoryAgentProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    async fn wait(&mut self) -> AgentLaunchResult<AgentExitStatus> {
        let mut receiver = self.exit.subscribe();
        let status = *receiver
            .wait_for(Option::is_some)
            .await
            .map_err(AgentLaunchError::runtime)?;
        Ok(status.unwrap_or_else(AgentExitStatus::terminated))
    }

    async fn kill(&mut self) -> AgentLaunchResult<()> {
        self.killed.store(true, Ordering::Release);
        self.exit.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(AgentExitStatus::terminated());
            true
        });
        Ok(())
    }
}
