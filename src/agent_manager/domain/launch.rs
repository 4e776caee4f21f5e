//! Agent launch configuration value objects.

use super::{AgentId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Command-line flag used to hand the expected identifier to the agent.
pub const AGENT_ID_FLAG: &str = "--agent-id";

/// Environment variable carrying the owning node's identifier.
pub const NODE_ID_ENV: &str = "AGENT_NODE_ID";

/// Environment variable carrying the supervisor's process identifier.
pub const SUPERVISOR_PID_ENV: &str = "AGENT_SUPERVISOR_PID";

/// Environment variable carrying how many times the agent was restarted.
pub const RESTART_COUNT_ENV: &str = "AGENT_RESTART_COUNT";

/// Environment variable carrying the restart ceiling.
pub const MAX_RESTART_COUNT_ENV: &str = "AGENT_MAX_RESTART_COUNT";

/// Immutable options owned by an agent manager for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentManagerOptions {
    node_id: NodeId,
    agent_commands: Vec<String>,
}

impl AgentManagerOptions {
    /// Creates manager options.
    ///
    /// An empty command vector means the node runs without an agent.
    #[must_use]
    pub fn new(node_id: NodeId, agent_commands: impl IntoIterator<Item = String>) -> Self {
        Self {
            node_id,
            agent_commands: agent_commands.into_iter().collect(),
        }
    }

    /// Returns the owning node's identifier.
    #[must_use]
    pub const fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Returns whether an agent should be launched at all.
    #[must_use]
    pub fn should_start_agent(&self) -> bool {
        self.agent_commands
            .first()
            .is_some_and(|program| !program.trim().is_empty())
    }

    /// Builds the launch specification for one agent instance.
    ///
    /// Returns `None` when no agent command is configured.
    #[must_use]
    pub fn launch_spec(&self, agent_id: AgentId, context: LaunchContext) -> Option<AgentLaunchSpec> {
        let (program, args) = self.agent_commands.split_first()?;
        if program.trim().is_empty() {
            return None;
        }

        let spec = AgentLaunchSpec::new(program.clone())
            .with_args(args.iter().cloned())
            .with_arg(AGENT_ID_FLAG)
            .with_arg(agent_id.to_string())
            .with_env(NODE_ID_ENV, self.node_id.as_str())
            .with_env(SUPERVISOR_PID_ENV, context.supervisor_pid.to_string())
            .with_env(RESTART_COUNT_ENV, context.restart_count.to_string())
            .with_env(MAX_RESTART_COUNT_ENV, context.max_restart_count.to_string());
        Some(spec)
    }
}

/// Per-launch values passed to the agent alongside its command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchContext {
    /// Process identifier of the supervisor.
    pub supervisor_pid: u32,
    /// Restarts performed before this launch.
    pub restart_count: u32,
    /// Restart ceiling.
    pub max_restart_count: u32,
}

/// Fully resolved command used to spawn one agent process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentLaunchSpec {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl AgentLaunchSpec {
    /// Creates a launch specification for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Appends command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(values);
        self
    }

    /// Appends a single command-line argument.
    #[must_use]
    pub fn with_arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets an environment variable for the child process.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Returns the executable.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the environment variables added for the child.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns the agent identifier passed on the command line, if any.
    #[must_use]
    pub fn agent_id(&self) -> Option<AgentId> {
        self.args
            .iter()
            .skip_while(|arg| arg.as_str() != AGENT_ID_FLAG)
            .nth(1)
            .and_then(|raw| raw.parse::<i32>().ok())
            .and_then(|raw| AgentId::new(raw).ok())
    }
}

/// How an agent process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentExitStatus {
    code: Option<i32>,
}

impl AgentExitStatus {
    /// Creates an exit status from an exit code.
    #[must_use]
    pub const fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Creates an exit status for a process terminated by a signal.
    #[must_use]
    pub const fn terminated() -> Self {
        Self { code: None }
    }

    /// Returns the exit code, or `None` when the process was terminated by a
    /// signal.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        self.code
    }

    /// Returns whether the process exited with code zero.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl From<std::process::ExitStatus> for AgentExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for AgentExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}
