//! Domain model for agent supervision and runtime environment brokering.
//!
//! The domain models agent identity, the registration state machine, launch
//! specifications, and runtime environment values. Process spawning, RPC
//! transport, and timers stay outside this boundary.

mod error;
mod ids;
mod info;
mod launch;
mod runtime_env;
mod state;

pub use error::AgentDomainError;
pub use ids::{AgentId, AgentIdAllocator, JobId, NodeId, RuntimeEnvRequestId};
pub use info::{AgentEndpoint, AgentInfo};
pub use launch::{
    AGENT_ID_FLAG, AgentExitStatus, AgentLaunchSpec, AgentManagerOptions, LaunchContext,
    MAX_RESTART_COUNT_ENV, NODE_ID_ENV, RESTART_COUNT_ENV, SUPERVISOR_PID_ENV,
};
pub use runtime_env::{RuntimeEnvConfig, RuntimeEnvContext, runtime_env_digest};
pub use state::{
    AgentRegistration, AgentState, AgentUnavailable, RegistrationOutcome, SupervisionStatus,
};
