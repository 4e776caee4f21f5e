//! Port contracts for agent supervision and runtime environment brokering.
//!
//! Ports define the capabilities the manager consumes (process launching,
//! RPC clients, retry delays) and the handler it exposes to the RPC server.

mod client;
mod handler;
mod launcher;
pub mod messages;
mod scheduler;

pub use client::{
    RuntimeEnvAgentClient, RuntimeEnvAgentClientError, RuntimeEnvAgentClientFactory,
    RuntimeEnvAgentClientResult,
};
pub use handler::AgentManagerServiceHandler;
pub use launcher::{AgentLaunchError, AgentLaunchResult, AgentProcess, AgentProcessLauncher};
pub use messages::{
    AgentRpcStatus, DeleteRuntimeEnvIfPossibleReply, DeleteRuntimeEnvIfPossibleRequest,
    GetOrCreateRuntimeEnvReply, GetOrCreateRuntimeEnvRequest, RegisterAgentReply,
    RegisterAgentRequest, SOURCE_PROCESS,
};
pub use scheduler::RetryScheduler;
