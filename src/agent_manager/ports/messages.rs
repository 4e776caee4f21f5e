//! Request and reply messages exchanged with the agent.
//!
//! These mirror the RPC surface: inbound registration from the agent and
//! outbound runtime environment calls to it. Transports map them onto their
//! own wire encoding.

use crate::agent_manager::domain::RuntimeEnvConfig;
use serde::{Deserialize, Serialize};

/// Process name the manager reports as the source of agent requests.
pub const SOURCE_PROCESS: &str = "node_manager";

/// Status carried by every agent RPC reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRpcStatus {
    /// The request was handled.
    Ok,
    /// The request was refused; see the accompanying error message.
    Failed,
}

/// Registration sent by a freshly launched agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    /// Identifier the agent received on its command line.
    pub agent_id: i32,
    /// Address the agent's RPC server listens on.
    pub agent_ip_address: String,
    /// Port of the agent's RPC server; `0` or negative when it failed to bind.
    pub agent_port: i32,
    /// Port of the agent's HTTP server, when it runs one.
    pub agent_http_port: Option<u16>,
    /// Process identifier of the agent.
    pub agent_pid: Option<u32>,
}

impl RegisterAgentRequest {
    /// Creates a registration request with the mandatory fields.
    #[must_use]
    pub fn new(agent_id: i32, agent_ip_address: impl Into<String>, agent_port: i32) -> Self {
        Self {
            agent_id,
            agent_ip_address: agent_ip_address.into(),
            agent_port,
            agent_http_port: None,
            agent_pid: None,
        }
    }
}

/// Reply to a registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAgentReply {
    /// Whether the registration was accepted.
    pub status: AgentRpcStatus,
    /// Reason for a rejected registration; empty on success.
    pub error_message: String,
}

impl RegisterAgentReply {
    /// Creates an accepting reply.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: AgentRpcStatus::Ok,
            error_message: String::new(),
        }
    }

    /// Creates a rejecting reply.
    #[must_use]
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: AgentRpcStatus::Failed,
            error_message: error_message.into(),
        }
    }

    /// Returns whether the registration was accepted.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == AgentRpcStatus::Ok
    }
}

/// Request asking the agent to create, or take another reference to, a
/// runtime environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOrCreateRuntimeEnvRequest {
    /// Job the environment belongs to.
    pub job_id: String,
    /// Serialized environment descriptor.
    pub serialized_runtime_env: String,
    /// Setup settings.
    pub runtime_env_config: RuntimeEnvConfig,
    /// Serialized resource allocation of the requesting worker.
    pub serialized_allocated_resource_instances: String,
    /// Process issuing the request.
    pub source_process: String,
}

/// Reply to [`GetOrCreateRuntimeEnvRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOrCreateRuntimeEnvReply {
    /// Whether the environment is ready.
    pub status: AgentRpcStatus,
    /// Serialized environment context on success.
    pub serialized_runtime_env_context: String,
    /// Setup failure description on refusal.
    pub error_message: String,
}

impl GetOrCreateRuntimeEnvReply {
    /// Creates a successful reply carrying `serialized_runtime_env_context`.
    #[must_use]
    pub fn ok(serialized_runtime_env_context: impl Into<String>) -> Self {
        Self {
            status: AgentRpcStatus::Ok,
            serialized_runtime_env_context: serialized_runtime_env_context.into(),
            error_message: String::new(),
        }
    }

    /// Creates a refusal carrying `error_message`.
    #[must_use]
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: AgentRpcStatus::Failed,
            serialized_runtime_env_context: String::new(),
            error_message: error_message.into(),
        }
    }
}

/// Request asking the agent to drop one reference to a runtime environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRuntimeEnvIfPossibleRequest {
    /// Serialized environment descriptor.
    pub serialized_runtime_env: String,
    /// Process issuing the request.
    pub source_process: String,
}

/// Reply to [`DeleteRuntimeEnvIfPossibleRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRuntimeEnvIfPossibleReply {
    /// Whether the reference was released.
    pub status: AgentRpcStatus,
    /// Refusal description.
    pub error_message: String,
}

impl DeleteRuntimeEnvIfPossibleReply {
    /// Creates a successful reply.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: AgentRpcStatus::Ok,
            error_message: String::new(),
        }
    }

    /// Creates a refusal carrying `error_message`.
    #[must_use]
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: AgentRpcStatus::Failed,
            error_message: error_message.into(),
        }
    }
}
