//! RPC client port for the agent's runtime environment service.

use super::messages::{
    DeleteRuntimeEnvIfPossibleReply, DeleteRuntimeEnvIfPossibleRequest,
    GetOrCreateRuntimeEnvReply, GetOrCreateRuntimeEnvRequest,
};
use crate::agent_manager::domain::AgentEndpoint;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for runtime environment agent client operations.
pub type RuntimeEnvAgentClientResult<T> = Result<T, RuntimeEnvAgentClientError>;

/// Client bound to one agent's runtime environment service.
///
/// A returned reply means the agent answered; whether it accepted the
/// request is carried in the reply status. Errors are transport failures.
#[async_trait]
pub trait RuntimeEnvAgentClient: Send + Sync {
    /// Asks the agent to create, or add a reference to, a runtime environment.
    async fn get_or_create_runtime_env(
        &self,
        request: &GetOrCreateRuntimeEnvRequest,
    ) -> RuntimeEnvAgentClientResult<GetOrCreateRuntimeEnvReply>;

    /// Asks the agent to drop one reference to a runtime environment.
    async fn delete_runtime_env_if_possible(
        &self,
        request: &DeleteRuntimeEnvIfPossibleRequest,
    ) -> RuntimeEnvAgentClientResult<DeleteRuntimeEnvIfPossibleReply>;
}

/// Builds clients for an agent endpoint.
///
/// `connect` runs while the manager holds its state lock, so it must bind
/// lazily and never block on network I/O.
pub trait RuntimeEnvAgentClientFactory: Send + Sync {
    /// Client type produced by this factory.
    type Client: RuntimeEnvAgentClient + 'static;

    /// Creates a client bound to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeEnvAgentClientError`] when no client can be built;
    /// callers treat this like any other transport failure.
    fn connect(&self, endpoint: &AgentEndpoint) -> RuntimeEnvAgentClientResult<Self::Client>;
}

/// Transport-level failures talking to the agent.
#[derive(Debug, Clone, Error)]
pub enum RuntimeEnvAgentClientError {
    /// The agent has not registered an endpoint yet.
    #[error("runtime env agent is not registered")]
    NotRegistered,

    /// No client could be built for the endpoint.
    #[error("runtime env agent at {endpoint} is unavailable: {reason}")]
    Unavailable {
        /// Endpoint the client was meant for.
        endpoint: String,
        /// Failure description.
        reason: String,
    },

    /// The agent did not answer in time.
    #[error("runtime env agent request timed out after {0:?}")]
    Timeout(Duration),

    /// The RPC channel failed.
    #[error("runtime env agent transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl RuntimeEnvAgentClientError {
    /// Wraps a transport failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Creates an unavailability error for `endpoint`.
    pub fn unavailable(endpoint: &AgentEndpoint, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
