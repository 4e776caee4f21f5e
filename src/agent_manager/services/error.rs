//! Service-level errors for agent supervision and runtime env brokering.

use crate::agent_manager::{
    domain::{AgentDomainError, AgentUnavailable, JobId},
    ports::{AgentLaunchError, RuntimeEnvAgentClientError},
};
use thiserror::Error;

/// Message substituted when the agent refuses a request without saying why.
pub const EMPTY_REFUSAL_MESSAGE: &str = "runtime env agent refused the request without a message";

/// Errors returned by [`super::AgentManager`] supervision and registration
/// operations.
#[derive(Debug, Error)]
pub enum AgentManagerError {
    /// The agent process could not be launched.
    #[error(transparent)]
    Launch(#[from] AgentLaunchError),
    /// A registration or identifier failed validation.
    #[error(transparent)]
    Domain(#[from] AgentDomainError),
    /// No agent has completed registration.
    #[error("runtime env agent has not registered")]
    AgentNotRegistered,
    /// Supervision was started outside a tokio runtime.
    #[error("agent supervision requires a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Result type for agent manager operations.
pub type AgentManagerResult<T> = Result<T, AgentManagerError>;

/// Terminal outcome of a failed runtime environment request.
///
/// Every variant renders a non-empty message suitable for forwarding to the
/// job's driver.
#[derive(Debug, Clone, Error)]
pub enum RuntimeEnvError {
    /// The node runs without an agent.
    #[error("runtime env agent is not started on this node")]
    AgentNotStarted,
    /// The agent could not be launched or exhausted its restarts.
    #[error("runtime env agent failed and is no longer supervised")]
    AgentFailed,
    /// The agent reported an unusable RPC port.
    #[error(
        "runtime env agent client is disabled because the agent reported an invalid port{}",
        job_suffix(.job_id.as_ref())
    )]
    AgentClientDisabled {
        /// Job whose request was rejected, when the request named one.
        job_id: Option<JobId>,
    },
    /// No agent has completed registration.
    #[error("runtime env agent has not registered")]
    AgentNotRegistered,
    /// The agent answered and refused the request.
    #[error("{message}")]
    AgentRefused {
        /// Refusal reason reported by the agent.
        message: String,
    },
    /// Every attempt failed at the transport level.
    #[error("runtime env agent request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Failure of the final attempt.
        last_error: RuntimeEnvAgentClientError,
    },
}

fn job_suffix(job_id: Option<&JobId>) -> String {
    job_id.map_or_else(String::new, |id| format!("; rejecting request for job {id}"))
}

impl RuntimeEnvError {
    /// Creates a refusal, substituting a placeholder for an empty message.
    #[must_use]
    pub fn refused(reason: impl Into<String>) -> Self {
        let reported = reason.into();
        let message = if reported.trim().is_empty() {
            EMPTY_REFUSAL_MESSAGE.to_owned()
        } else {
            reported
        };
        Self::AgentRefused { message }
    }

    /// Maps a fail-fast unavailability reason onto the caller-visible error.
    #[must_use]
    pub fn from_unavailable(reason: AgentUnavailable, job_id: Option<&JobId>) -> Self {
        match reason {
            AgentUnavailable::NotConfigured => Self::AgentNotStarted,
            AgentUnavailable::ClientDisabled => Self::AgentClientDisabled {
                job_id: job_id.cloned(),
            },
            AgentUnavailable::Failed => Self::AgentFailed,
            AgentUnavailable::NotRegistered => Self::AgentNotRegistered,
        }
    }

    /// Returns the message forwarded to drivers when setup fails.
    #[must_use]
    pub fn setup_error_message(&self) -> String {
        self.to_string()
    }

    /// Returns whether the agent answered and refused the request.
    #[must_use]
    pub const fn is_refusal(&self) -> bool {
        matches!(self, Self::AgentRefused { .. })
    }
}
