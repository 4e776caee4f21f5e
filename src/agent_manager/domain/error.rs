//! Error types for agent manager domain validation.

use super::AgentId;
use thiserror::Error;

/// Errors returned while constructing agent manager domain values or
/// applying registration transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentDomainError {
    /// The node identifier is empty after trimming.
    #[error("node id must not be empty")]
    EmptyNodeId,

    /// The job identifier is empty after trimming.
    #[error("job id must not be empty")]
    EmptyJobId,

    /// The agent reported an empty IP address.
    #[error("agent IP address must not be empty")]
    EmptyIpAddress,

    /// The agent reported the unset identifier (zero).
    #[error("agent id must not be zero")]
    UnsetAgentId,

    /// A registration arrived before any agent instance was expected.
    #[error("agent {reported} registered but no agent instance is expected")]
    NoAgentExpected {
        /// Identifier reported by the registering agent.
        reported: AgentId,
    },

    /// A registration arrived from an agent other than the expected one.
    #[error("agent {reported} registered but agent {expected} is expected")]
    UnexpectedAgentId {
        /// Identifier chosen when the current agent was launched.
        expected: AgentId,
        /// Identifier reported by the registering agent.
        reported: AgentId,
    },
}
