//! Registration state machine for the supervised agent.
//!
//! [`AgentState`] is the single record behind the manager's lock. It holds
//! the identifier expected from the current launch, the identity accepted
//! from the agent, and the permanent "client disabled" and "ever
//! registered" flags. An agent is registered only while the accepted
//! identity carries the expected id.

use super::{AgentDomainError, AgentEndpoint, AgentId, AgentInfo};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Supervision status of the agent process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisionStatus {
    /// No launch has been attempted.
    #[default]
    Idle,
    /// The node is configured to run without an agent.
    NotConfigured,
    /// An agent process has been launched and is supervised.
    Running,
    /// The agent could not be launched or exhausted its restarts.
    Failed,
}

impl SupervisionStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::NotConfigured => "not_configured",
            Self::Running => "running",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SupervisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity accepted from the agent, with the time it was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistration {
    info: AgentInfo,
    registered_at: DateTime<Utc>,
}

impl AgentRegistration {
    /// Returns the reported agent information.
    #[must_use]
    pub const fn info(&self) -> &AgentInfo {
        &self.info
    }

    /// Returns when the registration was accepted.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}

/// Result of an accepted registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The agent is registered and reachable at the endpoint.
    Registered(AgentEndpoint),
    /// The agent is registered but its RPC port is unusable, so the agent
    /// client is now permanently disabled.
    ClientDisabled {
        /// Port reported by the agent.
        grpc_port: i32,
    },
}

/// Reason runtime environment requests cannot reach the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AgentUnavailable {
    /// The node is configured to run without an agent.
    #[error("the runtime env agent is not configured on this node")]
    NotConfigured,
    /// The agent reported an unusable RPC port.
    #[error("the runtime env agent client is disabled")]
    ClientDisabled,
    /// The agent could not be launched or exhausted its restarts.
    #[error("the runtime env agent failed")]
    Failed,
    /// No agent has completed registration.
    #[error("the runtime env agent has not registered")]
    NotRegistered,
}

/// Consolidated agent state guarded by the manager's lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentState {
    expected_agent_id: Option<AgentId>,
    registration: Option<AgentRegistration>,
    client_disabled: bool,
    ever_registered: bool,
    supervision: SupervisionStatus,
}

impl AgentState {
    /// Creates an unregistered state with no expected agent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifier expected from the current agent instance.
    #[must_use]
    pub const fn expected_agent_id(&self) -> Option<AgentId> {
        self.expected_agent_id
    }

    /// Expects a freshly launched agent instance.
    ///
    /// Any previous registration is dropped; the state returns to
    /// unregistered until `id` registers.
    pub fn expect_agent(&mut self, id: AgentId) {
        self.expected_agent_id = Some(id);
        self.registration = None;
    }

    /// Applies a registration reported by an agent.
    ///
    /// A registration whose id equals the expected id replaces the stored
    /// identity. An unusable RPC port permanently disables the agent client.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::NoAgentExpected`] when no launch is
    /// pending or [`AgentDomainError::UnexpectedAgentId`] when the id does
    /// not match. The state is left untouched in both cases.
    pub fn register(
        &mut self,
        info: AgentInfo,
        clock: &impl Clock,
    ) -> Result<RegistrationOutcome, AgentDomainError> {
        let reported = info.id();
        match self.expected_agent_id {
            None => return Err(AgentDomainError::NoAgentExpected { reported }),
            Some(expected) if expected != reported => {
                return Err(AgentDomainError::UnexpectedAgentId { expected, reported });
            }
            Some(_) => {}
        }

        let outcome = info.grpc_endpoint().map_or(
            RegistrationOutcome::ClientDisabled {
                grpc_port: info.grpc_port(),
            },
            RegistrationOutcome::Registered,
        );
        if matches!(outcome, RegistrationOutcome::ClientDisabled { .. }) {
            self.client_disabled = true;
        }

        self.registration = Some(AgentRegistration {
            info,
            registered_at: clock.utc(),
        });
        self.ever_registered = true;
        Ok(outcome)
    }

    /// Forgets the registration of agent `id` after its process ended.
    ///
    /// Returns `false` when `id` is no longer the expected agent, meaning a
    /// newer launch has already superseded it.
    pub fn forget_agent(&mut self, id: AgentId) -> bool {
        if self.expected_agent_id != Some(id) {
            return false;
        }
        self.registration = None;
        true
    }

    /// Returns whether the expected agent has registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registration().is_some()
    }

    /// Returns whether agent `id` is the expected agent and has registered.
    #[must_use]
    pub fn is_registered_as(&self, id: AgentId) -> bool {
        self.registration()
            .is_some_and(|registration| registration.info().id() == id)
    }

    /// Returns the accepted registration of the expected agent.
    #[must_use]
    pub fn registration(&self) -> Option<&AgentRegistration> {
        let expected = self.expected_agent_id?;
        self.registration
            .as_ref()
            .filter(|registration| registration.info().id() == expected)
    }

    /// Returns the identity of the expected agent once it has registered.
    #[must_use]
    pub fn agent_info(&self) -> Option<&AgentInfo> {
        self.registration().map(AgentRegistration::info)
    }

    /// Returns whether the agent client is permanently disabled.
    #[must_use]
    pub const fn is_client_disabled(&self) -> bool {
        self.client_disabled
    }

    /// Returns whether any agent instance has completed registration.
    ///
    /// Once set the flag survives restarts, so a missing registration only
    /// means a replacement agent is on its way.
    #[must_use]
    pub const fn has_ever_registered(&self) -> bool {
        self.ever_registered
    }

    /// Returns the supervision status.
    #[must_use]
    pub const fn supervision(&self) -> SupervisionStatus {
        self.supervision
    }

    /// Records a supervision status change.
    pub const fn set_supervision(&mut self, status: SupervisionStatus) {
        self.supervision = status;
    }

    /// Returns the endpoint runtime environment requests should use.
    ///
    /// # Errors
    ///
    /// Returns the first [`AgentUnavailable`] reason that applies, checked in
    /// the order: not configured, client disabled, failed, not registered.
    pub fn runtime_env_endpoint(&self) -> Result<AgentEndpoint, AgentUnavailable> {
        if self.supervision == SupervisionStatus::NotConfigured {
            return Err(AgentUnavailable::NotConfigured);
        }
        if self.client_disabled {
            return Err(AgentUnavailable::ClientDisabled);
        }
        if self.supervision == SupervisionStatus::Failed {
            return Err(AgentUnavailable::Failed);
        }
        self.agent_info()
            .and_then(AgentInfo::grpc_endpoint)
            .ok_or(AgentUnavailable::NotRegistered)
    }
}
