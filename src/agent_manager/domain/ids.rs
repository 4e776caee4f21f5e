//! Identifier types for the agent manager domain.

use super::AgentDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroI32;
use uuid::Uuid;

/// Identifier of one launched agent process instance.
///
/// Zero is the wire value for "unset" and cannot be represented, so an
/// expected id and an absent report can never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct AgentId(NonZeroI32);

impl AgentId {
    /// Creates an agent identifier from its wire value.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::UnsetAgentId`] when `raw` is zero.
    pub const fn new(raw: i32) -> Result<Self, AgentDomainError> {
        match NonZeroI32::new(raw) {
            Some(value) => Ok(Self(value)),
            None => Err(AgentDomainError::UnsetAgentId),
        }
    }

    /// Returns the wire value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0.get()
    }
}

impl TryFrom<i32> for AgentId {
    type Error = AgentDomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AgentId> for i32 {
    fn from(value: AgentId) -> Self {
        value.get()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates agent identifiers for successive launches.
///
/// Identifiers are positive, start at a random offset so that a restarted
/// supervisor does not collide with agents left over from a previous run, and
/// increase monotonically so that no value repeats within one manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdAllocator {
    next: i32,
}

impl AgentIdAllocator {
    /// Creates an allocator seeded from the operating system's entropy source.
    ///
    /// Falls back to starting at `1` when no entropy is available.
    #[must_use]
    pub fn seeded() -> Self {
        let offset = getrandom::u32()
            .ok()
            .and_then(|raw| i32::try_from(raw >> 2).ok())
            .unwrap_or(0);
        Self::starting_at(offset.saturating_add(1))
    }

    /// Creates an allocator whose first identifier is `first`.
    ///
    /// Non-positive values are clamped to `1`.
    #[must_use]
    pub const fn starting_at(first: i32) -> Self {
        Self {
            next: if first > 0 { first } else { 1 },
        }
    }

    /// Returns the next identifier.
    pub fn allocate(&mut self) -> AgentId {
        let current = self.next;
        self.next = current.checked_add(1).unwrap_or(1);
        NonZeroI32::new(current).map_or(AgentId(NonZeroI32::MIN), AgentId)
    }
}

/// Opaque identifier of the node that owns the agent manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyNodeId`] when the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(AgentDomainError::EmptyNodeId);
        }
        Ok(Self(normalized))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of the job a runtime environment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a job identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyJobId`] when the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(AgentDomainError::EmptyJobId);
        }
        Ok(Self(normalized))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation identifier for one runtime environment request and its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeEnvRequestId(Uuid);

impl RuntimeEnvRequestId {
    /// Creates a new random request identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RuntimeEnvRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuntimeEnvRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
