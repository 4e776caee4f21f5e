//! Identity reported by a registering agent.

use super::{AgentDomainError, AgentId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Information an agent reports about itself when it registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    id: AgentId,
    ip_address: String,
    grpc_port: i32,
    http_port: Option<u16>,
    pid: Option<u32>,
}

impl AgentInfo {
    /// Creates agent information from the mandatory registration fields.
    ///
    /// `grpc_port` is kept as reported, including invalid values, so that the
    /// manager can tell a usable RPC endpoint from one the agent failed to
    /// bind.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyIpAddress`] when `ip_address` is empty
    /// after trimming.
    pub fn new(
        id: AgentId,
        ip_address: impl Into<String>,
        grpc_port: i32,
    ) -> Result<Self, AgentDomainError> {
        let normalized = ip_address.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(AgentDomainError::EmptyIpAddress);
        }

        Ok(Self {
            id,
            ip_address: normalized,
            grpc_port,
            http_port: None,
            pid: None,
        })
    }

    /// Sets the agent's HTTP port.
    #[must_use]
    pub const fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = Some(port);
        self
    }

    /// Sets the agent's process identifier.
    #[must_use]
    pub const fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Returns the agent IP address.
    #[must_use]
    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    /// Returns the RPC port exactly as reported.
    #[must_use]
    pub const fn grpc_port(&self) -> i32 {
        self.grpc_port
    }

    /// Returns the HTTP port, when reported.
    #[must_use]
    pub const fn http_port(&self) -> Option<u16> {
        self.http_port
    }

    /// Returns the agent process identifier, when reported.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Returns the RPC endpoint, or `None` when the reported port is unusable.
    ///
    /// Ports outside `1..=65535` are unusable; agents report `0` or a negative
    /// value when their RPC server could not bind.
    #[must_use]
    pub fn grpc_endpoint(&self) -> Option<AgentEndpoint> {
        u16::try_from(self.grpc_port)
            .ok()
            .filter(|port| *port != 0)
            .map(|port| AgentEndpoint::new(self.ip_address.clone(), port))
    }

    /// Returns whether the reported RPC port is usable.
    #[must_use]
    pub fn has_valid_grpc_port(&self) -> bool {
        self.grpc_endpoint().is_some()
    }
}

/// Address and port of the agent's RPC server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentEndpoint {
    ip_address: String,
    port: u16,
}

impl AgentEndpoint {
    /// Creates an endpoint.
    #[must_use]
    pub const fn new(ip_address: String, port: u16) -> Self {
        Self { ip_address, port }
    }

    /// Returns the IP address.
    #[must_use]
    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip_address, self.port)
    }
}
