//! Inbound RPC handler port for agent registration.

use super::messages::{RegisterAgentReply, RegisterAgentRequest};
use async_trait::async_trait;

/// Server-side handler for the agent manager RPC service.
///
/// Implementations must always produce a reply, including for rejected
/// registrations, so that an agent never hangs waiting on its supervisor.
#[async_trait]
pub trait AgentManagerServiceHandler: Send + Sync {
    /// Handles a registration sent by an agent.
    async fn handle_register_agent(&self, request: &RegisterAgentRequest) -> RegisterAgentReply;
}
