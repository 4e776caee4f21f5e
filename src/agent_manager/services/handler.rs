//! RPC-facing handler that forwards registrations to a late-bound manager.

use crate::agent_manager::ports::{
    AgentManagerServiceHandler, RegisterAgentReply, RegisterAgentRequest,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::warn;

/// Reply message used when no manager is available to take a registration.
pub const MANAGER_UNAVAILABLE_MESSAGE: &str = "agent manager is not available";

/// Non-owning slot for the manager a handler forwards to.
///
/// The RPC server can be wired with a handler before the manager exists;
/// the manager is bound once it has been constructed. The slot never keeps
/// the manager alive.
pub struct AgentManagerSlot<H> {
    manager: OnceLock<Weak<H>>,
}

impl<H> AgentManagerSlot<H> {
    /// Creates an unbound slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            manager: OnceLock::new(),
        }
    }

    /// Binds `manager` to the slot.
    ///
    /// Returns `false` when the slot was already bound; the first binding
    /// is kept.
    pub fn bind(&self, manager: &Arc<H>) -> bool {
        self.manager.set(Arc::downgrade(manager)).is_ok()
    }

    /// Returns the bound manager while it is still alive.
    #[must_use]
    pub fn get(&self) -> Option<Arc<H>> {
        self.manager.get().and_then(Weak::upgrade)
    }
}

impl<H> Default for AgentManagerSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for AgentManagerSlot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentManagerSlot")
            .field("bound", &self.manager.get().is_some())
            .finish()
    }
}

/// Default RPC handler for the agent manager service.
///
/// Forwards each registration verbatim to the manager in its slot and
/// replies `Failed` when the slot is unbound or the manager is gone.
pub struct DefaultAgentManagerServiceHandler<H> {
    slot: Arc<AgentManagerSlot<H>>,
}

impl<H> DefaultAgentManagerServiceHandler<H> {
    /// Creates a handler forwarding to the manager bound in `slot`.
    #[must_use]
    pub const fn new(slot: Arc<AgentManagerSlot<H>>) -> Self {
        Self { slot }
    }
}

impl<H> fmt::Debug for DefaultAgentManagerServiceHandler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultAgentManagerServiceHandler")
            .field("slot", &self.slot)
            .finish()
    }
}

#[async_trait]
impl<H> AgentManagerServiceHandler for DefaultAgentManagerServiceHandler<H>
where
    H: AgentManagerServiceHandler + 'static,
{
    async fn handle_register_agent(&self, request: &RegisterAgentRequest) -> RegisterAgentReply {
        let Some(manager) = self.slot.get() else {
            warn!(
                agent_id = request.agent_id,
                "agent registration received while no agent manager is bound"
            );
            return RegisterAgentReply::failed(MANAGER_UNAVAILABLE_MESSAGE);
        };
        manager.handle_register_agent(request).await
    }
}
