//! Agent manager: shared state, registration reconciliation and queries.
//!
//! Supervision lives in `supervisor.rs` and runtime environment brokering in
//! `broker.rs`; both extend [`AgentManager`] and share its single lock.

use super::error::{AgentManagerError, AgentManagerResult};
use crate::agent_manager::{
    config::AgentManagerConfig,
    domain::{
        AgentEndpoint, AgentId, AgentIdAllocator, AgentInfo, AgentManagerOptions, AgentState,
        RegistrationOutcome, SupervisionStatus,
    },
    ports::{
        AgentManagerServiceHandler, AgentProcessLauncher, RegisterAgentReply,
        RegisterAgentRequest, RetryScheduler, RuntimeEnvAgentClientFactory,
    },
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Client built for one agent endpoint.
pub(super) struct CachedClient<T> {
    pub(super) endpoint: AgentEndpoint,
    pub(super) client: Arc<T>,
}

/// Everything guarded by the manager's lock.
pub(super) struct ManagerState<T> {
    pub(super) agent: AgentState,
    pub(super) client: Option<CachedClient<T>>,
    pub(super) id_allocator: AgentIdAllocator,
    pub(super) restart_count: u32,
}

/// Per-node supervisor and broker for the runtime environment agent.
///
/// The manager launches the agent, accepts its registration, and forwards
/// runtime environment requests to it. It is shared as
/// `Arc<AgentManager<..>>` between the RPC server, the supervision task and
/// job lifecycle code.
pub struct AgentManager<L, F, S, C>
where
    L: AgentProcessLauncher,
    F: RuntimeEnvAgentClientFactory,
    S: RetryScheduler,
    C: Clock + Send + Sync,
{
    pub(super) options: AgentManagerOptions,
    pub(super) config: AgentManagerConfig,
    pub(super) launcher: Arc<L>,
    pub(super) client_factory: Arc<F>,
    pub(super) scheduler: Arc<S>,
    clock: Arc<C>,
    state: Mutex<ManagerState<F::Client>>,
    pub(super) start_requested: AtomicBool,
}

impl<L, F, S, C> AgentManager<L, F, S, C>
where
    L: AgentProcessLauncher,
    F: RuntimeEnvAgentClientFactory,
    S: RetryScheduler,
    C: Clock + Send + Sync,
{
    /// Creates a manager that has not launched or expected any agent yet.
    #[must_use]
    pub fn new(
        options: AgentManagerOptions,
        config: AgentManagerConfig,
        launcher: Arc<L>,
        client_factory: Arc<F>,
        scheduler: Arc<S>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            options,
            config,
            launcher,
            client_factory,
            scheduler,
            clock,
            state: Mutex::new(ManagerState {
                agent: AgentState::new(),
                client: None,
                id_allocator: AgentIdAllocator::seeded(),
                restart_count: 0,
            }),
            start_requested: AtomicBool::new(false),
        }
    }

    /// Replaces the allocator used to pick agent identifiers.
    #[must_use]
    pub fn with_agent_id_allocator(mut self, allocator: AgentIdAllocator) -> Self {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .id_allocator = allocator;
        self
    }

    pub(super) fn lock_state(&self) -> MutexGuard<'_, ManagerState<F::Client>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Expects agent `id` to register next.
    ///
    /// Drops the current registration and cached client. Used when the host
    /// launches the agent itself instead of calling `start_agent`.
    pub fn expect_agent(&self, id: AgentId) {
        let mut state = self.lock_state();
        state.agent.expect_agent(id);
        state.client = None;
        drop(state);
        debug!(agent_id = id.get(), "expecting runtime env agent");
    }

    /// Handles a registration sent by an agent and always produces a reply.
    pub fn register_agent(&self, request: &RegisterAgentRequest) -> RegisterAgentReply {
        match self.accept_registration(request) {
            Ok(_) => RegisterAgentReply::ok(),
            Err(err) => {
                warn!(
                    agent_id = request.agent_id,
                    ip_address = %request.agent_ip_address,
                    error = %err,
                    "rejected runtime env agent registration"
                );
                RegisterAgentReply::failed(err.to_string())
            }
        }
    }

    /// Validates and applies a registration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::Domain`] when the reported identity is
    /// malformed or does not belong to the expected agent. Rejected
    /// registrations leave the state untouched.
    pub fn accept_registration(
        &self,
        request: &RegisterAgentRequest,
    ) -> AgentManagerResult<RegistrationOutcome> {
        let agent_id = AgentId::new(request.agent_id)?;
        let mut info = AgentInfo::new(
            agent_id,
            request.agent_ip_address.clone(),
            request.agent_port,
        )?;
        if let Some(http_port) = request.agent_http_port {
            info = info.with_http_port(http_port);
        }
        if let Some(pid) = request.agent_pid {
            info = info.with_pid(pid);
        }

        let mut state = self.lock_state();
        let outcome = state.agent.register(info, &*self.clock)?;
        let keep_client = match &outcome {
            RegistrationOutcome::Registered(endpoint) => state
                .client
                .as_ref()
                .is_some_and(|cached| cached.endpoint == *endpoint),
            RegistrationOutcome::ClientDisabled { .. } => false,
        };
        if !keep_client {
            state.client = None;
        }
        drop(state);

        match &outcome {
            RegistrationOutcome::Registered(endpoint) => info!(
                agent_id = agent_id.get(),
                endpoint = %endpoint,
                "runtime env agent registered"
            ),
            RegistrationOutcome::ClientDisabled { grpc_port } => warn!(
                agent_id = agent_id.get(),
                grpc_port,
                "runtime env agent reported an invalid port; runtime env requests will fail"
            ),
        }
        Ok(outcome)
    }

    /// Returns the identity of the registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::AgentNotRegistered`] until the expected
    /// agent has registered.
    pub fn try_to_get_agent_info(&self) -> AgentManagerResult<AgentInfo> {
        self.lock_state()
            .agent
            .agent_info()
            .cloned()
            .ok_or(AgentManagerError::AgentNotRegistered)
    }

    /// Returns whether the expected agent has registered.
    #[must_use]
    pub fn is_agent_registered(&self) -> bool {
        self.lock_state().agent.is_registered()
    }

    /// Returns whether the agent client is permanently disabled.
    #[must_use]
    pub fn is_agent_client_disabled(&self) -> bool {
        self.lock_state().agent.is_client_disabled()
    }

    /// Returns the identifier the manager expects to register next.
    #[must_use]
    pub fn expected_agent_id(&self) -> Option<AgentId> {
        self.lock_state().agent.expected_agent_id()
    }

    /// Returns the supervision status.
    #[must_use]
    pub fn supervision_status(&self) -> SupervisionStatus {
        self.lock_state().agent.supervision()
    }

    /// Returns how many times the agent has been restarted.
    #[must_use]
    pub fn restart_count(&self) -> u32 {
        self.lock_state().restart_count
    }
}

#[async_trait]
impl<L, F, S, C> AgentManagerServiceHandler for AgentManager<L, F, S, C>
where
    L: AgentProcessLauncher,
    F: RuntimeEnvAgentClientFactory,
    S: RetryScheduler,
    C: Clock + Send + Sync,
{
    async fn handle_register_agent(&self, request: &RegisterAgentRequest) -> RegisterAgentReply {
        self.register_agent(request)
    }
}
