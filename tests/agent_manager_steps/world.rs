//! Shared world state for agent manager BDD scenarios.

use std::sync::Arc;

use agent_supervisor::agent_manager::{
    adapters::memory::{
        InMemoryAgentProcessLauncher, InMemoryRuntimeEnvAgentClientFactory,
        RecordingRetryScheduler,
    },
    config::AgentManagerConfig,
    domain::{AgentId, AgentManagerOptions, NodeId, RuntimeEnvContext},
    ports::{RegisterAgentReply, RegisterAgentRequest},
    services::{AgentManager, DefaultAgentManagerServiceHandler, RuntimeEnvError},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Manager type used by the BDD world.
pub type ScenarioManager = AgentManager<
    InMemoryAgentProcessLauncher,
    InMemoryRuntimeEnvAgentClientFactory,
    RecordingRetryScheduler,
    DefaultClock,
>;

/// Scenario world for agent manager behaviour tests.
pub struct AgentManagerWorld {
    /// The manager under test.
    pub manager: Arc<ScenarioManager>,
    /// Client factory shared with the manager.
    pub factory: InMemoryRuntimeEnvAgentClientFactory,
    /// Retry scheduler shared with the manager.
    pub scheduler: RecordingRetryScheduler,
    /// Handler under test, for scenarios that exercise the RPC surface.
    pub handler: Option<DefaultAgentManagerServiceHandler<ScenarioManager>>,
    /// Reply to the most recent registration.
    pub last_reply: Option<RegisterAgentReply>,
    /// Result of the most recent runtime env request.
    pub last_runtime_env_result: Option<Result<RuntimeEnvContext, RuntimeEnvError>>,
}

impl AgentManagerWorld {
    /// Creates a world around a manager with fast retry settings.
    #[must_use]
    pub fn new() -> Self {
        let factory = InMemoryRuntimeEnvAgentClientFactory::new();
        let scheduler = RecordingRetryScheduler::new();
        let config = AgentManagerConfig {
            retry_interval_ms: 10,
            max_retries: 3,
            ..AgentManagerConfig::default()
        };
        let options = AgentManagerOptions::new(
            NodeId::new("scenario-node").expect("scenario node id is valid"),
            Vec::new(),
        );
        let manager = AgentManager::new(
            options,
            config,
            Arc::new(InMemoryAgentProcessLauncher::new()),
            Arc::new(factory.clone()),
            Arc::new(scheduler.clone()),
            Arc::new(DefaultClock),
        );
        Self {
            manager: Arc::new(manager),
            factory,
            scheduler,
            handler: None,
            last_reply: None,
            last_runtime_env_result: None,
        }
    }
}

impl Default for AgentManagerWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> AgentManagerWorld {
    AgentManagerWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Parses a scenario agent id.
pub fn parse_agent_id(raw: i32) -> Result<AgentId, eyre::Report> {
    AgentId::new(raw).map_err(|err| eyre::eyre!("invalid agent id {raw}: {err}"))
}

/// Builds a registration request.
pub fn build_registration(id: i32, ip_address: &str, port: i32) -> RegisterAgentRequest {
    RegisterAgentRequest::new(id, ip_address, port)
}
