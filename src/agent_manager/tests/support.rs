//! Shared construction helpers for agent manager unit tests.

use crate::agent_manager::{
    adapters::memory::{
        InMemoryAgentProcessLauncher, InMemoryRuntimeEnvAgentClientFactory,
        RecordingRetryScheduler,
    },
    config::AgentManagerConfig,
    domain::{AgentId, AgentIdAllocator, AgentManagerOptions, NodeId},
    ports::RegisterAgentRequest,
    services::AgentManager,
};
use mockable::DefaultClock;
use std::sync::Arc;

pub(super) type TestManager = AgentManager<
    InMemoryAgentProcessLauncher,
    InMemoryRuntimeEnvAgentClientFactory,
    RecordingRetryScheduler,
    DefaultClock,
>;

pub(super) const FIRST_AGENT_ID: i32 = 7;

pub(super) struct Harness {
    pub(super) manager: Arc<TestManager>,
    pub(super) launcher: InMemoryAgentProcessLauncher,
    pub(super) factory: InMemoryRuntimeEnvAgentClientFactory,
    pub(super) scheduler: RecordingRetryScheduler,
}

pub(super) fn test_config() -> AgentManagerConfig {
    AgentManagerConfig {
        retry_interval_ms: 10,
        max_retries: 3,
        rpc_timeout_ms: 1_000,
        register_timeout_ms: 500,
        restart_interval_ms: 100,
        max_restart_count: 2,
    }
}

pub(super) fn agent_command() -> Vec<String> {
    vec!["/usr/local/bin/runtime-env-agent".to_owned()]
}

pub(super) fn build_harness(command: Vec<String>, config: AgentManagerConfig) -> Harness {
    build_harness_with_scheduler(command, config, RecordingRetryScheduler::new())
}

pub(super) fn build_harness_with_scheduler(
    command: Vec<String>,
    config: AgentManagerConfig,
    scheduler: RecordingRetryScheduler,
) -> Harness {
    let launcher = InMemoryAgentProcessLauncher::new();
    let factory = InMemoryRuntimeEnvAgentClientFactory::new();
    let options = AgentManagerOptions::new(
        NodeId::new("node-1").expect("test node id should be valid"),
        command,
    );
    let manager = AgentManager::new(
        options,
        config,
        Arc::new(launcher.clone()),
        Arc::new(factory.clone()),
        Arc::new(scheduler.clone()),
        Arc::new(DefaultClock),
    )
    .with_agent_id_allocator(AgentIdAllocator::starting_at(FIRST_AGENT_ID));

    Harness {
        manager: Arc::new(manager),
        launcher,
        factory,
        scheduler,
    }
}

pub(super) fn agent_id(raw: i32) -> AgentId {
    AgentId::new(raw).expect("test agent id should be non-zero")
}

pub(super) fn registration(raw_id: i32, port: i32) -> RegisterAgentRequest {
    RegisterAgentRequest::new(raw_id, "10.0.0.5", port)
}
