//! Scripted runtime environment agent client and factory for tests.

use crate::agent_manager::{
    domain::AgentEndpoint,
    ports::{
        DeleteRuntimeEnvIfPossibleReply, DeleteRuntimeEnvIfPossibleRequest,
        GetOrCreateRuntimeEnvReply, GetOrCreateRuntimeEnvRequest, RuntimeEnvAgentClient,
        RuntimeEnvAgentClientError, RuntimeEnvAgentClientFactory, RuntimeEnvAgentClientResult,
    },
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Context returned for create requests that have no scripted response.
pub const DEFAULT_RUNTIME_ENV_CONTEXT: &str = "{}";

/// Client that answers from queued responses and records every request.
///
/// Clones share the same script and request log, so a test can keep one
/// handle while the manager uses another. With an empty queue the client
/// accepts the request.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRuntimeEnvAgentClient {
    state: Arc<Mutex<ScriptedClientState>>,
}

#[derive(Debug, Default)]
struct ScriptedClientState {
    create_responses: VecDeque<RuntimeEnvAgentClientResult<GetOrCreateRuntimeEnvReply>>,
    delete_responses: VecDeque<RuntimeEnvAgentClientResult<DeleteRuntimeEnvIfPossibleReply>>,
    create_requests: Vec<GetOrCreateRuntimeEnvRequest>,
    delete_requests: Vec<DeleteRuntimeEnvIfPossibleRequest>,
}

impl ScriptedRuntimeEnvAgentClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the outcome of the next create call.
    pub fn push_create_response(
        &self,
        response: RuntimeEnvAgentClientResult<GetOrCreateRuntimeEnvReply>,
    ) {
        self.lock().create_responses.push_back(response);
    }

    /// Queues the outcome of the next delete call.
    pub fn push_delete_response(
        &self,
        response: RuntimeEnvAgentClientResult<DeleteRuntimeEnvIfPossibleReply>,
    ) {
        self.lock().delete_responses.push_back(response);
    }

    /// Makes the next `times` create calls fail at the transport level.
    pub fn fail_create_transport(&self, times: usize) {
        for _ in 0..times {
            self.push_create_response(Err(connection_reset()));
        }
    }

    /// Makes the next `times` delete calls fail at the transport level.
    pub fn fail_delete_transport(&self, times: usize) {
        for _ in 0..times {
            self.push_delete_response(Err(connection_reset()));
        }
    }

    /// Returns every create request received, oldest first.
    #[must_use]
    pub fn create_requests(&self) -> Vec<GetOrCreateRuntimeEnvRequest> {
        self.lock().create_requests.clone()
    }

    /// Returns every delete request received, oldest first.
    #[must_use]
    pub fn delete_requests(&self) -> Vec<DeleteRuntimeEnvIfPossibleRequest> {
        self.lock().delete_requests.clone()
    }
}

fn connection_reset() -> RuntimeEnvAgentClientError {
    RuntimeEnvAgentClientError::transport(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "scripted transport failure",
    ))
}

#[async_trait]
impl RuntimeEnvAgentClient for ScriptedRuntimeEnvAgentClient {
    async fn get_or_create_runtime_env(
        &self,
        request: &GetOrCreateRuntimeEnvRequest,
    ) -> RuntimeEnvAgentClientResult<GetOrCreateRuntimeEnvReply> {
        let mut state = self.lock();
        state.create_requests.push(request.clone());
        state
            .create_responses
            .pop_front()
            .unwrap_or_else(|| Ok(GetOrCreateRuntimeEnvReply::ok(DEFAULT_RUNTIME_ENV_CONTEXT)))
    }

    async fn delete_runtime_env_if_possible(
        &self,
        request: &DeleteRuntimeEnvIfPossibleRequest,
    ) -> RuntimeEnvAgentClientResult<DeleteRuntimeEnvIfPossibleReply> {
        let mut state = self.lock();
        state.delete_requests.push(request.clone());
        state
            .delete_responses
            .pop_front()
            .unwrap_or_else(|| Ok(DeleteRuntimeEnvIfPossibleReply::ok()))
    }
}

/// Factory handing out clones of one [`ScriptedRuntimeEnvAgentClient`] and
/// counting connection attempts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuntimeEnvAgentClientFactory {
    client: ScriptedRuntimeEnvAgentClient,
    state: Arc<Mutex<FactoryState>>,
}

#[derive(Debug, Default)]
struct FactoryState {
    connect_attempts: Vec<AgentEndpoint>,
    pending_failures: usize,
}

impl InMemoryRuntimeEnvAgentClientFactory {
    /// Creates a factory with a fresh scripted client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FactoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the scripted client shared by every connection.
    #[must_use]
    pub const fn client(&self) -> &ScriptedRuntimeEnvAgentClient {
        &self.client
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_next_connects(&self, count: usize) {
        self.lock().pending_failures = count;
    }

    /// Returns how many times a client was requested.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.lock().connect_attempts.len()
    }

    /// Returns the endpoints clients were requested for, oldest first.
    #[must_use]
    pub fn connected_endpoints(&self) -> Vec<AgentEndpoint> {
        self.lock().connect_attempts.clone()
    }
}

impl RuntimeEnvAgentClientFactory for InMemoryRuntimeEnvAgentClientFactory {
    type Client = ScriptedRuntimeEnvAgentClient;

    fn connect(
        &self,
        endpoint: &AgentEndpoint,
    ) -> RuntimeEnvAgentClientResult<ScriptedRuntimeEnvAgentClient> {
        let mut state = self.lock();
        state.connect_attempts.push(endpoint.clone());
        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            return Err(RuntimeEnvAgentClientError::unavailable(
                endpoint,
                "scripted connect failure",
            ));
        }
        Ok(self.client.clone())
    }
}
