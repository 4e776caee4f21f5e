//! Runtime environment brokering over the cached agent client.

use super::error::RuntimeEnvError;
use super::manager::{AgentManager, CachedClient};
use crate::agent_manager::{
    domain::{
        AgentUnavailable, JobId, RuntimeEnvConfig, RuntimeEnvContext, RuntimeEnvRequestId,
        runtime_env_digest,
    },
    ports::{
        AgentProcessLauncher, AgentRpcStatus, DeleteRuntimeEnvIfPossibleRequest,
        GetOrCreateRuntimeEnvRequest, RetryScheduler, RuntimeEnvAgentClient as _,
        RuntimeEnvAgentClientError, RuntimeEnvAgentClientFactory, RuntimeEnvAgentClientResult,
        SOURCE_PROCESS,
    },
};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outcome of one failed attempt.
enum AttemptError {
    /// Ends the request without retrying.
    Fatal(RuntimeEnvError),
    /// Retried after the configured interval.
    Transient(RuntimeEnvAgentClientError),
}

/// Log context shared by every attempt of one request.
#[derive(Clone, Copy)]
struct RuntimeEnvCall<'a> {
    operation: &'static str,
    request_id: RuntimeEnvRequestId,
    job_id: Option<&'a JobId>,
    digest: &'a str,
}

impl<L, F, S, C> AgentManager<L, F, S, C>
where
    L: AgentProcessLauncher,
    F: RuntimeEnvAgentClientFactory,
    S: RetryScheduler,
    C: Clock + Send + Sync,
{
    /// Asks the agent to create, or take another reference to, a runtime
    /// environment for `job_id`.
    ///
    /// The call is not idempotent: every successful call adds one reference
    /// on the agent. Transport failures, and a restarting agent that has
    /// not re-registered yet, are retried every `retry_interval` up to
    /// `max_retries` times. Refusals are returned at once.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeEnvError`] without contacting the agent when it is
    /// not started, failed or disabled, or when no agent has ever
    /// registered. Otherwise it is returned when the agent refuses the
    /// request or every attempt fails.
    pub async fn get_or_create_runtime_env(
        &self,
        job_id: &JobId,
        serialized_runtime_env: String,
        runtime_env_config: RuntimeEnvConfig,
        serialized_allocated_resource_instances: String,
    ) -> Result<RuntimeEnvContext, RuntimeEnvError> {
        let digest = runtime_env_digest(&serialized_runtime_env);
        let call = RuntimeEnvCall {
            operation: "get_or_create_runtime_env",
            request_id: RuntimeEnvRequestId::new(),
            job_id: Some(job_id),
            digest: &digest,
        };
        self.ensure_agent_available(call)?;

        let request = GetOrCreateRuntimeEnvRequest {
            job_id: job_id.as_str().to_owned(),
            serialized_runtime_env,
            runtime_env_config,
            serialized_allocated_resource_instances,
            source_process: SOURCE_PROCESS.to_owned(),
        };
        let reply = self
            .call_with_retries(call, |client| {
                let attempt_request = request.clone();
                async move { client.get_or_create_runtime_env(&attempt_request).await }
            })
            .await?;

        match reply.status {
            AgentRpcStatus::Ok => {
                debug!(
                    request_id = %call.request_id,
                    job_id = %job_id,
                    runtime_env_digest = %digest,
                    "runtime env created"
                );
                Ok(RuntimeEnvContext::new(reply.serialized_runtime_env_context))
            }
            AgentRpcStatus::Failed => Err(Self::refusal(call, reply.error_message)),
        }
    }

    /// Asks the agent to drop one reference to a runtime environment.
    ///
    /// Follows the same fail-fast, refusal and retry rules as
    /// [`Self::get_or_create_runtime_env`].
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeEnvError`] when the agent is unavailable, refuses
    /// the request, or every attempt fails.
    pub async fn delete_runtime_env_if_possible(
        &self,
        serialized_runtime_env: String,
    ) -> Result<(), RuntimeEnvError> {
        let digest = runtime_env_digest(&serialized_runtime_env);
        let call = RuntimeEnvCall {
            operation: "delete_runtime_env_if_possible",
            request_id: RuntimeEnvRequestId::new(),
            job_id: None,
            digest: &digest,
        };
        self.ensure_agent_available(call)?;

        let request = DeleteRuntimeEnvIfPossibleRequest {
            serialized_runtime_env,
            source_process: SOURCE_PROCESS.to_owned(),
        };
        let reply = self
            .call_with_retries(call, |client| {
                let attempt_request = request.clone();
                async move { client.delete_runtime_env_if_possible(&attempt_request).await }
            })
            .await?;

        match reply.status {
            AgentRpcStatus::Ok => {
                debug!(
                    request_id = %call.request_id,
                    runtime_env_digest = %digest,
                    "runtime env reference released"
                );
                Ok(())
            }
            AgentRpcStatus::Failed => Err(Self::refusal(call, reply.error_message)),
        }
    }

    /// Rejects requests the agent can never serve.
    ///
    /// A missing registration is only final before the first agent has
    /// registered. Afterwards it means a restart is in progress and the
    /// request goes through the retry path instead.
    fn ensure_agent_available(&self, call: RuntimeEnvCall<'_>) -> Result<(), RuntimeEnvError> {
        let (availability, ever_registered) = {
            let state = self.lock_state();
            (
                state.agent.runtime_env_endpoint(),
                state.agent.has_ever_registered(),
            )
        };
        let reason = match availability {
            Ok(_) => return Ok(()),
            Err(AgentUnavailable::NotRegistered) if ever_registered => {
                debug!(
                    operation = call.operation,
                    request_id = %call.request_id,
                    runtime_env_digest = call.digest,
                    "runtime env agent is restarting; request will be retried"
                );
                return Ok(());
            }
            Err(reason) => reason,
        };

        let err = RuntimeEnvError::from_unavailable(reason, call.job_id);
        warn!(
            operation = call.operation,
            request_id = %call.request_id,
            job_id = call.job_id.map(JobId::as_str),
            runtime_env_digest = call.digest,
            error = %err,
            "runtime env request rejected without contacting the agent"
        );
        Err(err)
    }

    fn refusal(call: RuntimeEnvCall<'_>, message: String) -> RuntimeEnvError {
        let err = RuntimeEnvError::refused(message);
        warn!(
            operation = call.operation,
            request_id = %call.request_id,
            job_id = call.job_id.map(JobId::as_str),
            runtime_env_digest = call.digest,
            error = %err,
            "runtime env agent refused the request"
        );
        err
    }

    async fn call_with_retries<T, Op, Fut>(
        &self,
        call: RuntimeEnvCall<'_>,
        mut operation: Op,
    ) -> Result<T, RuntimeEnvError>
    where
        Op: FnMut(Arc<F::Client>) -> Fut,
        Fut: Future<Output = RuntimeEnvAgentClientResult<T>>,
    {
        let mut retries: u32 = 0;
        loop {
            let last_error = match self.attempt(call, &mut operation).await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Transient(err)) => err,
            };

            if retries >= self.config.max_retries {
                let attempts = retries.saturating_add(1);
                error!(
                    operation = call.operation,
                    request_id = %call.request_id,
                    job_id = call.job_id.map(JobId::as_str),
                    runtime_env_digest = call.digest,
                    attempts,
                    error = %last_error,
                    "runtime env agent request failed; giving up"
                );
                return Err(RuntimeEnvError::RetriesExhausted {
                    attempts,
                    last_error,
                });
            }

            retries = retries.saturating_add(1);
            warn!(
                operation = call.operation,
                request_id = %call.request_id,
                job_id = call.job_id.map(JobId::as_str),
                runtime_env_digest = call.digest,
                attempt = retries,
                max_retries = self.config.max_retries,
                error = %last_error,
                "runtime env agent request failed; retrying"
            );
            self.scheduler.delay(self.config.retry_interval()).await;
        }
    }

    async fn attempt<T, Op, Fut>(
        &self,
        call: RuntimeEnvCall<'_>,
        operation: &mut Op,
    ) -> Result<T, AttemptError>
    where
        Op: FnMut(Arc<F::Client>) -> Fut,
        Fut: Future<Output = RuntimeEnvAgentClientResult<T>>,
    {
        let client = self.client_for_request(call)?;
        let rpc_timeout = self.config.rpc_timeout();
        let result = tokio::time::timeout(rpc_timeout, operation(client))
            .await
            .map_err(|_elapsed| {
                AttemptError::Transient(RuntimeEnvAgentClientError::Timeout(rpc_timeout))
            })?;
        result.map_err(AttemptError::Transient)
    }

    /// Returns the cached client for the registered endpoint, building one
    /// when none matches.
    fn client_for_request(
        &self,
        call: RuntimeEnvCall<'_>,
    ) -> Result<Arc<F::Client>, AttemptError> {
        let mut state = self.lock_state();
        let endpoint = match state.agent.runtime_env_endpoint() {
            Ok(endpoint) => endpoint,
            Err(AgentUnavailable::NotRegistered) => {
                return Err(AttemptError::Transient(
                    RuntimeEnvAgentClientError::NotRegistered,
                ));
            }
            Err(reason) => {
                return Err(AttemptError::Fatal(RuntimeEnvError::from_unavailable(
                    reason,
                    call.job_id,
                )));
            }
        };

        if let Some(cached) = state
            .client
            .as_ref()
            .filter(|cached| cached.endpoint == endpoint)
        {
            return Ok(Arc::clone(&cached.client));
        }

        let client = Arc::new(
            self.client_factory
                .connect(&endpoint)
                .map_err(AttemptError::Transient)?,
        );
        debug!(endpoint = %endpoint, "connected runtime env agent client");
        state.client = Some(CachedClient {
            endpoint,
            client: Arc::clone(&client),
        });
        Ok(client)
    }
}
