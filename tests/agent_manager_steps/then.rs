//! Then steps for agent manager BDD scenarios.

use super::world::AgentManagerWorld;
use agent_supervisor::agent_manager::{
    adapters::memory::DEFAULT_RUNTIME_ENV_CONTEXT, domain::RuntimeEnvContext,
    services::RuntimeEnvError,
};
use rstest_bdd_macros::then;

fn runtime_env_result(
    world: &AgentManagerWorld,
) -> Result<&Result<RuntimeEnvContext, RuntimeEnvError>, eyre::Report> {
    world
        .last_runtime_env_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing runtime env result in scenario world"))
}

#[then(r#"the registered agent is {id} at "{ip}" port {port}"#)]
fn registered_agent_is(
    world: &AgentManagerWorld,
    id: i32,
    ip: String,
    port: i32,
) -> Result<(), eyre::Report> {
    let info = world
        .manager
        .try_to_get_agent_info()
        .map_err(|err| eyre::eyre!("agent info unavailable: {err}"))?;
    let actual = (info.id().get(), info.ip_address(), info.grpc_port());
    if actual != (id, ip.as_str(), port) {
        return Err(eyre::eyre!(
            "expected agent {id} at {ip}:{port}, found {actual:?}"
        ));
    }
    Ok(())
}

#[then("the last registration was rejected")]
fn last_registration_rejected(world: &AgentManagerWorld) -> Result<(), eyre::Report> {
    let reply = world
        .last_reply
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing registration reply in scenario world"))?;
    if reply.is_ok() || reply.error_message.is_empty() {
        return Err(eyre::eyre!("expected a failed reply, got {reply:?}"));
    }
    Ok(())
}

#[then("agent info is not available")]
fn agent_info_not_available(world: &AgentManagerWorld) -> Result<(), eyre::Report> {
    match world.manager.try_to_get_agent_info() {
        Ok(info) => Err(eyre::eyre!("expected no agent info, found {info:?}")),
        Err(_) => Ok(()),
    }
}

#[then(r#"the request fails because the agent client is disabled for job "{job}""#)]
fn request_fails_client_disabled(
    world: &AgentManagerWorld,
    job: String,
) -> Result<(), eyre::Report> {
    match runtime_env_result(world)? {
        Err(RuntimeEnvError::AgentClientDisabled {
            job_id: Some(job_id),
        }) if job_id.as_str() == job => Ok(()),
        other => Err(eyre::eyre!(
            "expected client disabled error for {job}, got {other:?}"
        )),
    }
}

#[then("no agent client was created")]
fn no_agent_client_created(world: &AgentManagerWorld) -> Result<(), eyre::Report> {
    let connects = world.factory.connect_count();
    if connects != 0 {
        return Err(eyre::eyre!("expected no client, factory was called {connects} times"));
    }
    Ok(())
}

#[then("the runtime env context is returned")]
fn runtime_env_context_returned(world: &AgentManagerWorld) -> Result<(), eyre::Report> {
    match runtime_env_result(world)? {
        Ok(context) if context.as_str() == DEFAULT_RUNTIME_ENV_CONTEXT => Ok(()),
        other => Err(eyre::eyre!("expected the runtime env context, got {other:?}")),
    }
}

#[then("the manager waited {count:usize} times before retrying")]
fn manager_waited(world: &AgentManagerWorld, count: usize) -> Result<(), eyre::Report> {
    let waits = world.scheduler.delay_count();
    if waits != count {
        return Err(eyre::eyre!("expected {count} retry waits, found {waits}"));
    }
    Ok(())
}

#[then("the request fails after exhausting retries")]
fn request_fails_after_retries(world: &AgentManagerWorld) -> Result<(), eyre::Report> {
    match runtime_env_result(world)? {
        Err(err @ RuntimeEnvError::RetriesExhausted { .. })
            if !err.setup_error_message().is_empty() =>
        {
            Ok(())
        }
        other => Err(eyre::eyre!("expected exhausted retries, got {other:?}")),
    }
}

#[then(r#"the request fails with message "{message}""#)]
fn request_fails_with_message(
    world: &AgentManagerWorld,
    message: String,
) -> Result<(), eyre::Report> {
    match runtime_env_result(world)? {
        Err(err) if err.is_refusal() && err.setup_error_message() == message => Ok(()),
        other => Err(eyre::eyre!("expected refusal '{message}', got {other:?}")),
    }
}
