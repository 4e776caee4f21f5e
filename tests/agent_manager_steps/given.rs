//! Given steps for agent manager BDD scenarios.

use super::world::{AgentManagerWorld, build_registration, parse_agent_id};
use agent_supervisor::agent_manager::{
    ports::GetOrCreateRuntimeEnvReply,
    services::{AgentManagerSlot, DefaultAgentManagerServiceHandler},
};
use rstest_bdd_macros::given;
use std::sync::Arc;

#[given("the manager expects agent {id}")]
fn manager_expects_agent(world: &mut AgentManagerWorld, id: i32) -> Result<(), eyre::Report> {
    world.manager.expect_agent(parse_agent_id(id)?);
    Ok(())
}

#[given(r#"a registered agent {id} at "{ip}" port {port}"#)]
fn registered_agent(
    world: &mut AgentManagerWorld,
    id: i32,
    ip: String,
    port: i32,
) -> Result<(), eyre::Report> {
    world.manager.expect_agent(parse_agent_id(id)?);
    let reply = world
        .manager
        .register_agent(&build_registration(id, &ip, port));
    if !reply.is_ok() {
        return Err(eyre::eyre!(
            "registration of agent {id} failed: {}",
            reply.error_message
        ));
    }
    Ok(())
}

#[given("the agent drops the next {count:usize} requests")]
fn agent_drops_requests(world: &mut AgentManagerWorld, count: usize) {
    world.factory.client().fail_create_transport(count);
}

#[given(r#"the agent refuses the next request with "{message}""#)]
fn agent_refuses_request(world: &mut AgentManagerWorld, message: String) {
    world
        .factory
        .client()
        .push_create_response(Ok(GetOrCreateRuntimeEnvReply::failed(message)));
}

#[given("a service handler with no bound manager")]
fn unbound_handler(world: &mut AgentManagerWorld) {
    world.handler = Some(DefaultAgentManagerServiceHandler::new(Arc::new(
        AgentManagerSlot::new(),
    )));
}
