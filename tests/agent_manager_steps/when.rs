//! When steps for agent manager BDD scenarios.

use super::world::{AgentManagerWorld, build_registration, run_async};
use agent_supervisor::agent_manager::{
    domain::{JobId, RuntimeEnvConfig},
    ports::AgentManagerServiceHandler,
};
use rstest_bdd_macros::when;

#[when(r#"agent {id} registers at "{ip}" port {port}"#)]
fn agent_registers(world: &mut AgentManagerWorld, id: i32, ip: String, port: i32) {
    world.last_reply = Some(
        world
            .manager
            .register_agent(&build_registration(id, &ip, port)),
    );
}

#[when("agent {id} registers through the handler")]
fn agent_registers_through_handler(
    world: &mut AgentManagerWorld,
    id: i32,
) -> Result<(), eyre::Report> {
    let handler = world
        .handler
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no service handler in scenario world"))?;
    let request = build_registration(id, "10.0.0.5", 6379);
    world.last_reply = Some(run_async(handler.handle_register_agent(&request)));
    Ok(())
}

#[when(r#"a runtime env is requested for job "{job}""#)]
fn runtime_env_requested(world: &mut AgentManagerWorld, job: String) -> Result<(), eyre::Report> {
    let job_id = JobId::new(job).map_err(|err| eyre::eyre!("invalid job id: {err}"))?;
    let result = run_async(world.manager.get_or_create_runtime_env(
        &job_id,
        r#"{"pip": ["requests"]}"#.to_owned(),
        RuntimeEnvConfig::default(),
        String::new(),
    ));
    world.last_runtime_env_result = Some(result);
    Ok(())
}
