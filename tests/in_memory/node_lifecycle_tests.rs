//! End-to-end lifecycle of a node's runtime env agent.

use std::time::Duration;

use super::helpers::{Node, node, registration_from_latest_launch, request_runtime_env};
use agent_supervisor::agent_manager::{
    domain::{AgentExitStatus, SupervisionStatus},
    ports::AgentManagerServiceHandler,
    services::RuntimeEnvError,
};
use rstest::rstest;

const RUNTIME_ENV: &str = r#"{"working_dir": "s3://bucket/job.zip"}"#;

#[rstest]
#[tokio::test(start_paused = true)]
async fn launched_agent_registers_through_handler_and_serves_requests(node: Node) {
    node.manager.start_agent().expect("agent should launch");
    let request = registration_from_latest_launch(&node, 50_051).expect("agent was launched");

    let reply = node.handler.handle_register_agent(&request).await;

    assert!(reply.is_ok(), "registration failed: {}", reply.error_message);
    let context = request_runtime_env(&node, "job-a", RUNTIME_ENV)
        .await
        .expect("runtime env should be created");
    assert_eq!(context.as_str(), "{}");
    let endpoints = node.factory.connected_endpoints();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(
        endpoints.first().map(ToString::to_string).as_deref(),
        Some("127.0.0.1:50051")
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn requests_fail_fast_until_the_agent_registers(node: Node) {
    node.manager.start_agent().expect("agent should launch");

    let result = request_runtime_env(&node, "job-a", RUNTIME_ENV).await;

    assert!(matches!(result, Err(RuntimeEnvError::AgentNotRegistered)));
    assert_eq!(node.factory.connect_count(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn restarted_agent_replaces_the_client(node: Node) {
    node.manager.start_agent().expect("agent should launch");
    let first = registration_from_latest_launch(&node, 50_051).expect("agent was launched");
    assert!(node.handler.handle_register_agent(&first).await.is_ok());
    request_runtime_env(&node, "job-a", RUNTIME_ENV)
        .await
        .expect("runtime env should be created");

    assert!(node.launcher.exit(0, AgentExitStatus::exited(137)));
    tokio::time::sleep(Duration::from_secs(1)).await;
    let second = registration_from_latest_launch(&node, 50_052).expect("agent was relaunched");
    let stale_reply = node.handler.handle_register_agent(&first).await;
    let fresh_reply = node.handler.handle_register_agent(&second).await;
    request_runtime_env(&node, "job-b", RUNTIME_ENV)
        .await
        .expect("runtime env should be created on the new agent");

    assert_ne!(first.agent_id, second.agent_id);
    assert!(!stale_reply.is_ok());
    assert!(fresh_reply.is_ok());
    assert_eq!(node.manager.supervision_status(), SupervisionStatus::Running);
    let ports: Vec<u16> = node
        .factory
        .connected_endpoints()
        .iter()
        .map(|endpoint| endpoint.port())
        .collect();
    assert_eq!(ports, vec![50_051, 50_052]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn handler_rejects_registration_after_manager_shutdown(node: Node) {
    let Node {
        manager, handler, ..
    } = node;
    let request = agent_supervisor::agent_manager::ports::RegisterAgentRequest::new(
        1,
        "127.0.0.1",
        50_051,
    );
    drop(manager);

    let reply = handler.handle_register_agent(&request).await;

    assert!(!reply.is_ok());
}
