//! Create and delete requests are forwarded one-for-one.

use super::helpers::{Node, node, registration_from_latest_launch, request_runtime_env};
use agent_supervisor::agent_manager::{
    ports::{AgentManagerServiceHandler, DeleteRuntimeEnvIfPossibleReply},
    services::RuntimeEnvError,
};
use rstest::rstest;

const RUNTIME_ENV: &str = r#"{"conda": "env.yaml"}"#;

async fn registered(node: &Node) {
    node.manager.start_agent().expect("agent should launch");
    let request = registration_from_latest_launch(node, 50_051).expect("agent was launched");
    assert!(node.handler.handle_register_agent(&request).await.is_ok());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn identical_creates_each_reach_the_agent(node: Node) {
    registered(&node).await;

    for _ in 0..3 {
        request_runtime_env(&node, "job-a", RUNTIME_ENV)
            .await
            .expect("runtime env should be created");
    }

    let requests = node.factory.client().create_requests();
    assert_eq!(requests.len(), 3);
    assert!(
        requests
            .iter()
            .all(|request| request.serialized_runtime_env == RUNTIME_ENV)
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn each_create_is_released_by_its_own_delete(node: Node) {
    registered(&node).await;
    request_runtime_env(&node, "job-a", RUNTIME_ENV)
        .await
        .expect("first create should succeed");
    request_runtime_env(&node, "job-b", RUNTIME_ENV)
        .await
        .expect("second create should succeed");

    for _ in 0..2 {
        node.manager
            .delete_runtime_env_if_possible(RUNTIME_ENV.to_owned())
            .await
            .expect("delete should succeed");
    }

    assert_eq!(node.factory.client().delete_requests().len(), 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn delete_retries_then_reports_exhaustion(node: Node) {
    registered(&node).await;
    node.factory.client().fail_delete_transport(3);

    let result = node
        .manager
        .delete_runtime_env_if_possible(RUNTIME_ENV.to_owned())
        .await;

    assert!(matches!(
        result,
        Err(RuntimeEnvError::RetriesExhausted { attempts: 3, .. })
    ));
    assert_eq!(node.scheduler.delay_count(), 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn delete_refusal_is_not_retried(node: Node) {
    registered(&node).await;
    node.factory
        .client()
        .push_delete_response(Ok(DeleteRuntimeEnvIfPossibleReply::failed(
            "runtime env is still in use",
        )));

    let result = node
        .manager
        .delete_runtime_env_if_possible(RUNTIME_ENV.to_owned())
        .await;

    let err = result.expect_err("delete should be refused");
    assert_eq!(err.setup_error_message(), "runtime env is still in use");
    assert_eq!(node.scheduler.delay_count(), 0);
    assert_eq!(node.factory.client().delete_requests().len(), 1);
}
