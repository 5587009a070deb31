//! Polling coordinator behaviour against a mock gateway.

use std::sync::Arc;
use std::time::Duration;

use openclaw_bridge::coordinator::SetupAbort;
use openclaw_bridge::{
    Coordinator, CoordinatorState, GatewayClient, GatewayConfig, SetupError, Timeouts, Transport,
    UpdateFailure,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn coordinator_for(base_url: &str, interval: Duration) -> Arc<Coordinator> {
    let config = GatewayConfig {
        base_url: base_url.to_string(),
        api_token: "abc".to_string(),
        agent_id: "main".to_string(),
    };
    let client = GatewayClient::new(&config, Transport::new()).with_timeouts(Timeouts {
        tool: Duration::from_millis(300),
        chat: Duration::from_millis(300),
        health: Duration::from_millis(300),
    });
    Arc::new(Coordinator::new("openclaw", client, interval))
}

async fn mount_status(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/tools/invoke"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_then_failure_keeps_last_data() {
    let mock_server = MockServer::start().await;
    let status = json!({"result": {"activeSessions": 4}});
    mount_status(&mock_server, ResponseTemplate::new(200).set_body_json(&status)).await;

    let coordinator = coordinator_for(&mock_server.uri(), Duration::from_secs(30));
    coordinator.refresh().await.unwrap();

    let snapshot = coordinator.snapshot();
    assert!(snapshot.last_update_success);
    assert_eq!(snapshot.data.as_deref(), Some(&status));
    assert_eq!(snapshot.state, CoordinatorState::Healthy);
    assert!(snapshot.last_updated.is_some());

    mock_server.reset().await;
    mount_status(&mock_server, ResponseTemplate::new(503).set_body_string("maintenance")).await;

    let failure = coordinator.refresh().await.unwrap_err();
    assert!(matches!(failure, UpdateFailure::Gateway(ref msg) if msg.contains("503")));

    let snapshot = coordinator.snapshot();
    assert!(!snapshot.last_update_success);
    assert_eq!(snapshot.data.as_deref(), Some(&status));
    assert_eq!(snapshot.last_error, Some(failure));
    assert_eq!(snapshot.state, CoordinatorState::Unhealthy);

    // And back again.
    mock_server.reset().await;
    let newer = json!({"result": {"activeSessions": 1}});
    mount_status(&mock_server, ResponseTemplate::new(200).set_body_json(&newer)).await;

    coordinator.refresh().await.unwrap();
    let snapshot = coordinator.snapshot();
    assert!(snapshot.last_update_success);
    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.data.as_deref(), Some(&newer));
}

#[tokio::test]
async fn test_auth_failure_in_steady_state_is_absorbed() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, ResponseTemplate::new(200).set_body_json(json!({"ok": 1}))).await;

    let coordinator = coordinator_for(&mock_server.uri(), Duration::from_secs(30));
    coordinator.first_refresh().await.unwrap();

    mock_server.reset().await;
    mount_status(&mock_server, ResponseTemplate::new(401)).await;

    let failure = coordinator.refresh().await.unwrap_err();
    assert_eq!(failure.kind(), "authentication");
    assert_eq!(coordinator.data().as_deref(), Some(&json!({"ok": 1})));
    assert!(!coordinator.client().transport().is_closed());
}

#[tokio::test]
async fn test_first_refresh_auth_failure_aborts_setup() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, ResponseTemplate::new(403)).await;

    let coordinator = coordinator_for(&mock_server.uri(), Duration::from_secs(30));
    let err = coordinator.first_refresh().await.unwrap_err();

    assert!(matches!(err, SetupError::AuthFailed(_)));
    assert_eq!(err.to_string(), "Authentication failed: gateway returned 403");
    assert_eq!(coordinator.state(), CoordinatorState::SetupAborted(SetupAbort::Auth));
    assert!(coordinator.client().transport().is_closed());
    assert!(coordinator.data().is_none());
}

#[tokio::test]
async fn test_first_refresh_connectivity_failure_is_retry_later() {
    let coordinator = coordinator_for("http://127.0.0.1:9", Duration::from_secs(30));
    let err = coordinator.first_refresh().await.unwrap_err();

    assert!(matches!(err, SetupError::NotReady(_)), "got {:?}", err);
    assert_eq!(
        coordinator.state(),
        CoordinatorState::SetupAborted(SetupAbort::RetryLater)
    );
    assert!(coordinator.client().transport().is_closed());
}

#[tokio::test]
async fn test_first_refresh_gateway_failure_is_surfaced_verbatim() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, ResponseTemplate::new(500).set_body_string("tool not allowed")).await;

    let coordinator = coordinator_for(&mock_server.uri(), Duration::from_secs(30));
    match coordinator.first_refresh().await.unwrap_err() {
        SetupError::NotReady(reason) => {
            assert!(reason.contains("500"));
            assert!(reason.contains("tool not allowed"));
        }
        other => panic!("expected NotReady, got {:?}", other),
    }
    assert!(coordinator.client().transport().is_closed());
}

#[tokio::test]
async fn test_poll_loop_refreshes_until_shutdown() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, ResponseTemplate::new(200).set_body_json(json!({"sessions": 1}))).await;

    let coordinator = coordinator_for(&mock_server.uri(), Duration::from_millis(50));
    coordinator.first_refresh().await.unwrap();

    let mut updates = coordinator.subscribe();
    updates.borrow_and_update();
    coordinator.start();

    // A failing tick must not kill the loop.
    mock_server.reset().await;
    mount_status(&mock_server, ResponseTemplate::new(502)).await;
    tokio::time::timeout(Duration::from_secs(2), async {
        while coordinator.last_update_success() {
            updates.changed().await.unwrap();
        }
    })
    .await
    .expect("poll loop should record the failure");
    assert_eq!(coordinator.data().as_deref(), Some(&json!({"sessions": 1})));

    mock_server.reset().await;
    mount_status(&mock_server, ResponseTemplate::new(200).set_body_json(json!({"sessions": 2}))).await;
    tokio::time::timeout(Duration::from_secs(2), async {
        while !coordinator.last_update_success() {
            updates.changed().await.unwrap();
        }
    })
    .await
    .expect("poll loop should recover");
    assert_eq!(coordinator.data().as_deref(), Some(&json!({"sessions": 2})));

    coordinator.shutdown();
    assert_eq!(coordinator.state(), CoordinatorState::Stopped);
    assert!(coordinator.client().transport().is_closed());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let received = mock_server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(mock_server.received_requests().await.unwrap().len(), received);

    assert!(coordinator.refresh().await.is_err());
    assert_eq!(coordinator.state(), CoordinatorState::Stopped);
}
