//! Task store and entitlement clients against a mock HTTP server

use serde_json::json;
use tiergate_client::{
    ClientError, EntitlementClient, EntitlementConfig, TaskCreate, TaskStoreClient,
    TaskStoreConfig, TaskUpdate,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task_json(id: u64, title: &str, completed: bool) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "completed": completed,
        "created_at": "2026-10-17T09:00:00.000001"
    })
}

fn task_client(server: &MockServer) -> TaskStoreClient {
    TaskStoreClient::new(TaskStoreConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn entitlement_client(server: &MockServer) -> EntitlementClient {
    EntitlementClient::new(EntitlementConfig {
        base_url: server.uri(),
        customer_id: "customer-42".into(),
        api_key: Some("secret".into()),
        timeout_secs: 5,
        ready_attempts: 3,
        ready_backoff_ms: 1,
    })
    .unwrap()
}

#[tokio::test]
async fn list_tasks_parses_store_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            task_json(1, "first", false),
            task_json(2, "second", true),
        ])))
        .mount(&server)
        .await;

    let tasks = task_client(&server).list_tasks().await.unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].title, "second");
    assert!(tasks[1].completed);
}

#[tokio::test]
async fn create_task_sends_title_and_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_json(json!({"title": "Buy milk", "description": "oat"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(3, "Buy milk", false)))
        .expect(1)
        .mount(&server)
        .await;

    let task = task_client(&server)
        .create_task(&TaskCreate {
            title: "Buy milk".into(),
            description: "oat".into(),
        })
        .await
        .unwrap();

    assert_eq!(task.id, 3);
}

#[tokio::test]
async fn update_unknown_task_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/tasks/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Task not found"})))
        .mount(&server)
        .await;

    let result = task_client(&server)
        .update_task(99, &TaskUpdate::completed(true))
        .await;

    assert!(matches!(result, Err(ClientError::NotFound(_))));
}

#[tokio::test]
async fn delete_task_accepts_message_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Task deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    task_client(&server).delete_task(4).await.unwrap();
}

#[tokio::test]
async fn server_failure_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = task_client(&server).list_tasks().await.unwrap_err();

    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn get_entitlement_passes_requested_usage_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/customer-42/entitlements/feature-task-hourly-limit"))
        .and(query_param("requestedUsage", "1"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hasAccess": true,
            "usageLimit": 5,
            "currentUsage": 2,
            "usagePeriodEnd": "2026-10-17T13:00:00Z"
        })))
        .mount(&server)
        .await;

    let grant = entitlement_client(&server)
        .get_entitlement("feature-task-hourly-limit", Some(1))
        .await
        .unwrap();

    assert_eq!(grant.has_access, Some(true));
    assert_eq!(grant.usage_limit, Some(5));
    assert_eq!(grant.current_usage, Some(2));
    assert!(grant.usage_period_end.is_some());
}

#[tokio::test]
async fn unknown_feature_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/customer-42/entitlements/feature-missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = entitlement_client(&server)
        .get_entitlement("feature-missing", None)
        .await;

    assert!(matches!(result, Err(ClientError::NotFound(_))));
}

#[tokio::test]
async fn wait_for_ready_retries_until_healthy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    entitlement_client(&server).wait_for_ready().await.unwrap();
}

#[tokio::test]
async fn wait_for_ready_gives_up_after_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let result = entitlement_client(&server).wait_for_ready().await;

    assert!(matches!(result, Err(ClientError::NotReady { attempts: 3 })));
}

#[tokio::test]
async fn refresh_and_usage_report_hit_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/customers/customer-42/refresh"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/usage"))
        .and(body_json(json!({
            "customerId": "customer-42",
            "featureId": "feature-task-total-limit-3",
            "value": 1
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = entitlement_client(&server);
    client.refresh().await.unwrap();
    client
        .report_usage("feature-task-total-limit-3", 1)
        .await
        .unwrap();
}
