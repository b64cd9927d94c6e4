//! Cloud Tasks queue provisioning against a mock API
//!
//! Covers:
//! - GET 404 → POST default spec → Running queue
//! - Repeated get_or_create issues exactly one create
//! - Errors other than 404 never trigger a create
//! - Task creation and queue actions

use gantry_core::wire;
use gantry_gcp::tasks::{CloudTasksClient, CreateTaskRequest, HttpRequest, Queue, QueueState, Task};
use gantry_gcp::{Error, ProvisionState};
use gantry_tests::assertions::{assert_bearer, json_body};
use gantry_tests::fixtures::{self, queue};
use gantry_tests::{CountingTokenProvider, MockGoogleApi};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn client(api: &MockGoogleApi) -> CloudTasksClient {
    CloudTasksClient::new(
        api.config(fixtures::PROJECT, fixtures::LOCATION),
        CountingTokenProvider::new(fixtures::TOKEN),
    )
    .unwrap()
}

#[tokio::test]
async fn missing_queue_is_created_with_defaults() {
    fixtures::init_tracing();
    let api = MockGoogleApi::start().await;
    api.mount_not_found("GET", &queue::route()).await;
    api.mount_json("POST", &queue::collection_route(), 200, queue::running(queue::NAME))
        .await;

    let client = client(&api);
    let id = client.queue_path("q1").unwrap();
    assert_eq!(id.to_string(), queue::NAME);

    let provisioned = client.get_or_create_queue(&id).await.unwrap();
    assert_eq!(provisioned.state, ProvisionState::Created);
    assert!(provisioned.was_created());
    assert_eq!(provisioned.status.state, QueueState::Running);
    assert_eq!(provisioned.status.spec.task_ttl, Duration::from_secs(864_000));

    let creates = api.requests_to("POST", &queue::collection_route()).await;
    assert_eq!(creates.len(), 1);
    assert_bearer(&creates[0], fixtures::TOKEN);
    assert_eq!(
        json_body(&creates[0]),
        wire::encode(&Queue::new(&id)).unwrap()
    );
    assert_eq!(json_body(&creates[0])["taskTtl"], "864000s");
}

#[tokio::test]
async fn second_get_or_create_only_reads() {
    let api = MockGoogleApi::start().await;
    Mock::given(method("GET"))
        .and(path(queue::route()))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(api.server())
        .await;
    Mock::given(method("GET"))
        .and(path(queue::route()))
        .respond_with(ResponseTemplate::new(200).set_body_json(queue::running(queue::NAME)))
        .mount(api.server())
        .await;
    Mock::given(method("POST"))
        .and(path(queue::collection_route()))
        .respond_with(ResponseTemplate::new(200).set_body_json(queue::running(queue::NAME)))
        .expect(1)
        .mount(api.server())
        .await;

    let client = client(&api);
    let id = client.queue_path("q1").unwrap();

    let first = client.get_or_create_queue(&id).await.unwrap();
    let second = client.get_or_create_queue(&id).await.unwrap();

    assert_eq!(first.state, ProvisionState::Created);
    assert_eq!(second.state, ProvisionState::Found);
    assert_eq!(first.status, second.status);
    assert_eq!(api.requests_to("GET", &queue::route()).await.len(), 2);
}

#[tokio::test]
async fn server_error_on_read_does_not_create() {
    let api = MockGoogleApi::start().await;
    api.mount_json("GET", &queue::route(), 500, json!({"error": {"code": 500}}))
        .await;

    let client = client(&api);
    let id = client.queue_path("q1").unwrap();
    let err = client.get_or_create_queue(&id).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(api.requests_to("POST", &queue::collection_route()).await.is_empty());
}

#[tokio::test]
async fn failed_create_surfaces_status() {
    let api = MockGoogleApi::start().await;
    api.mount_not_found("GET", &queue::route()).await;
    api.mount_json(
        "POST",
        &queue::collection_route(),
        409,
        json!({"error": {"code": 409, "status": "ALREADY_EXISTS"}}),
    )
    .await;

    let client = client(&api);
    let id = client.queue_path("q1").unwrap();
    match client.get_or_create_queue(&id).await {
        Err(Error::ResourceClient { status, body }) => {
            assert_eq!(status, 409);
            assert!(body.contains("ALREADY_EXISTS"));
        }
        other => panic!("expected ResourceClient, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_state_is_a_decode_error() {
    let api = MockGoogleApi::start().await;
    let mut body = queue::running(queue::NAME);
    body["state"] = json!("HIBERNATING");
    api.mount_json("GET", &queue::route(), 200, body).await;

    let client = client(&api);
    let err = client
        .get_queue(&client.queue_path("q1").unwrap())
        .await
        .unwrap_err();
    match err {
        Error::Decode(e) => assert!(e.is_unknown_enum_value()),
        other => panic!("expected Decode, got {:?}", other),
    }
}

#[tokio::test]
async fn pause_posts_to_action_path() {
    let api = MockGoogleApi::start().await;
    api.mount_json(
        "POST",
        &format!("{}:pause", queue::route()),
        200,
        queue::paused(queue::NAME),
    )
    .await;

    let client = client(&api);
    let status = client
        .pause_queue(&client.queue_path("q1").unwrap())
        .await
        .unwrap();
    assert_eq!(status.state, QueueState::Paused);
}

#[tokio::test]
async fn create_task_encodes_body_as_base64() {
    let api = MockGoogleApi::start().await;
    let tasks_route = format!("{}/tasks", queue::route());
    api.mount_json(
        "POST",
        &tasks_route,
        200,
        json!({
            "name": format!("{}/tasks/t1", queue::NAME),
            "createTime": "2024-05-01T10:00:00Z",
            "view": "BASIC"
        }),
    )
    .await;

    let client = client(&api);
    let request = HttpRequest::post_json("https://worker.example.com/run", &json!({"dev_log": "hello"}))
        .unwrap();
    let task = client
        .create_task(
            &client.queue_path("q1").unwrap(),
            &CreateTaskRequest::new(Task::http(request)),
        )
        .await
        .unwrap();
    assert_eq!(
        task.name.value().map(String::as_str),
        Some("projects/p/locations/l/queues/q1/tasks/t1")
    );

    let sent = api.requests_to("POST", &tasks_route).await;
    let body = json_body(&sent[0]);
    assert_eq!(
        body["task"]["httpRequest"]["body"],
        "eyJkZXZfbG9nIjoiaGVsbG8ifQ=="
    );
}

#[tokio::test]
async fn delete_returns_true() {
    let api = MockGoogleApi::start().await;
    api.mount_json("DELETE", &queue::route(), 200, json!({})).await;

    let client = client(&api);
    assert!(client
        .delete_queue(&client.queue_path("q1").unwrap())
        .await
        .unwrap());
}

#[tokio::test]
async fn wrong_collection_is_rejected_before_sending() {
    let api = MockGoogleApi::start().await;
    let client = client(&api);
    let topic = fixtures::identity("projects/p/topics/t");

    let err = client.get_queue(&topic).await.unwrap_err();
    assert!(matches!(err, Error::InvalidIdentity(_)));
    assert!(api.requests().await.is_empty());
}

#[tokio::test]
async fn ids_with_url_delimiters_never_reach_the_api() {
    let api = MockGoogleApi::start().await;
    let client = client(&api);

    for id in ["a#b", "a?b", ".."] {
        assert!(matches!(
            client.queue_path(id),
            Err(Error::InvalidIdentity(_))
        ));
    }
    let parsed = "projects/p/locations/l/queues/a#b".parse::<gantry_core::ResourceIdentity>();
    assert!(parsed.is_err());
    assert!(api.requests().await.is_empty());
}

#[tokio::test]
async fn close_waits_for_cloned_handles() {
    let api = MockGoogleApi::start().await;
    api.mount_json("GET", &queue::route(), 200, queue::running(queue::NAME))
        .await;

    let shared = client(&api);
    let queues = shared.queues().clone();
    assert!(!shared.close());

    let id = fixtures::identity(queue::NAME);
    let status = queues.get(&id).await.unwrap();
    assert_eq!(status.state, QueueState::Running);
    assert!(queues.close());

    assert!(client(&api).close());
}
