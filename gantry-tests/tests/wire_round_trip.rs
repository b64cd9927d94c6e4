//! decode(encode(x)) == x for service shapes

use chrono::{TimeZone, Utc};
use gantry_core::wire::{self, Field};
use gantry_gcp::pubsub::{
    DeadLetterPolicy, ExpirationPolicy, PubsubMessage, Subscription, Topic,
};
use gantry_gcp::scheduler::Job;
use gantry_gcp::sql::ConnectSettings;
use gantry_gcp::tasks::{HttpRequest, Queue, QueueStatus, Task};
use gantry_gcp::types::{HttpMethod, OidcToken};
use gantry_tests::fixtures::{identity, queue};
use gantry_tests::{assert_round_trip, check_round_trip, RoundTripInvariantViolation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

#[test]
fn queue_shapes_round_trip() {
    let id = identity(queue::NAME);
    assert_round_trip(&Queue::new(&id));
    assert_round_trip(&Queue::new(&id).with_http_target(HttpMethod::Put, "sa@p.iam"));

    let status: QueueStatus = wire::decode_value(queue::running(queue::NAME)).unwrap();
    assert_round_trip(&status);
}

#[test]
fn task_round_trips_with_null_and_binary_fields() {
    let request = HttpRequest::post_json("https://worker.example.com", &json!({"a": [1, 2]}))
        .unwrap()
        .with_oidc_token(OidcToken {
            service_account_email: "sa@p.iam".to_string(),
            audience: String::new(),
        });
    let mut task = Task::http(request)
        .named(&identity("projects/p/locations/l/queues/q1/tasks/t1"))
        .scheduled_at(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    task.dispatch_deadline = Duration::from_millis(1500).into();
    task.response_count = Field::Null;

    assert_round_trip(&task);
    assert_eq!(wire::encode(&task).unwrap()["dispatchDeadline"], "1.5s");
    assert!(wire::encode(&task).unwrap()["responseCount"].is_null());
}

#[test]
fn pubsub_shapes_round_trip() {
    let topic_id = identity("projects/p/topics/t");
    let mut topic = Topic::new(&topic_id).with_label("env", "test");
    topic.message_retention_duration = Duration::from_secs(86_400).into();
    assert_round_trip(&topic);

    let mut sub = Subscription::pull(&identity("projects/p/subscriptions/s"), &topic_id);
    sub.expiration_policy = ExpirationPolicy { ttl: Field::Null }.into();
    sub.dead_letter_policy = DeadLetterPolicy {
        dead_letter_topic: "projects/p/topics/dlq".to_string().into(),
        max_delivery_attempts: Field::Value(5),
    }
    .into();
    assert_round_trip(&sub);

    assert_round_trip(
        &PubsubMessage::new(vec![0u8, 159, 146, 150]).with_attribute("binary", "yes"),
    );
}

#[test]
fn scheduler_job_round_trips() {
    let job = Job::app_engine(
        &identity("projects/p/locations/l/jobs/nightly"),
        "/print_something",
        HttpMethod::Post,
        &json!({"dev_log": "hello"}),
    )
    .unwrap()
    .with_description("nightly log");
    assert_round_trip(&job);
}

#[test]
fn connect_settings_round_trip() {
    let settings: ConnectSettings = wire::decode_value(json!({
        "kind": "sql#connectSettings",
        "serverCaCert": {
            "kind": "sql#sslCert",
            "certSerialNumber": "0",
            "cert": "-----BEGIN CERTIFICATE-----",
            "createTime": "2024-01-01T00:00:00.250Z",
            "commonName": "ca",
            "expirationTime": "2034-01-01T00:00:00Z",
            "sha1Fingerprint": "ab12",
            "instance": "main"
        },
        "ipAddresses": [{ "type": "PRIMARY", "ipAddress": "34.1.2.3", "timeToRetire": null }],
        "region": "us-east1",
        "databaseVersion": "POSTGRES_15",
        "backendType": "SECOND_GEN",
        "pscEnabled": false
    }))
    .unwrap();
    assert!(settings.ip_addresses[0].time_to_retire.is_null());
    assert_round_trip(&settings);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Lossy {
    display_name: String,
    #[serde(skip)]
    local_only: u32,
}

#[test]
fn lossy_shape_is_reported() {
    let err = check_round_trip(&Lossy {
        display_name: "x".to_string(),
        local_only: 7,
    })
    .unwrap_err();
    assert!(matches!(err, RoundTripInvariantViolation::Mismatch { .. }));
}
