//! Cloud SQL connect settings and Drive reads against a mock API

use chrono::{TimeZone, Utc};
use gantry_gcp::drive::DriveClient;
use gantry_gcp::sql::{CloudSqlClient, SqlIpAddressType};
use gantry_gcp::Error;
use gantry_tests::assertions::{assert_bearer, assert_query};
use gantry_tests::fixtures;
use gantry_tests::{CountingTokenProvider, MockGoogleApi};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn connect_settings() -> serde_json::Value {
    json!({
        "kind": "sql#connectSettings",
        "serverCaCert": {
            "kind": "sql#sslCert",
            "certSerialNumber": "0",
            "cert": "-----BEGIN CERTIFICATE-----",
            "createTime": "2024-01-01T00:00:00Z",
            "commonName": "ca",
            "expirationTime": "2034-01-01T00:00:00Z",
            "sha1Fingerprint": "ab12",
            "instance": "main"
        },
        "ipAddresses": [{ "type": "PRIVATE", "ipAddress": "10.0.0.5" }],
        "region": "us-east1",
        "databaseVersion": "POSTGRES_15",
        "backendType": "SECOND_GEN"
    })
}

#[tokio::test]
async fn connect_settings_passes_read_time() {
    let api = MockGoogleApi::start().await;
    let route = "/v1/projects/p/instances/main/connectSettings";
    api.mount_json("GET", route, 200, connect_settings()).await;

    let client = CloudSqlClient::new(
        api.config(fixtures::PROJECT, "us-east1"),
        CountingTokenProvider::new(fixtures::TOKEN),
    )
    .unwrap();
    let instance = client.instance_path("main").unwrap();

    let settings = client
        .connect_settings(
            &instance,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(settings.ip_address(SqlIpAddressType::Private), Some("10.0.0.5"));

    client.connect_settings(&instance, None).await.unwrap();

    let sent = api.requests_to("GET", route).await;
    assert_eq!(sent.len(), 2);
    assert_query(&sent[0], "readTime", "2024-06-01T12:00:00Z");
    assert!(sent[1].url.query().is_none());
}

#[tokio::test]
async fn file_fetches_content_and_metadata() {
    let api = MockGoogleApi::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/1AbC"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
        .mount(api.server())
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/1AbC"))
        .and(query_param("fields", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1AbC",
            "name": "budget.xlsx",
            "mimeType": "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "size": "4"
        })))
        .mount(api.server())
        .await;

    let client = DriveClient::new(
        api.config(fixtures::PROJECT, fixtures::LOCATION),
        CountingTokenProvider::new(fixtures::TOKEN),
    )
    .unwrap();
    let file = client.file("1AbC").await.unwrap();

    assert_eq!(&file.content[..], b"PK\x03\x04");
    assert_eq!(file.metadata.name, "budget.xlsx");
    assert_eq!(file.metadata.size_bytes(), Some(4));
    for request in api.requests().await {
        assert_bearer(&request, fixtures::TOKEN);
    }
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let api = MockGoogleApi::start().await;
    api.mount_not_found("GET", "/drive/v3/files/gone").await;

    let client = DriveClient::new(
        api.config(fixtures::PROJECT, fixtures::LOCATION),
        CountingTokenProvider::new(fixtures::TOKEN),
    )
    .unwrap();
    let err = client.file_content("gone").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn about_requests_all_fields() {
    let api = MockGoogleApi::start().await;
    api.mount_json(
        "GET",
        "/drive/v3/about",
        200,
        json!({
            "user": { "displayName": "Ops", "emailAddress": "ops@example.com" },
            "storageQuota": { "limit": "1000", "usage": "10" },
            "maxUploadSize": "5120000"
        }),
    )
    .await;

    let client = DriveClient::new(
        api.config(fixtures::PROJECT, fixtures::LOCATION),
        CountingTokenProvider::new(fixtures::TOKEN),
    )
    .unwrap();
    let about = client.about().await.unwrap();
    assert_eq!(about.user.display_name, "Ops");
    assert_eq!(about.extra["maxUploadSize"], "5120000");
    assert_query(&api.requests().await[0], "fields", "*");

    assert!(matches!(client.file_metadata("").await, Err(Error::Config(_))));
}
