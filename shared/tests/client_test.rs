//! HttpControlPlane against a fake control plane

use serde_json::json;
use shared::{ControlPlane, HttpControlPlane, InstanceRecord, SharedError};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok_envelope() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"ok": true, "msg": "ok"}))
}

#[tokio::test]
async fn register_service_puts_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/register/service/frontend"))
        .and(body_json(json!({"service": "frontend", "endpoint": "http://a:1"})))
        .respond_with(ok_envelope())
        .expect(1)
        .mount(&server)
        .await;

    // trailing slash on the control endpoint must not produce `//register`
    let client = HttpControlPlane::new(&format!("{}/", server.uri()));
    client.register_service("frontend", "http://a:1").await.unwrap();
}

#[tokio::test]
async fn register_stressor_carries_progress_flag() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/register/stressor/s1"))
        .and(body_json(json!({
            "baseEndpoint": "http://s:1",
            "name": "s1",
            "testInProgress": true
        })))
        .respond_with(ok_envelope())
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpControlPlane::new(&server.uri());
    client.register_stressor("s1", "http://s:1", true).await.unwrap();
}

#[tokio::test]
async fn register_instance_strips_liveness_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/register/instance/w1"))
        .and(body_json(json!({
            "name": "w1",
            "services": {"frontend": "http://a:1"},
            "metrics": {"requests": 7}
        })))
        .respond_with(ok_envelope())
        .expect(1)
        .mount(&server)
        .await;

    let mut instance = InstanceRecord::new("w1").with_service("frontend", "http://a:1");
    instance.metrics.requests = 7;
    instance.last_ping = Some(chrono::Utc::now());
    instance.time_since_last_ping_ms = 1234;

    let client = HttpControlPlane::new(&server.uri());
    client.register_instance(instance).await.unwrap();
}

#[tokio::test]
async fn non_ok_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"msg": "invalid server endpoint", "status": 400}
        })))
        .mount(&server)
        .await;

    let client = HttpControlPlane::new(&server.uri());
    let err = client.register_service("frontend", "").await.unwrap_err();
    assert!(matches!(err, SharedError::UnexpectedStatus { status: 400, .. }));
    assert!(err.is_upstream());
}

#[tokio::test]
async fn services_reads_servers_from_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [
                {"service": "frontend", "endpoint": "http://a:1"},
                {"service": "db", "endpoint": "http://b:2"}
            ],
            "stressor": [],
            "instances": {}
        })))
        .mount(&server)
        .await;

    let client = HttpControlPlane::new(&server.uri());
    let services = client.services().await.unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[1].service, "db");
    assert_eq!(services[1].endpoint, "http://b:2");
}

#[tokio::test]
async fn unreachable_control_plane_is_upstream_error() {
    // nothing listens on port 9 on loopback in test environments
    let client = HttpControlPlane::new("http://127.0.0.1:9");
    let err = client.services().await.unwrap_err();
    assert!(matches!(err, SharedError::Upstream { .. }));
}

#[tokio::test]
async fn garbage_registry_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpControlPlane::new(&server.uri());
    let err = client.services().await.unwrap_err();
    assert!(matches!(err, SharedError::Decode { .. }));
}
