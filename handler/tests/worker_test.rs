//! Worker-to-worker calls through a faked control plane

use handler::{ForwardingHandler, HandlerServer, RegistrationHeartbeat, ServiceDirectory};
use serde_json::json;
use shared::{spawn_heartbeat, HttpControlPlane, Shutdown};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_worker(shutdown: &Shutdown) -> (SocketAddr, HandlerServer<ForwardingHandler>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let directory = Arc::new(ServiceDirectory::new(format!("http://{addr}")));
    let server = HandlerServer::new(ForwardingHandler::new(), directory);

    let serving = server.clone();
    let listener_handle = shutdown.listener();
    tokio::spawn(async move { serving.serve(listener, listener_handle).await });
    (addr, server)
}

#[tokio::test]
async fn heartbeat_feeds_discovery_for_forwarded_calls() {
    let shutdown = Shutdown::new();
    let (backend_addr, _) = spawn_worker(&shutdown).await;
    let (frontend_addr, frontend) = spawn_worker(&shutdown).await;
    let frontend_endpoint = format!("http://{frontend_addr}");

    let control = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/register/service/frontend"))
        .and(body_partial_json(json!({"endpoint": frontend_endpoint})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "msg": "Server added to the list"})))
        .expect(1..)
        .mount(&control)
        .await;
    Mock::given(method("PUT"))
        .and(path("/register/instance/w1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1..)
        .mount(&control)
        .await;
    Mock::given(method("GET"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [
                {"service": "frontend", "endpoint": frontend_endpoint},
                {"service": "backend", "endpoint": format!("http://{backend_addr}")}
            ],
            "stressor": [],
            "instances": {}
        })))
        .expect(1..)
        .mount(&control)
        .await;

    let registration = RegistrationHeartbeat::new(
        HttpControlPlane::new(&control.uri()),
        "w1",
        "frontend",
        &frontend_endpoint,
        frontend.request_counter(),
        frontend.directory().clone(),
    );
    let heartbeat = spawn_heartbeat(Arc::new(registration), Duration::from_secs(60), shutdown.listener());

    // first beat runs immediately
    let mut refreshed = false;
    for _ in 0..50 {
        if !frontend.directory().snapshot().await.endpoints("backend").is_empty() {
            refreshed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(refreshed);
    // self is never a discovery candidate
    assert!(frontend.directory().snapshot().await.endpoints("frontend").is_empty());

    let response = reqwest::Client::new()
        .get(format!("{frontend_endpoint}/checkout"))
        .header("x-lsd-call", "backend")
        .body("order-42")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    // the backend echoes what it received
    assert_eq!(response.text().await.unwrap(), "POST /\norder-42");

    let response = reqwest::get(format!("{frontend_endpoint}/plain")).await.unwrap();
    assert_eq!(response.text().await.unwrap(), "GET /plain\n");
    assert_eq!(frontend.requests_served(), 2);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), heartbeat).await.unwrap().unwrap();
}

#[tokio::test]
async fn unknown_service_answers_bad_gateway() {
    let shutdown = Shutdown::new();
    let (addr, _) = spawn_worker(&shutdown).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/"))
        .header("x-lsd-call", "ghost")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);

    shutdown.trigger();
}
