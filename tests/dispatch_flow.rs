//! End-to-end tests of the HTTP front door against mock workers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_dispatch::classifier::KeywordClassifier;
use agent_dispatch::config::{BreakerConfig, ConfigError, GatewayConfig, ValidationError};
use agent_dispatch::http::HttpServer;
use agent_dispatch::resilience::CircuitBreakerRegistry;
use agent_dispatch::routing::Router;
use agent_dispatch::transport::{HttpTransport, MemoryQueue};
use agent_dispatch::Dispatcher;
use serde_json::{json, Value};

mod common;

const ADMIN_KEY: &str = "test-admin-key";

fn admin_config(worker: std::net::SocketAddr) -> GatewayConfig {
    let mut config = common::test_config(worker);
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config
}

#[tokio::test]
async fn test_health_reports_service_name() {
    let worker = common::start_mock_backend("{}").await;
    let mut config = common::test_config(worker);
    config.service.name = "root-agent-test".into();
    let (addr, shutdown, _updates) = common::start_gateway(config).await;

    let res = common::client()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"status": "healthy", "service": "root-agent-test"}));

    shutdown.trigger();
}

#[tokio::test]
async fn test_urgent_request_reaches_worker() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let worker = common::start_programmable_backend(move |req| {
        recorder.lock().unwrap().push(req);
        async { (200, r#"{"result":"paid","amount":42}"#.to_string()) }
    })
    .await;
    let (addr, shutdown, _updates) = common::start_gateway(common::test_config(worker)).await;

    let res = common::client()
        .post(format!("http://{}/process", addr))
        .json(&json!({"message": "Please pay my invoice", "user_id": "u-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let header_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("x-request-id header");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["request_id"], header_id.as_str());
    assert_eq!(body["agent_id"], "root-agent");
    assert_eq!(body["data"], json!({"result": "paid", "amount": 42}));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/agents/payment-agent-service/process");

    let delivered = seen[0].json();
    assert_eq!(delivered["id"], header_id.as_str());
    assert_eq!(delivered["user_id"], "u-1");
    assert_eq!(delivered["analysis"]["intent"], "payment");
    assert_eq!(delivered["analysis"]["urgent"], true);

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_urgent_request_is_queued() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let worker = common::start_programmable_backend(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { (200, "{}".to_string()) }
    })
    .await;

    let config = common::test_config(worker);
    let queue = Arc::new(MemoryQueue::new());
    let dispatcher = Arc::new(Dispatcher::new(
        Router::from_config(&config.routing),
        Arc::new(CircuitBreakerRegistry::new(config.breaker.clone())),
        Arc::new(HttpTransport::new(&config.transport.http)),
        queue.clone(),
        config.transport.http.timeout(),
    ));
    let server = HttpServer::with_parts(config, dispatcher, Arc::new(KeywordClassifier));
    let (addr, shutdown, _updates) = common::start_server(server).await;

    let res = common::client()
        .post(format!("http://{}/process", addr))
        .json(&json!({"message": "find me a hotel in Lisbon"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"], json!({"status": "queued", "queue": "search-agent-service_queue"}));

    let queued = queue.messages("search-agent-service_queue");
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].id, body["request_id"].as_str().unwrap());
    assert_eq!(queued[0].message, "find me a hotel in Lisbon");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_breaker_opens_after_repeated_worker_errors() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let worker = common::start_programmable_backend(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { (500, r#"{"error":"boom"}"#.to_string()) }
    })
    .await;

    let mut config = common::test_config(worker);
    config.breaker = BreakerConfig {
        failure_threshold: 3,
        open_timeout_secs: 60,
        recovery_threshold: 1,
    };
    let (addr, shutdown, _updates) = common::start_gateway(config).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client
            .post(format!("http://{}/process", addr))
            .json(&json!({"message": "charge my card"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 502);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["error_kind"], "downstream_failure");
    }

    let res = client
        .post(format!("http://{}/process", addr))
        .json(&json!({"message": "charge my card"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error_kind"], "circuit_open");

    // The open breaker answered without contacting the worker.
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_worker_times_out() {
    let worker = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, "{}".to_string())
    })
    .await;

    let mut config = common::test_config(worker);
    config.transport.http.timeout_secs = 1;
    let (addr, shutdown, _updates) = common::start_gateway(config).await;

    let res = common::client()
        .post(format!("http://{}/process", addr))
        .json(&json!({"message": "pay now"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 504);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error_kind"], "downstream_timeout");

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_deadline_shorter_than_worker_timeout_is_rejected() {
    let worker = common::start_mock_backend("{}").await;
    let mut config = common::test_config(worker);
    config.transport.http.timeout_secs = 5;
    config.timeouts.request_secs = 1;

    match HttpServer::new(config) {
        Err(ConfigError::Validation(errors)) => assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::RequestDeadlineTooShort { request_secs: 1, .. }))),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("config with request_secs=1 was accepted"),
    }
}

#[tokio::test]
async fn test_worker_timeout_counts_against_breaker() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let worker = common::start_programmable_backend(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            (200, "{}".to_string())
        }
    })
    .await;

    let mut config = admin_config(worker);
    config.transport.http.timeout_secs = 1;
    config.transport.queue.timeout_secs = 1;
    config.timeouts.request_secs = 3;
    config.breaker.failure_threshold = 1;
    let (addr, shutdown, _updates) = common::start_gateway(config).await;
    let client = common::client();

    let res = client
        .post(format!("http://{}/process", addr))
        .json(&json!({"message": "pay my invoice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 504);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error_kind"], "downstream_timeout");

    let res = client
        .post(format!("http://{}/process", addr))
        .json(&json!({"message": "pay my invoice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let breakers: Value = client
        .get(format!("http://{}/admin/breakers", addr))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(breakers[0]["target"], "payment-agent-service");
    assert_eq!(breakers[0]["state"], "open");
    assert_eq!(breakers[0]["failure_count"], 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let worker = common::start_mock_backend("{}").await;
    let (addr, shutdown, _updates) = common::start_gateway(common::test_config(worker)).await;

    let res = common::client()
        .post(format!("http://{}/process", addr))
        .json(&json!({"user_id": "no-message"}))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_client_error());

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_disabled_by_default() {
    let worker = common::start_mock_backend("{}").await;
    let (addr, shutdown, _updates) = common::start_gateway(common::test_config(worker)).await;

    let res = common::client()
        .get(format!("http://{}/admin/status", addr))
        .bearer_auth("CHANGE_ME_IN_PRODUCTION")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_requires_bearer_key() {
    let worker = common::start_mock_backend("{}").await;
    let (addr, shutdown, _updates) = common::start_gateway(admin_config(worker)).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/admin/status", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("http://{}/admin/status", addr))
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("http://{}/admin/status", addr))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["breakers"], 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_breaker_listing_and_reset() {
    let worker = common::start_programmable_backend(|_| async { (503, "{}".to_string()) }).await;
    let mut config = admin_config(worker);
    config.breaker.failure_threshold = 1;
    let (addr, shutdown, _updates) = common::start_gateway(config).await;
    let client = common::client();

    let res = client
        .post(format!("http://{}/process", addr))
        .json(&json!({"message": "pay the bill"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);

    let breakers: Value = client
        .get(format!("http://{}/admin/breakers", addr))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(breakers[0]["target"], "payment-agent-service");
    assert_eq!(breakers[0]["state"], "open");
    assert_eq!(breakers[0]["failure_count"], 1);

    let res = client
        .post(format!("http://{}/admin/breakers/payment-agent-service/reset", addr))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let reset: Value = res.json().await.unwrap();
    assert_eq!(reset["state"], "closed");
    assert_eq!(reset["failure_count"], 0);

    let res = client
        .post(format!("http://{}/admin/breakers/unknown-service/reset", addr))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn test_routing_table_hot_reload() {
    let worker = common::start_mock_backend("{}").await;
    let config = admin_config(worker);
    let (addr, shutdown, updates) = common::start_gateway(config.clone()).await;
    let client = common::client();

    let mut reloaded = config;
    reloaded.routing.default_target = "fallback-agent-service".into();
    reloaded.routing.routes.insert("booking".into(), "booking-agent-service".into());
    updates.send(reloaded).unwrap();

    let mut routes = Value::Null;
    for _ in 0..50 {
        routes = client
            .get(format!("http://{}/admin/routes", addr))
            .bearer_auth(ADMIN_KEY)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if routes["default_target"] == "fallback-agent-service" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(routes["default_target"], "fallback-agent-service");
    assert_eq!(routes["routes"]["booking"], "booking-agent-service");
    assert_eq!(routes["routes"]["payment"], "payment-agent-service");

    shutdown.trigger();
}
