//! Delivery tests for the default HTTP client against a local store endpoint
//!
//! These tests verify that:
//! 1. Events are posted to the DSN's store URL with the auth header and JSON body
//! 2. With the global panic hook installed, a handler panic is reported once,
//!    with request context, while panics outside requests are still reported

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use error_common::{RequestErrorContext, UnhandledError};
use error_reporter::{
    register, ClientFactory, ClientSettings, HttpClientFactory, ReporterConfig, ReporterOptions,
    ReportingClient,
};
use serde_json::Value;
use tower::ServiceExt;

#[derive(Debug, Clone)]
struct StoredEvent {
    auth: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Store {
    events: Arc<Mutex<Vec<StoredEvent>>>,
}

impl Store {
    fn events(&self) -> Vec<StoredEvent> {
        self.events.lock().expect("store lock").clone()
    }

    /// Wait until at least `count` events arrived, then return all of them
    async fn wait_for(&self, count: usize) -> Vec<StoredEvent> {
        for _ in 0..250 {
            if self.events().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.events()
    }
}

async fn store_event(
    State(store): State<Store>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let auth = headers
        .get("x-sentry-auth")
        .and_then(|h| h.to_str().ok())
        .map(ToString::to_string);
    store.events.lock().expect("store lock").push(StoredEvent { auth, body });
    StatusCode::OK
}

async fn spawn_store() -> (SocketAddr, Store) {
    let store = Store::default();
    let app = Router::new()
        .route("/api/1/store/", post(store_event))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind store");
    let addr = listener.local_addr().expect("store address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("store server");
    });

    (addr, store)
}

fn inject(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("user-agent", "shot")
        .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 51234))))
        .body(Body::empty())
        .expect("Failed to build request")
}

async fn exploding_handler() -> &'static str {
    panic!("handler exploded")
}

async fn failing_worker() {
    panic!("background worker failed")
}

#[tokio::test]
async fn test_default_client_posts_event_to_store() {
    let (addr, store) = spawn_store().await;

    let client = HttpClientFactory::new(ClientSettings {
        release: Some("2.0.0".to_string()),
        ..ClientSettings::default()
    })
    .create(&format!("http://public:secret@{addr}/1"))
    .expect("client");

    let context = RequestErrorContext::from_request(&inject("/wards?floor=3"));
    let error = UnhandledError::new(anyhow::anyhow!("database down").context("loading ward"));
    let event_id = client.capture_error(&error, &context).expect("capture");

    let events = store.wait_for(1).await;
    assert_eq!(events.len(), 1);

    let auth = events[0].auth.as_deref().expect("auth header");
    assert!(auth.starts_with("Sentry sentry_version=7"));
    assert!(auth.contains("sentry_key=public"));
    assert!(auth.contains("sentry_secret=secret"));

    let body = &events[0].body;
    assert_eq!(body["event_id"], event_id.to_string());
    assert_eq!(body["message"], "loading ward");
    assert_eq!(body["release"], "2.0.0");
    assert_eq!(body["exception"]["values"][0]["value"], "database down");
    assert_eq!(body["exception"]["values"][1]["type"], "internal_error");
    assert_eq!(body["extra"]["path"], "/wards");
    assert_eq!(body["extra"]["query"]["floor"], "3");
    assert_eq!(body["extra"]["remoteAddress"], "127.0.0.1");
}

#[tokio::test]
async fn test_handler_panic_reported_once_with_patch_global() {
    let (addr, store) = spawn_store().await;

    let config = ReporterConfig::with_dsn(format!("http://public@{addr}/1")).patch_global(true);
    let app = register(
        Router::new().route("/x", get(exploding_handler)),
        ReporterOptions::new(config),
    );

    let response = app.oneshot(inject("/x")).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    store.wait_for(1).await;
    // Give a second delivery time to show up if one was sent
    tokio::time::sleep(Duration::from_millis(200)).await;
    let events = store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].body["extra"]["path"], "/x");
    assert_eq!(events[0].body["exception"]["values"][0]["type"], "panic");

    // Panics outside a request still go through the global hook
    let background = tokio::spawn(failing_worker()).await;
    assert!(background.is_err());

    let events = store.wait_for(2).await;
    assert_eq!(events.len(), 2);
    let uncaught = &events[1].body;
    assert!(uncaught.get("extra").is_none());
    assert!(uncaught["message"]
        .as_str()
        .is_some_and(|m| m.contains("background worker failed")));
}
