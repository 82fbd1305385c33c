use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use lampsync_common::{ErrorCode, LampSyncError, UpdateDeviceCommand};
use lampsync_handler::{server, DebounceGate, DeviceRegistry, HttpDeviceRegistry, Outcome, TelemetryHandler};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    List(HashMap<String, String>),
    Update(HashMap<String, String>, Value),
}

/// Registry stand-in with canned responses.
#[derive(Clone)]
struct Stub {
    seen: Arc<Mutex<Vec<Seen>>>,
    list_status: StatusCode,
    list_body: String,
    update_status: StatusCode,
}

impl Stub {
    fn new(list_body: Value) -> Self {
        Self {
            seen: Arc::default(),
            list_status: StatusCode::OK,
            list_body: list_body.to_string(),
            update_status: StatusCode::OK,
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

async fn get_all_devices(State(stub): State<Stub>, Query(q): Query<HashMap<String, String>>) -> (StatusCode, String) {
    stub.seen.lock().unwrap().push(Seen::List(q));
    (stub.list_status, stub.list_body.clone())
}

async fn update_device(
    State(stub): State<Stub>,
    Query(q): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, &'static str) {
    stub.seen.lock().unwrap().push(Seen::Update(q, body));
    let text = if stub.update_status.is_success() { "" } else { "device locked" };
    (stub.update_status, text)
}

async fn spawn_registry(stub: Stub) -> String {
    let app = Router::new()
        .route("/api/v1/Device/GetAllDevices", get(get_all_devices))
        .route("/api/v1/Device/UpdateDevice", put(update_device))
        .with_state(stub);
    format!("http://{}", spawn(app).await)
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn pascal_listing() -> Value {
    json!({
        "PageNumber": 1,
        "PageSize": 10,
        "Succeeded": true,
        "Message": null,
        "Errors": null,
        "Data": [
            {"Id": 3, "Name": "Hall lamp", "Type": "Lamp", "Status": false, "RoomId": 1},
            {"Id": 12, "Name": "Front door", "Type": "Door", "Status": true, "RoomId": 1},
            {"Id": 7, "Name": "Desk lamp", "Type": "Lamp", "Status": false, "RoomId": 2},
            {"Id": 5, "Name": "Bedside", "Type": "Lamp", "Status": true, "RoomId": 3}
        ]
    })
}

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn list_devices_requests_first_page() {
    let stub = Stub::new(pascal_listing());
    let registry = HttpDeviceRegistry::new(reqwest::Client::new(), format!("{}/", spawn_registry(stub.clone()).await));

    let listing = registry.list_devices(1, 10).await.unwrap();

    assert!(listing.succeeded);
    assert_eq!(listing.devices().len(), 4);
    assert_eq!(stub.seen(), vec![Seen::List(query(&[("PageNumber", "1"), ("PageSize", "10")]))]);
}

#[tokio::test]
async fn list_devices_surfaces_status() {
    let mut stub = Stub::new(json!({}));
    stub.list_status = StatusCode::SERVICE_UNAVAILABLE;
    let registry = HttpDeviceRegistry::new(reqwest::Client::new(), spawn_registry(stub).await);

    let err = registry.list_devices(1, 10).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::RegistryFetchFailed);
    assert!(matches!(err, LampSyncError::UpstreamStatus { status: 503, .. }));
}

#[tokio::test]
async fn undecodable_listing_is_a_serialization_error() {
    let mut stub = Stub::new(json!({}));
    stub.list_body = "<html>maintenance</html>".to_string();
    let registry = HttpDeviceRegistry::new(reqwest::Client::new(), spawn_registry(stub).await);

    let err = registry.list_devices(1, 10).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ResponseUndecodable);
}

#[tokio::test]
async fn update_device_puts_pascal_case_body() {
    let stub = Stub::new(pascal_listing());
    let registry = HttpDeviceRegistry::new(reqwest::Client::new(), spawn_registry(stub.clone()).await);

    let cmd = UpdateDeviceCommand {
        id: 7,
        name: Some("Desk lamp".to_string()),
        status: true,
    };
    registry.update_device(&cmd).await.unwrap();

    assert_eq!(
        stub.seen(),
        vec![Seen::Update(
            query(&[("id", "7")]),
            json!({"Id": 7, "Name": "Desk lamp", "Status": true})
        )]
    );
}

#[tokio::test]
async fn update_device_rejection_keeps_body() {
    let mut stub = Stub::new(pascal_listing());
    stub.update_status = StatusCode::CONFLICT;
    let registry = HttpDeviceRegistry::new(reqwest::Client::new(), spawn_registry(stub).await);

    let cmd = UpdateDeviceCommand {
        id: 7,
        name: None,
        status: false,
    };
    match registry.update_device(&cmd).await.unwrap_err() {
        LampSyncError::UpstreamStatus { code, status, body } => {
            assert_eq!(code, ErrorCode::RegistryUpdateFailed);
            assert_eq!(status, 409);
            assert_eq!(body, "device locked");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_registry_is_a_network_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let registry = HttpDeviceRegistry::new(reqwest::Client::new(), format!("http://{addr}"));

    let err = registry.list_devices(1, 10).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NetworkError);
}

fn telemetry(led_status: i64) -> String {
    json!({"deviceId": "rgb-led", "telemetry": {"led_status": led_status}}).to_string()
}

async fn spawn_service(stub: Stub) -> String {
    let registry = HttpDeviceRegistry::new(reqwest::Client::new(), spawn_registry(stub).await);
    let handler = Arc::new(TelemetryHandler::new(registry, DebounceGate::new(Duration::from_secs(1))));
    format!("http://{}", spawn(server::router(handler)).await)
}

#[tokio::test]
async fn posted_message_updates_the_newest_lamp() {
    let stub = Stub::new(pascal_listing());
    let base = spawn_service(stub.clone()).await;
    let http = reqwest::Client::new();

    let health = http.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let resp = http.post(format!("{base}/messages")).body(telemetry(1)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: Value = resp.json().await.unwrap();
    assert_eq!(outcome, serde_json::to_value(Outcome::Updated { device_id: 7, status: true }).unwrap());

    let seen = stub.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(
        seen[1],
        Seen::Update(query(&[("id", "7")]), json!({"Id": 7, "Name": "Desk lamp", "Status": true}))
    );

    // Same status straight away is debounced and never reaches the registry.
    let resp = http.post(format!("{base}/messages")).body(telemetry(1)).send().await.unwrap();
    let outcome: Value = resp.json().await.unwrap();
    assert_eq!(outcome, json!({"outcome": "skipped", "reason": {"kind": "debounced"}}));
    assert_eq!(stub.seen().len(), 2);
}

#[tokio::test]
async fn posted_message_reports_rejected_update() {
    let mut stub = Stub::new(pascal_listing());
    stub.update_status = StatusCode::INTERNAL_SERVER_ERROR;
    let base = spawn_service(stub).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/messages"))
        .body(telemetry(0))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 7202);
}

#[tokio::test]
async fn posted_garbage_is_skipped() {
    let stub = Stub::new(pascal_listing());
    let base = spawn_service(stub.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/messages"))
        .body("{\"telemetry\":")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: Value = resp.json().await.unwrap();
    assert_eq!(outcome, json!({"outcome": "skipped", "reason": {"kind": "malformed_message"}}));
    assert!(stub.seen().is_empty());
}
