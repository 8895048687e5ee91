use super::*;
use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response as AxumResponse},
    Router,
};
use serde_json::json;
use shared::domain::AutoId;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    authorization: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct StubState {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubState {
    async fn respond(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .await
            .insert((method.to_string(), path.to_string()), (status, body.into()));
    }

    async fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

async fn stub_handler(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> AxumResponse {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.requests.lock().await.push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        authorization,
        body: serde_json::from_slice(&body).ok(),
    });

    let canned = state
        .responses
        .lock()
        .await
        .get(&(method.to_string(), uri.path().to_string()))
        .cloned();
    match canned {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_stub_server() -> std::io::Result<(HttpGateway, StubState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = StubState::default();
    let app = Router::new()
        .fallback(stub_handler)
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let session = Session::from_login(&format!("http://{addr}"), "admin", "secret")
        .expect("session");
    Ok((HttpGateway::new(Arc::new(session)), state))
}

const BASIC_ADMIN_SECRET: &str = "Basic YWRtaW46c2VjcmV0";

#[tokio::test]
async fn fetch_orders_accepts_bare_array() {
    let (gateway, server) = spawn_stub_server().await.expect("spawn server");
    server
        .respond(
            "POST",
            "/api/orders/filtered",
            200,
            json!([
                { "id": 1, "orderCode": "A-1", "status": { "id": 2, "name": "New" } },
                { "id": 2, "orderCode": "A-2" }
            ])
            .to_string(),
        )
        .await;

    let page = gateway.fetch_orders(0, 100).await.expect("orders");
    assert_eq!(page.orders.len(), 2);
    assert_eq!(page.orders[0].status_name(), "New");
    assert_eq!(page.total_pages, None);

    let requests = server.recorded().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/orders/filtered");
    assert_eq!(requests[0].authorization.as_deref(), Some(BASIC_ADMIN_SECRET));
    assert_eq!(requests[0].body, Some(json!({ "page": 0, "size": 100 })));
}

#[tokio::test]
async fn fetch_orders_accepts_paged_envelope() {
    let (gateway, server) = spawn_stub_server().await.expect("spawn server");
    server
        .respond(
            "POST",
            "/api/orders/filtered",
            200,
            json!({
                "content": [{ "id": 1 }, { "id": 2 }, { "id": 3 }],
                "totalPages": 5,
                "number": 0
            })
            .to_string(),
        )
        .await;

    let page = gateway.fetch_orders(0, 100).await.expect("orders");
    let ids: Vec<_> = page.orders.iter().map(|order| order.id).collect();
    assert_eq!(ids, vec![OrderId(1), OrderId(2), OrderId(3)]);
    assert_eq!(page.total_pages, Some(5));
}

#[tokio::test]
async fn fetch_orders_reports_unrecognized_shape() {
    let (gateway, server) = spawn_stub_server().await.expect("spawn server");
    server
        .respond("POST", "/api/orders/filtered", 200, r#"{"items": []}"#)
        .await;

    let err = gateway.fetch_orders(0, 100).await.expect_err("must fail");
    assert!(matches!(err, GatewayError::Shape { .. }), "unexpected: {err:?}");

    server
        .respond("POST", "/api/orders/filtered", 200, "not json at all")
        .await;
    let err = gateway.fetch_orders(0, 100).await.expect_err("must fail");
    assert!(matches!(err, GatewayError::Shape { .. }), "unexpected: {err:?}");
}

#[tokio::test]
async fn non_success_status_carries_status_code() {
    let (gateway, server) = spawn_stub_server().await.expect("spawn server");
    server
        .respond("POST", "/api/orders/filtered", 500, "boom")
        .await;
    server
        .respond("GET", "/api/dictionary/statuses", 401, "")
        .await;

    let err = gateway.fetch_orders(0, 100).await.expect_err("must fail");
    assert_eq!(err, GatewayError::request(500));

    let err = gateway.fetch_statuses().await.expect_err("must fail");
    assert_eq!(err.status_code(), Some(401));
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let session = Session::new(&format!("http://{addr}"), "dG9rZW4=").expect("session");
    let gateway = HttpGateway::new(Arc::new(session));
    let err = gateway.fetch_statuses().await.expect_err("must fail");
    assert!(matches!(err, GatewayError::Network { .. }), "unexpected: {err:?}");
}

#[tokio::test]
async fn fetch_statuses_reads_dictionary() {
    let (gateway, server) = spawn_stub_server().await.expect("spawn server");
    server
        .respond(
            "GET",
            "/api/dictionary/statuses",
            200,
            json!([{ "id": 1, "name": "New" }, { "id": 2, "name": "Delivered" }]).to_string(),
        )
        .await;

    let statuses = gateway.fetch_statuses().await.expect("statuses");
    assert_eq!(
        statuses,
        vec![
            Status {
                id: StatusId(1),
                name: "New".into()
            },
            Status {
                id: StatusId(2),
                name: "Delivered".into()
            },
        ]
    );
}

#[tokio::test]
async fn update_order_status_puts_to_order_status_path() {
    let (gateway, server) = spawn_stub_server().await.expect("spawn server");
    server
        .respond("PUT", "/api/orders/7/status/3", 204, "")
        .await;

    gateway
        .update_order_status(OrderId(7), StatusId(3))
        .await
        .expect("update");

    let requests = server.recorded().await;
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].path, "/api/orders/7/status/3");
    assert_eq!(requests[0].authorization.as_deref(), Some(BASIC_ADMIN_SECRET));
    assert_eq!(requests[0].body, None);
}

#[tokio::test]
async fn admin_endpoints_use_their_paths() {
    let (gateway, server) = spawn_stub_server().await.expect("spawn server");
    server
        .respond(
            "POST",
            "/api/dictionary/filter",
            200,
            json!({
                "content": [{ "id": 4, "login": "ops", "name": "Olga", "accepted": false }],
                "totalPages": 2
            })
            .to_string(),
        )
        .await;
    server
        .respond("POST", "/api/v1/auth/confirm/4", 200, "")
        .await;
    server
        .respond(
            "GET",
            "/api/auto/get/list",
            200,
            json!([{ "id": 5, "brand": { "name": "Kia" }, "model": { "name": "Rio" } }])
                .to_string(),
        )
        .await;
    server
        .respond("POST", "/api/orders", 200, json!(["K9Q1", 77]).to_string())
        .await;

    let users = gateway.list_users(1, 10).await.expect("users");
    assert_eq!(users.total_pages, 2);
    assert_eq!(users.content[0].login, "ops");
    assert!(!users.content[0].accepted);

    gateway.confirm_user(UserId(4)).await.expect("confirm");

    let vehicles = gateway.list_vehicles().await.expect("vehicles");
    assert_eq!(vehicles[0].label(), "5 - Kia Rio");

    let created = gateway
        .create_order(&CreateOrderRequest {
            auto_ids: vec![AutoId(5)],
            description: "New order".into(),
            vin: "1HGCM82633A123456".into(),
        })
        .await
        .expect("create");
    assert_eq!(created.code, "K9Q1");
    assert_eq!(created.id, OrderId(77));

    let requests = server.recorded().await;
    let paths: Vec<_> = requests
        .iter()
        .map(|r| (r.method.as_str(), r.path.as_str()))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("POST", "/api/dictionary/filter"),
            ("POST", "/api/v1/auth/confirm/4"),
            ("GET", "/api/auto/get/list"),
            ("POST", "/api/orders"),
        ]
    );
    assert_eq!(requests[0].body, Some(json!({ "page": 1, "size": 10 })));
    assert_eq!(
        requests[3].body,
        Some(json!({ "autoIds": [5], "description": "New order", "vin": "1HGCM82633A123456" }))
    );
    assert!(requests
        .iter()
        .all(|r| r.authorization.as_deref() == Some(BASIC_ADMIN_SECRET)));
}
