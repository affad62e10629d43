use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;
use twrec::domain::repositories::StreamRepository;
use twrec::domain::value_objects::ChannelName;
use twrec::infrastructure::{InfrastructureError, TwitchClient};

#[derive(Clone, Default)]
struct FakeTwitch {
    token_calls: Arc<AtomicUsize>,
    stream_calls: Arc<AtomicUsize>,
    token_status: Arc<AtomicU16>,
    streams_status: Arc<AtomicU16>,
    live: Arc<AtomicBool>,
}

impl FakeTwitch {
    fn new() -> Self {
        let fake = Self::default();
        fake.token_status.store(200, Ordering::SeqCst);
        fake.streams_status.store(200, Ordering::SeqCst);
        fake
    }
}

async fn token(State(fake): State<FakeTwitch>) -> Response {
    let n = fake.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let status = StatusCode::from_u16(fake.token_status.load(Ordering::SeqCst)).unwrap();
    if !status.is_success() {
        return (status, "invalid client").into_response();
    }
    Json(json!({
        "access_token": format!("tok{}", n),
        "expires_in": 3600,
        "token_type": "bearer"
    }))
    .into_response()
}

async fn streams(
    State(fake): State<FakeTwitch>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    fake.stream_calls.fetch_add(1, Ordering::SeqCst);

    let autorizado = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer tok"));
    let con_client_id = headers.get("client-id").is_some_and(|v| v == "id");
    if !autorizado || !con_client_id {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let status = StatusCode::from_u16(fake.streams_status.load(Ordering::SeqCst)).unwrap();
    if !status.is_success() {
        return (status, "error").into_response();
    }

    let login = query.get("user_login").cloned().unwrap_or_default();
    if fake.live.load(Ordering::SeqCst) {
        Json(json!({"data": [{"user_login": login, "type": "live"}], "pagination": {}}))
            .into_response()
    } else {
        Json(json!({"data": [], "pagination": {}})).into_response()
    }
}

async fn servidor(fake: FakeTwitch) -> SocketAddr {
    let app = Router::new()
        .route("/oauth2/token", post(token))
        .route("/helix/streams", get(streams))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn cliente(addr: SocketAddr) -> TwitchClient {
    let base = format!("http://{}", addr);
    TwitchClient::new("id", "secret")
        .unwrap()
        .with_endpoints(&base, &base)
}

fn canal() -> ChannelName {
    ChannelName::new("foo").unwrap()
}

#[tokio::test]
async fn handshake_failure_reports_not_live() {
    let fake = FakeTwitch::new();
    fake.token_status.store(400, Ordering::SeqCst);
    fake.live.store(true, Ordering::SeqCst);
    let client = cliente(servidor(fake.clone()).await);

    assert!(!client.is_live(&canal()).await);
    assert_eq!(fake.stream_calls.load(Ordering::SeqCst), 0);

    let error = client.consultar_stream(&canal()).await.unwrap_err();
    assert!(matches!(error, InfrastructureError::Authentication(_)));
    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 2);

    fake.token_status.store(200, Ordering::SeqCst);
    assert!(client.is_live(&canal()).await);
}

#[tokio::test]
async fn session_is_created_lazily_and_reused() {
    let fake = FakeTwitch::new();
    fake.live.store(true, Ordering::SeqCst);
    let client = cliente(servidor(fake.clone()).await);
    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 0);

    assert!(client.is_live(&canal()).await);
    assert!(client.is_live(&canal()).await);
    fake.live.store(false, Ordering::SeqCst);
    assert!(!client.is_live(&canal()).await);

    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.stream_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rejected_token_is_replaced_on_next_call() {
    let fake = FakeTwitch::new();
    fake.live.store(true, Ordering::SeqCst);
    fake.streams_status.store(401, Ordering::SeqCst);
    let client = cliente(servidor(fake.clone()).await);

    assert!(!client.is_live(&canal()).await);
    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 1);

    fake.streams_status.store(200, Ordering::SeqCst);
    assert!(client.is_live(&canal()).await);
    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unexpected_status_reports_not_live() {
    let fake = FakeTwitch::new();
    fake.live.store(true, Ordering::SeqCst);
    fake.streams_status.store(404, Ordering::SeqCst);
    let client = cliente(servidor(fake.clone()).await);

    assert!(!client.is_live(&canal()).await);
    let error = client.consultar_stream(&canal()).await.unwrap_err();
    assert!(matches!(error, InfrastructureError::ExternalService(_)));
    // La sesion sigue siendo valida.
    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_api_reports_not_live() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = cliente(addr);
    assert!(!client.is_live(&canal()).await);
}
