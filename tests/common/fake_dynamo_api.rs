//! Fake DynamoDB `PutItem` endpoint for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves `POST /` and records every request it receives. Writes
//! can be made to fail per visitor IP, and every response can be delayed to
//! exercise client timeouts.
//!
//! # Example
//!
//! ```rust,no_run
//! let api = FakeDynamoApi::start().await.unwrap();
//! api.fail_visitor("10.0.0.9").await;
//!
//! let client = DynamoClient::new(&api.base_url(), Duration::from_secs(1)).unwrap();
//! ```

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// One request as seen by the fake.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub target: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

impl CapturedRequest {
    /// `Item.<name>` of a `PutItem` body.
    pub fn attribute(&self, name: &str) -> &serde_json::Value {
        &self.body["Item"][name]
    }
}

#[derive(Default)]
struct ApiState {
    requests: Vec<CapturedRequest>,
    failing_visitors: HashSet<String>,
    delay: Option<Duration>,
}

/// Handle to the running fake store.
pub struct FakeDynamoApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeDynamoApi {
    /// Start the fake on a random port. Returns once the server is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route("/", post(put_item))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer writes for `visitor_ip` with a throughput error.
    pub async fn fail_visitor(&self, visitor_ip: &str) {
        self.state
            .lock()
            .await
            .failing_visitors
            .insert(visitor_ip.to_string());
    }

    /// Hold every response for `delay` before answering.
    pub async fn delay_responses(&self, delay: Duration) {
        self.state.lock().await.delay = Some(delay);
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.state.lock().await.requests.clone()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn put_item(
    State(state): State<Arc<Mutex<ApiState>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let request = CapturedRequest {
        target: header("x-amz-target"),
        content_type: header("content-type"),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };

    let (delay, fail) = {
        let mut state = state.lock().await;
        let visitor = request.attribute("visitor_ip")["S"].as_str().unwrap_or_default();
        let fail = state.failing_visitors.contains(visitor);
        state.requests.push(request.clone());
        (state.delay, fail)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if request.target.as_deref() != Some("DynamoDB_20120810.PutItem") {
        return (
            StatusCode::BAD_REQUEST,
            r#"{"__type":"com.amazon.coral.service#UnknownOperationException"}"#,
        );
    }
    if fail {
        return (
            StatusCode::BAD_REQUEST,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ProvisionedThroughputExceededException","message":"Rate of requests exceeds the allowed throughput"}"#,
        );
    }
    (StatusCode::OK, "{}")
}
