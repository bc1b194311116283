//! In-process backend shared by the panel tests. Behaves like the real one
//! for the endpoints the page uses and records every request it sees.

#![allow(dead_code)]

use axum::extract::{Multipart, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Seen {
    pub path: &'static str,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
    results_calls: Arc<AtomicUsize>,
}

impl Backend {
    fn record(&self, path: &'static str, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.seen.lock().unwrap().push(Seen {
            path,
            authorization,
            body,
        });
    }

    pub fn seen(&self, path: &str) -> Vec<Seen> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.path == path)
            .cloned()
            .collect()
    }
}

async fn login(
    State(b): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    b.record("/login", &headers, body.clone());
    let token = match (body["username"].as_str(), body["password"].as_str()) {
        (Some("admin"), Some("password123")) => "tok-admin",
        (Some("analyst"), Some("s3cret")) => "tok-analyst",
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid username or password"})),
            )
        }
    };
    (StatusCode::OK, Json(json!({"access_token": token})))
}

async fn register(
    State(b): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    b.record("/register", &headers, body.clone());
    if body["username"] == "admin" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "User already exists"})),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({"message": "User registered successfully"})),
    )
}

/// A part without a file name is not a file: the backend answers 500
/// with an `error` body, as it does for a missing `file` entry.
async fn upload(
    State(b): State<Backend>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut file_name = None;
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        fields.push(json!(field.name().unwrap_or_default()));
        file_name = field.file_name().map(String::from);
    }
    b.record("/upload", &headers, Value::Array(fields));
    match file_name {
        Some(name) => (
            StatusCode::OK,
            Json(json!({"message": "File uploaded successfully!", "file_key": format!("admin/{}", name)})),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "'file'"})),
        ),
    }
}

/// `slow` answers after 300 ms, `garbage` answers with a non-JSON body.
async fn query(
    State(b): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    b.record("/query", &headers, body.clone());
    let text = body["query"].as_str().unwrap_or_default().to_string();
    match text.as_str() {
        "garbage" => return (StatusCode::OK, "<html>proxy error</html>").into_response(),
        "slow" => tokio::time::sleep(Duration::from_millis(300)).await,
        _ => {}
    }
    Json(json!({
        "message": format!("Query processed successfully! ({})", text),
        "result_key": "admin/processed-results/data_result.json",
    }))
    .into_response()
}

/// First call: two records. Second: one record. Later: a 500.
async fn results(State(b): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    b.record("/results", &headers, Value::Null);
    match b.results_calls.fetch_add(1, Ordering::SeqCst) {
        0 => (StatusCode::OK, Json(json!([{"a": 1}, {"b": 2}]))),
        1 => (StatusCode::OK, Json(json!([{"output": "done", "agent_outputs": {}}]))),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "NoSuchBucket"})),
        ),
    }
}

/// Start the backend on the current runtime. Returns its base URL.
pub async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/upload", post(upload))
        .route("/query", post(query))
        .route("/results", get(results))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), backend)
}

/// A base URL nothing listens on.
pub fn dead_url() -> String {
    let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://127.0.0.1:{}", l.local_addr().unwrap().port())
}
