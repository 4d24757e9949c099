//! Common test utilities for in-process server testing with a mock library.
//!
//! This module provides a test fixture that builds the full router with a
//! `MockMovieLibrary` behind the tool router, so the HTTP surface can be
//! exercised without a running upstream.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use reelgate_core::testing::MockMovieLibrary;
use reelgate_core::{load_config_from_str, ResponseCache, ToolRouter};
use reelgate_server::state::AppState;

/// Re-export fixtures for test convenience
pub use reelgate_core::testing::fixtures;

pub const TEST_API_KEY: &str = "fixture-upstream-key-7c1e";

/// Test fixture for in-process HTTP testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_tools_listed() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/tools").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock library - configure catalog, library, queue, errors
    pub library: MockMovieLibrary,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestFixture {
    /// Create a new fixture with an empty mock library.
    pub async fn new() -> Self {
        let config = load_config_from_str(&format!(
            r#"
[server]
host = "127.0.0.1"
port = 0

[upstream]
url = "http://127.0.0.1:7878"
api_key = "{}"
"#,
            TEST_API_KEY
        ))
        .expect("Failed to parse test config");

        let library = MockMovieLibrary::new();
        let tools = ToolRouter::new(
            Arc::new(library.clone()),
            Arc::new(ResponseCache::new(config.cache.ttl())),
        );
        let state = Arc::new(AppState::new(config, tools));
        let router = reelgate_server::api::create_router(state);

        Self { router, library }
    }

    /// Fixture with two quality profiles and two root folders upstream.
    pub async fn with_defaults() -> Self {
        let fixture = Self::new().await;
        fixture
            .library
            .set_quality_profiles(vec![
                fixtures::quality_profile(1, "HD-1080p"),
                fixtures::quality_profile(2, "Ultra-HD"),
            ])
            .await;
        fixture
            .library
            .set_root_folders(vec![
                fixtures::root_folder(1, "/movies"),
                fixtures::root_folder(2, "/archive"),
            ])
            .await;
        fixture
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send one JSON-RPC request to `/mcp`.
    pub async fn rpc(&self, id: u64, method: &str, params: Value) -> TestResponse {
        self.post(
            "/mcp",
            json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }),
        )
        .await
    }

    /// Call a tool over MCP and return the `result` object.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        let response = self
            .rpc(1, "tools/call", json!({ "name": name, "arguments": arguments }))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["result"].clone()
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
