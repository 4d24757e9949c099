//! MCP endpoint: JSON-RPC 2.0 over streamable HTTP, JSON responses only.
//!
//! Requests get a JSON-RPC response body; a POST carrying only notifications
//! or client responses gets `202 Accepted` with no body. A successful
//! `initialize` issues an `Mcp-Session-Id` header.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use reelgate_core::{ErrorKind, ToolError};

use crate::metrics::MCP_MESSAGES_TOTAL;
use crate::state::AppState;

pub const MCP_PROTOCOL_VERSION: &str = "2025-03-26";
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Protocol revisions a client may ask for; anything else gets ours.
const SUPPORTED_PROTOCOL_VERSIONS: [&str; 2] = [MCP_PROTOCOL_VERSION, "2024-11-05"];

const SERVER_NAME: &str = "reelgate";

/// Methods counted under their own metric label.
const KNOWN_METHODS: [&str; 9] = [
    "initialize",
    "ping",
    "tools/list",
    "tools/call",
    "resources/list",
    "resources/templates/list",
    "resources/read",
    "notifications/initialized",
    "notifications/cancelled",
];

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(-32700, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(-32600, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, message)
    }

    /// Resource reads fail at the protocol level, carrying `{kind, detail}`.
    fn from_resource_error(err: &ToolError) -> Self {
        let payload = err.payload();
        let code = match payload.kind {
            ErrorKind::NotFound => -32002,
            ErrorKind::Validation => -32602,
            _ => -32603,
        };
        Self {
            code,
            message: payload.detail.clone(),
            data: serde_json::to_value(&payload).ok(),
        }
    }
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn error_response(id: Value, error: RpcError) -> Value {
    let mut payload = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    });
    if let Some(data) = error.data {
        payload["error"]["data"] = data;
    }
    payload
}

// ============================================================================
// HTTP handler
// ============================================================================

/// `POST /mcp`
pub async fn handle_mcp(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let incoming: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            let reply = error_response(Value::Null, RpcError::parse_error(e.to_string()));
            return Json(reply).into_response();
        }
    };

    let initializes = incoming.get("method").and_then(Value::as_str) == Some("initialize")
        && incoming.get("id").is_some();

    let reply = match incoming {
        Value::Array(batch) if batch.is_empty() => Some(error_response(
            Value::Null,
            RpcError::invalid_request("Batch request must not be empty"),
        )),
        Value::Array(batch) => {
            let responses: Vec<Value> = join_all(
                batch
                    .into_iter()
                    .map(|message| handle_message(&state, message)),
            )
            .await
            .into_iter()
            .flatten()
            .collect();
            (!responses.is_empty()).then_some(Value::Array(responses))
        }
        single => handle_message(&state, single).await,
    };

    let Some(reply) = reply else {
        return StatusCode::ACCEPTED.into_response();
    };

    let issue_session = initializes && reply.get("result").is_some();
    let mut response = Json(reply).into_response();
    if issue_session {
        let session_id = Uuid::new_v4().to_string();
        info!(session_id = %session_id, "MCP session initialized");
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    response
}

// ============================================================================
// Dispatch
// ============================================================================

/// Handle one JSON-RPC message; `None` for notifications and client responses.
pub async fn handle_message(state: &AppState, incoming: Value) -> Option<Value> {
    let Some(obj) = incoming.as_object() else {
        return Some(error_response(
            Value::Null,
            RpcError::invalid_request("Request must be a JSON object"),
        ));
    };

    let id = obj.get("id").cloned();
    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Some(error_response(
            id.unwrap_or(Value::Null),
            RpcError::invalid_request("jsonrpc must be '2.0'"),
        ));
    }

    // No method: a response to something we never sent.
    let method = obj.get("method").and_then(Value::as_str)?;

    let label = if KNOWN_METHODS.contains(&method) {
        method
    } else {
        "other"
    };
    MCP_MESSAGES_TOTAL.with_label_values(&[label]).inc();

    let params = obj.get("params").cloned().unwrap_or(Value::Null);
    match id {
        Some(id) => {
            debug!(method, "MCP request");
            Some(match handle_request(state, method, params).await {
                Ok(result) => success_response(id, result),
                Err(err) => error_response(id, err),
            })
        }
        None => {
            debug!(method, "MCP notification");
            None
        }
    }
}

async fn handle_request(state: &AppState, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(initialize_result(&params)),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": state.tools().definitions() })),
        "tools/call" => call_tool(state, params).await,
        "resources/list" => Ok(json!({ "resources": state.tools().resources() })),
        "resources/templates/list" => Ok(json!({
            "resourceTemplates": state.tools().resource_templates()
        })),
        "resources/read" => read_resource(state, params).await,
        other => Err(RpcError::method_not_found(other)),
    }
}

fn initialize_result(params: &Value) -> Value {
    let requested = params.get("protocolVersion").and_then(Value::as_str);
    let version = requested
        .filter(|version| SUPPORTED_PROTOCOL_VERSIONS.contains(version))
        .unwrap_or(MCP_PROTOCOL_VERSION);

    json!({
        "protocolVersion": version,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": "Manage a Radarr movie library: search and add movies, inspect the \
                         library, pick releases and watch the download queue."
    })
}

fn object_params<'a>(params: &'a Value, method: &str) -> Result<&'a Map<String, Value>, RpcError> {
    params
        .as_object()
        .ok_or_else(|| RpcError::invalid_params(format!("{} params must be an object", method)))
}

async fn call_tool(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let params = object_params(&params, "tools/call")?;

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

    let arguments = match params.get("arguments") {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        Some(Value::Null) | None => Value::Null,
        Some(_) => {
            return Err(RpcError::invalid_params(
                "tools/call 'arguments' must be an object",
            ))
        }
    };

    // Tool failures are results the model can read, not protocol errors.
    Ok(match state.tools().call(name, arguments).await {
        Ok(result) => tool_result(result, false),
        Err(err) => tool_result(json!(err.payload()), true),
    })
}

fn tool_result(payload: Value, is_error: bool) -> Value {
    let text = serde_json::to_string_pretty(&payload).unwrap_or_default();
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": payload,
        "isError": is_error
    })
}

async fn read_resource(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let params = object_params(&params, "resources/read")?;
    let uri = params
        .get("uri")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("resources/read requires string field 'uri'"))?;

    let contents = state
        .tools()
        .read_resource(uri)
        .await
        .map_err(|err| RpcError::from_resource_error(&err))?;
    Ok(json!({ "contents": [contents] }))
}
