//! MCP Tools
//!
//! One tool per retrieval procedure. Every tool opens its own engine
//! connection, runs the procedure and reshapes the result into the JSON
//! payload returned to the client.

pub mod apps;
pub mod data_model;
pub mod master_items;
pub mod sheets;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::warn;

use super::protocol::{McpError, ToolsCallResult};
use super::registry::{McpRegistry, ToolResult};
use crate::engine::EngineError;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) {
    apps::register_tools(registry);
    master_items::register_tools(registry);
    data_model::register_tools(registry);
    sheets::register_tools(registry);
}

pub(crate) fn default_true() -> bool {
    true
}

/// RFC 3339 UTC timestamp used in every payload.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_args<T: DeserializeOwned>(params: Value) -> Result<T, McpError> {
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// Reject blank identifiers before any connection is opened.
pub(crate) fn require_id(name: &str, value: &str) -> Result<(), McpError> {
    if value.trim().is_empty() {
        return Err(McpError::InvalidParams(format!("{} must not be empty", name)));
    }
    Ok(())
}

/// JSON schema property for a boolean flag.
pub(crate) fn flag(description: &str, default: bool) -> Value {
    json!({
        "type": "boolean",
        "description": description,
        "default": default
    })
}

pub(crate) fn app_id_property() -> Value {
    json!({
        "type": "string",
        "description": "Qlik Sense application ID"
    })
}

pub(crate) fn respond(payload: &Value) -> ToolResult {
    ToolsCallResult::json(payload).map_err(|e| McpError::InternalError(e.to_string()))
}

/// Engine failure reported as an error result carrying the identifying
/// `context` (app and sheet ids).
pub(crate) fn failure(tool: &str, err: &EngineError, context: Value) -> ToolResult {
    warn!("{} failed: {}", tool, err);

    let mut payload = match context {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    payload.insert("error".into(), json!(err.to_string()));
    payload.insert("error_kind".into(), json!(err.kind()));
    payload.insert("timestamp".into(), json!(timestamp()));

    ToolsCallResult::json_error(&Value::Object(payload))
        .map_err(|e| McpError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DocumentOpenFailure;

    #[test]
    fn test_failure_payload_carries_kind_and_context() {
        let err = EngineError::DocumentOpen {
            document: "app-1".to_string(),
            reason: DocumentOpenFailure::NoHandle,
        };
        let result = failure("get_app_script", &err, json!({"app_id": "app-1"})).unwrap();
        assert_eq!(result.is_error, Some(true));

        let payload: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(payload["app_id"], "app-1");
        assert_eq!(payload["error_kind"], "document_open_error");
        assert!(payload["error"].as_str().unwrap().contains("no document handle"));
        assert!(payload["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_require_id() {
        assert!(require_id("app_id", "abc").is_ok());
        assert!(matches!(
            require_id("app_id", "  "),
            Err(McpError::InvalidParams(_))
        ));
    }
}
