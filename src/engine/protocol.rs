//! Engine Wire Protocol
//!
//! JSON-RPC 2.0 frames exchanged with the engine over the WebSocket.
//! Requests carry an extra `handle` member naming the object they target.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::EngineError;

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// Handle addressing the engine root rather than an open document.
pub const GLOBAL_HANDLE: i64 = -1;

// ============================================================================
// Method Names
// ============================================================================

pub mod methods {
    // Global
    pub const OPEN_DOC: &str = "OpenDoc";
    pub const GET_DOC_LIST: &str = "GetDocList";

    // Document
    pub const GET_APP_LAYOUT: &str = "GetAppLayout";
    pub const CREATE_SESSION_OBJECT: &str = "CreateSessionObject";
    pub const DESTROY_SESSION_OBJECT: &str = "DestroySessionObject";
    pub const GET_ALL_INFOS: &str = "GetAllInfos";
    pub const GET_OBJECT: &str = "GetObject";
    pub const GET_SCRIPT: &str = "GetScript";
    pub const GET_LINEAGE: &str = "GetLineage";

    // Generic object
    pub const GET_LAYOUT: &str = "GetLayout";
}

// ============================================================================
// Outbound
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct EngineRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub handle: i64,
    pub params: Value,
}

impl<'a> EngineRequest<'a> {
    pub fn new(id: u64, method: &'a str, handle: i64, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            handle,
            params,
        }
    }
}

// ============================================================================
// Inbound
// ============================================================================

/// Error object of a failed call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl From<RpcError> for EngineError {
    fn from(err: RpcError) -> Self {
        EngineError::Engine {
            code: err.code,
            message: err.message,
        }
    }
}

/// A classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Response {
        id: u64,
        outcome: Result<Value, RpcError>,
    },
    /// Engine-initiated message such as `OnConnected`
    Notification { method: String },
}

/// Parse and classify one text frame.
pub fn parse_frame(text: &str) -> Result<InboundFrame, EngineError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| EngineError::Protocol(format!("frame is not valid JSON: {}", e)))?;

    let Value::Object(mut frame) = value else {
        return Err(EngineError::Protocol("frame is not a JSON object".into()));
    };

    match frame.get("jsonrpc").and_then(Value::as_str) {
        Some(JSONRPC_VERSION) => {}
        other => {
            return Err(EngineError::Protocol(format!(
                "unsupported jsonrpc version: {:?}",
                other
            )))
        }
    }

    let id = match frame.remove("id") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(raw.as_u64().ok_or_else(|| {
            EngineError::Protocol(format!("response id is not an unsigned integer: {}", raw))
        })?),
    };

    let Some(id) = id else {
        return match frame.get("method").and_then(Value::as_str) {
            Some(method) => Ok(InboundFrame::Notification {
                method: method.to_string(),
            }),
            None => Err(EngineError::Protocol(
                "frame has neither an id nor a method".into(),
            )),
        };
    };

    if let Some(error) = frame.remove("error") {
        let error: RpcError = serde_json::from_value(error)
            .map_err(|e| EngineError::Protocol(format!("malformed error object: {}", e)))?;
        return Ok(InboundFrame::Response {
            id,
            outcome: Err(error),
        });
    }

    match frame.remove("result") {
        Some(result) => Ok(InboundFrame::Response {
            id,
            outcome: Ok(result),
        }),
        None => Err(EngineError::Protocol(format!(
            "response {} has neither result nor error",
            id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_with_handle() {
        let request = EngineRequest::new(3, methods::OPEN_DOC, GLOBAL_HANDLE, json!(["app-1"]));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "OpenDoc",
                "handle": -1,
                "params": ["app-1"]
            })
        );
    }

    #[test]
    fn test_parse_result_frame() {
        let frame = parse_frame(r#"{"jsonrpc":"2.0","id":7,"result":{"qScript":"LOAD"}}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Response {
                id: 7,
                outcome: Ok(json!({"qScript": "LOAD"}))
            }
        );
    }

    #[test]
    fn test_parse_error_frame() {
        let frame = parse_frame(
            r#"{"jsonrpc":"2.0","id":2,"error":{"code":1002,"message":"App already open"}}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            InboundFrame::Response {
                id: 2,
                outcome: Err(RpcError {
                    code: 1002,
                    message: "App already open".to_string()
                })
            }
        );
    }

    #[test]
    fn test_parse_notification() {
        let frame = parse_frame(
            r#"{"jsonrpc":"2.0","method":"OnConnected","params":{"qSessionState":"SESSION_CREATED"}}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            InboundFrame::Notification {
                method: "OnConnected".to_string()
            }
        );
    }

    #[test]
    fn test_null_id_counts_as_absent() {
        let frame = parse_frame(r#"{"jsonrpc":"2.0","id":null,"method":"OnClose"}"#).unwrap();
        assert!(matches!(frame, InboundFrame::Notification { .. }));
    }

    #[test]
    fn test_parse_rejects_malformed_frames() {
        for text in [
            "not json",
            "[1,2,3]",
            r#"{"id":1,"result":{}}"#,
            r#"{"jsonrpc":"2.0","id":"abc","result":{}}"#,
            r#"{"jsonrpc":"2.0","id":4}"#,
            r#"{"jsonrpc":"2.0","result":{}}"#,
            r#"{"jsonrpc":"2.0","error":{"code":1,"message":"x"}}"#,
        ] {
            let err = parse_frame(text).unwrap_err();
            assert!(
                matches!(err, EngineError::Protocol(_)),
                "expected protocol error for {}",
                text
            );
        }
    }
}
