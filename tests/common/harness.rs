use qlik_mcp_server::engine::EngineConnector;
use qlik_mcp_server::mcp::{McpServer, ToolContext};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use super::engine::MockEngine;

pub const TEST_SERVER_NAME: &str = "qlik-sense-test";
pub const TEST_SERVER_VERSION: &str = "0.1.0-test";

/// Drives an [`McpServer`] wired to a [`MockEngine`] one message at a time.
pub struct McpHarness {
    pub server: McpServer,
    next_id: i64,
}

impl McpHarness {
    pub fn new(engine: &MockEngine) -> Self {
        let connector: Arc<dyn EngineConnector> = Arc::new(engine.clone());
        let context = ToolContext {
            connector,
            server_name: TEST_SERVER_NAME.to_string(),
            server_version: TEST_SERVER_VERSION.to_string(),
            start_time: Instant::now(),
        };
        Self {
            server: McpServer::new(context),
            next_id: 0,
        }
    }

    /// Harness that already completed the initialize handshake.
    pub async fn initialized(engine: &MockEngine) -> Self {
        let mut harness = Self::new(engine);
        let response = harness
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }),
            )
            .await;
        assert!(response.get("result").is_some(), "initialize failed: {}", response);
        assert!(harness.notify("notifications/initialized").await.is_none());
        harness
    }

    /// Send raw text and return the serialized response, if any.
    pub async fn send_raw(&mut self, text: &str) -> Option<Value> {
        self.server
            .handle_message(text)
            .await
            .map(|response| serde_json::to_value(response).unwrap())
    }

    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let message = json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params
        });
        let response = self
            .send_raw(&message.to_string())
            .await
            .expect("request without a response");
        assert_eq!(response["id"], json!(self.next_id));
        response
    }

    pub async fn notify(&mut self, method: &str) -> Option<Value> {
        self.send_raw(&json!({"jsonrpc": "2.0", "method": method}).to_string())
            .await
    }

    /// Raw `tools/call` result: content list plus `isError`.
    pub async fn call_tool_result(&mut self, name: &str, arguments: Value) -> Value {
        let response = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        response
            .get("result")
            .cloned()
            .unwrap_or_else(|| panic!("tools/call {} returned an error: {}", name, response))
    }

    /// JSON payload carried in the first text block of a tool result.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let result = self.call_tool_result(name, arguments).await;
        tool_payload(&result)
    }
}

pub fn tool_payload(result: &Value) -> Value {
    let text = result["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("tool result has no text content: {}", result));
    serde_json::from_str(text).unwrap()
}
