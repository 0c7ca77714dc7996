//! Common test infrastructure
//!
//! A scripted stand-in for the analytics engine plus helpers to drive the
//! MCP server against it. Tests should only import from this module.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{McpHarness, MockEngine};
//!
//! #[tokio::test]
//! async fn test_list_apps() {
//!     let engine = MockEngine::new(common::sales_app);
//!     let mut mcp = McpHarness::initialized(&engine).await;
//!     let payload = mcp.call_tool("list_qlik_applications", serde_json::json!({})).await;
//!     assert_eq!(payload["count"], 2);
//! }
//! ```

mod engine;
mod fixtures;
mod harness;

pub use engine::{EngineCall, MockEngine, MockReply};
pub use fixtures::*;
pub use harness::{tool_payload, McpHarness, TEST_SERVER_NAME, TEST_SERVER_VERSION};
