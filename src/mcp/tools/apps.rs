//! Application Tools
//!
//! Listing the documents the engine identity can see.

use serde_json::{json, Value};

use super::{failure, respond, timestamp};
use crate::engine::retrieval::list_documents;
use crate::engine::with_global;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_applications_tool());
}

// ============================================================================
// list_qlik_applications
// ============================================================================

fn list_applications_tool() -> RegisteredTool {
    ToolBuilder::new("list_qlik_applications")
        .description(
            "Get a list of all available Qlik Sense applications with their names and IDs",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {},
            "required": []
        }))
        .build(list_applications_handler)
}

async fn list_applications_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    let result = with_global(ctx.connector.as_ref(), |conn| {
        Box::pin(list_documents(conn))
    })
    .await;

    match result {
        Ok(applications) => respond(&json!({
            "applications": applications,
            "count": applications.len(),
            "retrieved_at": timestamp(),
        })),
        Err(e) => failure("list_qlik_applications", &e, json!({})),
    }
}
