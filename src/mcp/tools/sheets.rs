//! Sheet Tools
//!
//! Sheets of an application and the visualizations placed on them.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{app_id_property, default_true, failure, flag, parse_args, require_id, respond, timestamp};
use crate::engine::retrieval::{
    fetch_sheet_objects, fetch_sheets, ItemOutcome, SheetObjectOptions, SheetOptions,
};
use crate::engine::with_document;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(sheets_tool());
    registry.register_tool(sheet_objects_tool());
}

// ============================================================================
// get_app_sheets
// ============================================================================

#[derive(Debug, Deserialize)]
struct SheetsParams {
    app_id: String,
    #[serde(default)]
    include_thumbnail: bool,
    #[serde(default = "default_true")]
    include_metadata: bool,
}

fn sheets_tool() -> RegisteredTool {
    ToolBuilder::new("get_app_sheets")
        .description("Retrieve all sheets of a Qlik Sense application, ordered by rank")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "app_id": app_id_property(),
                "include_thumbnail": flag("Include sheet thumbnails", false),
                "include_metadata": flag("Include sheet metadata", true)
            },
            "required": ["app_id"]
        }))
        .build(sheets_handler)
}

async fn sheets_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: SheetsParams = parse_args(params)?;
    require_id("app_id", &params.app_id)?;

    let options = SheetOptions {
        include_thumbnail: params.include_thumbnail,
        include_metadata: params.include_metadata,
    };
    let result = with_document(ctx.connector.as_ref(), &params.app_id, |conn| {
        Box::pin(fetch_sheets(conn, options))
    })
    .await;

    match result {
        Ok(outcomes) => {
            let sheets: Vec<_> = outcomes.into_iter().map(ItemOutcome::into_record).collect();
            respond(&json!({
                "app_id": params.app_id,
                "sheets": sheets,
                "sheet_count": sheets.len(),
                "retrieved_at": timestamp(),
                "options": {
                    "include_thumbnail": options.include_thumbnail,
                    "include_metadata": options.include_metadata
                }
            }))
        }
        Err(e) => failure("get_app_sheets", &e, json!({"app_id": params.app_id})),
    }
}

// ============================================================================
// get_sheet_objects
// ============================================================================

#[derive(Debug, Deserialize)]
struct SheetObjectsParams {
    app_id: String,
    sheet_id: String,
    #[serde(default = "default_true")]
    include_properties: bool,
    #[serde(default = "default_true")]
    include_layout: bool,
    #[serde(default = "default_true")]
    include_data_definition: bool,
}

fn sheet_objects_tool() -> RegisteredTool {
    ToolBuilder::new("get_sheet_objects")
        .description("Retrieve the visualization objects placed on a sheet")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "app_id": app_id_property(),
                "sheet_id": {
                    "type": "string",
                    "description": "Sheet ID to analyze"
                },
                "include_properties": flag("Include object properties", true),
                "include_layout": flag("Include position/size info", true),
                "include_data_definition": flag("Include measures/dimensions", true)
            },
            "required": ["app_id", "sheet_id"]
        }))
        .build(sheet_objects_handler)
}

async fn sheet_objects_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: SheetObjectsParams = parse_args(params)?;
    require_id("app_id", &params.app_id)?;
    require_id("sheet_id", &params.sheet_id)?;

    let options = SheetObjectOptions {
        include_properties: params.include_properties,
        include_layout: params.include_layout,
        include_data_definition: params.include_data_definition,
    };
    let sheet_id = params.sheet_id.clone();
    let result = with_document(ctx.connector.as_ref(), &params.app_id, move |conn| {
        Box::pin(async move { fetch_sheet_objects(conn, &sheet_id, options).await })
    })
    .await;

    match result {
        Ok(sheet) => {
            let objects: Vec<_> = sheet
                .objects
                .into_iter()
                .map(ItemOutcome::into_record)
                .collect();
            respond(&json!({
                "app_id": params.app_id,
                "sheet_id": params.sheet_id,
                "sheet_title": sheet.sheet_title,
                "objects": objects,
                "object_count": objects.len(),
                "retrieved_at": timestamp(),
                "options": {
                    "include_properties": options.include_properties,
                    "include_layout": options.include_layout,
                    "include_data_definition": options.include_data_definition
                }
            }))
        }
        Err(e) => failure(
            "get_sheet_objects",
            &e,
            json!({"app_id": params.app_id, "sheet_id": params.sheet_id}),
        ),
    }
}
