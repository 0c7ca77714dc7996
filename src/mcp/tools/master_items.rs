//! Master Item Tools
//!
//! Measures, dimensions and variables defined in an application.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{app_id_property, default_true, failure, flag, parse_args, require_id, respond, timestamp};
use crate::engine::retrieval::{
    fetch_dimensions, fetch_measures, fetch_variables, DimensionOptions, MeasureOptions,
    VariableOptions,
};
use crate::engine::with_document;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(measures_tool());
    registry.register_tool(variables_tool());
    registry.register_tool(dimensions_tool());
}

// ============================================================================
// get_app_measures
// ============================================================================

#[derive(Debug, Deserialize)]
struct MeasuresParams {
    app_id: String,
    #[serde(default = "default_true")]
    include_expression: bool,
    #[serde(default = "default_true")]
    include_tags: bool,
}

fn measures_tool() -> RegisteredTool {
    ToolBuilder::new("get_app_measures")
        .description("Retrieve all measures from a Qlik Sense application")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "app_id": app_id_property(),
                "include_expression": flag("Include measure expressions in the response", true),
                "include_tags": flag("Include measure tags in the response", true)
            },
            "required": ["app_id"]
        }))
        .build(measures_handler)
}

async fn measures_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: MeasuresParams = parse_args(params)?;
    require_id("app_id", &params.app_id)?;

    let options = MeasureOptions {
        include_expression: params.include_expression,
        include_tags: params.include_tags,
    };
    let result = with_document(ctx.connector.as_ref(), &params.app_id, |conn| {
        Box::pin(fetch_measures(conn, options))
    })
    .await;

    match result {
        Ok(measures) => respond(&json!({
            "app_id": params.app_id,
            "measures": measures,
            "count": measures.len(),
            "retrieved_at": timestamp(),
            "options": {
                "include_expression": options.include_expression,
                "include_tags": options.include_tags
            }
        })),
        Err(e) => failure("get_app_measures", &e, json!({"app_id": params.app_id})),
    }
}

// ============================================================================
// get_app_variables
// ============================================================================

#[derive(Debug, Deserialize)]
struct VariablesParams {
    app_id: String,
    #[serde(default = "default_true")]
    include_definition: bool,
    #[serde(default = "default_true")]
    include_tags: bool,
    #[serde(default = "default_true")]
    show_reserved: bool,
    #[serde(default = "default_true")]
    show_config: bool,
}

fn variables_tool() -> RegisteredTool {
    ToolBuilder::new("get_app_variables")
        .description("Retrieve all variables from a Qlik Sense application")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "app_id": app_id_property(),
                "include_definition": flag("Include variable definitions in the response", true),
                "include_tags": flag("Include variable tags in the response", true),
                "show_reserved": flag("Include reserved system variables", true),
                "show_config": flag("Include configuration variables", true)
            },
            "required": ["app_id"]
        }))
        .build(variables_handler)
}

async fn variables_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: VariablesParams = parse_args(params)?;
    require_id("app_id", &params.app_id)?;

    let options = VariableOptions {
        include_definition: params.include_definition,
        include_tags: params.include_tags,
        show_reserved: params.show_reserved,
        show_config: params.show_config,
    };
    let result = with_document(ctx.connector.as_ref(), &params.app_id, |conn| {
        Box::pin(fetch_variables(conn, options))
    })
    .await;

    match result {
        Ok(variables) => respond(&json!({
            "app_id": params.app_id,
            "variables": variables,
            "count": variables.len(),
            "retrieved_at": timestamp(),
            "options": {
                "include_definition": options.include_definition,
                "include_tags": options.include_tags,
                "show_reserved": options.show_reserved,
                "show_config": options.show_config
            }
        })),
        Err(e) => failure("get_app_variables", &e, json!({"app_id": params.app_id})),
    }
}

// ============================================================================
// get_app_dimensions
// ============================================================================

#[derive(Debug, Deserialize)]
struct DimensionsParams {
    app_id: String,
    #[serde(default = "default_true")]
    include_title: bool,
    #[serde(default = "default_true")]
    include_tags: bool,
    #[serde(default = "default_true")]
    include_grouping: bool,
    #[serde(default = "default_true")]
    include_info: bool,
}

fn dimensions_tool() -> RegisteredTool {
    ToolBuilder::new("get_app_dimensions")
        .description("Retrieve all master dimensions from a Qlik Sense application")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "app_id": app_id_property(),
                "include_title": flag("Include dimension titles", true),
                "include_tags": flag("Include dimension tags", true),
                "include_grouping": flag("Include dimension grouping information", true),
                "include_info": flag("Include detailed dimension information", true)
            },
            "required": ["app_id"]
        }))
        .build(dimensions_handler)
}

async fn dimensions_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DimensionsParams = parse_args(params)?;
    require_id("app_id", &params.app_id)?;

    let options = DimensionOptions {
        include_title: params.include_title,
        include_tags: params.include_tags,
        include_grouping: params.include_grouping,
        include_info: params.include_info,
    };
    let result = with_document(ctx.connector.as_ref(), &params.app_id, |conn| {
        Box::pin(fetch_dimensions(conn, options))
    })
    .await;

    match result {
        Ok(dimensions) => respond(&json!({
            "app_id": params.app_id,
            "dimensions": dimensions,
            "dimension_count": dimensions.len(),
            "retrieved_at": timestamp(),
            "options": {
                "include_title": options.include_title,
                "include_tags": options.include_tags,
                "include_grouping": options.include_grouping,
                "include_info": options.include_info
            }
        })),
        Err(e) => failure("get_app_dimensions", &e, json!({"app_id": params.app_id})),
    }
}
