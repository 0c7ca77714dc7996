//! Data Model Tools
//!
//! Fields, load script and data lineage of an application.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{app_id_property, default_true, failure, flag, parse_args, require_id, respond, timestamp};
use crate::engine::retrieval::{
    fetch_fields, fetch_lineage, fetch_script, FieldOptions, LineageOptions,
};
use crate::engine::with_document;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(fields_tool());
    registry.register_tool(script_tool());
    registry.register_tool(data_sources_tool());
}

// ============================================================================
// get_app_fields
// ============================================================================

#[derive(Debug, Deserialize)]
struct FieldsParams {
    app_id: String,
    #[serde(default = "default_true")]
    show_system: bool,
    #[serde(default = "default_true")]
    show_hidden: bool,
    #[serde(default = "default_true")]
    show_derived_fields: bool,
    #[serde(default = "default_true")]
    show_semantic: bool,
    #[serde(default = "default_true")]
    show_src_tables: bool,
    #[serde(default = "default_true")]
    show_implicit: bool,
}

fn fields_tool() -> RegisteredTool {
    ToolBuilder::new("get_app_fields")
        .description("Retrieve all fields and table information from a Qlik Sense application")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "app_id": app_id_property(),
                "show_system": flag("Include system fields", true),
                "show_hidden": flag("Include hidden fields", true),
                "show_derived_fields": flag("Include derived fields", true),
                "show_semantic": flag("Include semantic fields", true),
                "show_src_tables": flag("Include source table information", true),
                "show_implicit": flag("Include implicit fields", true)
            },
            "required": ["app_id"]
        }))
        .build(fields_handler)
}

async fn fields_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: FieldsParams = parse_args(params)?;
    require_id("app_id", &params.app_id)?;

    let options = FieldOptions {
        show_system: params.show_system,
        show_hidden: params.show_hidden,
        show_derived_fields: params.show_derived_fields,
        show_semantic: params.show_semantic,
        show_src_tables: params.show_src_tables,
        show_implicit: params.show_implicit,
    };
    let result = with_document(ctx.connector.as_ref(), &params.app_id, |conn| {
        Box::pin(fetch_fields(conn, options))
    })
    .await;

    match result {
        Ok(catalog) => respond(&json!({
            "app_id": params.app_id,
            "fields": catalog.fields,
            "field_count": catalog.fields.len(),
            "tables": catalog.tables,
            "table_count": catalog.tables.len(),
            "retrieved_at": timestamp(),
            "options": {
                "show_system": options.show_system,
                "show_hidden": options.show_hidden,
                "show_derived_fields": options.show_derived_fields,
                "show_semantic": options.show_semantic,
                "show_src_tables": options.show_src_tables,
                "show_implicit": options.show_implicit
            }
        })),
        Err(e) => failure("get_app_fields", &e, json!({"app_id": params.app_id})),
    }
}

// ============================================================================
// get_app_script
// ============================================================================

#[derive(Debug, Deserialize)]
struct ScriptParams {
    app_id: String,
    #[serde(default)]
    max_preview_length: Option<usize>,
}

fn script_tool() -> RegisteredTool {
    ToolBuilder::new("get_app_script")
        .description("Retrieve the load script of a Qlik Sense application")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "app_id": app_id_property(),
                "max_preview_length": {
                    "type": "integer",
                    "description": "Return at most this many characters of the script",
                    "minimum": 0
                }
            },
            "required": ["app_id"]
        }))
        .build(script_handler)
}

/// First `max_chars` characters of `text`, and whether anything was cut.
fn preview(text: &str, max_chars: Option<usize>) -> (&str, bool) {
    let Some(max_chars) = max_chars else {
        return (text, false);
    };
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => (&text[..end], true),
        None => (text, false),
    }
}

async fn script_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ScriptParams = parse_args(params)?;
    require_id("app_id", &params.app_id)?;

    let result = with_document(ctx.connector.as_ref(), &params.app_id, |conn| {
        Box::pin(fetch_script(conn))
    })
    .await;

    match result {
        Ok(record) => {
            let (script, is_truncated) = preview(&record.script, params.max_preview_length);
            respond(&json!({
                "app_id": params.app_id,
                "script": script,
                "script_length": record.script_length,
                "is_truncated": is_truncated,
                "retrieved_at": timestamp(),
            }))
        }
        Err(e) => failure("get_app_script", &e, json!({"app_id": params.app_id})),
    }
}

// ============================================================================
// get_app_data_sources
// ============================================================================

#[derive(Debug, Deserialize)]
struct DataSourcesParams {
    app_id: String,
    #[serde(default = "default_true")]
    include_resident: bool,
    #[serde(default = "default_true")]
    include_file_sources: bool,
    #[serde(default = "default_true")]
    include_binary_sources: bool,
    #[serde(default = "default_true")]
    include_inline_sources: bool,
}

fn data_sources_tool() -> RegisteredTool {
    ToolBuilder::new("get_app_data_sources")
        .description(
            "Retrieve the data sources of a Qlik Sense application from its load lineage, \
             grouped into binary, resident, file, inline and other sources",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "app_id": app_id_property(),
                "include_resident": flag("Include RESIDENT data sources", true),
                "include_file_sources": flag("Include file-based data sources", true),
                "include_binary_sources": flag("Include binary data sources", true),
                "include_inline_sources": flag("Include inline data sources", true)
            },
            "required": ["app_id"]
        }))
        .build(data_sources_handler)
}

async fn data_sources_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DataSourcesParams = parse_args(params)?;
    require_id("app_id", &params.app_id)?;

    let options = LineageOptions {
        include_resident: params.include_resident,
        include_file_sources: params.include_file_sources,
        include_binary_sources: params.include_binary_sources,
        include_inline_sources: params.include_inline_sources,
    };
    let result = with_document(ctx.connector.as_ref(), &params.app_id, |conn| {
        Box::pin(fetch_lineage(conn, options))
    })
    .await;

    match result {
        Ok(report) => respond(&json!({
            "app_id": params.app_id,
            "data_sources": report.data_sources,
            "source_count": report.data_sources.len(),
            "categories": report.category_counts(),
            "by_category": report.by_category(),
            "retrieved_at": timestamp(),
            "options": {
                "include_resident": options.include_resident,
                "include_file_sources": options.include_file_sources,
                "include_binary_sources": options.include_binary_sources,
                "include_inline_sources": options.include_inline_sources
            }
        })),
        Err(e) => failure("get_app_data_sources", &e, json!({"app_id": params.app_id})),
    }
}
