//! Config Resources
//!
//! The engine settings this server connects with.

use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ResourceContent};
use crate::mcp::registry::{McpRegistry, RegisteredResource, ResourceBuilder, ResourceResult};

pub const ENGINE_CONFIG_URI: &str = "config://engine";

pub fn register_resources(registry: &mut McpRegistry) {
    registry.register_resource(engine_config_resource());
}

// ============================================================================
// config://engine
// ============================================================================

fn engine_config_resource() -> RegisteredResource {
    ResourceBuilder::new(ENGINE_CONFIG_URI, "Engine Configuration")
        .description("Engine connection settings (read-only view)")
        .mime_type("application/json")
        .build(engine_config_handler)
}

async fn engine_config_handler(ctx: ToolContext, uri: String) -> ResourceResult {
    let settings = ctx.settings();

    // Certificate paths are reported, their contents never are
    let config_view = serde_json::json!({
        "engine": {
            "endpoint": settings.endpoint(),
            "host": settings.host,
            "port": settings.port,
            "user_directory": settings.identity.user_directory,
            "user_id": settings.identity.user_id,
            "connect_timeout_secs": settings.connect_timeout.as_secs(),
            "recv_timeout_secs": settings.session.recv_timeout.as_secs(),
            "destroy_session_objects": settings.session.destroy_session_objects,
        },
        "tls": {
            "root_ca": settings.tls.root_ca.display().to_string(),
            "client_cert": settings.tls.client_cert.display().to_string(),
            "client_key": settings.tls.client_key.display().to_string(),
        },
        "runtime": {
            "server_name": ctx.server_name.clone(),
            "version": ctx.server_version.clone(),
            "uptime_secs": ctx.start_time.elapsed().as_secs(),
        }
    });

    let text = serde_json::to_string_pretty(&config_view)
        .map_err(|e| McpError::InternalError(e.to_string()))?;

    Ok(vec![ResourceContent {
        uri,
        mime_type: Some("application/json".to_string()),
        text,
    }])
}
