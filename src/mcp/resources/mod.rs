//! MCP Resources
//!
//! Read-only views of the server's own state.

pub mod config;

use super::registry::McpRegistry;

/// Register all resources with the registry
pub fn register_all_resources(registry: &mut McpRegistry) {
    config::register_resources(registry);
}
