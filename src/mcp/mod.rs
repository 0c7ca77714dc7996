//! MCP (Model Context Protocol) Server
//!
//! Exposes the engine retrieval procedures as MCP tools.
//!
//! ## Architecture
//!
//! - Transport: newline-delimited JSON-RPC over stdin/stdout
//! - Tools: one per retrieval procedure, each on its own engine connection
//! - Resources: read-only view of the engine configuration

pub mod context;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod tools;

pub use context::ToolContext;
pub use handler::McpServer;
pub use protocol::{McpError, McpRequest, McpResponse};
pub use registry::McpRegistry;
