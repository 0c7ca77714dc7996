//! Qlik Engine MCP Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod engine;
pub mod mcp;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use engine::{EngineConnector, EngineError, EngineSettings, TlsEngineConnector};
pub use mcp::{McpServer, ToolContext};
