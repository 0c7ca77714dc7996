//! MCP Tool Execution Context
//!
//! What tool and resource handlers get to work with.

use std::sync::Arc;
use std::time::Instant;

use crate::engine::{EngineConnector, EngineSettings};

/// Context provided to tool and resource handlers during execution
#[derive(Clone)]
pub struct ToolContext {
    /// Opens one engine connection per tool call
    pub connector: Arc<dyn EngineConnector>,

    pub server_name: String,

    /// Server version info
    pub server_version: String,

    /// Server start time (for uptime calculation)
    pub start_time: Instant,
}

impl ToolContext {
    pub fn settings(&self) -> &EngineSettings {
        self.connector.settings()
    }
}
