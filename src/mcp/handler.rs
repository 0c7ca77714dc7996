//! MCP stdio Handler
//!
//! Reads newline-delimited JSON-RPC messages from the client and writes one
//! response line per request. Logging goes to stderr; stdout carries only
//! protocol traffic.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use super::context::ToolContext;
use super::protocol::{
    methods, InitializeParams, InitializeResult, McpError, McpRequest, McpResponse, PingResult,
    RequestId, ResourcesCapability, ResourcesListResult, ResourcesReadParams,
    ResourcesReadResult, ServerCapabilities, ServerInfo, ToolsCallParams, ToolsCapability,
    ToolsListResult, MCP_PROTOCOL_VERSION,
};
use super::registry::McpRegistry;

/// One MCP session with one client.
pub struct McpServer {
    registry: McpRegistry,
    context: ToolContext,
    initialized: bool,
    shutdown_requested: bool,
}

impl McpServer {
    /// Server with every tool and resource registered.
    pub fn new(context: ToolContext) -> Self {
        let mut registry = McpRegistry::new();
        super::tools::register_all_tools(&mut registry);
        super::resources::register_all_resources(&mut registry);

        info!(
            "MCP registry initialized with {} tools and {} resources",
            registry.tool_count(),
            registry.resource_count()
        );

        Self::with_registry(registry, context)
    }

    pub fn with_registry(registry: McpRegistry, context: ToolContext) -> Self {
        Self {
            registry,
            context,
            initialized: false,
            shutdown_requested: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Serve until the client closes its end or asks to shut down.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        debug!("MCP session started");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                match serde_json::to_string(&response) {
                    Ok(mut json) => {
                        json.push('\n');
                        writer.write_all(json.as_bytes()).await?;
                        writer.flush().await?;
                    }
                    Err(e) => {
                        error!("Failed to serialize MCP response: {}", e);
                    }
                }
            }

            if self.shutdown_requested {
                info!("Shutdown requested by client");
                break;
            }
        }

        debug!("MCP session ended");
        Ok(())
    }

    /// Handle a single MCP message. Notifications yield no response.
    pub async fn handle_message(&mut self, text: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                return Some(McpResponse::error(
                    None,
                    McpError::ParseError(e.to_string()),
                ));
            }
        };

        let request: McpRequest = match serde_json::from_value(value.clone()) {
            Ok(req) => req,
            Err(e) => {
                let id = value
                    .get("id")
                    .cloned()
                    .and_then(|id| serde_json::from_value::<RequestId>(id).ok());
                return Some(McpResponse::error(
                    id,
                    McpError::InvalidRequest(e.to_string()),
                ));
            }
        };

        let Some(request_id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(&request),
            methods::PING => handle_ping(),
            methods::SHUTDOWN => {
                self.shutdown_requested = true;
                Ok(serde_json::json!({}))
            }
            methods::TOOLS_LIST
            | methods::TOOLS_CALL
            | methods::RESOURCES_LIST
            | methods::RESOURCES_READ
                if !self.initialized =>
            {
                Err(McpError::InvalidRequest("Not initialized".to_string()))
            }
            methods::TOOLS_LIST => self.handle_tools_list(),
            methods::TOOLS_CALL => self.handle_tools_call(&request).await,
            methods::RESOURCES_LIST => self.handle_resources_list(),
            methods::RESOURCES_READ => self.handle_resources_read(&request).await,
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => McpResponse::success(request_id, value),
            Err(error) => {
                debug!("{} failed: {}", request.method, error.message());
                McpResponse::error(Some(request_id), error)
            }
        })
    }

    fn handle_notification(&mut self, request: &McpRequest) {
        match request.method.as_str() {
            methods::INITIALIZED => debug!("Client finished initialization"),
            methods::CANCELLED => debug!("Client cancelled a request"),
            other => debug!("Ignoring notification {}", other),
        }
    }

    fn handle_initialize(&mut self, request: &McpRequest) -> Result<Value, McpError> {
        let params: InitializeParams = parse_params(request)?.unwrap_or_default();

        if let Some(client) = &params.client_info {
            info!(
                "MCP client {} {} connected",
                client.name,
                client.version.as_deref().unwrap_or("")
            );
        }
        if let Some(version) = &params.protocol_version {
            if version != MCP_PROTOCOL_VERSION {
                warn!(
                    "Client requested protocol {}, answering with {}",
                    version, MCP_PROTOCOL_VERSION
                );
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                resources: Some(ResourcesCapability {
                    subscribe: Some(false),
                    list_changed: None,
                }),
            },
            server_info: ServerInfo {
                name: self.context.server_name.clone(),
                version: self.context.server_version.clone(),
            },
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, McpError> {
        let result = ToolsListResult {
            tools: self.registry.tool_definitions(),
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: ToolsCallParams = parse_params(request)?
            .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

        let tool = self
            .registry
            .get_tool(&params.name)
            .ok_or_else(|| McpError::MethodNotFound(format!("Unknown tool: {}", params.name)))?;

        info!("Calling tool {}", tool.name);
        let arguments = params.arguments.unwrap_or(serde_json::json!({}));
        let result = (tool.handler)(self.context.clone(), arguments).await?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_resources_list(&self) -> Result<Value, McpError> {
        let result = ResourcesListResult {
            resources: self.registry.resource_definitions(),
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_resources_read(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: ResourcesReadParams = parse_params(request)?
            .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

        let resource = self
            .registry
            .find_resource(&params.uri)
            .ok_or_else(|| McpError::ResourceNotFound(params.uri.clone()))?;

        let contents = (resource.handler)(self.context.clone(), params.uri).await?;
        let result = ResourcesReadResult { contents };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

fn handle_ping() -> Result<Value, McpError> {
    serde_json::to_value(PingResult {}).map_err(|e| McpError::InternalError(e.to_string()))
}

fn parse_params<T: serde::de::DeserializeOwned>(
    request: &McpRequest,
) -> Result<Option<T>, McpError> {
    request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))
}
