//! MCP server implementation.
//!
//! [`KvbridgeServer`] implements rmcp's `ServerHandler` by delegating
//! `tools/list` and `tools/call` to a [`ToolRegistry`].

use kvbridge_core::Error;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RunningService, ServerInitializeError};
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use std::sync::Arc;

use crate::error::McpErrorExt;
use crate::registry::ToolRegistry;

/// Instructions sent to clients in the `initialize` response.
pub const INSTRUCTIONS: &str = "Key-value store tools backed by Redis. \
    Use set/get/delete/list/incr/expire for plain keys, hset/hget/hgetall for hashes, \
    lpush/rpush/lpop/rpop/lrange for lists, sadd/srem/smembers for sets, \
    zadd/zrange/zrem/zscore/zrank for sorted sets, and publish/pubsub_channels for messaging. \
    delete, lpush, rpush, sadd, srem and zrem accept a single value or an array.";

/// MCP server exposing a tool registry.
pub struct KvbridgeServer<R> {
    registry: Arc<R>,
    name: String,
    version: String,
}

impl<R> Clone for KvbridgeServer<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

impl<R: ToolRegistry + 'static> KvbridgeServer<R> {
    /// Create a server for `registry`, named after this crate.
    pub fn new(registry: R) -> Self {
        Self {
            registry: Arc::new(registry),
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the server name reported to clients.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The registry backing this server.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Serve MCP over stdin/stdout.
    pub async fn serve_stdio(
        self,
    ) -> std::result::Result<RunningService<RoleServer, Self>, ServerInitializeError> {
        log::info!(
            "Serving {} tools over stdio as {}",
            self.registry.tool_count(),
            self.name
        );
        self.serve(rmcp::transport::stdio()).await
    }
}

impl<R: ToolRegistry + 'static> ServerHandler for KvbridgeServer<R> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(Implementation::new(&self.name, &self.version))
            .with_instructions(INSTRUCTIONS)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.registry.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.registry.call(&request.name, request.arguments) {
            Some(result) => result.await,
            None => {
                log::warn!("Unknown tool requested: {}", request.name);
                Err(Error::unknown_tool(request.name.to_string()).to_mcp_error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolResult;
    use rmcp::model::Tool;
    use serde_json::{Map, Value};

    struct EmptyRegistry;

    impl ToolRegistry for EmptyRegistry {
        fn tools(&self) -> Vec<Tool> {
            Vec::new()
        }

        fn call(&self, _name: &str, _args: Option<Map<String, Value>>) -> Option<ToolResult> {
            None
        }
    }

    #[test]
    fn test_server_info() {
        let server = KvbridgeServer::new(EmptyRegistry);
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.instructions.as_deref(), Some(INSTRUCTIONS));
        assert_eq!(info.server_info.name, "kvbridge-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_with_name() {
        let server = KvbridgeServer::new(EmptyRegistry).with_name("cache-tools");
        assert_eq!(server.get_info().server_info.name, "cache-tools");
        assert_eq!(server.registry().tool_count(), 0);
    }

    #[test]
    fn test_instructions_mention_dual_shape_tools() {
        for tool in ["delete", "lpush", "rpush", "sadd", "srem", "zrem"] {
            assert!(INSTRUCTIONS.contains(tool), "{tool}");
        }
    }
}
