//! Tool registry trait for the MCP server.
//!
//! The server only knows about [`ToolRegistry`]: it lists whatever the
//! registry advertises and hands every call to it. The store-backed
//! implementation is [`Dispatcher`](crate::Dispatcher).

use rmcp::model::{CallToolResult, ErrorData, Tool};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

/// Type alias for async tool handler results.
pub type ToolResult = Pin<Box<dyn Future<Output = Result<CallToolResult, ErrorData>> + Send>>;

/// Trait for listing and dispatching MCP tools.
pub trait ToolRegistry: Send + Sync {
    /// Returns information about all available tools.
    fn tools(&self) -> Vec<Tool>;

    /// Dispatches a tool call by name.
    ///
    /// Returns `None` if the tool is not recognized by this registry.
    fn call(&self, name: &str, args: Option<Map<String, Value>>) -> Option<ToolResult>;

    /// Returns the number of registered tools.
    fn tool_count(&self) -> usize {
        self.tools().len()
    }

    /// Check if a tool exists by name.
    fn has_tool(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name == name)
    }
}
