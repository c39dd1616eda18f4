//! Tool dispatch.
//!
//! Resolves a tool by name, validates its arguments, runs the resulting
//! command through a [`CommandExecutor`] and renders the reply. Lookup and
//! validation failures return before anything is sent to the store.

use kvbridge_core::{Error, Result};
use kvbridge_store::CommandExecutor;
use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::McpErrorExt;
use crate::registry::{ToolRegistry, ToolResult};
use crate::schema::ToolDefinition;
use crate::tools::{self, TOOLS};

/// Routes tool invocations to the store.
pub struct Dispatcher<E> {
    executor: Arc<E>,
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: CommandExecutor + 'static> Dispatcher<E> {
    /// Create a dispatcher that runs commands on `executor`.
    pub fn new(executor: E) -> Self {
        Self::with_shared(Arc::new(executor))
    }

    /// Create a dispatcher with a shared executor reference.
    pub fn with_shared(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Every tool, in registration order.
    pub fn definitions(&self) -> &'static [ToolDefinition] {
        TOOLS
    }

    /// Invoke a tool and return its response text.
    pub async fn dispatch(&self, name: &str, args: Option<&Map<String, Value>>) -> Result<String> {
        let tool = tools::find(name).ok_or_else(|| Error::unknown_tool(name))?;
        let validated = tool.validate(args)?;
        let command = (tool.command)(&validated)?;
        log::debug!("Tool {name} sending: {command}");
        let reply = self.executor.execute(command).await?;
        (tool.render)(&validated, reply)
    }
}

impl<E: CommandExecutor + 'static> ToolRegistry for Dispatcher<E> {
    fn tools(&self) -> Vec<Tool> {
        TOOLS.iter().map(ToolDefinition::to_tool).collect()
    }

    fn call(&self, name: &str, args: Option<Map<String, Value>>) -> Option<ToolResult> {
        tools::find(name)?;
        let dispatcher = self.clone();
        let name = name.to_string();
        Some(Box::pin(async move {
            match dispatcher.dispatch(&name, args.as_ref()).await {
                Ok(text) => {
                    log::info!("Tool {name} succeeded");
                    Ok(CallToolResult::success(vec![Content::text(text)]))
                }
                Err(e) => {
                    log::warn!("Tool {name} failed: {e}");
                    Err(e.to_mcp_error())
                }
            }
        }))
    }

    fn tool_count(&self) -> usize {
        TOOLS.len()
    }

    fn has_tool(&self, name: &str) -> bool {
        tools::find(name).is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
