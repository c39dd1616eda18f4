//! MCP server exposing a Redis command surface as tools.
//!
//! Each tool maps to one store command. Arguments are validated against the
//! same field table that produces the advertised JSON Schema, the command is
//! run through the connection manager, and the reply is rendered as a single
//! text response.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      kvbridge-mcp                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  tools::TOOLS - the tool table (24 tools, 6 families)       │
//! │  ToolDefinition / FieldSpec - schema + validation           │
//! │  OneOrMany / Items - scalar-or-array normalization          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Dispatcher - lookup → validate → execute → render          │
//! │  ToolRegistry trait - what the server delegates to          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  KvbridgeServer - rmcp ServerHandler over stdio             │
//! │  McpErrorExt - kvbridge_core::Error → rmcp::ErrorData       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  config - defaults < TOML < env < CLI                       │
//! │  lifecycle - startup, shutdown triggers, exit codes         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use kvbridge_mcp::{Dispatcher, KvbridgeServer};
//! use kvbridge_store::{ConnectionManager, ReconnectPolicy, RedisConnector};
//!
//! let manager = ConnectionManager::new(
//!     RedisConnector::new("redis://localhost:6379")?,
//!     ReconnectPolicy::default(),
//! );
//! manager.start().await?;
//!
//! KvbridgeServer::new(Dispatcher::new(manager))
//!     .serve_stdio()
//!     .await?
//!     .waiting()
//!     .await?;
//! ```

pub mod args;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod schema;
pub mod server;
pub mod tools;

// Re-exports - tools
pub use args::{Items, OneOrMany, Shape, ValidatedArguments};
pub use schema::{FieldSpec, FieldType, ToolDefinition};

// Re-exports - dispatch
pub use dispatcher::Dispatcher;
pub use registry::{ToolRegistry, ToolResult};

// Re-exports - server
pub use error::McpErrorExt;
pub use server::KvbridgeServer;

// Re-exports - process
pub use config::{Cli, ServerConfig};
pub use lifecycle::Shutdown;
