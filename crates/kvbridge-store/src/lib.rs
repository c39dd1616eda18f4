//! Store access for kvbridge.
//!
//! This crate owns the single connection to the key-value store and hides
//! the client library behind small seams.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      kvbridge-store                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Command / Reply - store-agnostic request and reply shapes  │
//! │  CommandExecutor - what the dispatcher depends on           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ConnectionManager - state machine + bounded reconnection   │
//! │  ReconnectPolicy - exponential delays (backon)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Connector / StoreConnection - connection seams             │
//! │  RedisConnector - production implementation (redis)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use kvbridge_store::{Command, CommandExecutor, ConnectionManager, ReconnectPolicy, RedisConnector};
//!
//! let connector = RedisConnector::new("redis://localhost:6379")?;
//! let manager = ConnectionManager::new(connector, ReconnectPolicy::default());
//! manager.start().await?;
//!
//! let reply = manager.execute(Command::new("GET").arg("greeting")).await?;
//! ```

pub mod command;
pub mod connector;
pub mod manager;
pub mod policy;

// Re-exports - commands
pub use command::{Command, CommandExecutor, Reply};

// Re-exports - connections
pub use connector::{Connector, RedisConnection, RedisConnector, StoreConnection, StoreFailure};
pub use manager::ConnectionManager;
pub use policy::ReconnectPolicy;
