//! kvbridge Core - shared errors and connection state.
//!
//! This crate provides the foundational types used across all kvbridge
//! crates. It has no internal kvbridge dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`state`]: Connection state machine and its observable handle

pub mod error;
pub mod state;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use state::{ConnectionState, StateHandle};
