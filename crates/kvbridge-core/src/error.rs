//! Error types shared by every kvbridge crate.
//!
//! The variants mirror the caller-visible failure taxonomy: lookup and
//! validation failures never reach the store, connection failures abort the
//! invocation, and store-reported failures are passed through verbatim.

use crate::state::ConnectionState;

/// Errors that can occur while serving a tool invocation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The invocation names a tool that is not registered.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// Tool name as received from the caller
        name: String,
    },

    /// Argument validation failed before anything was sent to the store.
    #[error("Invalid arguments: {field}: {reason}")]
    InvalidArguments {
        /// First offending field, in schema order
        field: String,
        /// What was wrong with it
        reason: String,
    },

    /// The store connection is not usable right now.
    #[error("Not connected to the store (connection is {state})")]
    NotConnected {
        /// Connection state observed when the command was refused
        state: ConnectionState,
    },

    /// The store accepted the request but answered with an error.
    #[error("Store error: {message}")]
    Upstream {
        /// Error text reported by the store
        message: String,
    },

    /// Every reconnection attempt failed.
    #[error("Reconnection failed after {attempts} attempts")]
    ReconnectExhausted {
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// The store answered with a reply shape the tool does not render.
    #[error("Unexpected reply for {tool}: {reply}")]
    UnexpectedReply {
        /// Tool whose renderer rejected the reply
        tool: String,
        /// Debug rendering of the reply
        reply: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error (config files, transport setup)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias used across kvbridge.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error ends the process rather than one invocation.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::ReconnectExhausted { .. } => true,
            Error::NotConnected { state } => state.is_exhausted(),
            _ => false,
        }
    }

    /// Returns whether the store was contacted before the error occurred.
    pub fn reached_store(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::UnexpectedReply { .. })
    }

    /// Creates an unknown-tool error.
    pub fn unknown_tool<S: Into<String>>(name: S) -> Self {
        Error::UnknownTool { name: name.into() }
    }

    /// Creates an argument validation error for a field.
    pub fn invalid_argument<F, R>(field: F, reason: R) -> Self
    where
        F: Into<String>,
        R: Into<String>,
    {
        Error::InvalidArguments {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a store-reported error.
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Error::Upstream {
            message: message.into(),
        }
    }

    /// Creates an unexpected-reply error.
    pub fn unexpected_reply<T, R>(tool: T, reply: R) -> Self
    where
        T: Into<String>,
        R: std::fmt::Debug,
    {
        Error::UnexpectedReply {
            tool: tool.into(),
            reply: format!("{reply:?}"),
        }
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}
