//! Connection seams and the Redis implementation.
//!
//! The connection manager is generic over [`Connector`], so the reconnection
//! state machine can be exercised without a live store. [`RedisConnector`]
//! is the production implementation backed by the `redis` crate.

use async_trait::async_trait;
use kvbridge_core::{Error, Result};
use redis::{AsyncConnectionConfig, Value};
use std::time::Duration;

use crate::command::{Command, Reply};

/// Why a store round trip failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreFailure {
    /// The store answered with an error reply; the connection is still fine.
    #[error("{0}")]
    Server(String),

    /// The connection itself failed (refused, dropped, timed out).
    #[error("{0}")]
    Transport(String),
}

/// An established connection to the store.
#[async_trait]
pub trait StoreConnection: Send + 'static {
    /// Send one command and wait for its reply.
    async fn send(&mut self, command: &Command) -> std::result::Result<Reply, StoreFailure>;
}

/// Opens connections to the store.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connection type produced by this connector.
    type Connection: StoreConnection;

    /// Open a fresh connection.
    async fn connect(&self) -> std::result::Result<Self::Connection, StoreFailure>;

    /// Human-readable target, for logs.
    fn target(&self) -> String;
}

// ============================================================================
// Redis
// ============================================================================

/// Connector for a Redis server reachable over a connection URL.
#[derive(Clone, Debug)]
pub struct RedisConnector {
    client: redis::Client,
    target: String,
    response_timeout: Option<Duration>,
}

impl RedisConnector {
    /// Create a connector for `url` (e.g. `redis://localhost:6379`).
    ///
    /// Only parses the URL; no connection is opened.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            Error::config(format!(
                "Invalid Redis URL '{}': {e}",
                redact_credentials(url)
            ))
        })?;
        Ok(Self {
            client,
            target: redact_credentials(url),
            response_timeout: None,
        })
    }

    /// Bound how long a single command may wait for its reply.
    ///
    /// `None` (the default) waits indefinitely. A command that times out
    /// fails on its own; the connection stays in use.
    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// The configured per-command reply timeout.
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout
    }
}

/// Hide any `user:password@` part of a connection URL.
fn redact_credentials(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[async_trait]
impl Connector for RedisConnector {
    type Connection = RedisConnection;

    async fn connect(&self) -> std::result::Result<RedisConnection, StoreFailure> {
        let config = AsyncConnectionConfig::new().set_response_timeout(self.response_timeout);
        let conn = self
            .client
            .get_multiplexed_async_connection_with_config(&config)
            .await
            .map_err(classify)?;
        Ok(RedisConnection { conn })
    }

    fn target(&self) -> String {
        self.target.clone()
    }
}

/// A live Redis connection.
pub struct RedisConnection {
    conn: redis::aio::MultiplexedConnection,
}

#[async_trait]
impl StoreConnection for RedisConnection {
    async fn send(&mut self, command: &Command) -> std::result::Result<Reply, StoreFailure> {
        let mut cmd = redis::cmd(command.name());
        for arg in command.arguments() {
            cmd.arg(arg);
        }
        let value: Value = cmd
            .query_async(&mut self.conn)
            .await
            .map_err(classify_command)?;
        Ok(reply_from_value(value))
    }
}

/// Split client errors into connection failures and server error replies.
fn classify(err: redis::RedisError) -> StoreFailure {
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        StoreFailure::Transport(err.to_string())
    } else {
        StoreFailure::Server(err.to_string())
    }
}

/// Like [`classify`], but a reply timeout only fails the command.
///
/// The multiplexed connection discards the late reply and keeps serving
/// other requests, so a slow command must not trigger a reconnect.
fn classify_command(err: redis::RedisError) -> StoreFailure {
    if err.is_timeout() && !err.is_connection_dropped() {
        StoreFailure::Server(format!("Command timed out: {err}"))
    } else {
        classify(err)
    }
}

fn reply_from_value(value: Value) -> Reply {
    match value {
        Value::Nil => Reply::Nil,
        Value::Int(n) => Reply::Int(n),
        Value::BulkString(bytes) => Reply::Bulk(String::from_utf8_lossy(&bytes).into_owned()),
        Value::SimpleString(s) => Reply::Status(s),
        Value::Okay => Reply::Status("OK".to_string()),
        Value::Double(d) => Reply::Double(d),
        Value::Boolean(b) => Reply::Int(i64::from(b)),
        Value::VerbatimString { text, .. } => Reply::Bulk(text),
        Value::Array(items) | Value::Set(items) => {
            Reply::Array(items.into_iter().map(reply_from_value).collect())
        }
        Value::Map(entries) => Reply::Map(
            entries
                .into_iter()
                .map(|(k, v)| (reply_from_value(k), reply_from_value(v)))
                .collect(),
        ),
        other => Reply::Status(format!("{other:?}")),
    }
}
