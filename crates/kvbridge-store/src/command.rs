//! Store commands and replies.
//!
//! [`Command`] is what the dispatcher asks the store to run; [`Reply`] is the
//! store's answer, decoupled from the client library's value type so that
//! renderers and tests never depend on `redis` directly.

use async_trait::async_trait;
use kvbridge_core::Result;
use std::fmt;

// ============================================================================
// Command
// ============================================================================

/// A single store command: a verb plus its textual arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    args: Vec<String>,
}

impl Command {
    /// Start a command with the given verb (e.g. `"SET"`).
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments, preserving their order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command verb.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The command arguments, in wire order.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Reply
// ============================================================================

/// A store reply, reduced to the shapes kvbridge renders.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Absent value (missing key, missing field, empty pop).
    Nil,
    /// Integer reply (counts, lengths, booleans in RESP2).
    Int(i64),
    /// Status reply such as `OK`.
    Status(String),
    /// Bulk string reply.
    Bulk(String),
    /// Floating point reply (RESP3 scores).
    Double(f64),
    /// Array or set reply.
    Array(Vec<Reply>),
    /// Map reply (RESP3 `HGETALL`).
    Map(Vec<(Reply, Reply)>),
}

impl Reply {
    /// Interpret the reply as an integer.
    pub fn into_int(self) -> std::result::Result<i64, Reply> {
        match self {
            Reply::Int(n) => Ok(n),
            other => Err(other),
        }
    }

    /// Interpret the reply as an optional piece of text.
    ///
    /// `Nil` becomes `None`; scalar replies become their textual form.
    pub fn into_text(self) -> std::result::Result<Option<String>, Reply> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Status(s) | Reply::Bulk(s) => Ok(Some(s)),
            Reply::Int(n) => Ok(Some(n.to_string())),
            Reply::Double(d) => Ok(Some(d.to_string())),
            other => Err(other),
        }
    }

    /// Interpret the reply as a list of text items.
    ///
    /// `Nil` is treated as an empty list.
    pub fn into_strings(self) -> std::result::Result<Vec<String>, Reply> {
        match self {
            Reply::Nil => Ok(Vec::new()),
            Reply::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item.into_text() {
                        Ok(Some(text)) => out.push(text),
                        Ok(None) => return Err(Reply::Nil),
                        Err(bad) => return Err(bad),
                    }
                }
                Ok(out)
            }
            other => Err(other),
        }
    }

    /// Interpret the reply as ordered key/value pairs.
    ///
    /// Accepts a RESP3 map or a RESP2 flat array of even length.
    pub fn into_pairs(self) -> std::result::Result<Vec<(String, String)>, Reply> {
        match self {
            Reply::Map(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    match (k.into_text(), v.into_text()) {
                        (Ok(Some(k)), Ok(Some(v))) => out.push((k, v)),
                        (Err(bad), _) | (_, Err(bad)) => return Err(bad),
                        _ => return Err(Reply::Nil),
                    }
                }
                Ok(out)
            }
            Reply::Array(items) if items.len() % 2 == 0 => {
                let flat = Reply::Array(items).into_strings()?;
                let mut out = Vec::with_capacity(flat.len() / 2);
                let mut iter = flat.into_iter();
                while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
                    out.push((k, v));
                }
                Ok(out)
            }
            Reply::Nil => Ok(Vec::new()),
            other => Err(other),
        }
    }
}

// ============================================================================
// CommandExecutor
// ============================================================================

/// Something that can run store commands.
///
/// Implemented by [`ConnectionManager`](crate::ConnectionManager); the
/// dispatcher depends only on this trait.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run one command and return the store's reply.
    async fn execute(&self, command: Command) -> Result<Reply>;
}
