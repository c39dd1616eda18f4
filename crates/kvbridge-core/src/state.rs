//! Connection lifecycle state.
//!
//! Provides [`ConnectionState`] and [`StateHandle`] for tracking the single
//! store connection owned by the connection manager.
//!
//! # Usage
//!
//! ```rust
//! use kvbridge_core::state::{ConnectionState, StateHandle};
//!
//! let handle = StateHandle::new("redis");
//! assert_eq!(handle.state(), ConnectionState::Disconnected);
//!
//! handle.set_state(ConnectionState::Connecting);
//! handle.set_state(ConnectionState::Connected);
//! assert!(handle.state().is_connected());
//! ```

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

// ============================================================================
// ConnectionState
// ============================================================================

/// State of the store connection.
///
/// ```text
/// Disconnected ──▶ Connecting ──▶ Connected
///                      ▲              │
///                      └── transport ─┘
///                          error
/// Connecting ──(retry budget spent)──▶ ReconnectExhausted   (terminal)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection, and none is being attempted.
    Disconnected,
    /// A connection attempt or reconnection cycle is in progress.
    Connecting,
    /// The connection is established and accepts commands.
    Connected,
    /// The reconnection budget was spent; the connection is gone for good.
    ReconnectExhausted,
}

impl ConnectionState {
    /// Returns `true` if commands may be executed.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` once the retry budget has been spent.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ReconnectExhausted)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::ReconnectExhausted => write!(f, "reconnect-exhausted"),
        }
    }
}

// ============================================================================
// StateHandle
// ============================================================================

/// Thread-safe handle for observing and updating the connection state.
///
/// Cheap to clone (Arc internals). State changes are broadcast to all
/// subscribers via a watch channel. `ReconnectExhausted` is terminal: once
/// reached, no later update is applied.
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<StateHandleInner>,
}

struct StateHandleInner {
    name: String,
    tx: watch::Sender<ConnectionState>,
}

impl StateHandle {
    /// Create a new handle with the given name.
    ///
    /// Initial state is [`ConnectionState::Disconnected`].
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(StateHandleInner {
                name: name.into(),
                tx,
            }),
        }
    }

    /// Get the connection name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the current state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.tx.borrow()
    }

    /// Update the state.
    ///
    /// Returns `false` (and changes nothing) when the current state is
    /// terminal.
    pub fn set_state(&self, state: ConnectionState) -> bool {
        let name = &self.inner.name;
        self.inner.tx.send_if_modified(|current| {
            if current.is_exhausted() || *current == state {
                return false;
            }
            log::debug!("Connection '{name}' {current} → {state}");
            *current = state;
            true
        })
    }

    /// Atomically move from `from` to `to`.
    ///
    /// Returns `true` if the transition happened. Used to make sure only one
    /// caller starts a reconnection cycle. Nothing leaves `ReconnectExhausted`.
    pub fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        let name = &self.inner.name;
        self.inner.tx.send_if_modified(|current| {
            if current.is_exhausted() || *current != from || from == to {
                return false;
            }
            log::debug!("Connection '{name}' {current} → {to}");
            *current = to;
            true
        })
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.tx.subscribe()
    }

    /// Wait until the state satisfies `predicate`, returning that state.
    pub async fn wait_for<F>(&self, predicate: F) -> ConnectionState
    where
        F: Fn(&ConnectionState) -> bool,
    {
        let mut rx = self.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if predicate(&state) {
                return state;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
