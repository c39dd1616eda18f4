//! Connection manager.
//!
//! Owns the single store connection and its [`StateHandle`]. Commands run
//! only while the state is `Connected`; anything else fails immediately with
//! `NotConnected`. A transport failure during a command moves the state to
//! `Connecting` and starts one background reconnection cycle that follows
//! the [`ReconnectPolicy`]. If every attempt fails the state becomes
//! `ReconnectExhausted`, which is terminal.

use async_trait::async_trait;
use kvbridge_core::{ConnectionState, Error, Result, StateHandle};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::command::{Command, CommandExecutor, Reply};
use crate::connector::{Connector, StoreConnection, StoreFailure};
use crate::policy::ReconnectPolicy;

/// Owner of the store connection.
///
/// Cheap to clone; clones share the same connection and state.
pub struct ConnectionManager<C: Connector> {
    inner: Arc<Shared<C>>,
}

struct Shared<C: Connector> {
    connector: C,
    policy: ReconnectPolicy,
    state: StateHandle,
    connection: Mutex<Option<C::Connection>>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager. No connection is opened until [`start`](Self::start).
    pub fn new(connector: C, policy: ReconnectPolicy) -> Self {
        let state = StateHandle::new(connector.target());
        Self {
            inner: Arc::new(Shared {
                connector,
                policy,
                state,
                connection: Mutex::new(None),
                reconnect_task: Mutex::new(None),
            }),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state.state()
    }

    /// Handle for observing state changes.
    pub fn state_handle(&self) -> &StateHandle {
        &self.inner.state
    }

    /// Establish the initial connection.
    ///
    /// If the first attempt fails, the regular reconnection schedule is
    /// followed. Returns `ReconnectExhausted` when that fails too.
    pub async fn start(&self) -> Result<()> {
        let target = self.inner.connector.target();
        log::info!("Connecting to {target}");
        self.inner.state.set_state(ConnectionState::Connecting);

        match self.inner.connector.connect().await {
            Ok(conn) => {
                self.install(conn).await;
                Ok(())
            }
            Err(e) => {
                log::warn!("Initial connection to {target} failed: {e}");
                self.reconnect_cycle().await
            }
        }
    }

    /// Wait until the retry budget has been spent.
    pub async fn exhausted(&self) {
        self.inner.state.wait_for(ConnectionState::is_exhausted).await;
    }

    /// Close the connection (best effort) and stop any reconnection cycle.
    pub async fn close(&self) {
        if let Some(task) = self.inner.reconnect_task.lock().await.take() {
            task.abort();
        }
        let had_connection = self.inner.connection.lock().await.take().is_some();
        self.inner.state.set_state(ConnectionState::Disconnected);
        if had_connection {
            log::info!("Connection to {} closed", self.inner.connector.target());
        }
    }

    async fn install(&self, conn: C::Connection) {
        *self.inner.connection.lock().await = Some(conn);
        if self.inner.state.set_state(ConnectionState::Connected) {
            log::info!("Connected to {}", self.inner.connector.target());
        }
    }

    /// Start a background reconnection cycle unless one is already running.
    async fn begin_reconnect(&self) {
        if !self
            .inner
            .state
            .transition(ConnectionState::Connected, ConnectionState::Connecting)
        {
            return;
        }
        let manager = self.clone();
        let task = tokio::spawn(async move {
            // Exhaustion is reported through the state handle.
            let _ = manager.reconnect_cycle().await;
        });
        *self.inner.reconnect_task.lock().await = Some(task);
    }

    async fn reconnect_cycle(&self) -> Result<()> {
        let target = self.inner.connector.target();
        let max = self.inner.policy.max_attempts();
        let mut attempts = 0;

        for delay in self.inner.policy.delays() {
            attempts += 1;
            log::info!("Reconnecting to {target} in {delay:?} (attempt {attempts}/{max})");
            tokio::time::sleep(delay).await;

            if self.state() != ConnectionState::Connecting {
                // Closed while we were waiting.
                return Ok(());
            }

            match self.inner.connector.connect().await {
                Ok(conn) => {
                    self.install(conn).await;
                    return Ok(());
                }
                Err(e) => log::warn!("Reconnection attempt {attempts}/{max} failed: {e}"),
            }
        }

        self.inner
            .state
            .set_state(ConnectionState::ReconnectExhausted);
        log::error!("Giving up on {target} after {attempts} reconnection attempts");
        Err(Error::ReconnectExhausted { attempts })
    }
}

#[async_trait]
impl<C: Connector> CommandExecutor for ConnectionManager<C> {
    async fn execute(&self, command: Command) -> Result<Reply> {
        let state = self.state();
        if !state.is_connected() {
            return Err(Error::NotConnected { state });
        }

        let mut guard = self.inner.connection.lock().await;
        let Some(conn) = guard.as_mut() else {
            return Err(Error::NotConnected {
                state: self.state(),
            });
        };

        match conn.send(&command).await {
            Ok(reply) => Ok(reply),
            Err(StoreFailure::Server(message)) => Err(Error::Upstream { message }),
            Err(StoreFailure::Transport(message)) => {
                guard.take();
                drop(guard);
                log::warn!("Connection lost during {}: {message}", command.name());
                self.begin_reconnect().await;
                Err(Error::NotConnected {
                    state: self.state(),
                })
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    // -- Scripted connector -------------------------------------------------

    /// Connect outcomes are popped in order; once the script runs out every
    /// attempt fails. Command replies are popped the same way and default to
    /// `OK`.
    #[derive(Clone, Default)]
    struct ScriptedConnector {
        connects: Arc<std::sync::Mutex<VecDeque<bool>>>,
        replies: Arc<std::sync::Mutex<VecDeque<std::result::Result<Reply, StoreFailure>>>>,
        attempts: Arc<AtomicU32>,
    }

    impl ScriptedConnector {
        fn with_connects(outcomes: &[bool]) -> Self {
            let connector = Self::default();
            connector.connects.lock().unwrap().extend(outcomes);
            connector
        }

        fn push_reply(&self, reply: std::result::Result<Reply, StoreFailure>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    struct ScriptedConnection {
        replies: Arc<std::sync::Mutex<VecDeque<std::result::Result<Reply, StoreFailure>>>>,
    }

    #[async_trait]
    impl StoreConnection for ScriptedConnection {
        async fn send(&mut self, _command: &Command) -> std::result::Result<Reply, StoreFailure> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Reply::Status("OK".into())))
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        type Connection = ScriptedConnection;

        async fn connect(&self) -> std::result::Result<ScriptedConnection, StoreFailure> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let ok = self.connects.lock().unwrap().pop_front().unwrap_or(false);
            if ok {
                Ok(ScriptedConnection {
                    replies: Arc::clone(&self.replies),
                })
            } else {
                Err(StoreFailure::Transport("connection refused".into()))
            }
        }

        fn target(&self) -> String {
            "redis://scripted:6379".to_string()
        }
    }

    fn manager(connector: &ScriptedConnector) -> ConnectionManager<ScriptedConnector> {
        ConnectionManager::new(connector.clone(), ReconnectPolicy::default())
    }

    // -- Startup ------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_start_connects_first_try() {
        let connector = ScriptedConnector::with_connects(&[true]);
        let mgr = manager(&connector);

        mgr.start().await.unwrap();
        assert_eq!(mgr.state(), ConnectionState::Connected);
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_retries_with_backoff() {
        let connector = ScriptedConnector::with_connects(&[false, false, true]);
        let mgr = manager(&connector);
        let started = Instant::now();

        mgr.start().await.unwrap();
        assert_eq!(mgr.state(), ConnectionState::Connected);
        assert_eq!(connector.attempts(), 3);
        // 1s + 2s of backoff
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_exhausts_after_budget() {
        let connector = ScriptedConnector::with_connects(&[]);
        let mgr = manager(&connector);
        let started = Instant::now();

        let err = mgr.start().await.unwrap_err();
        assert!(matches!(err, Error::ReconnectExhausted { attempts: 5 }));
        assert_eq!(mgr.state(), ConnectionState::ReconnectExhausted);
        // Initial attempt plus five reconnection attempts, no sixth.
        assert_eq!(connector.attempts(), 6);
        // 1 + 2 + 4 + 8 + 16 seconds
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(31));
        assert!(elapsed < Duration::from_secs(32));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(connector.attempts(), 6);
    }

    // -- Command execution --------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_execute_before_start_fails_fast() {
        let connector = ScriptedConnector::with_connects(&[true]);
        let mgr = manager(&connector);

        let err = mgr.execute(Command::new("GET").arg("a")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotConnected {
                state: ConnectionState::Disconnected
            }
        ));
        assert_eq!(connector.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_returns_reply() {
        let connector = ScriptedConnector::with_connects(&[true]);
        connector.push_reply(Ok(Reply::Bulk("1".into())));
        let mgr = manager(&connector);
        mgr.start().await.unwrap();

        let reply = mgr.execute(Command::new("GET").arg("a")).await.unwrap();
        assert_eq!(reply, Reply::Bulk("1".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_is_upstream_and_not_retried() {
        let connector = ScriptedConnector::with_connects(&[true]);
        connector.push_reply(Err(StoreFailure::Server(
            "WRONGTYPE Operation against a key holding the wrong kind of value".into(),
        )));
        let mgr = manager(&connector);
        mgr.start().await.unwrap();

        let err = mgr.execute(Command::new("LPUSH").arg("s")).await.unwrap_err();
        let Error::Upstream { message } = err else {
            unreachable!("Expected Upstream error");
        };
        assert!(message.starts_with("WRONGTYPE"));
        assert_eq!(mgr.state(), ConnectionState::Connected);
        assert_eq!(connector.attempts(), 1);

        // Connection remains usable
        assert!(mgr.execute(Command::new("PING")).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_triggers_reconnect() {
        let connector = ScriptedConnector::with_connects(&[true, false, true]);
        connector.push_reply(Err(StoreFailure::Transport("broken pipe".into())));
        let mgr = manager(&connector);
        mgr.start().await.unwrap();

        let err = mgr.execute(Command::new("GET").arg("a")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotConnected {
                state: ConnectionState::Connecting
            }
        ));

        // Commands during reconnection fail fast rather than queueing
        let err = mgr.execute(Command::new("GET").arg("a")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotConnected {
                state: ConnectionState::Connecting
            }
        ));

        mgr.state_handle()
            .wait_for(ConnectionState::is_connected)
            .await;
        assert_eq!(connector.attempts(), 3);
        assert!(mgr.execute(Command::new("PING")).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_exhaustion_is_terminal() {
        let connector = ScriptedConnector::with_connects(&[true]);
        connector.push_reply(Err(StoreFailure::Transport("connection reset".into())));
        let mgr = manager(&connector);
        mgr.start().await.unwrap();

        let _ = mgr.execute(Command::new("GET").arg("a")).await;
        mgr.exhausted().await;

        assert_eq!(mgr.state(), ConnectionState::ReconnectExhausted);
        // One initial connect plus exactly five reconnection attempts
        assert_eq!(connector.attempts(), 6);

        let err = mgr.execute(Command::new("GET").arg("a")).await.unwrap_err();
        assert!(err.is_fatal());

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(connector.attempts(), 6);
    }

    // -- Shutdown -----------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_close_disconnects() {
        let connector = ScriptedConnector::with_connects(&[true]);
        let mgr = manager(&connector);
        mgr.start().await.unwrap();

        mgr.close().await;
        assert_eq!(mgr.state(), ConnectionState::Disconnected);

        let err = mgr.execute(Command::new("PING")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotConnected {
                state: ConnectionState::Disconnected
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_reconnection() {
        let connector = ScriptedConnector::with_connects(&[true]);
        connector.push_reply(Err(StoreFailure::Transport("eof".into())));
        let mgr = manager(&connector);
        mgr.start().await.unwrap();

        let _ = mgr.execute(Command::new("PING")).await;
        assert_eq!(mgr.state(), ConnectionState::Connecting);

        mgr.close().await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert_eq!(connector.attempts(), 1);
    }

    #[test]
    fn test_manager_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConnectionManager<crate::RedisConnector>>();
    }
}
