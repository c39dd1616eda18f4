//! Process lifecycle: connect, serve, and shut down.
//!
//! The store connection is established before the transport starts, so a
//! client never sees a server whose store is unreachable at startup. After
//! that the process runs until one of three things happens: a termination
//! signal, the client closing the transport, or the connection manager
//! giving up on the store. Each maps to an exit code.

use kvbridge_store::{ConnectionManager, Connector, RedisConnector};
use std::future::Future;

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::server::KvbridgeServer;

/// Why the server stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shutdown {
    /// SIGINT or SIGTERM
    Signal,
    /// The client closed stdin or the transport failed
    TransportClosed,
    /// Reconnection attempts were exhausted
    StoreUnavailable,
}

impl Shutdown {
    /// Process exit status for this outcome.
    pub fn exit_code(self) -> u8 {
        match self {
            Shutdown::Signal | Shutdown::TransportClosed => 0,
            Shutdown::StoreUnavailable => 1,
        }
    }
}

/// Run the server over stdio until it shuts down.
pub async fn run(config: &ServerConfig) -> anyhow::Result<Shutdown> {
    let connector =
        RedisConnector::new(&config.redis_url)?.with_response_timeout(config.command_timeout());
    let manager = ConnectionManager::new(connector, config.reconnect.policy());

    if let Some(shutdown) = connect(&manager, shutdown_signal()).await {
        return Ok(shutdown);
    }

    let server = KvbridgeServer::new(Dispatcher::new(manager.clone()));
    let running = server.serve_stdio().await?;
    let cancel = running.cancellation_token();

    let transport_closed = async move {
        match running.waiting().await {
            Ok(reason) => log::info!("Transport closed: {reason:?}"),
            Err(e) => log::warn!("Transport task failed: {e}"),
        }
    };
    let shutdown = supervise(&manager, transport_closed, shutdown_signal()).await;

    cancel.cancel();
    manager.close().await;
    log::info!("Shut down ({shutdown:?})");
    Ok(shutdown)
}

/// Establish the initial store connection.
///
/// Returns the shutdown outcome if the store could not be reached or
/// `signal` fired before the connection was up.
pub async fn connect<C, S>(manager: &ConnectionManager<C>, signal: S) -> Option<Shutdown>
where
    C: Connector,
    S: Future<Output = ()>,
{
    let outcome = tokio::select! {
        result = manager.start() => match result {
            Ok(()) => return None,
            Err(e) => {
                log::error!("Store unavailable at startup: {e}");
                Shutdown::StoreUnavailable
            }
        },
        _ = signal => {
            log::info!("Termination signal received during startup");
            Shutdown::Signal
        }
    };
    manager.close().await;
    Some(outcome)
}

/// Wait for whichever shutdown trigger fires first.
pub async fn supervise<C, T, S>(
    manager: &ConnectionManager<C>,
    transport_closed: T,
    signal: S,
) -> Shutdown
where
    C: Connector,
    T: Future<Output = ()>,
    S: Future<Output = ()>,
{
    tokio::select! {
        _ = signal => {
            log::info!("Termination signal received");
            Shutdown::Signal
        }
        _ = transport_closed => Shutdown::TransportClosed,
        _ = manager.exhausted() => {
            log::error!("Store connection lost and could not be re-established");
            Shutdown::StoreUnavailable
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
