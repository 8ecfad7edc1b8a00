//! Listener and graceful shutdown.
//!
//! [`Server::bind`] binds eagerly, so a port that cannot be bound fails
//! startup before anything else runs. [`Server::serve`] then loops:
//!
//! 1. Accept a connection and spawn exactly one session for it.
//! 2. Resume accepting immediately; a failed accept is logged and skipped.
//! 3. On SIGTERM or Ctrl-C, stop accepting and let every in-flight session
//!    run to completion before returning.
//!
//! The router is dropped when `serve` returns, releasing every handler and
//! middleware registered on it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info};

use crate::error::Error;
use crate::router::Router;
use crate::session::Session;

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
}

impl Server {
    /// Binds a listener to `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the address cannot be resolved or bound.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), quay::Error> {
    /// use quay::{Router, Server};
    /// Server::bind("0.0.0.0:8080").await?.serve(Router::new()).await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// The address actually bound (useful after binding port `0`).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains in-flight sessions.
    pub async fn serve(self, router: Router) {
        self.serve_with_shutdown(router, shutdown_signal()).await;
    }

    /// Serves `router` until `signal` resolves, then drains in-flight sessions.
    pub async fn serve_with_shutdown(self, router: Router, signal: impl Future<Output = ()>) {
        let Self { listener, addr } = self;
        let router = Arc::new(router);

        info!(addr = %addr, "quay listening");

        let mut sessions = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown first, so a signal stops accepting even while more
                // connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = sessions.len(), "shutdown signal received, draining sessions");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };
                    sessions.spawn(Session::new(stream, peer, Arc::clone(&router)).run());
                }

                // Reap finished sessions so the set does not grow without
                // bound on long-running servers.
                Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
            }
        }

        drop(listener);
        while sessions.join_next().await.is_some() {}

        info!("quay stopped");
    }
}

/// Resolves on the first shutdown signal the process receives.
///
/// SIGTERM and SIGINT on Unix; only Ctrl-C elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
