//! Service lifecycle.
//!
//! `Initializing → Serving → Draining → Stopped`, published on a watch
//! channel. The server runs on its own task; the control task waits for the
//! cancellation future, then grants in-flight requests a bounded drain window.

use std::future::Future;
use std::io;
use std::time::Duration;

use axum::extract::Request;
use axum::ServiceExt;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::ShortenerService;

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Dependencies and listener being set up
    Initializing,
    /// Accepting requests
    Serving,
    /// No new connections; in-flight requests finishing
    Draining,
    /// Terminal
    Stopped,
}

/// Lifecycle failures. Each one makes the binary exit non-zero.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A dependency could not be constructed during startup
    #[error("failed to initialize {component}: {reason}")]
    Dependency {
        /// Name of the component
        component: &'static str,
        /// Why construction failed
        reason: String,
    },

    /// Server stopped without being asked to
    #[error("listener failed: {0}")]
    Listener(#[source] io::Error),

    /// In-flight requests outlived the drain window
    #[error("drain window of {0:?} elapsed with requests in flight")]
    DrainTimeout(Duration),
}

impl LifecycleError {
    /// Wraps a startup failure of a named component.
    pub fn dependency(component: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Dependency {
            component,
            reason: err.to_string(),
        }
    }
}

type ServerTask = JoinHandle<io::Result<()>>;

/// Owns startup, serving and bounded graceful drain.
#[derive(Debug)]
pub struct ServiceLifecycle {
    state_tx: watch::Sender<LifecycleState>,
    drain_timeout: Duration,
}

impl ServiceLifecycle {
    /// Creates a lifecycle in [`LifecycleState::Initializing`].
    pub fn new(drain_timeout: Duration) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Initializing);
        Self {
            state_tx,
            drain_timeout,
        }
    }

    /// Receiver observing state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state_tx.borrow()
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state_tx.send_replace(next);
        info!(from = ?previous, to = ?next, "lifecycle transition");
    }

    /// Records a startup failure and returns it for propagation.
    pub fn abort(&self, err: LifecycleError) -> LifecycleError {
        error!(error = %err, "startup failed");
        self.transition(LifecycleState::Stopped);
        err
    }

    /// Binds the HTTP listener.
    pub async fn bind(&self, addr: &str) -> Result<TcpListener, LifecycleError> {
        TcpListener::bind(addr).await.map_err(|source| {
            self.abort(LifecycleError::Bind {
                addr: addr.to_string(),
                source,
            })
        })
    }

    /// Serves `app` until `shutdown` resolves, then drains.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Listener`] if the server ends on its own,
    /// [`LifecycleError::DrainTimeout`] if requests outlive the drain window.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        app: ShortenerService,
        shutdown: F,
    ) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()> + Send,
    {
        let (drain_tx, drain_rx) = oneshot::channel::<()>();

        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "listening");
        }

        let mut server: ServerTask = tokio::spawn(async move {
            axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
                .with_graceful_shutdown(async move {
                    // A dropped sender also means stop
                    let _ = drain_rx.await;
                })
                .await
        });
        self.transition(LifecycleState::Serving);

        tokio::select! {
            () = shutdown => {
                info!("shutdown requested");
            }
            result = &mut server => {
                self.transition(LifecycleState::Stopped);
                let err = match result {
                    Ok(Ok(())) => io::Error::other("server exited unexpectedly"),
                    Ok(Err(e)) => e,
                    Err(join) => io::Error::other(join.to_string()),
                };
                error!(error = %err, "server stopped while serving");
                return Err(LifecycleError::Listener(err));
            }
        }

        self.drain(drain_tx, server).await
    }

    async fn drain(
        &self,
        drain_tx: oneshot::Sender<()>,
        mut server: ServerTask,
    ) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Draining);
        let _ = drain_tx.send(());

        let outcome = match tokio::time::timeout(self.drain_timeout, &mut server).await {
            Ok(Ok(Ok(()))) => {
                info!("drained cleanly");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(LifecycleError::Listener(e)),
            Ok(Err(join)) => Err(LifecycleError::Listener(io::Error::other(join.to_string()))),
            Err(_) => {
                warn!(timeout = ?self.drain_timeout, "drain window elapsed, aborting server");
                server.abort();
                Err(LifecycleError::DrainTimeout(self.drain_timeout))
            }
        };

        self.transition(LifecycleState::Stopped);
        outcome
    }
}

/// Waits for SIGTERM or SIGINT.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
