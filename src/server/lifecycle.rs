//! Server lifecycle: bind, serve, graceful shutdown
//!
//! The server runs until its `CancellationToken` is cancelled. From then on
//! no new connections are accepted and in-flight requests get one grace
//! period to finish; requests still running after that are abandoned.

use axum::Router;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::metrics::SharedMetrics;
use super::routes::{build_router, AppState};
use crate::config::Config;
use crate::status::{PickerError, StatusPicker};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("HTTP server died unexpectedly")]
    Serve(#[source] io::Error),

    #[error("HTTP server stopped without a shutdown request")]
    UnexpectedClose,

    #[error("failed to shutdown server gracefully")]
    Shutdown(#[source] io::Error),

    #[error("requests still in flight after {0:?} grace period")]
    GracePeriodElapsed(Duration),

    #[error("server task failed")]
    Task(#[source] JoinError),

    #[error("invalid status table")]
    Picker(#[from] PickerError),
}

/// A bound but not yet serving HTTP server
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listening socket
    pub async fn bind(addr: SocketAddr) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;
        // Log after successful bind - server is actually listening
        info!(address = %local_addr, "Server listening");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address the listener is bound to (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve `app` until `token` is cancelled, then shut down within `grace`
    ///
    /// # Errors
    /// - [`ServerError::Serve`] / [`ServerError::UnexpectedClose`] if the
    ///   listener stops while no shutdown was requested
    /// - [`ServerError::GracePeriodElapsed`] if requests outlive the grace period
    /// - [`ServerError::Shutdown`] / [`ServerError::Task`] if shutdown itself fails
    pub async fn serve(
        self,
        app: Router,
        token: CancellationToken,
        grace: Duration,
    ) -> Result<(), ServerError> {
        let listener = self.listener;
        let shutdown = token.clone().cancelled_owned();
        let mut serving = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown)
            .await
        });

        tokio::select! {
            result = &mut serving => {
                if token.is_cancelled() {
                    // Shutdown finished before we observed the cancellation
                    return finish_shutdown(result);
                }
                match result {
                    Ok(Ok(())) => Err(ServerError::UnexpectedClose),
                    Ok(Err(e)) => Err(ServerError::Serve(e)),
                    Err(e) => Err(ServerError::Task(e)),
                }
            }
            _ = token.cancelled() => {
                info!(grace_secs = grace.as_secs_f64(), "Shutting down, draining in-flight requests");
                match tokio::time::timeout(grace, &mut serving).await {
                    Ok(result) => finish_shutdown(result),
                    Err(_) => {
                        serving.abort();
                        error!(grace_secs = grace.as_secs_f64(), "Grace period elapsed, dropping in-flight requests");
                        Err(ServerError::GracePeriodElapsed(grace))
                    }
                }
            }
        }
    }
}

fn finish_shutdown(result: Result<io::Result<()>, JoinError>) -> Result<(), ServerError> {
    match result {
        Ok(Ok(())) => {
            info!("Shutdown server...");
            Ok(())
        }
        Ok(Err(e)) => Err(ServerError::Shutdown(e)),
        Err(e) => Err(ServerError::Task(e)),
    }
}

/// Build the router for `config`, bind it and serve until `token` is cancelled
pub async fn run(
    config: &Config,
    metrics: SharedMetrics,
    token: CancellationToken,
) -> Result<(), ServerError> {
    let picker = StatusPicker::with_default_choices()?;
    let app = build_router(config.endpoints, AppState::new(picker, metrics));

    let server = Server::bind(config.listen_address).await?;
    info!(endpoints = ?config.endpoints, "Serving");

    server.serve(app, token, config.shutdown_grace).await
}
