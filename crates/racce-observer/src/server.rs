//! Listening socket for the observer.
//!
//! [`ServerConfig`] names the address, [`start_server`] binds it and serves
//! the router until the hosting task is aborted.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Where the observer listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address to bind, v4 or v6 (`0.0.0.0` for every interface).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Resolve the configured host and port to a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] if `host` is not an IP
    /// address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let ip: IpAddr = self
            .host
            .trim()
            .parse()
            .map_err(|source| ServerError::InvalidAddress {
                host: self.host.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Bind the configured address and serve the observer routes.
///
/// Only returns on failure, or once axum stops accepting connections.
///
/// # Errors
///
/// Returns [`ServerError::InvalidAddress`], [`ServerError::Bind`] if the
/// port is unavailable, or [`ServerError::Serve`] if accepting fails.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(%addr, "observer listening");
    axum::serve(listener, build_router(state))
        .await
        .map_err(|source| ServerError::Serve { source })
}

/// Failures of the observer's listening socket.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured host is not an IP address.
    #[error("invalid observer host {host:?}: {source}")]
    InvalidAddress {
        /// The rejected host.
        host: String,
        /// Parse failure.
        source: AddrParseError,
    },

    /// The address could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// The address that was tried.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Accepting connections failed.
    #[error("observer stopped serving: {source}")]
    Serve {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
