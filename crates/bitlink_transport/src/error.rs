//! # Transport Error Types
//!
//! Errors surfaced to the host. Per-datagram failures on the background
//! paths are counted in [`TransportStats`](crate::TransportStats) and logged,
//! never returned.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors that can occur while configuring or starting a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The remote host name did not resolve to any address.
    #[error("could not resolve remote host {host}:{port}")]
    Resolve {
        /// Host name as given.
        host: String,
        /// Port as given.
        port: u16,
    },

    /// The receive path could not bind its socket. Fatal to the session.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Local endpoint the bind was attempted on.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The session did not become ready within the allotted time.
    #[error("transport not ready after {waited_ms}ms")]
    NotReady {
        /// How long the caller waited.
        waited_ms: u64,
    },

    /// The session stopped before it could serve traffic.
    #[error("session failed: {reason}")]
    SessionFailed {
        /// What went wrong.
        reason: String,
    },

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Operating system error outside the bind step.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
