//! # Host Error Types

use bitlink_codec::BitError;
use bitlink_transport::TransportError;
use thiserror::Error;

/// Errors that can stop a host run.
#[derive(Error, Debug)]
pub enum HostError {
    /// Another host session holds the process-wide slot.
    #[error("host session busy: {holder} is already active")]
    SessionBusy {
        /// Name of the session holding the slot.
        holder: &'static str,
    },

    /// The transport failed to start or bind.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A datagram could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] BitError),

    /// An echoed message did not match what was sent.
    #[error("echo mismatch in field {field}")]
    EchoMismatch {
        /// First field that differed.
        field: &'static str,
    },
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
