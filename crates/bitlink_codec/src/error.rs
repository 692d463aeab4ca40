//! # Codec Error Types
//!
//! All errors that can occur while encoding or decoding a bit stream.

use thiserror::Error;

/// Errors that can occur in the bit codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitError {
    /// A read asked for more bits than the buffer still holds.
    #[error("bit stream overrun: requested {requested} bits, {remaining} remaining")]
    Overrun {
        /// Bits the read needed.
        requested: usize,
        /// Bits left between the head and the end of the buffer.
        remaining: usize,
    },

    /// A text field did not contain valid UTF-8.
    #[error("text field is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A text field is longer than its 32-bit length prefix can describe.
    #[error("text of {len} bytes does not fit a 32-bit length prefix")]
    StringTooLong {
        /// Byte length of the rejected text.
        len: usize,
    },
}

/// Result type for codec operations.
pub type BitResult<T> = Result<T, BitError>;
