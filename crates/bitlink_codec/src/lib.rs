//! # BITLINK Codec
//!
//! Bit-exact packing of primitive values for datagram payloads.
//!
//! ## Encoding
//!
//! Every value is written most significant bit first. A field occupies
//! exactly the number of bits it was written with, so consecutive fields
//! straddle byte boundaries freely:
//!
//! ```text
//!  bool  byte (8)           int @ 3 bits
//!  ┌─┬───────────────┬─────┬────────────────────
//!  │1│1 1 1 1 1 0 1 0│1 1 1│ ...
//!  └─┴───────────────┴─────┴────────────────────
//!  byte 0: 1111_1101   byte 1: 0111_xxxx
//! ```
//!
//! | value | default width | configurable |
//! |---|---|---|
//! | `bool` | 1 | no |
//! | `u8` | 8 | 1–8 |
//! | `u32` / `i32` | 32 | 1–32 |
//! | `u64` / `i64` | 64 | 1–64 |
//! | `f32` / `f64` | 32 / 64 | no, exact IEEE-754 bits |
//! | text | 32-bit count + UTF-8 bytes | no |
//!
//! Signed fields carry one leading sign bit followed by the magnitude at the
//! requested width. The stream carries no field tags: the reader must be
//! given the same widths the writer used.
//!
//! ## Example
//!
//! ```rust
//! use bitlink_codec::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bool(true);
//! writer.write_u8(0xFA);
//! writer.write_u32_bits(7, 3);
//! writer.write_str("Hello World!").unwrap();
//!
//! let bytes = writer.into_bytes();
//! let mut reader = BitReader::new(&bytes);
//! assert!(reader.read_bool().unwrap());
//! assert_eq!(reader.read_u8().unwrap(), 0xFA);
//! assert_eq!(reader.read_u32_bits(3).unwrap(), 7);
//! assert_eq!(reader.read_string().unwrap(), "Hello World!");
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use error::{BitError, BitResult};
pub use message::BitMessage;
pub use reader::BitReader;
pub use writer::BitWriter;

/// Width of a boolean field.
pub const BOOL_BITS: u32 = 1;

/// Full width of a byte field.
pub const BYTE_BITS: u32 = 8;

/// Full width of an int field (`u32`, `i32`, `f32`).
pub const INT_BITS: u32 = 32;

/// Full width of a long field (`u64`, `i64`, `f64`).
pub const LONG_BITS: u32 = 64;

/// Caps a requested width at the maximum the field type supports.
#[inline]
pub(crate) const fn clamp_width(bits: u32, max: u32) -> u32 {
    if bits > max {
        max
    } else {
        bits
    }
}

/// Width of the leading partial byte of a `bits`-wide field.
///
/// A multiple of 8 has no partial byte, so its lead is a full byte.
#[inline]
pub(crate) const fn lead_bits(bits: u32) -> u32 {
    if bits % 8 == 0 {
        8
    } else {
        bits % 8
    }
}
