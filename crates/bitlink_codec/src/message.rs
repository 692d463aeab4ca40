//! # Message Layout Trait
//!
//! The stream carries no field tags, so writer and reader must agree on
//! every width out of band. Implementing [`BitMessage`] puts both halves of
//! that agreement next to each other.
//!
//! ```text
//! impl BitMessage for Foo      encode: write_bool, write_u32_bits(.., 3)
//!                              decode: read_bool,  read_u32_bits(3)
//! ```

use crate::error::BitResult;
use crate::reader::BitReader;
use crate::writer::BitWriter;

/// A value with a fixed bit layout.
///
/// `decode` must read exactly the fields `encode` writes, in the same order
/// and at the same widths.
pub trait BitMessage: Sized {
    /// Appends this message's fields to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be encoded (text too long).
    fn encode(&self, writer: &mut BitWriter) -> BitResult<()>;

    /// Reads one message from `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream ends early or holds invalid text.
    fn decode(reader: &mut BitReader<'_>) -> BitResult<Self>;

    /// Encodes this message on its own into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`BitMessage::encode`].
    fn to_bytes(&self) -> BitResult<Vec<u8>> {
        let mut writer = BitWriter::new();
        self.encode(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Decodes one message from the start of `bytes`.
    ///
    /// Trailing padding bits are ignored.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`BitMessage::decode`].
    fn from_bytes(bytes: &[u8]) -> BitResult<Self> {
        Self::decode(&mut BitReader::new(bytes))
    }
}
