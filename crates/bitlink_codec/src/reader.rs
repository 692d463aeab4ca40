//! # Bit Reader
//!
//! Sequential decoder over a borrowed byte slice.
//!
//! Mirrors [`BitWriter`](crate::BitWriter) field for field: the same widths
//! must be passed in the same order. Every read checks the remaining bit
//! count before touching the head, so a failed read leaves the reader where
//! it was.

use crate::error::{BitError, BitResult};
use crate::{clamp_width, lead_bits, BYTE_BITS, INT_BITS, LONG_BITS};

/// Bit-level stream reader.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    /// Source data.
    buffer: &'a [u8],
    /// Offset of the next unread bit.
    head: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a reader positioned at the first bit of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, head: 0 }
    }

    /// Returns the buffer being decoded.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.buffer
    }

    /// Returns the offset of the next unread bit.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.head
    }

    /// Returns the number of unread bits.
    #[inline]
    #[must_use]
    pub const fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.head
    }

    /// Returns the number of bytes that still hold at least one unread bit.
    #[inline]
    #[must_use]
    pub const fn remaining_bytes(&self) -> usize {
        self.buffer.len() - (self.head >> 3)
    }

    /// Returns true once every bit has been read.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining_bits() == 0
    }

    /// Reads a one-bit boolean.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if the buffer is exhausted.
    pub fn read_bool(&mut self) -> BitResult<bool> {
        self.ensure(1)?;
        Ok(self.read_bits(1) == 1)
    }

    /// Reads a full byte.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than 8 bits remain.
    pub fn read_u8(&mut self) -> BitResult<u8> {
        self.ensure(8)?;
        Ok(self.read_bits(8))
    }

    /// Reads a byte written with [`BitWriter::write_u8_bits`](crate::BitWriter::write_u8_bits).
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than `bits` bits remain.
    pub fn read_u8_bits(&mut self, bits: u32) -> BitResult<u8> {
        let bits = clamp_width(bits, BYTE_BITS);
        if bits == 0 {
            return Ok(0);
        }
        self.ensure(bits as usize)?;
        Ok(self.read_bits(bits as usize))
    }

    /// Reads a full 32-bit unsigned int.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than 32 bits remain.
    pub fn read_u32(&mut self) -> BitResult<u32> {
        self.read_u32_bits(INT_BITS)
    }

    /// Reads a `bits`-wide unsigned int.
    ///
    /// Widths above 32 are capped at 32; a width of 0 yields 0 and consumes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than `bits` bits remain.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_u32_bits(&mut self, bits: u32) -> BitResult<u32> {
        let bits = clamp_width(bits, INT_BITS);
        self.ensure(bits as usize)?;
        Ok(self.read_field(bits) as u32)
    }

    /// Reads a full 64-bit unsigned long.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than 64 bits remain.
    pub fn read_u64(&mut self) -> BitResult<u64> {
        self.read_u64_bits(LONG_BITS)
    }

    /// Reads a `bits`-wide unsigned long.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than `bits` bits remain.
    pub fn read_u64_bits(&mut self, bits: u32) -> BitResult<u64> {
        let bits = clamp_width(bits, LONG_BITS);
        self.ensure(bits as usize)?;
        Ok(self.read_field(bits))
    }

    /// Reads a signed int with a 32-bit magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than 33 bits remain.
    pub fn read_i32(&mut self) -> BitResult<i32> {
        self.read_i32_bits(INT_BITS)
    }

    /// Reads a sign bit followed by a `bits`-wide magnitude.
    ///
    /// A set sign bit with a zero magnitude decodes to `0`.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than `bits + 1` bits remain.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn read_i32_bits(&mut self, bits: u32) -> BitResult<i32> {
        let bits = clamp_width(bits, INT_BITS);
        self.ensure(1 + bits as usize)?;

        let negative = self.read_bits(1) == 1;
        let magnitude = self.read_field(bits) as u32 as i32;
        Ok(if negative {
            magnitude.wrapping_neg()
        } else {
            magnitude
        })
    }

    /// Reads a signed long with a 64-bit magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than 65 bits remain.
    pub fn read_i64(&mut self) -> BitResult<i64> {
        self.read_i64_bits(LONG_BITS)
    }

    /// Reads a sign bit followed by a `bits`-wide long magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than `bits + 1` bits remain.
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_i64_bits(&mut self, bits: u32) -> BitResult<i64> {
        let bits = clamp_width(bits, LONG_BITS);
        self.ensure(1 + bits as usize)?;

        let negative = self.read_bits(1) == 1;
        let magnitude = self.read_field(bits) as i64;
        Ok(if negative {
            magnitude.wrapping_neg()
        } else {
            magnitude
        })
    }

    /// Reads an `f32` from its exact IEEE-754 bit pattern.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than 32 bits remain.
    pub fn read_f32(&mut self) -> BitResult<f32> {
        self.read_u32().map(f32::from_bits)
    }

    /// Reads an `f64` from its exact IEEE-754 bit pattern.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if fewer than 64 bits remain.
    pub fn read_f64(&mut self) -> BitResult<f64> {
        self.read_u64().map(f64::from_bits)
    }

    /// Reads length-prefixed UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Overrun`] if the prefix or the announced bytes run
    /// past the buffer (the head is left after the prefix in the latter
    /// case), or [`BitError::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn read_string(&mut self) -> BitResult<String> {
        let len = self.read_u32()? as usize;
        let bits = len.checked_mul(8).unwrap_or(usize::MAX);
        self.ensure(bits)?;

        let bytes: Vec<u8> = (0..len).map(|_| self.read_bits(8)).collect();
        Ok(String::from_utf8(bytes)?)
    }

    /// Fails unless at least `bits` unread bits remain.
    #[inline]
    fn ensure(&self, bits: usize) -> BitResult<()> {
        let remaining = self.remaining_bits();
        if bits > remaining {
            return Err(BitError::Overrun {
                requested: bits,
                remaining,
            });
        }
        Ok(())
    }

    /// Reads a `bits`-wide field, leading partial byte first.
    ///
    /// Caller must have checked the remaining length.
    fn read_field(&mut self, bits: u32) -> u64 {
        if bits == 0 {
            return 0;
        }

        let byte_count = bits.div_ceil(8);
        let lead = lead_bits(bits);

        let mut value = u64::from(self.read_bits(lead as usize));
        for _ in 1..byte_count {
            value = (value << 8) | u64::from(self.read_bits(8));
        }
        value
    }

    /// Reads `bit_count` bits (1..=8) into the low bits of a byte.
    ///
    /// Caller must have checked the remaining length.
    fn read_bits(&mut self, bit_count: usize) -> u8 {
        debug_assert!((1..=8).contains(&bit_count));

        let byte_offset = self.head >> 3;
        let bit_offset = self.head & 0x7;

        let mut result = self.buffer[byte_offset] << bit_offset;

        let readable = 8 - bit_offset;
        if readable < bit_count {
            result |= self.buffer[byte_offset + 1] >> readable;
        }

        self.head += bit_count;
        result >> (8 - bit_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_across_byte_boundary() {
        let data = [0xFD, 0x00];
        let mut reader = BitReader::new(&data);

        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_u8().unwrap(), 0xFA);
        assert_eq!(reader.position(), 9);
        assert_eq!(reader.remaining_bits(), 7);
    }

    #[test]
    fn test_leading_partial_byte() {
        let data = [0xFF, 0xC0];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_u32_bits(10).unwrap(), 0x3FF);
    }

    #[test]
    fn test_signed_fields() {
        let data = [0xF7];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_i32_bits(3).unwrap(), -7);
        assert_eq!(reader.read_i32_bits(3).unwrap(), 7);
    }

    #[test]
    fn test_negative_zero_decodes_to_zero() {
        // sign bit set, 7-bit zero magnitude
        let data = [0b1000_0000];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_i32_bits(7).unwrap(), 0);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_past_end_fails_without_advancing() {
        let data = [0xAB, 0xCD];
        let mut reader = BitReader::new(&data);
        reader.read_u8_bits(4).unwrap();

        let err = reader.read_u32_bits(13).unwrap_err();
        assert_eq!(
            err,
            BitError::Overrun {
                requested: 13,
                remaining: 12
            }
        );
        assert_eq!(reader.position(), 4);

        assert_eq!(reader.read_u32_bits(12).unwrap(), 0xBCD);
        assert!(reader.read_bool().is_err());
    }

    #[test]
    fn test_signed_overrun_checks_sign_bit_too() {
        let data = [0xFF];
        let mut reader = BitReader::new(&data);

        assert!(reader.read_i32_bits(8).is_err());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_string_length_past_end() {
        // announces 16 bytes, carries 2
        let data = [0, 0, 0, 16, b'o', b'k'];
        let mut reader = BitReader::new(&data);

        assert!(matches!(
            reader.read_string(),
            Err(BitError::Overrun { requested: 128, .. })
        ));
    }

    #[test]
    fn test_string_invalid_utf8() {
        let data = [0, 0, 0, 2, 0xC3, 0x28];
        let mut reader = BitReader::new(&data);

        assert!(matches!(reader.read_string(), Err(BitError::InvalidUtf8(_))));
    }

    #[test]
    fn test_zero_width_read_consumes_nothing() {
        let data = [0xFF];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_u32_bits(0).unwrap(), 0);
        assert_eq!(reader.read_u8_bits(0).unwrap(), 0);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_remaining_bytes() {
        let data = [0u8; 4];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.remaining_bytes(), 4);

        reader.read_u8_bits(3).unwrap();
        assert_eq!(reader.remaining_bytes(), 4);

        reader.read_u8_bits(5).unwrap();
        assert_eq!(reader.remaining_bytes(), 3);
    }

    #[test]
    fn test_empty_buffer() {
        let data: [u8; 0] = [];
        let mut reader = BitReader::new(&data);
        assert!(reader.is_empty());
        assert!(reader.read_bool().is_err());
        assert_eq!(reader.as_bytes().len(), 0);
    }
}
