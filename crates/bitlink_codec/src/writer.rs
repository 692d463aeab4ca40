//! # Bit Writer
//!
//! Growable, bit-addressable output buffer.
//!
//! ## Design
//!
//! - Preallocates [`DEFAULT_CAPACITY_BYTES`] so typical messages never grow
//! - Capacity is tracked in bits and always equals the backing length × 8
//! - Grows before writing: doubling, or straight to the required size
//! - Numeric fields are split into a leading partial byte plus full bytes,
//!   each packed through a single primitive

use crate::error::{BitError, BitResult};
use crate::{clamp_width, lead_bits, BYTE_BITS, INT_BITS, LONG_BITS};

/// Bytes preallocated by [`BitWriter::new`].
pub const DEFAULT_CAPACITY_BYTES: usize = 600;

/// Bit-level stream writer.
///
/// The head only moves forward. Bits past the head are unused capacity and
/// are never returned by [`BitWriter::as_bytes`].
#[derive(Clone, Debug)]
pub struct BitWriter {
    /// Backing storage; `buffer.len() * 8 == capacity`.
    buffer: Vec<u8>,
    /// Capacity in bits.
    capacity: usize,
    /// Offset of the next free bit.
    head: usize,
}

impl BitWriter {
    /// Creates a writer with the default preallocation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY_BYTES)
    }

    /// Creates a writer preallocating `bytes` bytes.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buffer: vec![0u8; bytes],
            capacity: bytes * 8,
            head: 0,
        }
    }

    /// Returns the number of bits written.
    #[inline]
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.head
    }

    /// Returns the number of bytes the written bits occupy (rounded up).
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        (self.head + 7) >> 3
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head == 0
    }

    /// Returns the current capacity in bits.
    #[inline]
    #[must_use]
    pub const fn capacity_bits(&self) -> usize {
        self.capacity
    }

    /// Returns the written prefix of the buffer.
    ///
    /// Trailing bits of the last byte that were never written are zero.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.byte_len()]
    }

    /// Copies the written prefix into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Consumes the writer, returning the written prefix.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        let len = self.byte_len();
        self.buffer.truncate(len);
        self.buffer
    }

    /// Writes a boolean as one bit.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_bits(u8::from(value), 1);
    }

    /// Writes a full byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.write_bits(value, 8);
    }

    /// Writes the low `bits` bits of a byte.
    ///
    /// Widths above 8 are capped at 8; a width of 0 writes nothing.
    pub fn write_u8_bits(&mut self, value: u8, bits: u32) {
        let bits = clamp_width(bits, BYTE_BITS);
        if bits == 0 {
            return;
        }
        self.write_bits(value, bits as usize);
    }

    /// Writes a full 32-bit unsigned int.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.write_u32_bits(value, INT_BITS);
    }

    /// Writes the low `bits` bits of an unsigned int.
    ///
    /// Widths above 32 are capped at 32; a width of 0 writes nothing.
    pub fn write_u32_bits(&mut self, value: u32, bits: u32) {
        let bits = clamp_width(bits, INT_BITS);
        self.write_field(u64::from(value), bits);
    }

    /// Writes a full 64-bit unsigned long.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.write_u64_bits(value, LONG_BITS);
    }

    /// Writes the low `bits` bits of an unsigned long.
    ///
    /// Widths above 64 are capped at 64; a width of 0 writes nothing.
    pub fn write_u64_bits(&mut self, value: u64, bits: u32) {
        let bits = clamp_width(bits, LONG_BITS);
        self.write_field(value, bits);
    }

    /// Writes a signed int as a sign bit plus a 32-bit magnitude.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.write_i32_bits(value, INT_BITS);
    }

    /// Writes a signed int as a sign bit plus a `bits`-wide magnitude.
    ///
    /// The sign bit is set for negative values. The sign bit is always
    /// written; only the magnitude honours the width rules of
    /// [`BitWriter::write_u32_bits`].
    pub fn write_i32_bits(&mut self, value: i32, bits: u32) {
        self.write_bool(value < 0);
        self.write_u32_bits(value.unsigned_abs(), bits);
    }

    /// Writes a signed long as a sign bit plus a 64-bit magnitude.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.write_i64_bits(value, LONG_BITS);
    }

    /// Writes a signed long as a sign bit plus a `bits`-wide magnitude.
    pub fn write_i64_bits(&mut self, value: i64, bits: u32) {
        self.write_bool(value < 0);
        self.write_u64_bits(value.unsigned_abs(), bits);
    }

    /// Writes the exact IEEE-754 bit pattern of an `f32`.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes the exact IEEE-754 bit pattern of an `f64`.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    /// Writes text as a 32-bit byte count followed by its UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::StringTooLong`] if the text has more bytes than a
    /// `u32` can count. Nothing is written in that case.
    pub fn write_str(&mut self, value: &str) -> BitResult<()> {
        let bytes = value.as_bytes();
        let len = u32::try_from(bytes.len())
            .map_err(|_| BitError::StringTooLong { len: bytes.len() })?;

        self.write_u32(len);
        for &byte in bytes {
            self.write_u8(byte);
        }
        Ok(())
    }

    /// Writes the low `bits` bits of `value`, leading partial byte first.
    #[allow(clippy::cast_possible_truncation)]
    fn write_field(&mut self, value: u64, bits: u32) {
        if bits == 0 {
            return;
        }

        let byte_count = bits.div_ceil(8);
        let lead = lead_bits(bits);

        for index in (0..byte_count).rev() {
            let byte = (value >> (index * 8)) as u8;
            let width = if index == byte_count - 1 { lead } else { 8 };
            self.write_bits(byte, width as usize);
        }
    }

    /// Packs the low `bit_count` bits of `data` at the head (1..=8 bits).
    ///
    /// Bits already written in the current byte are preserved; bits that do
    /// not fit spill into the following byte.
    fn write_bits(&mut self, data: u8, bit_count: usize) {
        debug_assert!((1..=8).contains(&bit_count));

        let next_head = self.head + bit_count;
        if next_head > self.capacity {
            self.reallocate((self.capacity * 2).max(next_head));
        }

        let byte_offset = self.head >> 3;
        let bit_offset = self.head & 0x7;

        // Ones mark bits of the current byte that are already written.
        let occupied = !(0xFFu8 >> bit_offset);
        let aligned = data << (8 - bit_count);

        self.buffer[byte_offset] = (self.buffer[byte_offset] & occupied) | (aligned >> bit_offset);

        let free = 8 - bit_offset;
        if free < bit_count {
            self.buffer[byte_offset + 1] = aligned << free;
        }

        self.head = next_head;
    }

    /// Moves the contents into a new allocation of at least `capacity` bits.
    fn reallocate(&mut self, capacity: usize) {
        let len = capacity.div_ceil(8);
        let mut grown = vec![0u8; len];
        grown[..self.buffer.len()].copy_from_slice(&self.buffer);

        self.buffer = grown;
        self.capacity = len * 8;
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_writer_is_empty() {
        let writer = BitWriter::new();
        assert!(writer.is_empty());
        assert_eq!(writer.bit_len(), 0);
        assert_eq!(writer.byte_len(), 0);
        assert_eq!(writer.capacity_bits(), DEFAULT_CAPACITY_BYTES * 8);
        assert!(writer.as_bytes().is_empty());
    }

    #[test]
    fn test_bool_then_byte_straddles_boundary() {
        let mut writer = BitWriter::new();
        writer.write_bool(true);
        writer.write_u8(0xFA);

        // 1 | 1111_1010 -> 1111_1101 0000_0000
        assert_eq!(writer.bit_len(), 9);
        assert_eq!(writer.as_bytes(), &[0xFD, 0x00]);
    }

    #[test]
    fn test_partial_widths_pack_msb_first() {
        let mut writer = BitWriter::new();
        writer.write_u32_bits(0b101, 3);
        writer.write_u32_bits(0b11, 2);

        assert_eq!(writer.as_bytes(), &[0b1011_1000]);
    }

    #[test]
    fn test_leading_partial_byte() {
        let mut writer = BitWriter::new();
        writer.write_u32_bits(0x3FF, 10);

        // lead byte carries 2 bits, then one full byte
        assert_eq!(writer.as_bytes(), &[0xFF, 0xC0]);
    }

    #[test]
    fn test_full_width_is_big_endian() {
        let mut writer = BitWriter::new();
        writer.write_u32_bits(0x1234, 16);
        writer.write_u32(0xDEAD_BEEF);

        assert_eq!(writer.as_bytes(), &[0x12, 0x34, 0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_high_bits_beyond_width_are_dropped() {
        let mut writer = BitWriter::new();
        writer.write_u32_bits(0xFF, 4);

        assert_eq!(writer.bit_len(), 4);
        assert_eq!(writer.as_bytes(), &[0xF0]);
    }

    #[test]
    fn test_signed_sign_bit_then_magnitude() {
        let mut writer = BitWriter::new();
        writer.write_i32_bits(-7, 3);
        writer.write_i32_bits(7, 3);

        // 1 111 | 0 111
        assert_eq!(writer.as_bytes(), &[0xF7]);
    }

    #[test]
    fn test_signed_zero_width_still_writes_sign() {
        let mut writer = BitWriter::new();
        writer.write_i32_bits(-5, 0);
        assert_eq!(writer.bit_len(), 1);
    }

    #[test]
    fn test_float_writes_ieee_bits() {
        let mut writer = BitWriter::new();
        writer.write_f32(1.0);
        assert_eq!(writer.as_bytes(), &[0x3F, 0x80, 0x00, 0x00]);

        let mut writer = BitWriter::new();
        writer.write_f64(-2.0);
        assert_eq!(writer.as_bytes(), &[0xC0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let mut writer = BitWriter::new();
        writer.write_str("Hi").unwrap();

        assert_eq!(writer.as_bytes(), &[0, 0, 0, 2, b'H', b'i']);
    }

    #[test]
    fn test_width_is_clamped() {
        let mut clamped = BitWriter::new();
        clamped.write_u32_bits(0xCAFE_BABE, 40);
        clamped.write_u8_bits(0xAB, 12);
        clamped.write_u64_bits(u64::MAX, 100);

        let mut exact = BitWriter::new();
        exact.write_u32(0xCAFE_BABE);
        exact.write_u8(0xAB);
        exact.write_u64(u64::MAX);

        assert_eq!(clamped.bit_len(), 32 + 8 + 64);
        assert_eq!(clamped.as_bytes(), exact.as_bytes());
    }

    #[test]
    fn test_zero_width_is_noop() {
        let mut writer = BitWriter::new();
        writer.write_u8_bits(0xFF, 0);
        writer.write_u32_bits(0xFFFF, 0);
        writer.write_u64_bits(u64::MAX, 0);

        assert!(writer.is_empty());
    }

    #[test]
    fn test_growth_doubles_and_preserves_bits() {
        let mut writer = BitWriter::with_capacity(1);
        writer.write_u8(0xAA);
        assert_eq!(writer.capacity_bits(), 8);

        writer.write_bool(true);
        assert_eq!(writer.capacity_bits(), 16);

        writer.write_u32(0x0102_0304);
        assert_eq!(writer.capacity_bits(), 64);
        assert_eq!(writer.bit_len(), 41);
        assert_eq!(writer.byte_len(), 6);
        assert_eq!(writer.as_bytes(), &[0xAA, 0x80, 0x81, 0x01, 0x82, 0x00]);
    }

    #[test]
    fn test_growth_from_zero_capacity() {
        let mut writer = BitWriter::with_capacity(0);
        writer.write_u32_bits(0b101, 3);

        assert_eq!(writer.capacity_bits(), 8);
        assert_eq!(writer.as_bytes(), &[0b1010_0000]);
    }

    #[test]
    fn test_output_excludes_unused_capacity() {
        let mut writer = BitWriter::with_capacity(64);
        writer.write_u32_bits(1, 9);

        assert_eq!(writer.to_vec().len(), 2);
        assert_eq!(writer.into_bytes(), vec![0x00, 0x80]);
    }
}
