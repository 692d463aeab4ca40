//! Integration tests for writer/reader symmetry.
//!
//! Covers every field type at every legal width, at every starting bit
//! alignment, plus the mixed streams hosts actually send.

use bitlink_codec::{BitError, BitReader, BitWriter};

/// Largest value that fits in `bits` bits.
fn max_for(bits: u32) -> u64 {
    if bits == 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[test]
fn test_hello_world_stream() {
    let mut writer = BitWriter::new();
    writer.write_bool(true);
    writer.write_u8(0xFA);
    writer.write_u32_bits(7, 3);
    writer.write_str("Hello World!").unwrap();

    let bytes = writer.into_bytes();
    let mut reader = BitReader::new(&bytes);

    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_u8().unwrap(), 0xFA);
    assert_eq!(reader.read_u32_bits(3).unwrap(), 7);
    assert_eq!(reader.read_string().unwrap(), "Hello World!");
}

#[test]
fn test_every_field_type_in_one_stream() {
    let mut writer = BitWriter::new();
    writer.write_bool(true);
    writer.write_u8(0xFA);
    writer.write_f64(1.2);
    writer.write_f32(81.12);
    writer.write_u32_bits(7, 3);
    writer.write_u64_bits(8, 4);
    writer.write_i32_bits(-7, 3);
    writer.write_i64_bits(-8, 4);
    writer.write_str("Hello World!").unwrap();

    let bytes = writer.to_vec();
    assert_eq!(bytes.len(), writer.byte_len());

    let mut reader = BitReader::new(&bytes);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_u8().unwrap(), 0xFA);
    assert_eq!(reader.read_f64().unwrap().to_bits(), 1.2f64.to_bits());
    assert_eq!(reader.read_f32().unwrap().to_bits(), 81.12f32.to_bits());
    assert_eq!(reader.read_u32_bits(3).unwrap(), 7);
    assert_eq!(reader.read_u64_bits(4).unwrap(), 8);
    assert_eq!(reader.read_i32_bits(3).unwrap(), -7);
    assert_eq!(reader.read_i64_bits(4).unwrap(), -8);
    assert_eq!(reader.read_string().unwrap(), "Hello World!");
    assert!(reader.remaining_bits() < 8);
}

#[test]
fn test_unsigned_extremes_at_every_width_and_alignment() {
    for offset in 0..8u32 {
        for bits in 1..=64u32 {
            let mut writer = BitWriter::new();
            writer.write_u8_bits(0x55, offset);
            writer.write_u64_bits(0, bits);
            writer.write_u64_bits(max_for(bits), bits);
            writer.write_bool(true);

            let bytes = writer.into_bytes();
            let mut reader = BitReader::new(&bytes);
            reader.read_u8_bits(offset).unwrap();
            assert_eq!(reader.read_u64_bits(bits).unwrap(), 0, "zero @ {bits}/{offset}");
            assert_eq!(
                reader.read_u64_bits(bits).unwrap(),
                max_for(bits),
                "ones @ {bits}/{offset}"
            );
            assert!(reader.read_bool().unwrap(), "trailer @ {bits}/{offset}");
        }
    }
}

#[test]
#[allow(clippy::cast_possible_truncation)]
fn test_int_widths_match_long_widths() {
    for bits in 1..=32u32 {
        let mask = max_for(bits) as u32;
        let value = (0xA5A5_A5A5 & mask) | 1;

        let mut int_writer = BitWriter::new();
        int_writer.write_u32_bits(value, bits);
        let mut long_writer = BitWriter::new();
        long_writer.write_u64_bits(u64::from(value), bits);

        assert_eq!(int_writer.as_bytes(), long_writer.as_bytes(), "width {bits}");

        let mut reader = BitReader::new(int_writer.as_bytes());
        assert_eq!(reader.read_u32_bits(bits).unwrap(), value);
    }
}

#[test]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn test_signed_extremes_at_every_width() {
    for bits in 1..=32u32 {
        let magnitude = max_for(bits) as u32 as i32;
        let magnitude = if bits == 32 { i32::MAX } else { magnitude };

        for value in [0, 1, -1, magnitude, -magnitude] {
            let mut writer = BitWriter::new();
            writer.write_i32_bits(value, bits);

            let bytes = writer.into_bytes();
            let mut reader = BitReader::new(&bytes);
            assert_eq!(reader.read_i32_bits(bits).unwrap(), value, "{value} @ {bits}");
        }
    }

    for bits in 1..=64u32 {
        let magnitude = if bits == 64 {
            i64::MAX
        } else {
            max_for(bits) as i64
        };

        for value in [0, 1, -1, magnitude, -magnitude] {
            let mut writer = BitWriter::new();
            writer.write_i64_bits(value, bits);

            let bytes = writer.into_bytes();
            let mut reader = BitReader::new(&bytes);
            assert_eq!(reader.read_i64_bits(bits).unwrap(), value, "{value} @ {bits}");
        }
    }
}

#[test]
fn test_signed_minimum_survives_full_width() {
    let mut writer = BitWriter::new();
    writer.write_i32(i32::MIN);
    writer.write_i64(i64::MIN);

    let bytes = writer.into_bytes();
    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_i32().unwrap(), i32::MIN);
    assert_eq!(reader.read_i64().unwrap(), i64::MIN);
}

#[test]
fn test_float_special_values_keep_bit_patterns() {
    let singles = [
        0.0f32,
        -0.0,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::MIN_POSITIVE,
        f32::from_bits(0x7FC0_0001),
    ];
    let doubles = [
        0.0f64,
        -0.0,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::EPSILON,
        f64::from_bits(0x7FF8_0000_0000_0042),
    ];

    let mut writer = BitWriter::new();
    writer.write_bool(false);
    for value in singles {
        writer.write_f32(value);
    }
    for value in doubles {
        writer.write_f64(value);
    }

    let bytes = writer.into_bytes();
    let mut reader = BitReader::new(&bytes);
    reader.read_bool().unwrap();
    for value in singles {
        assert_eq!(reader.read_f32().unwrap().to_bits(), value.to_bits());
    }
    for value in doubles {
        assert_eq!(reader.read_f64().unwrap().to_bits(), value.to_bits());
    }
}

#[test]
fn test_growth_keeps_every_bit() {
    let mut writer = BitWriter::with_capacity(2);
    let initial = writer.capacity_bits();

    for i in 0..1000u32 {
        writer.write_bool(i % 3 == 0);
        writer.write_u32_bits(i, 11);
    }

    assert!(writer.capacity_bits() > initial);
    assert_eq!(writer.bit_len(), 12_000);
    assert_eq!(writer.byte_len(), 1500);

    let bytes = writer.into_bytes();
    assert_eq!(bytes.len(), 1500);

    let mut reader = BitReader::new(&bytes);
    for i in 0..1000u32 {
        assert_eq!(reader.read_bool().unwrap(), i % 3 == 0);
        assert_eq!(reader.read_u32_bits(11).unwrap(), i);
    }
    assert!(reader.is_empty());
}

#[test]
fn test_growth_past_default_capacity() {
    let text = "x".repeat(2000);

    let mut writer = BitWriter::new();
    writer.write_bool(true);
    writer.write_str(&text).unwrap();

    assert_eq!(writer.bit_len(), 1 + 32 + 2000 * 8);
    assert_eq!(writer.byte_len(), (writer.bit_len() + 7) / 8);

    let bytes = writer.into_bytes();
    let mut reader = BitReader::new(&bytes);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_string().unwrap(), text);
}

#[test]
fn test_multibyte_text() {
    let mut writer = BitWriter::new();
    writer.write_u8_bits(1, 5);
    writer.write_str("héllo, wörld ✓").unwrap();
    writer.write_str("").unwrap();

    let bytes = writer.into_bytes();
    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_u8_bits(5).unwrap(), 1);
    assert_eq!(reader.read_string().unwrap(), "héllo, wörld ✓");
    assert_eq!(reader.read_string().unwrap(), "");
}

#[test]
fn test_reading_more_fields_than_written_fails() {
    let mut writer = BitWriter::new();
    writer.write_u32(42);

    let bytes = writer.into_bytes();
    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_u32().unwrap(), 42);
    assert_eq!(
        reader.read_u8(),
        Err(BitError::Overrun {
            requested: 8,
            remaining: 0
        })
    );
}
