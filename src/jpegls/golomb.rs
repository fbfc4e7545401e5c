//! Limited length Golomb-Rice codes (ISO/IEC 14495-1, A.5.3).

use crate::error::JpeglsError;
use crate::jpegls::bit_reader::BitReader;
use crate::jpegls::bit_writer::BitWriter;

// Code segment A.11: 0, -1, 1, -2, 2, ... → 0, 1, 2, 3, 4, ...
pub fn map_error_value(error_value: i32) -> i32 {
    (error_value >> (i32::BITS - 1)) ^ (2 * error_value)
}

pub fn unmap_error_value(mapped_error_value: i32) -> i32 {
    let sign = (mapped_error_value << (i32::BITS - 1)) >> (i32::BITS - 1);
    sign ^ (mapped_error_value >> 1)
}

/// Writes `mapped_error_value` with Golomb parameter `k`.
///
/// Values whose unary part would reach `limit - qbpp - 1` zeros use the
/// escape code instead: that many zeros, a one, then `mapped - 1` in `qbpp` bits.
pub fn encode_mapped_value(
    writer: &mut BitWriter,
    k: i32,
    mapped_error_value: i32,
    limit: i32,
    quantized_bits_per_pixel: i32,
) {
    let escape_length = limit - quantized_bits_per_pixel - 1;
    let high_bits = mapped_error_value >> k;

    if high_bits < escape_length {
        writer.write_zero_bits(high_bits);
        writer.write_bit(true);
        writer.write_bits((mapped_error_value & ((1 << k) - 1)) as u32, k);
        return;
    }

    writer.write_zero_bits(escape_length);
    writer.write_bit(true);
    writer.write_bits(
        ((mapped_error_value - 1) & ((1 << quantized_bits_per_pixel) - 1)) as u32,
        quantized_bits_per_pixel,
    );
}

pub fn decode_mapped_value(
    reader: &mut BitReader,
    k: i32,
    limit: i32,
    quantized_bits_per_pixel: i32,
) -> Result<i32, JpeglsError> {
    let escape_length = limit - quantized_bits_per_pixel - 1;

    let mut high_bits = 0;
    while !reader.read_bit()? {
        high_bits += 1;
        if high_bits > escape_length {
            return Err(JpeglsError::InvalidData);
        }
    }

    if high_bits == escape_length {
        return Ok(reader.read_bits(quantized_bits_per_pixel)? + 1);
    }

    Ok((high_bits << k) | reader.read_bits(k)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let expected = [(0, 0), (-1, 1), (1, 2), (-2, 3), (2, 4), (-128, 255), (127, 254)];
        for (error_value, mapped) in expected {
            assert_eq!(map_error_value(error_value), mapped);
            assert_eq!(unmap_error_value(mapped), error_value);
        }
    }

    #[test]
    fn test_regular_code_layout() {
        let mut data = Vec::new();
        let mut writer = BitWriter::new(&mut data);
        // mapped 9, k 2: two zeros, a one, then 01.
        encode_mapped_value(&mut writer, 2, 9, 32, 8);
        writer.flush();
        assert_eq!(data, vec![0b0010_1000]);

        let mut reader = BitReader::new(&data);
        assert_eq!(decode_mapped_value(&mut reader, 2, 32, 8).unwrap(), 9);
    }

    #[test]
    fn test_escape_code_round_trips() {
        // limit 32, qbpp 8: any value with 23 or more high bits is escaped.
        let values = [0, 22, 23, 24, 200, 255, 256];
        let mut data = Vec::new();
        let mut writer = BitWriter::new(&mut data);
        for &value in &values {
            encode_mapped_value(&mut writer, 0, value, 32, 8);
        }
        writer.flush();

        let mut reader = BitReader::new(&data);
        for &value in &values {
            assert_eq!(decode_mapped_value(&mut reader, 0, 32, 8).unwrap(), value);
        }
    }

    #[test]
    fn test_escape_code_length() {
        let mut data = Vec::new();
        let mut writer = BitWriter::new(&mut data);
        encode_mapped_value(&mut writer, 0, 100, 32, 8);
        writer.flush();
        // 23 zeros, a one and 8 value bits.
        assert_eq!(data, vec![0x00, 0x00, 0x01, 99]);
    }

    #[test]
    fn test_too_many_zeros_is_invalid() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x00];
        let mut reader = BitReader::new(&data);
        assert_eq!(decode_mapped_value(&mut reader, 0, 32, 8), Err(JpeglsError::InvalidData));
    }
}
