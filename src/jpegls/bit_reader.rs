//! MSB-first bit reader over JPEG-LS entropy coded data.
//!
//! JPEG-LS does not stuff whole `0x00` bytes the way JPEG 1 does. Instead the
//! byte following an encoder-emitted `0xFF` carries only 7 bits: its most
//! significant bit is always zero. A `0xFF` followed by a byte with the most
//! significant bit set is a marker and terminates the entropy coded segment
//! (ISO/IEC 14495-1, A.1).

use crate::error::JpeglsError;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, is_marker_code};

const CACHE_BITS: i32 = u64::BITS as i32;

pub struct BitReader<'a> {
    source: &'a [u8],
    // Next byte to move into the cache.
    position: usize,
    read_cache: u64,
    // Unread bits in the low end of `read_cache`.
    valid_bits: i32,
    previous_byte_was_ff: bool,
    end_of_data: bool,
}

impl<'a> BitReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
            read_cache: 0,
            valid_bits: 0,
            previous_byte_was_ff: false,
            end_of_data: false,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, JpeglsError> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Reads `count` bits (at most 31) as an unsigned value.
    pub fn read_bits(&mut self, count: i32) -> Result<i32, JpeglsError> {
        debug_assert!((0..32).contains(&count));
        if count == 0 {
            return Ok(0);
        }
        if self.valid_bits < count {
            self.fill_read_cache();
            if self.valid_bits < count {
                return Err(JpeglsError::UnexpectedEndOfBitstream);
            }
        }
        self.valid_bits -= count;
        Ok(((self.read_cache >> self.valid_bits) & ((1 << count) - 1)) as i32)
    }

    /// Byte offset at which marker parsing resumes once the scan is fully decoded.
    ///
    /// Remaining bits of a partially consumed byte are padding. When the last
    /// byte was `0xFF` the encoder appended one more byte holding 7 padding bits,
    /// which is skipped as well.
    pub fn end_of_scan_position(&self) -> usize {
        // Give back the cached bytes none of whose bits were consumed.
        let mut end = self.position;
        let mut unread_bits = self.valid_bits;
        while end > 0 && unread_bits >= self.stored_bits(end - 1) {
            unread_bits -= self.stored_bits(end - 1);
            end -= 1;
        }

        match self.source.get(end) {
            Some(&next) if end > 0 && self.source[end - 1] == JPEG_MARKER_START_BYTE && !is_marker_code(next) => {
                end + 1
            }
            _ => end,
        }
    }

    // Data bits carried by the byte at `index`.
    fn stored_bits(&self, index: usize) -> i32 {
        if index > 0 && self.source[index - 1] == JPEG_MARKER_START_BYTE { 7 } else { 8 }
    }

    fn fill_read_cache(&mut self) {
        while !self.end_of_data && self.valid_bits <= CACHE_BITS - 8 {
            let Some(&byte) = self.source.get(self.position) else {
                self.end_of_data = true;
                break;
            };

            let bits = if self.previous_byte_was_ff {
                if is_marker_code(byte) {
                    self.end_of_data = true;
                    break;
                }
                7
            } else {
                if byte == JPEG_MARKER_START_BYTE
                    && self
                        .source
                        .get(self.position + 1)
                        .is_some_and(|&next| is_marker_code(next))
                {
                    // Start of the marker that follows the entropy coded segment.
                    self.end_of_data = true;
                    break;
                }
                8
            };

            self.read_cache = (self.read_cache << bits) | u64::from(byte);
            self.valid_bits += bits;
            self.position += 1;
            self.previous_byte_was_ff = byte == JPEG_MARKER_START_BYTE;
        }
    }
}
