//! MSB-first bit writer producing JPEG-LS entropy coded data.
//!
//! After every `0xFF` byte the next byte is written with only 7 bit slots so
//! that no `0xFF xx` pair with `xx >= 0x80` can appear in the coded data.

use crate::jpeg_marker_code::JPEG_MARKER_START_BYTE;

pub struct BitWriter<'a> {
    destination: &'a mut Vec<u8>,
    bit_buffer: u8,
    bits_in_buffer: u8,
    // Bit slots in the byte being assembled: 8, or 7 following a 0xFF.
    bits_per_byte: u8,
}

impl<'a> BitWriter<'a> {
    pub fn new(destination: &'a mut Vec<u8>) -> Self {
        Self {
            destination,
            bit_buffer: 0,
            bits_in_buffer: 0,
            bits_per_byte: 8,
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.bit_buffer = (self.bit_buffer << 1) | bit as u8;
        self.bits_in_buffer += 1;
        if self.bits_in_buffer == self.bits_per_byte {
            self.emit_byte();
        }
    }

    /// Writes the low `count` bits (at most 31) of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: i32) {
        debug_assert!((0..32).contains(&count));
        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 != 0);
        }
    }

    pub fn write_zero_bits(&mut self, count: i32) {
        for _ in 0..count {
            self.write_bit(false);
        }
    }

    /// Pads the last partial byte with zero bits.
    ///
    /// If the final data byte is `0xFF` one extra byte with 7 zero bits is
    /// written, so the marker that follows cannot be mistaken for data.
    pub fn flush(&mut self) {
        while self.bits_in_buffer != 0 {
            self.write_bit(false);
        }
        if self.bits_per_byte == 7 {
            self.emit_byte();
        }
    }

    fn emit_byte(&mut self) {
        let byte = self.bit_buffer;
        self.destination.push(byte);
        self.bits_per_byte = if byte == JPEG_MARKER_START_BYTE { 7 } else { 8 };
        self.bit_buffer = 0;
        self.bits_in_buffer = 0;
    }
}
