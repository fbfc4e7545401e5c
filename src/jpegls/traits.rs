use crate::jpegls::coding_parameters::{compute_bits_per_pixel, compute_limit_parameter, compute_range, log2_ceil};

/// Storage type of an uncompressed sample in a caller buffer.
///
/// Samples are always handled as `u16` by the scan coders; this trait only
/// covers the little-endian byte layout of 8 and 16 bit containers.
pub trait JpeglsSample: Copy {
    const BYTES_PER_SAMPLE: usize;

    fn read_le(bytes: &[u8]) -> u16;
    fn write_le(value: u16, destination: &mut [u8]);
}

impl JpeglsSample for u8 {
    const BYTES_PER_SAMPLE: usize = 1;

    fn read_le(bytes: &[u8]) -> u16 {
        bytes[0] as u16
    }

    fn write_le(value: u16, destination: &mut [u8]) {
        destination[0] = value as u8;
    }
}

impl JpeglsSample for u16 {
    const BYTES_PER_SAMPLE: usize = 2;

    fn read_le(bytes: &[u8]) -> u16 {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    fn write_le(value: u16, destination: &mut [u8]) {
        destination.copy_from_slice(&value.to_le_bytes());
    }
}

pub fn unpack_samples<T: JpeglsSample>(source: &[u8]) -> Vec<u16> {
    source.chunks_exact(T::BYTES_PER_SAMPLE).map(T::read_le).collect()
}

pub fn pack_samples<T: JpeglsSample>(samples: &[u16], destination: &mut [u8]) {
    for (chunk, &sample) in destination.chunks_exact_mut(T::BYTES_PER_SAMPLE).zip(samples) {
        T::write_le(sample, chunk);
    }
}

/// Sample arithmetic shared by the scan encoder and decoder (ISO/IEC 14495-1, A.4 and A.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingTraits {
    pub maximum_sample_value: i32,
    pub near_lossless: i32,
    pub range: i32,
    pub quantized_bits_per_pixel: i32,
    pub limit: i32,
    pub reset_threshold: i32,
}

impl CodingTraits {
    pub fn new(maximum_sample_value: i32, near_lossless: i32, reset_threshold: i32) -> Self {
        let range = compute_range(maximum_sample_value, near_lossless);
        Self {
            maximum_sample_value,
            near_lossless,
            range,
            quantized_bits_per_pixel: log2_ceil(range),
            limit: compute_limit_parameter(compute_bits_per_pixel(maximum_sample_value)),
            reset_threshold,
        }
    }

    pub fn compute_error_value(&self, error_value: i32) -> i32 {
        self.modulo_range(self.quantize(error_value))
    }

    pub fn compute_reconstructed_sample(&self, predicted_value: i32, error_value: i32) -> i32 {
        self.fix_reconstructed_value(predicted_value + self.dequantize(error_value))
    }

    pub fn is_near(&self, lhs: i32, rhs: i32) -> bool {
        (lhs - rhs).abs() <= self.near_lossless
    }

    pub fn correct_prediction(&self, predicted: i32) -> i32 {
        predicted.clamp(0, self.maximum_sample_value)
    }

    // Code segment A.8
    fn quantize(&self, error_value: i32) -> i32 {
        if error_value > 0 {
            (error_value + self.near_lossless) / (2 * self.near_lossless + 1)
        } else {
            -((self.near_lossless - error_value) / (2 * self.near_lossless + 1))
        }
    }

    fn dequantize(&self, error_value: i32) -> i32 {
        error_value * (2 * self.near_lossless + 1)
    }

    // Code segment A.9
    fn modulo_range(&self, mut error_value: i32) -> i32 {
        if error_value < 0 {
            error_value += self.range;
        }
        if error_value >= (self.range + 1) / 2 {
            error_value -= self.range;
        }
        error_value
    }

    fn fix_reconstructed_value(&self, mut value: i32) -> i32 {
        if value < -self.near_lossless {
            value += self.range * (2 * self.near_lossless + 1);
        } else if value > self.maximum_sample_value + self.near_lossless {
            value -= self.range * (2 * self.near_lossless + 1);
        }
        self.correct_prediction(value)
    }
}

/// `-1` for negative values, `+1` otherwise.
pub fn sign(value: i32) -> i32 {
    if value < 0 { -1 } else { 1 }
}

pub fn apply_sign(value: i32, sign: i32) -> i32 {
    if sign < 0 { -value } else { value }
}
