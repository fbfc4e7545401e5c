pub const DEFAULT_RESET_THRESHOLD: i32 = 64; // Default RESET value as defined in ISO/IEC 14495-1, table C.2

pub const MINIMUM_COMPONENT_COUNT: i32 = 1;
pub const MAXIMUM_COMPONENT_COUNT: i32 = 4;
pub const MINIMUM_BITS_PER_SAMPLE: i32 = 2;
pub const MAXIMUM_BITS_PER_SAMPLE: i32 = 16;
pub const MAXIMUM_NEAR_LOSSLESS: i32 = 255;
pub const MAXIMUM_DIMENSION: u32 = u16::MAX as u32;

pub const MAX_K_VALUE: i32 = 16; // This is an implementation limit (theoretical limit is 32)

// Number of regular mode contexts (ISO/IEC 14495-1, A.3.3). Index 0 selects run mode,
// except for components of a sample interleaved pixel that is not part of a run.
pub const REGULAR_MODE_CONTEXT_COUNT: usize = 365;

// Bias correction limits, ISO/IEC 14495-1, code segment A.13.
pub const MIN_C: i32 = -128;
pub const MAX_C: i32 = 127;

// The size in bytes of the segment length field.
pub const SEGMENT_LENGTH_SIZE: usize = 2;

// Run-length order table, ISO/IEC 14495-1, A.7.1.2.
pub const J: [i32; 32] = [
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 9, 10, 11, 12, 13, 14, 15
];

pub const MAXIMUM_RUN_INDEX: usize = J.len() - 1;
