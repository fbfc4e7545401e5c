//! JPEG-LS Implementation (ISO/IEC 14495-1 / ITU-T T.87)
//!
//! JPEG-LS is a low-complexity lossless and near-lossless image compression
//! standard, used by DICOM for the transfer syntaxes 1.2.840.10008.1.2.4.80
//! and 1.2.840.10008.1.2.4.81.
//!
//! ## Layout
//!
//! - `JpeglsEncoder` / `JpeglsDecoder`: frame level codec working on one complete image.
//! - `scan_encoder` / `scan_decoder`: context modeling, prediction and run mode for one scan.
//! - `bit_reader` / `bit_writer`: MSB-first bit I/O with the JPEG-LS `0xFF` bit stuffing rule.
//!
//! ## Supported Image Types
//!
//! | Image Type | Encoding | Decoding |
//! |------------|----------|----------|
//! | 2 to 16 bit, 1 to 4 components | ✅ | ✅ |
//! | Interleave none, line, sample | ✅ | ✅ |
//! | Lossless and near-lossless | ✅ | ✅ |
//! | Custom preset parameters (LSE type 1) | ✅ | ✅ |
//! | Mapping tables, HP color transforms | ❌ | ❌ |

pub mod bit_reader;
pub mod bit_writer;
pub mod coding_parameters;
pub mod decoder;
pub mod encoder;
pub mod golomb;
pub mod line_buffer;
pub mod prediction;
pub mod regular_mode_context;
pub mod run_mode_context;
pub mod scan_decoder;
pub mod scan_encoder;
pub mod traits;

pub use coding_parameters::{CodingParameters, JpeglsPcParameters};
pub use decoder::JpeglsDecoder;
pub use encoder::JpeglsEncoder;

use crate::error::JpeglsError;
use num_enum::TryFromPrimitive;

/// Interleave mode for multi-component scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive)]
#[num_enum(error_type(name = JpeglsError, constructor = invalid_interleave_mode))]
#[repr(u8)]
pub enum InterleaveMode {
    /// No interleaving: one scan per component.
    #[default]
    None = 0,
    /// Interleaved by line.
    Line = 1,
    /// Interleaved by sample.
    Sample = 2,
}

fn invalid_interleave_mode(_value: u8) -> JpeglsError {
    JpeglsError::InvalidParameterInterleaveMode
}
