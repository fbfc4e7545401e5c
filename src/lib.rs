//! JPEG-LS (ISO/IEC 14495-1 / ITU-T T.87) codec for DICOM pixel data.
//!
//! [`JpeglsCodec`] is the frame level entry point used by a DICOM pixel data
//! pipeline: it converts between one uncompressed frame, described by a
//! [`PixelDataDescriptor`], and a complete JPEG-LS stream. The lower level
//! [`JpeglsEncoder`] and [`JpeglsDecoder`] expose the stream parameters directly.
//!
//! ```
//! use dicom_jpegls::{CompressionConfiguration, JpeglsCodec, PixelDataDescriptor};
//!
//! let codec = JpeglsCodec::new();
//! let descriptor = PixelDataDescriptor::new(2, 2, 8, 8, 1);
//! let pixels = [10u8, 20, 30, 40];
//! let encoded = codec
//!     .encode_frame(&pixels, &descriptor, 0, &CompressionConfiguration::lossless())
//!     .unwrap();
//! assert_eq!(codec.decode_frame(&encoded, &descriptor, 0).unwrap(), pixels);
//! ```

pub mod codec;
pub mod constants;
pub mod error;
pub mod jpeg_marker_code;
pub mod jpeg_stream_reader;
pub mod jpeg_stream_writer;
pub mod jpegls;

pub use codec::{
    CompressionConfiguration, JPEG_LS_LOSSLESS_TRANSFER_SYNTAX_UID, JPEG_LS_NEAR_LOSSLESS_TRANSFER_SYNTAX_UID,
    JpeglsCodec, PixelDataDescriptor, Quality,
};
pub use error::JpeglsError;
pub use jpegls::{InterleaveMode, JpeglsDecoder, JpeglsEncoder, JpeglsPcParameters};

/// Dimensions and sample layout of a JPEG-LS frame (SOF55).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: i32,
    pub component_count: i32,
}
