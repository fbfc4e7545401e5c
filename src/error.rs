use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpeglsError {
    #[error("Frame data is empty")]
    EmptyInput,
    #[error("Start of image marker not found")]
    MissingSoi,
    #[error("Start of scan marker not found")]
    MissingSos,
    #[error("Invalid image dimensions")]
    InvalidDimensions,
    #[error("Invalid component count")]
    InvalidComponentCount,
    #[error("Unexpected end of bitstream")]
    UnexpectedEndOfBitstream,
    #[error("Unsupported compression configuration")]
    UnsupportedConfiguration,

    #[error("Invalid data")]
    InvalidData,
    #[error("Destination too small")]
    DestinationTooSmall,
    #[error("Source too small")]
    SourceTooSmall,
    #[error("Encoding not supported")]
    EncodingNotSupported,
    #[error("Unknown JPEG marker found: 0xFF{0:02X}")]
    UnknownJpegMarkerFound(u8),
    #[error("Unexpected start of scan marker")]
    UnexpectedStartOfScanMarker,
    #[error("Unexpected end of image marker")]
    UnexpectedEndOfImageMarker,
    #[error("Invalid marker segment size")]
    InvalidMarkerSegmentSize,
    #[error("Duplicate start of image marker")]
    DuplicateStartOfImageMarker,
    #[error("Duplicate start of frame marker")]
    DuplicateStartOfFrameMarker,
    #[error("Unknown component ID")]
    UnknownComponentId,
    #[error("Frame header does not match the pixel data descriptor")]
    DescriptorMismatch,
    #[error("Invalid operation")]
    InvalidOperation,

    #[error("Invalid parameter bits per sample")]
    InvalidParameterBitsPerSample,
    #[error("Invalid parameter interleave mode")]
    InvalidParameterInterleaveMode,
    #[error("Invalid parameter near lossless")]
    InvalidParameterNearLossless,
    #[error("Invalid parameter JPEG-LS preset parameters")]
    InvalidParameterJpeglsPresetParameters,
}
