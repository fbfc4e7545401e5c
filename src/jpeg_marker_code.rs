use crate::error::JpeglsError;
use num_enum::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[num_enum(error_type(name = JpeglsError, constructor = JpeglsError::UnknownJpegMarkerFound))]
#[repr(u8)]
pub enum JpegMarkerCode {
    /// SOF0: Baseline DCT frame. Recognized only to be rejected.
    StartOfFrameBaseline = 0xC0,
    /// SOF1: Extended sequential DCT frame.
    StartOfFrameExtendedSequential = 0xC1,
    /// SOF2: Progressive DCT frame.
    StartOfFrameProgressive = 0xC2,
    /// SOF3: Lossless (sequential) frame.
    StartOfFrameLossless = 0xC3,

    /// SOI: Marks the start of an image.
    StartOfImage = 0xD8,

    /// EOI: Marks the end of an image.
    EndOfImage = 0xD9,

    /// SOS: Marks the start of scan.
    StartOfScan = 0xDA,

    /// DNL: Defines the number of lines in a scan.
    DefineNumberOfLines = 0xDC,

    /// DRI: Defines the restart interval used in succeeding scans.
    DefineRestartInterval = 0xDD,

    /// APP0: Application data 0: used for JFIF header.
    ApplicationData0 = 0xE0,
    /// APP1: Application data 1: used for EXIF or XMP header.
    ApplicationData1 = 0xE1,
    /// APP2: Application data 2: used for ICC profile.
    ApplicationData2 = 0xE2,
    /// APP3: Application data 3: used for meta info
    ApplicationData3 = 0xE3,
    /// APP4: Application data 4.
    ApplicationData4 = 0xE4,
    /// APP5: Application data 5.
    ApplicationData5 = 0xE5,
    /// APP6: Application data 6.
    ApplicationData6 = 0xE6,
    /// APP7: Application data 7: used for HP color-space info.
    ApplicationData7 = 0xE7,
    /// APP8: Application data 8: used for HP color-transformation info or SPIFF header.
    ApplicationData8 = 0xE8,
    /// APP9: Application data 9.
    ApplicationData9 = 0xE9,
    /// APP10: Application data 10.
    ApplicationData10 = 0xEA,
    /// APP11: Application data 11.
    ApplicationData11 = 0xEB,
    /// APP12: Application data 12: used for Picture info.
    ApplicationData12 = 0xEC,
    /// APP13: Application data 13: used by PhotoShop IRB
    ApplicationData13 = 0xED,
    /// APP14: Application data 14: used by Adobe
    ApplicationData14 = 0xEE,
    /// APP15: Application data 15.
    ApplicationData15 = 0xEF,

    /// COM: Comment block.
    Comment = 0xFE,

    // The following markers are defined in ISO/IEC 14495-1 | ITU T.87. (JPEG-LS standard)
    /// SOF_55: Marks the start of a JPEG-LS encoded frame.
    StartOfFrameJpegls = 0xF7,

    /// LSE: Marks the start of a JPEG-LS preset parameters segment.
    JpeglsPresetParameters = 0xF8,

    /// SOF_57: JPEG-LS extension (ISO/IEC 14495-2) frame. Recognized only to be rejected.
    StartOfFrameJpeglsExtended = 0xF9,
}

impl JpegMarkerCode {
    pub fn is_application_data(self) -> bool {
        (Self::ApplicationData0 as u8..=Self::ApplicationData15 as u8).contains(&(self as u8))
    }

    /// Frame markers of JPEG processes other than JPEG-LS baseline.
    pub fn is_unsupported_frame(self) -> bool {
        matches!(
            self,
            Self::StartOfFrameBaseline
                | Self::StartOfFrameExtendedSequential
                | Self::StartOfFrameProgressive
                | Self::StartOfFrameLossless
                | Self::StartOfFrameJpeglsExtended
        )
    }
}

pub const JPEG_MARKER_START_BYTE: u8 = 0xFF;

/// True when `0xFF` followed by `code` can only be a marker, never stuffed entropy data.
pub fn is_marker_code(code: u8) -> bool {
    code & 0x80 != 0
}
