//! Marker segment parser for JPEG-LS interchange streams.

use crate::FrameInfo;
use crate::constants::{
    MAXIMUM_BITS_PER_SAMPLE, MAXIMUM_COMPONENT_COUNT, MINIMUM_BITS_PER_SAMPLE, MINIMUM_COMPONENT_COUNT,
    SEGMENT_LENGTH_SIZE,
};
use crate::error::JpeglsError;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JpegMarkerCode};
use crate::jpegls::{CodingParameters, InterleaveMode, JpeglsPcParameters};
use log::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegStreamReaderState {
    BeforeStartOfImage,
    HeaderSection,
    ScanSection,
    EndOfImage,
}

/// The parsed start of scan segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanHeader {
    /// Frame component indices (not ids) coded in this scan, in scan order.
    pub component_indices: Vec<usize>,
    pub coding_parameters: CodingParameters,
}

pub struct JpegStreamReader<'a> {
    source: &'a [u8],
    position: usize,
    state: JpegStreamReaderState,
    frame_info: FrameInfo,
    component_ids: Vec<u8>,
    preset_coding_parameters: JpeglsPcParameters,
    scan_header: ScanHeader,
}

impl<'a> JpegStreamReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
            state: JpegStreamReaderState::BeforeStartOfImage,
            frame_info: FrameInfo::default(),
            component_ids: Vec::new(),
            preset_coding_parameters: JpeglsPcParameters::default(),
            scan_header: ScanHeader::default(),
        }
    }

    pub fn state(&self) -> JpegStreamReaderState {
        self.state
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.frame_info
    }

    /// The preset coding parameters of the last LSE segment; zero fields mean "default".
    pub fn preset_coding_parameters(&self) -> JpeglsPcParameters {
        self.preset_coding_parameters
    }

    pub fn scan_header(&self) -> &ScanHeader {
        &self.scan_header
    }

    /// Entropy coded data of the current scan and everything after it.
    pub fn remaining_data(&self) -> &'a [u8] {
        &self.source[self.position..]
    }

    pub fn advance(&mut self, count: usize) {
        self.position = (self.position + count).min(self.source.len());
    }

    /// Reads from `SOI` up to and including the first start of scan segment.
    pub fn read_header(&mut self) -> Result<(), JpeglsError> {
        if self.source.is_empty() {
            return Err(JpeglsError::EmptyInput);
        }
        if self.state != JpegStreamReaderState::BeforeStartOfImage {
            return Ok(());
        }

        self.read_start_of_image()?;
        if !self.read_segments_until_scan()? {
            return Err(JpeglsError::MissingSos);
        }
        Ok(())
    }

    /// Call after the entropy coded data of a scan has been consumed.
    /// Returns `true` when a further scan header was read, `false` at `EOI`.
    pub fn read_next_scan(&mut self) -> Result<bool, JpeglsError> {
        debug_assert!(self.state == JpegStreamReaderState::ScanSection);
        self.read_segments_until_scan()
    }

    fn read_segments_until_scan(&mut self) -> Result<bool, JpeglsError> {
        loop {
            let marker = self.read_next_marker()?;
            trace!("marker {:?} at offset {}", marker, self.position - 2);

            match marker {
                JpegMarkerCode::StartOfScan => {
                    if self.frame_info.component_count == 0 {
                        return Err(JpeglsError::UnexpectedStartOfScanMarker);
                    }
                    self.read_start_of_scan_segment()?;
                    self.state = JpegStreamReaderState::ScanSection;
                    return Ok(true);
                }
                JpegMarkerCode::EndOfImage => {
                    if self.state == JpegStreamReaderState::HeaderSection {
                        return Err(JpeglsError::UnexpectedEndOfImageMarker);
                    }
                    self.state = JpegStreamReaderState::EndOfImage;
                    return Ok(false);
                }
                JpegMarkerCode::StartOfImage => return Err(JpeglsError::DuplicateStartOfImageMarker),
                JpegMarkerCode::StartOfFrameJpegls => {
                    if self.frame_info.component_count != 0 {
                        return Err(JpeglsError::DuplicateStartOfFrameMarker);
                    }
                    self.read_start_of_frame_segment()?;
                }
                JpegMarkerCode::JpeglsPresetParameters => self.read_preset_parameters_segment()?,
                JpegMarkerCode::DefineRestartInterval => self.read_define_restart_interval_segment()?,
                JpegMarkerCode::Comment => self.skip_segment()?,
                marker if marker.is_application_data() => self.skip_segment()?,
                marker if marker.is_unsupported_frame() => {
                    warn!("frame marker {:?} is not a JPEG-LS frame", marker);
                    return Err(JpeglsError::EncodingNotSupported);
                }
                _ => return Err(JpeglsError::EncodingNotSupported),
            }
        }
    }

    fn read_start_of_image(&mut self) -> Result<(), JpeglsError> {
        if self.source.len() < 2
            || self.source[0] != JPEG_MARKER_START_BYTE
            || self.source[1] != JpegMarkerCode::StartOfImage as u8
        {
            return Err(JpeglsError::MissingSoi);
        }
        self.position = 2;
        self.state = JpegStreamReaderState::HeaderSection;
        Ok(())
    }

    fn read_next_marker(&mut self) -> Result<JpegMarkerCode, JpeglsError> {
        if self.read_u8()? != JPEG_MARKER_START_BYTE {
            return Err(JpeglsError::InvalidData);
        }

        // Any number of 0xFF fill bytes may precede a marker (ITU-T T.81, B.1.1.2).
        let mut code = self.read_u8()?;
        while code == JPEG_MARKER_START_BYTE {
            code = self.read_u8()?;
        }
        JpegMarkerCode::try_from(code)
    }

    fn read_start_of_frame_segment(&mut self) -> Result<(), JpeglsError> {
        let length = self.read_u16()? as usize;

        let bits_per_sample = self.read_u8()? as i32;
        if !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&bits_per_sample) {
            return Err(JpeglsError::InvalidParameterBitsPerSample);
        }
        let height = self.read_u16()? as u32;
        let width = self.read_u16()? as u32;
        if width == 0 || height == 0 {
            return Err(JpeglsError::InvalidDimensions);
        }
        let component_count = self.read_u8()? as i32;
        if !(MINIMUM_COMPONENT_COUNT..=MAXIMUM_COMPONENT_COUNT).contains(&component_count) {
            return Err(JpeglsError::InvalidComponentCount);
        }
        if length != 8 + 3 * component_count as usize {
            return Err(JpeglsError::InvalidMarkerSegmentSize);
        }

        for _ in 0..component_count {
            let id = self.read_u8()?;
            if self.component_ids.contains(&id) {
                return Err(JpeglsError::InvalidData);
            }
            self.component_ids.push(id);
            let _sampling_factors = self.read_u8()?;
            let _quantization_table = self.read_u8()?;
        }

        self.frame_info = FrameInfo {
            width,
            height,
            bits_per_sample,
            component_count,
        };
        trace!("frame {:?}", self.frame_info);
        Ok(())
    }

    fn read_preset_parameters_segment(&mut self) -> Result<(), JpeglsError> {
        let length = self.read_u16()? as usize;
        if length < SEGMENT_LENGTH_SIZE + 1 {
            return Err(JpeglsError::InvalidMarkerSegmentSize);
        }

        let parameters_type = self.read_u8()?;
        if parameters_type != 1 {
            // Mapping tables and oversize image dimensions are not used by DICOM.
            warn!("skipping JPEG-LS preset parameters segment of type {}", parameters_type);
            return self.skip(length - SEGMENT_LENGTH_SIZE - 1);
        }

        const PRESET_CODING_PARAMETERS_LENGTH: usize = 13;
        if length < PRESET_CODING_PARAMETERS_LENGTH {
            return Err(JpeglsError::InvalidMarkerSegmentSize);
        }

        self.preset_coding_parameters = JpeglsPcParameters {
            maximum_sample_value: self.read_u16()? as i32,
            threshold1: self.read_u16()? as i32,
            threshold2: self.read_u16()? as i32,
            threshold3: self.read_u16()? as i32,
            reset_value: self.read_u16()? as i32,
        };
        trace!("preset coding parameters {:?}", self.preset_coding_parameters);
        self.skip(length - PRESET_CODING_PARAMETERS_LENGTH)
    }

    fn read_define_restart_interval_segment(&mut self) -> Result<(), JpeglsError> {
        if self.read_u16()? != 4 {
            return Err(JpeglsError::InvalidMarkerSegmentSize);
        }
        if self.read_u16()? != 0 {
            return Err(JpeglsError::EncodingNotSupported);
        }
        Ok(())
    }

    fn read_start_of_scan_segment(&mut self) -> Result<(), JpeglsError> {
        let length = self.read_u16()? as usize;
        let component_count = self.read_u8()? as usize;
        if component_count == 0 || component_count > self.frame_info.component_count as usize {
            return Err(JpeglsError::InvalidComponentCount);
        }
        if length != 6 + 2 * component_count {
            return Err(JpeglsError::InvalidMarkerSegmentSize);
        }

        let mut component_indices = Vec::with_capacity(component_count);
        for _ in 0..component_count {
            let id = self.read_u8()?;
            let index = self
                .component_ids
                .iter()
                .position(|&component_id| component_id == id)
                .ok_or(JpeglsError::UnknownComponentId)?;
            if component_indices.contains(&index) {
                return Err(JpeglsError::UnknownComponentId);
            }
            component_indices.push(index);

            if self.read_u8()? != 0 {
                return Err(JpeglsError::EncodingNotSupported);
            }
        }

        let near_lossless = self.read_u8()? as i32;
        let interleave_mode = InterleaveMode::try_from(self.read_u8()?)?;
        if interleave_mode == InterleaveMode::None && component_count != 1 {
            return Err(JpeglsError::InvalidParameterInterleaveMode);
        }
        let point_transform = self.read_u8()?;
        if point_transform != 0 {
            warn!("ignoring point transform {} in scan header", point_transform);
        }

        self.scan_header = ScanHeader {
            component_indices,
            coding_parameters: CodingParameters {
                near_lossless,
                interleave_mode,
            },
        };
        trace!("scan {:?}", self.scan_header);
        Ok(())
    }

    fn skip_segment(&mut self) -> Result<(), JpeglsError> {
        let length = self.read_u16()? as usize;
        if length < SEGMENT_LENGTH_SIZE {
            return Err(JpeglsError::InvalidMarkerSegmentSize);
        }
        self.skip(length - SEGMENT_LENGTH_SIZE)
    }

    fn skip(&mut self, count: usize) -> Result<(), JpeglsError> {
        if self.source.len() - self.position < count {
            return Err(self.end_of_data_error());
        }
        self.position += count;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, JpeglsError> {
        let Some(&value) = self.source.get(self.position) else {
            return Err(self.end_of_data_error());
        };
        self.position += 1;
        Ok(value)
    }

    fn read_u16(&mut self) -> Result<u16, JpeglsError> {
        let high = self.read_u8()? as u16;
        let low = self.read_u8()? as u16;
        Ok((high << 8) | low)
    }

    fn end_of_data_error(&self) -> JpeglsError {
        match self.state {
            JpegStreamReaderState::BeforeStartOfImage => JpeglsError::MissingSoi,
            JpegStreamReaderState::HeaderSection => JpeglsError::MissingSos,
            JpegStreamReaderState::ScanSection | JpegStreamReaderState::EndOfImage => {
                JpeglsError::UnexpectedEndOfBitstream
            }
        }
    }
}
