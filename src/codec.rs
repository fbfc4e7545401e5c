//! DICOM facing JPEG-LS codec: one frame of pixel data in, one frame out.

use crate::FrameInfo;
use crate::error::JpeglsError;
use crate::jpegls::coding_parameters::compute_maximum_near_lossless;
use crate::jpegls::traits::{pack_samples, unpack_samples};
use crate::jpegls::{InterleaveMode, JpeglsDecoder, JpeglsEncoder};
use log::debug;

/// JPEG-LS Lossless Image Compression.
pub const JPEG_LS_LOSSLESS_TRANSFER_SYNTAX_UID: &str = "1.2.840.10008.1.2.4.80";
/// JPEG-LS Lossy (Near-Lossless) Image Compression.
pub const JPEG_LS_NEAR_LOSSLESS_TRANSFER_SYNTAX_UID: &str = "1.2.840.10008.1.2.4.81";

/// Geometry of one frame, taken from the Rows, Columns, Bits Allocated,
/// Bits Stored and Samples per Pixel attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelDataDescriptor {
    pub rows: u16,
    pub columns: u16,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    pub samples_per_pixel: u16,
}

impl PixelDataDescriptor {
    pub fn new(rows: u16, columns: u16, bits_allocated: u16, bits_stored: u16, samples_per_pixel: u16) -> Self {
        Self {
            rows,
            columns,
            bits_allocated,
            bits_stored,
            samples_per_pixel,
        }
    }

    pub fn validate(&self) -> Result<(), JpeglsError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(JpeglsError::InvalidDimensions);
        }
        if !(1..=4).contains(&self.samples_per_pixel) {
            return Err(JpeglsError::InvalidComponentCount);
        }
        if self.bits_allocated != 8 && self.bits_allocated != 16 {
            return Err(JpeglsError::UnsupportedConfiguration);
        }
        if self.bits_stored < 2 || self.bits_stored > self.bits_allocated {
            return Err(JpeglsError::InvalidParameterBitsPerSample);
        }
        Ok(())
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_allocated.div_ceil(8) as usize
    }

    pub fn sample_count(&self) -> usize {
        self.rows as usize * self.columns as usize * self.samples_per_pixel as usize
    }

    /// Size in bytes of one uncompressed frame.
    pub fn frame_size(&self) -> usize {
        self.sample_count() * self.bytes_per_sample()
    }

    pub fn maximum_sample_value(&self) -> i32 {
        (1 << self.bits_stored) - 1
    }

    fn frame_info(&self) -> FrameInfo {
        FrameInfo {
            width: self.columns as u32,
            height: self.rows as u32,
            bits_per_sample: self.bits_stored as i32,
            component_count: self.samples_per_pixel as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quality {
    Lossless,
    /// `1.0` is lossless, lower values allow a larger reconstruction error.
    Lossy(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionConfiguration {
    pub quality: Quality,
    pub prefer_lossless: bool,
    /// Interleave mode for multi-component frames; `None` selects sample interleaving.
    pub interleave_mode: Option<InterleaveMode>,
}

impl Default for CompressionConfiguration {
    fn default() -> Self {
        Self::lossless()
    }
}

impl CompressionConfiguration {
    pub fn lossless() -> Self {
        Self {
            quality: Quality::Lossless,
            prefer_lossless: true,
            interleave_mode: None,
        }
    }

    pub fn lossy(quality: f32) -> Self {
        Self {
            quality: Quality::Lossy(quality),
            prefer_lossless: false,
            interleave_mode: None,
        }
    }

    pub fn with_interleave_mode(mut self, interleave_mode: InterleaveMode) -> Self {
        self.interleave_mode = Some(interleave_mode);
        self
    }

    pub fn is_lossless(&self) -> bool {
        match self.quality {
            _ if self.prefer_lossless => true,
            Quality::Lossless => true,
            Quality::Lossy(quality) => quality >= 1.0,
        }
    }

    /// Derives `NEAR` for samples up to `maximum_sample_value`.
    ///
    /// Lossy quality `q` maps to `ceil((1 - q) * 10 * scale)`, where `scale`
    /// is the sample range in units of 256, limited to `[1, min(255, MAXVAL / 2)]`.
    pub fn near_lossless(&self, maximum_sample_value: i32) -> i32 {
        let Quality::Lossy(quality) = self.quality else {
            return 0;
        };
        if self.is_lossless() {
            return 0;
        }

        let maximum_near_lossless = compute_maximum_near_lossless(maximum_sample_value);
        if maximum_near_lossless == 0 {
            return 0;
        }
        let scale = ((maximum_sample_value + 1) >> 8).max(1) as f32;
        let near_lossless = ((1.0 - quality.clamp(0.0, 1.0)) * 10.0 * scale).ceil() as i32;
        near_lossless.clamp(1, maximum_near_lossless)
    }
}

/// Stateless JPEG-LS codec for DICOM frames; safe to share between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpeglsCodec;

impl JpeglsCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn transfer_syntax_uids(&self) -> [&'static str; 2] {
        [
            JPEG_LS_LOSSLESS_TRANSFER_SYNTAX_UID,
            JPEG_LS_NEAR_LOSSLESS_TRANSFER_SYNTAX_UID,
        ]
    }

    pub fn transfer_syntax_for(&self, configuration: &CompressionConfiguration) -> &'static str {
        if configuration.is_lossless() {
            JPEG_LS_LOSSLESS_TRANSFER_SYNTAX_UID
        } else {
            JPEG_LS_NEAR_LOSSLESS_TRANSFER_SYNTAX_UID
        }
    }

    pub fn can_encode(&self, _configuration: &CompressionConfiguration, descriptor: &PixelDataDescriptor) -> bool {
        descriptor.validate().is_ok() && matches!(descriptor.samples_per_pixel, 1 | 3)
    }

    /// Decodes one compressed frame into sample interleaved (planar configuration 0),
    /// little-endian pixel data of [`PixelDataDescriptor::frame_size`] bytes.
    pub fn decode_frame(
        &self,
        frame_data: &[u8],
        descriptor: &PixelDataDescriptor,
        frame_index: usize,
    ) -> Result<Vec<u8>, JpeglsError> {
        if frame_data.is_empty() {
            return Err(JpeglsError::EmptyInput);
        }
        descriptor.validate()?;

        let mut decoder = JpeglsDecoder::new(frame_data);
        decoder.read_header()?;
        let frame_info = decoder.frame_info();
        if frame_info.width != descriptor.columns as u32
            || frame_info.height != descriptor.rows as u32
            || frame_info.component_count != descriptor.samples_per_pixel as i32
            || frame_info.bits_per_sample > descriptor.bits_allocated as i32
        {
            return Err(JpeglsError::DescriptorMismatch);
        }

        debug!(
            "decoding frame {}: {}x{}x{}, {} bits, near {}, interleave {:?}",
            frame_index,
            frame_info.width,
            frame_info.height,
            frame_info.component_count,
            frame_info.bits_per_sample,
            decoder.near_lossless(),
            decoder.interleave_mode()
        );

        let samples = decoder.decode_samples()?;
        let mut destination = vec![0; descriptor.frame_size()];
        if descriptor.bits_allocated == 8 {
            pack_samples::<u8>(&samples, &mut destination);
        } else {
            pack_samples::<u16>(&samples, &mut destination);
        }
        Ok(destination)
    }

    /// Encodes one uncompressed, sample interleaved little-endian frame into a
    /// complete JPEG-LS stream. Bits above Bits Stored are ignored.
    pub fn encode_frame(
        &self,
        frame_data: &[u8],
        descriptor: &PixelDataDescriptor,
        frame_index: usize,
        configuration: &CompressionConfiguration,
    ) -> Result<Vec<u8>, JpeglsError> {
        if !self.can_encode(configuration, descriptor) {
            return Err(JpeglsError::UnsupportedConfiguration);
        }
        if frame_data.len() < descriptor.frame_size() {
            return Err(JpeglsError::SourceTooSmall);
        }

        let maximum_sample_value = descriptor.maximum_sample_value();
        let frame_data = &frame_data[..descriptor.frame_size()];
        let mut samples = if descriptor.bits_allocated == 8 {
            unpack_samples::<u8>(frame_data)
        } else {
            unpack_samples::<u16>(frame_data)
        };
        for sample in &mut samples {
            *sample &= maximum_sample_value as u16;
        }

        let near_lossless = configuration.near_lossless(maximum_sample_value);
        let interleave_mode = configuration.interleave_mode.unwrap_or(InterleaveMode::Sample);
        debug!(
            "encoding frame {}: {}x{}x{}, {} bits, near {}, interleave {:?}",
            frame_index,
            descriptor.columns,
            descriptor.rows,
            descriptor.samples_per_pixel,
            descriptor.bits_stored,
            near_lossless,
            interleave_mode
        );

        let mut encoder = JpeglsEncoder::new();
        encoder
            .set_frame_info(descriptor.frame_info())?
            .set_near_lossless(near_lossless)?
            .set_interleave_mode(interleave_mode);
        encoder.encode_samples(&samples)
    }
}
