use crate::FrameInfo;
use crate::constants::{
    MAXIMUM_BITS_PER_SAMPLE, MAXIMUM_COMPONENT_COUNT, MAXIMUM_DIMENSION, MAXIMUM_NEAR_LOSSLESS,
    MINIMUM_BITS_PER_SAMPLE, MINIMUM_COMPONENT_COUNT,
};
use crate::error::JpeglsError;
use crate::jpeg_stream_writer::JpegStreamWriter;
use crate::jpegls::coding_parameters::{compute_default, is_default, is_valid};
use crate::jpegls::decoder::bytes_per_sample;
use crate::jpegls::scan_encoder::ScanEncoder;
use crate::jpegls::traits::unpack_samples;
use crate::jpegls::{CodingParameters, InterleaveMode, JpeglsPcParameters};
use log::debug;

/// Encodes one image into a JPEG-LS interchange stream (SOI ... EOI).
#[derive(Debug, Clone, Default)]
pub struct JpeglsEncoder {
    frame_info: FrameInfo,
    near_lossless: i32,
    interleave_mode: InterleaveMode,
    preset_coding_parameters: JpeglsPcParameters,
}

impl JpeglsEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frame_info(&mut self, frame_info: FrameInfo) -> Result<&mut Self, JpeglsError> {
        if frame_info.width == 0
            || frame_info.height == 0
            || frame_info.width > MAXIMUM_DIMENSION
            || frame_info.height > MAXIMUM_DIMENSION
        {
            return Err(JpeglsError::InvalidDimensions);
        }
        if !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&frame_info.bits_per_sample) {
            return Err(JpeglsError::InvalidParameterBitsPerSample);
        }
        if !(MINIMUM_COMPONENT_COUNT..=MAXIMUM_COMPONENT_COUNT).contains(&frame_info.component_count) {
            return Err(JpeglsError::InvalidComponentCount);
        }
        self.frame_info = frame_info;
        Ok(self)
    }

    pub fn set_near_lossless(&mut self, near_lossless: i32) -> Result<&mut Self, JpeglsError> {
        if !(0..=MAXIMUM_NEAR_LOSSLESS).contains(&near_lossless) {
            return Err(JpeglsError::InvalidParameterNearLossless);
        }
        self.near_lossless = near_lossless;
        Ok(self)
    }

    /// Ignored for single component images, which are always coded non-interleaved.
    pub fn set_interleave_mode(&mut self, interleave_mode: InterleaveMode) -> &mut Self {
        self.interleave_mode = interleave_mode;
        self
    }

    pub fn set_preset_coding_parameters(&mut self, preset_coding_parameters: JpeglsPcParameters) -> &mut Self {
        self.preset_coding_parameters = preset_coding_parameters;
        self
    }

    /// Encodes sample interleaved little-endian bytes, one or two bytes per sample.
    pub fn encode(&self, source: &[u8]) -> Result<Vec<u8>, JpeglsError> {
        let size = self.sample_count() * bytes_per_sample(self.frame_info.bits_per_sample);
        if source.len() < size {
            return Err(JpeglsError::SourceTooSmall);
        }

        let samples = if self.frame_info.bits_per_sample <= 8 {
            unpack_samples::<u8>(&source[..size])
        } else {
            unpack_samples::<u16>(&source[..size])
        };
        self.encode_samples(&samples)
    }

    pub fn encode_samples(&self, samples: &[u16]) -> Result<Vec<u8>, JpeglsError> {
        let frame_info = self.frame_info;
        if frame_info.width == 0 {
            return Err(JpeglsError::InvalidDimensions);
        }
        if samples.len() < self.sample_count() {
            return Err(JpeglsError::SourceTooSmall);
        }
        let samples = &samples[..self.sample_count()];

        let maximum_component_value = (1 << frame_info.bits_per_sample) - 1;
        let preset_coding_parameters = is_valid(
            &self.preset_coding_parameters,
            maximum_component_value,
            self.near_lossless,
        )?;
        if samples
            .iter()
            .any(|&sample| sample as i32 > preset_coding_parameters.maximum_sample_value)
        {
            return Err(JpeglsError::InvalidData);
        }

        let interleave_mode = if frame_info.component_count == 1 {
            InterleaveMode::None
        } else {
            self.interleave_mode
        };
        let coding_parameters = CodingParameters {
            near_lossless: self.near_lossless,
            interleave_mode,
        };

        let mut writer = JpegStreamWriter::with_capacity(samples.len() + 64);
        writer.write_start_of_image();
        writer.write_start_of_frame_segment(&frame_info);
        if !is_default(
            &preset_coding_parameters,
            &compute_default(maximum_component_value, self.near_lossless),
        ) {
            writer.write_jpegls_preset_parameters_segment(&preset_coding_parameters);
        }

        let component_count = frame_info.component_count as usize;
        let scans: Vec<Vec<usize>> = if interleave_mode == InterleaveMode::None {
            (0..component_count).map(|component| vec![component]).collect()
        } else {
            vec![(0..component_count).collect()]
        };

        for component_indices in &scans {
            writer.write_start_of_scan_segment(component_indices, self.near_lossless, interleave_mode);
            ScanEncoder::new(
                frame_info,
                &preset_coding_parameters,
                coding_parameters,
                writer.destination_mut(),
            )
            .encode_scan(component_indices, samples)?;
        }

        writer.write_end_of_image();
        debug!(
            "encoded {}x{}x{} at {} bits, near {}: {} bytes",
            frame_info.width,
            frame_info.height,
            frame_info.component_count,
            frame_info.bits_per_sample,
            self.near_lossless,
            writer.len()
        );
        Ok(writer.into_inner())
    }

    fn sample_count(&self) -> usize {
        self.frame_info.width as usize * self.frame_info.height as usize * self.frame_info.component_count as usize
    }
}
