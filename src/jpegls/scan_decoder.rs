use crate::FrameInfo;
use crate::constants::{J, MAXIMUM_RUN_INDEX, REGULAR_MODE_CONTEXT_COUNT};
use crate::error::JpeglsError;
use crate::jpegls::bit_reader::BitReader;
use crate::jpegls::golomb::{decode_mapped_value, unmap_error_value};
use crate::jpegls::line_buffer::ComponentLines;
use crate::jpegls::prediction::{GradientQuantizer, QuantizedContext, get_predicted_value};
use crate::jpegls::regular_mode_context::RegularModeContext;
use crate::jpegls::run_mode_context::RunModeContext;
use crate::jpegls::traits::{CodingTraits, apply_sign, sign};
use crate::jpegls::{CodingParameters, InterleaveMode, JpeglsPcParameters};
use log::debug;

/// Decodes the entropy coded data of one scan into reconstructed samples.
pub struct ScanDecoder<'a> {
    frame_info: FrameInfo,
    traits: CodingTraits,
    quantizer: GradientQuantizer,
    interleave_mode: InterleaveMode,
    reader: BitReader<'a>,

    regular_mode_contexts: Vec<RegularModeContext>,
    run_mode_contexts: [RunModeContext; 2],
    run_index: usize,
}

impl<'a> ScanDecoder<'a> {
    /// `preset_coding_parameters` must be complete, as returned by `is_valid`.
    pub fn new(
        frame_info: FrameInfo,
        preset_coding_parameters: &JpeglsPcParameters,
        coding_parameters: CodingParameters,
        source: &'a [u8],
    ) -> Self {
        let traits = CodingTraits::new(
            preset_coding_parameters.maximum_sample_value,
            coding_parameters.near_lossless,
            preset_coding_parameters.reset_value,
        );

        Self {
            frame_info,
            traits,
            quantizer: GradientQuantizer::new(preset_coding_parameters, coding_parameters.near_lossless),
            interleave_mode: coding_parameters.interleave_mode,
            reader: BitReader::new(source),
            regular_mode_contexts: vec![RegularModeContext::new(traits.range); REGULAR_MODE_CONTEXT_COUNT],
            run_mode_contexts: [RunModeContext::new(0, traits.range), RunModeContext::new(1, traits.range)],
            run_index: 0,
        }
    }

    /// Decodes the scan holding `component_indices` into the sample interleaved
    /// `destination` and returns the byte offset just past the scan's coded data.
    pub fn decode_scan(
        &mut self,
        component_indices: &[usize],
        destination: &mut [u16],
    ) -> Result<usize, JpeglsError> {
        let width = self.frame_info.width as usize;
        let height = self.frame_info.height as usize;
        let stride = self.frame_info.component_count as usize;
        debug_assert!(destination.len() >= width * height * stride);

        debug!(
            "decoding scan: components {:?}, near {}, interleave {:?}",
            component_indices, self.traits.near_lossless, self.interleave_mode
        );

        let mut lines: Vec<ComponentLines> = component_indices.iter().map(|_| ComponentLines::new(width)).collect();
        let mut run_indices = vec![0; component_indices.len()];
        let sample_interleaved = self.interleave_mode == InterleaveMode::Sample && component_indices.len() > 1;

        for line in 0..height {
            if sample_interleaved {
                lines.iter_mut().for_each(ComponentLines::begin_line);
                self.decode_sample_interleaved_line(&mut lines)?;
            } else {
                for (component_lines, run_index) in lines.iter_mut().zip(run_indices.iter_mut()) {
                    self.run_index = *run_index;
                    component_lines.begin_line();
                    self.decode_line(component_lines)?;
                    *run_index = self.run_index;
                }
            }

            let row = &mut destination[line * width * stride..(line + 1) * width * stride];
            for (component_lines, &component) in lines.iter_mut().zip(component_indices) {
                for (pixel, &sample) in row.chunks_exact_mut(stride).zip(component_lines.samples()) {
                    pixel[component] = sample;
                }
                component_lines.end_line();
            }
        }

        Ok(self.reader.end_of_scan_position())
    }

    fn decode_line(&mut self, lines: &mut ComponentLines) -> Result<(), JpeglsError> {
        let width = self.frame_info.width as usize;
        let mut index = 1;

        while index <= width {
            let neighbors = lines.neighbors(index);
            let context_id = self.quantizer.compute_context_id(
                neighbors.rd - neighbors.rb,
                neighbors.rb - neighbors.rc,
                neighbors.rc - neighbors.ra,
            );

            if context_id != 0 {
                let predicted_value = get_predicted_value(neighbors.ra, neighbors.rb, neighbors.rc);
                lines.current[index] = self.decode_regular(context_id, predicted_value)? as u16;
                index += 1;
            } else {
                index += self.decode_run_mode(index, lines)?;
            }
        }
        Ok(())
    }

    fn decode_sample_interleaved_line(&mut self, lines: &mut [ComponentLines]) -> Result<(), JpeglsError> {
        let width = self.frame_info.width as usize;
        let mut index = 1;

        while index <= width {
            let mut context_ids = [0; 4];
            for (context_id, component_lines) in context_ids.iter_mut().zip(lines.iter()) {
                let neighbors = component_lines.neighbors(index);
                *context_id = self.quantizer.compute_context_id(
                    neighbors.rd - neighbors.rb,
                    neighbors.rb - neighbors.rc,
                    neighbors.rc - neighbors.ra,
                );
            }

            if context_ids[..lines.len()].iter().all(|&id| id == 0) {
                index += self.decode_sample_interleaved_run_mode(index, lines)?;
                continue;
            }

            for (&context_id, component_lines) in context_ids.iter().zip(lines.iter_mut()) {
                let neighbors = component_lines.neighbors(index);
                let predicted_value = get_predicted_value(neighbors.ra, neighbors.rb, neighbors.rc);
                component_lines.current[index] = self.decode_regular(context_id, predicted_value)? as u16;
            }
            index += 1;
        }
        Ok(())
    }

    fn decode_regular(&mut self, context_id: i32, predicted_value: i32) -> Result<i32, JpeglsError> {
        let quantized_context = QuantizedContext::from_context_id(context_id);
        let context = &mut self.regular_mode_contexts[quantized_context.index];

        let corrected_prediction = self
            .traits
            .correct_prediction(predicted_value + apply_sign(context.c(), quantized_context.sign));
        let k = context.compute_golomb_coding_parameter()?;
        let mapped_error_value = decode_mapped_value(
            &mut self.reader,
            k,
            self.traits.limit,
            self.traits.quantized_bits_per_pixel,
        )?;
        let error_value =
            unmap_error_value(mapped_error_value) ^ context.get_error_correction(k | self.traits.near_lossless);
        if error_value.abs() > 65535 {
            return Err(JpeglsError::InvalidData);
        }

        context.update_variables_and_bias(error_value, self.traits.near_lossless, self.traits.reset_threshold)?;

        Ok(self
            .traits
            .compute_reconstructed_sample(corrected_prediction, apply_sign(error_value, quantized_context.sign)))
    }

    /// Decodes a run starting at line buffer `index` plus its interruption sample.
    /// Returns the number of samples reconstructed.
    fn decode_run_mode(&mut self, index: usize, lines: &mut ComponentLines) -> Result<usize, JpeglsError> {
        let width = self.frame_info.width as usize;
        let ra = lines.current[index - 1];

        let run_length = self.decode_run_pixels(width + 1 - index)?;
        lines.current[index..index + run_length].fill(ra);

        let end_index = index + run_length;
        if end_index == width + 1 {
            return Ok(run_length);
        }

        let ra = ra as i32;
        let rb = lines.previous[end_index] as i32;
        lines.current[end_index] = self.decode_run_interruption_pixel(ra, rb)? as u16;
        self.decrement_run_index();
        Ok(run_length + 1)
    }

    fn decode_sample_interleaved_run_mode(
        &mut self,
        index: usize,
        lines: &mut [ComponentLines],
    ) -> Result<usize, JpeglsError> {
        let width = self.frame_info.width as usize;

        let run_length = self.decode_run_pixels(width + 1 - index)?;
        for component_lines in lines.iter_mut() {
            let ra = component_lines.current[index - 1];
            component_lines.current[index..index + run_length].fill(ra);
        }

        let end_index = index + run_length;
        if end_index == width + 1 {
            return Ok(run_length);
        }

        for component_lines in lines.iter_mut() {
            let ra = component_lines.current[end_index - 1] as i32;
            let rb = component_lines.previous[end_index] as i32;
            let error_value = self.decode_run_interruption_error(0)?;
            component_lines.current[end_index] =
                self.traits.compute_reconstructed_sample(rb, error_value * sign(rb - ra)) as u16;
        }
        self.decrement_run_index();
        Ok(run_length + 1)
    }

    // Code segment A.16
    fn decode_run_pixels(&mut self, pixel_count: usize) -> Result<usize, JpeglsError> {
        let mut index = 0;
        while self.reader.read_bit()? {
            let segment_length = 1usize << J[self.run_index];
            let count = segment_length.min(pixel_count - index);
            index += count;
            if count == segment_length {
                self.increment_run_index();
            }
            if index == pixel_count {
                break;
            }
        }

        if index != pixel_count {
            let j = J[self.run_index];
            if j > 0 {
                index += self.reader.read_bits(j)? as usize;
            }
        }

        if index > pixel_count {
            return Err(JpeglsError::InvalidData);
        }
        Ok(index)
    }

    fn decode_run_interruption_pixel(&mut self, ra: i32, rb: i32) -> Result<i32, JpeglsError> {
        if self.traits.is_near(ra, rb) {
            let error_value = self.decode_run_interruption_error(1)?;
            Ok(self.traits.compute_reconstructed_sample(ra, error_value))
        } else {
            let error_value = self.decode_run_interruption_error(0)?;
            Ok(self.traits.compute_reconstructed_sample(rb, error_value * sign(rb - ra)))
        }
    }

    fn decode_run_interruption_error(&mut self, run_interruption_type: usize) -> Result<i32, JpeglsError> {
        let context = &mut self.run_mode_contexts[run_interruption_type];
        let k = context.compute_golomb_coding_parameter()?;
        let e_mapped_error_value = decode_mapped_value(
            &mut self.reader,
            k,
            self.traits.limit - J[self.run_index] - 1,
            self.traits.quantized_bits_per_pixel,
        )?;
        let error_value = context.decode_error_value(e_mapped_error_value, k);
        context.update_variables(error_value, e_mapped_error_value, self.traits.reset_threshold);
        Ok(error_value)
    }

    fn increment_run_index(&mut self) {
        self.run_index = (self.run_index + 1).min(MAXIMUM_RUN_INDEX);
    }

    fn decrement_run_index(&mut self) {
        self.run_index = self.run_index.saturating_sub(1);
    }
}
