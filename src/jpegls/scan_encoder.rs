use crate::FrameInfo;
use crate::constants::{J, MAXIMUM_RUN_INDEX, REGULAR_MODE_CONTEXT_COUNT};
use crate::error::JpeglsError;
use crate::jpegls::bit_writer::BitWriter;
use crate::jpegls::golomb::{encode_mapped_value, map_error_value};
use crate::jpegls::line_buffer::ComponentLines;
use crate::jpegls::prediction::{GradientQuantizer, QuantizedContext, get_predicted_value};
use crate::jpegls::regular_mode_context::RegularModeContext;
use crate::jpegls::run_mode_context::RunModeContext;
use crate::jpegls::traits::{CodingTraits, apply_sign, sign};
use crate::jpegls::{CodingParameters, InterleaveMode, JpeglsPcParameters};
use log::debug;

/// Encodes one scan. The model state mirrors [`crate::jpegls::scan_decoder::ScanDecoder`]:
/// prediction always uses reconstructed samples, never source samples.
pub struct ScanEncoder<'a> {
    frame_info: FrameInfo,
    traits: CodingTraits,
    quantizer: GradientQuantizer,
    interleave_mode: InterleaveMode,
    writer: BitWriter<'a>,

    regular_mode_contexts: Vec<RegularModeContext>,
    run_mode_contexts: [RunModeContext; 2],
    run_index: usize,
}

impl<'a> ScanEncoder<'a> {
    pub fn new(
        frame_info: FrameInfo,
        preset_coding_parameters: &JpeglsPcParameters,
        coding_parameters: CodingParameters,
        destination: &'a mut Vec<u8>,
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
            writer: BitWriter::new(destination),
            regular_mode_contexts: vec![RegularModeContext::new(traits.range); REGULAR_MODE_CONTEXT_COUNT],
            run_mode_contexts: [RunModeContext::new(0, traits.range), RunModeContext::new(1, traits.range)],
            run_index: 0,
        }
    }

    /// Encodes the components `component_indices` of the sample interleaved `source`
    /// and flushes the coded data to the byte boundary.
    pub fn encode_scan(mut self, component_indices: &[usize], source: &[u16]) -> Result<(), JpeglsError> {
        let width = self.frame_info.width as usize;
        let height = self.frame_info.height as usize;
        let stride = self.frame_info.component_count as usize;
        debug_assert!(source.len() >= width * height * stride);

        debug!(
            "encoding scan: components {:?}, near {}, interleave {:?}",
            component_indices, self.traits.near_lossless, self.interleave_mode
        );

        let mut lines: Vec<ComponentLines> = component_indices.iter().map(|_| ComponentLines::new(width)).collect();
        let mut source_lines = vec![vec![0u16; width]; component_indices.len()];
        let mut run_indices = vec![0; component_indices.len()];
        let sample_interleaved = self.interleave_mode == InterleaveMode::Sample && component_indices.len() > 1;

        for line in 0..height {
            let row = &source[line * width * stride..(line + 1) * width * stride];
            for (source_line, &component) in source_lines.iter_mut().zip(component_indices) {
                for (sample, pixel) in source_line.iter_mut().zip(row.chunks_exact(stride)) {
                    *sample = pixel[component];
                }
            }

            if sample_interleaved {
                lines.iter_mut().for_each(ComponentLines::begin_line);
                self.encode_sample_interleaved_line(&mut lines, &source_lines)?;
            } else {
                for ((component_lines, source_line), run_index) in
                    lines.iter_mut().zip(&source_lines).zip(run_indices.iter_mut())
                {
                    self.run_index = *run_index;
                    component_lines.begin_line();
                    self.encode_line(component_lines, source_line)?;
                    *run_index = self.run_index;
                }
            }

            lines.iter_mut().for_each(ComponentLines::end_line);
        }

        self.writer.flush();
        Ok(())
    }

    fn encode_line(&mut self, lines: &mut ComponentLines, source: &[u16]) -> Result<(), JpeglsError> {
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
                lines.current[index] =
                    self.encode_regular(context_id, source[index - 1] as i32, predicted_value)? as u16;
                index += 1;
            } else {
                index += self.encode_run_mode(index, lines, source)?;
            }
        }
        Ok(())
    }

    fn encode_sample_interleaved_line(
        &mut self,
        lines: &mut [ComponentLines],
        sources: &[Vec<u16>],
    ) -> Result<(), JpeglsError> {
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
                index += self.encode_sample_interleaved_run_mode(index, lines, sources)?;
                continue;
            }

            for ((&context_id, component_lines), source) in context_ids.iter().zip(lines.iter_mut()).zip(sources) {
                let neighbors = component_lines.neighbors(index);
                let predicted_value = get_predicted_value(neighbors.ra, neighbors.rb, neighbors.rc);
                component_lines.current[index] =
                    self.encode_regular(context_id, source[index - 1] as i32, predicted_value)? as u16;
            }
            index += 1;
        }
        Ok(())
    }

    fn encode_regular(&mut self, context_id: i32, x: i32, predicted_value: i32) -> Result<i32, JpeglsError> {
        let quantized_context = QuantizedContext::from_context_id(context_id);
        let context = &mut self.regular_mode_contexts[quantized_context.index];

        let corrected_prediction = self
            .traits
            .correct_prediction(predicted_value + apply_sign(context.c(), quantized_context.sign));
        let error_value = self
            .traits
            .compute_error_value(apply_sign(x - corrected_prediction, quantized_context.sign));
        let k = context.compute_golomb_coding_parameter()?;
        let mapped_error_value =
            map_error_value(context.get_error_correction(k | self.traits.near_lossless) ^ error_value);

        encode_mapped_value(
            &mut self.writer,
            k,
            mapped_error_value,
            self.traits.limit,
            self.traits.quantized_bits_per_pixel,
        );
        context.update_variables_and_bias(error_value, self.traits.near_lossless, self.traits.reset_threshold)?;

        Ok(self
            .traits
            .compute_reconstructed_sample(corrected_prediction, apply_sign(error_value, quantized_context.sign)))
    }

    fn encode_run_mode(
        &mut self,
        index: usize,
        lines: &mut ComponentLines,
        source: &[u16],
    ) -> Result<usize, JpeglsError> {
        let width = self.frame_info.width as usize;
        let remaining = width + 1 - index;
        let ra = lines.current[index - 1];

        let mut run_length = 0;
        while self.traits.is_near(source[index - 1 + run_length] as i32, ra as i32) {
            lines.current[index + run_length] = ra;
            run_length += 1;
            if run_length == remaining {
                break;
            }
        }

        self.encode_run_pixels(run_length, run_length == remaining);
        if run_length == remaining {
            return Ok(run_length);
        }

        let end_index = index + run_length;
        let x = source[end_index - 1] as i32;
        let rb = lines.previous[end_index] as i32;
        lines.current[end_index] = self.encode_run_interruption_pixel(x, ra as i32, rb)? as u16;
        self.decrement_run_index();
        Ok(run_length + 1)
    }

    fn encode_sample_interleaved_run_mode(
        &mut self,
        index: usize,
        lines: &mut [ComponentLines],
        sources: &[Vec<u16>],
    ) -> Result<usize, JpeglsError> {
        let width = self.frame_info.width as usize;
        let remaining = width + 1 - index;

        let mut run_length = 0;
        while lines.iter().zip(sources).all(|(component_lines, source)| {
            self.traits.is_near(
                source[index - 1 + run_length] as i32,
                component_lines.current[index - 1] as i32,
            )
        }) {
            for component_lines in lines.iter_mut() {
                component_lines.current[index + run_length] = component_lines.current[index - 1];
            }
            run_length += 1;
            if run_length == remaining {
                break;
            }
        }

        self.encode_run_pixels(run_length, run_length == remaining);
        if run_length == remaining {
            return Ok(run_length);
        }

        let end_index = index + run_length;
        for (component_lines, source) in lines.iter_mut().zip(sources) {
            let ra = component_lines.current[end_index - 1] as i32;
            let rb = component_lines.previous[end_index] as i32;
            let x = source[end_index - 1] as i32;
            let error_sign = sign(rb - ra);

            let error_value = self.traits.compute_error_value(error_sign * (x - rb));
            self.encode_run_interruption_error(0, error_value)?;
            component_lines.current[end_index] =
                self.traits.compute_reconstructed_sample(rb, error_value * error_sign) as u16;
        }
        self.decrement_run_index();
        Ok(run_length + 1)
    }

    // Code segment A.15
    fn encode_run_pixels(&mut self, run_length: usize, end_of_line: bool) {
        let mut run_length = run_length as i32;
        while run_length >= 1 << J[self.run_index] {
            self.writer.write_bit(true);
            run_length -= 1 << J[self.run_index];
            self.increment_run_index();
        }

        if end_of_line {
            if run_length != 0 {
                self.writer.write_bit(true);
            }
        } else {
            // A zero bit followed by the J[RUNindex] bit remainder.
            self.writer.write_bits(run_length as u32, J[self.run_index] + 1);
        }
    }

    fn encode_run_interruption_pixel(&mut self, x: i32, ra: i32, rb: i32) -> Result<i32, JpeglsError> {
        if self.traits.is_near(ra, rb) {
            let error_value = self.traits.compute_error_value(x - ra);
            self.encode_run_interruption_error(1, error_value)?;
            Ok(self.traits.compute_reconstructed_sample(ra, error_value))
        } else {
            let error_sign = sign(rb - ra);
            let error_value = self.traits.compute_error_value((x - rb) * error_sign);
            self.encode_run_interruption_error(0, error_value)?;
            Ok(self.traits.compute_reconstructed_sample(rb, error_value * error_sign))
        }
    }

    fn encode_run_interruption_error(
        &mut self,
        run_interruption_type: usize,
        error_value: i32,
    ) -> Result<(), JpeglsError> {
        let context = &mut self.run_mode_contexts[run_interruption_type];
        let k = context.compute_golomb_coding_parameter()?;
        let e_mapped_error_value = context.compute_mapped_error_value(error_value, k);

        encode_mapped_value(
            &mut self.writer,
            k,
            e_mapped_error_value,
            self.traits.limit - J[self.run_index] - 1,
            self.traits.quantized_bits_per_pixel,
        );
        context.update_variables(error_value, e_mapped_error_value, self.traits.reset_threshold);
        Ok(())
    }

    fn increment_run_index(&mut self) {
        self.run_index = (self.run_index + 1).min(MAXIMUM_RUN_INDEX);
    }

    fn decrement_run_index(&mut self) {
        self.run_index = self.run_index.saturating_sub(1);
    }
}
