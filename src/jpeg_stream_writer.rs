//! JPEG-LS Codestream Writer utilities.
//!
//! This module provides the `JpegStreamWriter` which emits the markers and
//! segments (SOI, SOF55, LSE, SOS, EOI) of a JPEG-LS interchange stream.

use crate::FrameInfo;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JpegMarkerCode};
use crate::jpegls::{InterleaveMode, JpeglsPcParameters};

/// A growable writer for JPEG-LS codestreams.
pub struct JpegStreamWriter {
    destination: Vec<u8>,
}

impl JpegStreamWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            destination: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.destination.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_empty()
    }

    pub fn write_byte(&mut self, value: u8) {
        self.destination.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.destination.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_marker(&mut self, marker: JpegMarkerCode) {
        self.write_byte(JPEG_MARKER_START_BYTE);
        self.write_byte(marker as u8);
    }

    pub fn write_start_of_image(&mut self) {
        self.write_marker(JpegMarkerCode::StartOfImage);
    }

    pub fn write_end_of_image(&mut self) {
        self.write_marker(JpegMarkerCode::EndOfImage);
    }

    /// Writes SOF55 with component ids `1..=n`, sampling factors 1x1 and table 0.
    pub fn write_start_of_frame_segment(&mut self, frame_info: &FrameInfo) {
        self.write_marker(JpegMarkerCode::StartOfFrameJpegls);
        let length = 2 + 6 + (frame_info.component_count as usize * 3);
        self.write_u16(length as u16);

        self.write_byte(frame_info.bits_per_sample as u8);
        self.write_u16(frame_info.height as u16);
        self.write_u16(frame_info.width as u16);
        self.write_byte(frame_info.component_count as u8);

        for i in 0..frame_info.component_count {
            self.write_byte((i + 1) as u8); // Component ID
            self.write_byte(0x11); // H=1, V=1
            self.write_byte(0); // Tq
        }
    }

    pub fn write_jpegls_preset_parameters_segment(&mut self, pc: &JpeglsPcParameters) {
        self.write_marker(JpegMarkerCode::JpeglsPresetParameters);
        let length = 2 + 1 + 5 * 2;
        self.write_u16(length as u16);
        self.write_byte(1); // Type 1: Preset coding parameters

        self.write_u16(pc.maximum_sample_value as u16);
        self.write_u16(pc.threshold1 as u16);
        self.write_u16(pc.threshold2 as u16);
        self.write_u16(pc.threshold3 as u16);
        self.write_u16(pc.reset_value as u16);
    }

    /// Writes SOS for the frame components at `component_indices` (ids are index + 1).
    pub fn write_start_of_scan_segment(
        &mut self,
        component_indices: &[usize],
        near_lossless: i32,
        interleave_mode: InterleaveMode,
    ) {
        self.write_marker(JpegMarkerCode::StartOfScan);
        let length = 2 + 1 + (component_indices.len() * 2) + 3;
        self.write_u16(length as u16);

        self.write_byte(component_indices.len() as u8);
        for &index in component_indices {
            self.write_byte((index + 1) as u8); // Component Selector
            self.write_byte(0); // Mapping table selector
        }

        self.write_byte(near_lossless as u8);
        self.write_byte(interleave_mode as u8);
        self.write_byte(0); // Point transform
    }

    pub fn destination_mut(&mut self) -> &mut Vec<u8> {
        &mut self.destination
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.destination
    }
}
