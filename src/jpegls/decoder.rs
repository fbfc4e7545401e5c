use crate::FrameInfo;
use crate::error::JpeglsError;
use crate::jpeg_stream_reader::{JpegStreamReader, JpegStreamReaderState};
use crate::jpegls::coding_parameters::is_valid;
use crate::jpegls::scan_decoder::ScanDecoder;
use crate::jpegls::traits::pack_samples;
use crate::jpegls::{InterleaveMode, JpeglsPcParameters};
use log::debug;

/// Decodes a complete JPEG-LS interchange stream.
///
/// ```ignore
/// let mut decoder = JpeglsDecoder::new(&encoded);
/// decoder.read_header()?;
/// let mut pixels = vec![0; decoder.destination_size()];
/// decoder.decode(&mut pixels)?;
/// ```
pub struct JpeglsDecoder<'a> {
    reader: JpegStreamReader<'a>,
    header_read: bool,
}

impl<'a> JpeglsDecoder<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            reader: JpegStreamReader::new(source),
            header_read: false,
        }
    }

    pub fn read_header(&mut self) -> Result<(), JpeglsError> {
        if !self.header_read {
            self.reader.read_header()?;
            self.header_read = true;
        }
        Ok(())
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.reader.frame_info()
    }

    /// The `NEAR` value of the scan at the current position.
    pub fn near_lossless(&self) -> i32 {
        self.reader.scan_header().coding_parameters.near_lossless
    }

    pub fn interleave_mode(&self) -> InterleaveMode {
        self.reader.scan_header().coding_parameters.interleave_mode
    }

    /// Preset parameters as stored in the stream; zero fields mean "default".
    pub fn preset_coding_parameters(&self) -> JpeglsPcParameters {
        self.reader.preset_coding_parameters()
    }

    /// Size in bytes of the sample interleaved, little-endian decoded image.
    pub fn destination_size(&self) -> usize {
        let frame_info = self.frame_info();
        frame_info.width as usize
            * frame_info.height as usize
            * frame_info.component_count as usize
            * bytes_per_sample(frame_info.bits_per_sample)
    }

    /// Decodes every scan into one sample interleaved buffer.
    ///
    /// The scans are consumed: a second call fails with [`JpeglsError::InvalidOperation`].
    pub fn decode_samples(&mut self) -> Result<Vec<u16>, JpeglsError> {
        self.read_header()?;
        if self.reader.state() != JpegStreamReaderState::ScanSection {
            return Err(JpeglsError::InvalidOperation);
        }

        let frame_info = self.frame_info();
        let component_count = frame_info.component_count as usize;
        let maximum_component_value = (1 << frame_info.bits_per_sample) - 1;
        let mut samples = vec![0u16; frame_info.width as usize * frame_info.height as usize * component_count];
        let mut decoded = vec![false; component_count];

        loop {
            let scan_header = self.reader.scan_header().clone();
            if scan_header.component_indices.iter().any(|&index| decoded[index]) {
                return Err(JpeglsError::InvalidData);
            }

            let preset_coding_parameters = is_valid(
                &self.reader.preset_coding_parameters(),
                maximum_component_value,
                scan_header.coding_parameters.near_lossless,
            )?;

            let mut scan_decoder = ScanDecoder::new(
                frame_info,
                &preset_coding_parameters,
                scan_header.coding_parameters,
                self.reader.remaining_data(),
            );
            let scan_size = scan_decoder.decode_scan(&scan_header.component_indices, &mut samples)?;
            debug!("scan {:?} used {} bytes", scan_header.component_indices, scan_size);
            self.reader.advance(scan_size);

            for &index in &scan_header.component_indices {
                decoded[index] = true;
            }

            if !self.reader.read_next_scan()? {
                break;
            }
        }

        if !decoded.iter().all(|&done| done) {
            return Err(JpeglsError::MissingSos);
        }
        Ok(samples)
    }

    /// Decodes into `destination`, which must hold at least [`Self::destination_size`] bytes.
    pub fn decode(&mut self, destination: &mut [u8]) -> Result<(), JpeglsError> {
        self.read_header()?;
        let size = self.destination_size();
        if destination.len() < size {
            return Err(JpeglsError::DestinationTooSmall);
        }

        let samples = self.decode_samples()?;
        if self.frame_info().bits_per_sample <= 8 {
            pack_samples::<u8>(&samples, &mut destination[..size]);
        } else {
            pack_samples::<u16>(&samples, &mut destination[..size]);
        }
        Ok(())
    }
}

pub(crate) fn bytes_per_sample(bits_per_sample: i32) -> usize {
    if bits_per_sample <= 8 { 1 } else { 2 }
}
