// JPEG-LS round trip tests through the DICOM frame codec and the stream level
// encoder/decoder.
//
// Images are synthetic: constant, ramps, seeded noise, small palettes and
// half-range steps that reach the Golomb escape.

#[cfg(test)]
mod jpegls_roundtrip {
    use dicom_jpegls::{
        CompressionConfiguration, FrameInfo, InterleaveMode, JPEG_LS_LOSSLESS_TRANSFER_SYNTAX_UID,
        JPEG_LS_NEAR_LOSSLESS_TRANSFER_SYNTAX_UID, JpeglsCodec, JpeglsDecoder, JpeglsEncoder, JpeglsError,
        JpeglsPcParameters, PixelDataDescriptor,
    };
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    // SOI + SOF55 (one component) + SOS (one component) + EOI.
    const SINGLE_COMPONENT_OVERHEAD: usize = 2 + 13 + 10 + 2;

    fn random_frame(rng: &mut XorShiftRng, descriptor: &PixelDataDescriptor) -> Vec<u8> {
        let maximum = descriptor.maximum_sample_value();
        let mut frame = Vec::with_capacity(descriptor.frame_size());
        for _ in 0..descriptor.sample_count() {
            let value = rng.random_range(0..=maximum) as u16;
            if descriptor.bits_allocated == 8 {
                frame.push(value as u8);
            } else {
                frame.extend_from_slice(&value.to_le_bytes());
            }
        }
        frame
    }

    fn palette_frame(rng: &mut XorShiftRng, descriptor: &PixelDataDescriptor, palette: &[u8]) -> Vec<u8> {
        (0..descriptor.frame_size())
            .map(|_| palette[rng.random_range(0..palette.len())])
            .collect()
    }

    fn roundtrip_lossless(frame: &[u8], descriptor: &PixelDataDescriptor, configuration: &CompressionConfiguration) {
        let codec = JpeglsCodec::new();
        let encoded = codec.encode_frame(frame, descriptor, 0, configuration).unwrap();
        let decoded = codec.decode_frame(&encoded, descriptor, 0).unwrap();
        assert_eq!(decoded, frame, "lossless round trip failed for {:?}", descriptor);
    }

    fn encode_with_near(frame_info: FrameInfo, near_lossless: i32, pixels: &[u8]) -> Vec<u8> {
        let mut encoder = JpeglsEncoder::new();
        encoder
            .set_frame_info(frame_info)
            .unwrap()
            .set_near_lossless(near_lossless)
            .unwrap()
            .set_interleave_mode(InterleaveMode::Sample);
        encoder.encode(pixels).unwrap()
    }

    fn decode(encoded: &[u8]) -> Vec<u8> {
        let mut decoder = JpeglsDecoder::new(encoded);
        decoder.read_header().unwrap();
        let mut decoded = vec![0; decoder.destination_size()];
        decoder.decode(&mut decoded).unwrap();
        decoded
    }

    fn assert_within(decoded: &[u8], original: &[u8], near_lossless: i32) {
        assert_eq!(decoded.len(), original.len());
        for (index, (&d, &o)) in decoded.iter().zip(original).enumerate() {
            assert!(
                (d as i32 - o as i32).abs() <= near_lossless,
                "sample {} decoded as {}, expected {} +/- {}",
                index,
                d,
                o,
                near_lossless
            );
        }
    }

    fn scan_data_offset(encoded: &[u8]) -> usize {
        let sos = encoded
            .windows(2)
            .position(|pair| pair == [0xFF, 0xDA])
            .unwrap();
        let length = u16::from_be_bytes([encoded[sos + 2], encoded[sos + 3]]) as usize;
        sos + 2 + length
    }

    #[test]
    fn test_uniform_4x4_compresses_below_raw_size() {
        let descriptor = PixelDataDescriptor::new(4, 4, 8, 8, 1);
        let frame = [128u8; 16];
        let codec = JpeglsCodec::new();
        let encoded = codec
            .encode_frame(&frame, &descriptor, 0, &CompressionConfiguration::lossless())
            .unwrap();
        assert!(encoded.len() < 16 + SINGLE_COMPONENT_OVERHEAD, "{} bytes", encoded.len());
        assert_eq!(codec.decode_frame(&encoded, &descriptor, 0).unwrap(), frame);
    }

    #[test]
    fn test_16_bit_extremes() {
        let descriptor = PixelDataDescriptor::new(2, 2, 16, 16, 1);
        let frame: Vec<u8> = [0u16, 65535, 32768, 1]
            .iter()
            .flat_map(|value| value.to_le_bytes())
            .collect();
        roundtrip_lossless(&frame, &descriptor, &CompressionConfiguration::lossless());
    }

    #[test]
    fn test_ramp_near_lossless_2() {
        let pixels: Vec<u8> = (0..8)
            .flat_map(|row| (0..8).map(move |column| (10 * row + column) as u8))
            .collect();
        let frame_info = FrameInfo {
            width: 8,
            height: 8,
            bits_per_sample: 8,
            component_count: 1,
        };
        let encoded = encode_with_near(frame_info, 2, &pixels);

        let mut decoder = JpeglsDecoder::new(&encoded);
        decoder.read_header().unwrap();
        assert_eq!(decoder.near_lossless(), 2);

        let decoded = JpeglsCodec::new()
            .decode_frame(&encoded, &PixelDataDescriptor::new(8, 8, 8, 8, 1), 0)
            .unwrap();
        assert_within(&decoded, &pixels, 2);
    }

    #[test]
    fn test_single_pixel() {
        let descriptor = PixelDataDescriptor::new(1, 1, 8, 8, 1);
        roundtrip_lossless(&[200], &descriptor, &CompressionConfiguration::lossless());
    }

    #[test]
    fn test_rgb_4x4_sample_interleaved() {
        let descriptor = PixelDataDescriptor::new(4, 4, 8, 8, 3);
        let frame: Vec<u8> = (0..16)
            .flat_map(|pixel| {
                let (x, y) = (pixel % 4, pixel / 4);
                [(x * 40 + y * 10) as u8, (200 - x * 30) as u8, (y * 60 + 5) as u8]
            })
            .collect();
        let configuration = CompressionConfiguration::lossless().with_interleave_mode(InterleaveMode::Sample);
        let codec = JpeglsCodec::new();
        let encoded = codec.encode_frame(&frame, &descriptor, 0, &configuration).unwrap();

        let mut decoder = JpeglsDecoder::new(&encoded);
        decoder.read_header().unwrap();
        assert_eq!(decoder.interleave_mode(), InterleaveMode::Sample);
        assert_eq!(codec.decode_frame(&encoded, &descriptor, 0).unwrap(), frame);
    }

    #[test]
    fn test_empty_frame_data() {
        let descriptor = PixelDataDescriptor::new(4, 4, 8, 8, 1);
        assert_eq!(
            JpeglsCodec::new().decode_frame(&[], &descriptor, 0),
            Err(JpeglsError::EmptyInput)
        );
    }

    #[test]
    fn test_random_lossless_8_bit() {
        let mut rng = XorShiftRng::seed_from_u64(0);
        for (rows, columns) in [(1, 17), (13, 1), (23, 37), (64, 64)] {
            let descriptor = PixelDataDescriptor::new(rows, columns, 8, 8, 1);
            let frame = random_frame(&mut rng, &descriptor);
            roundtrip_lossless(&frame, &descriptor, &CompressionConfiguration::lossless());
        }
    }

    #[test]
    fn test_random_lossless_16_bit() {
        let mut rng = XorShiftRng::seed_from_u64(1);
        for bits_stored in [9, 12, 16] {
            let descriptor = PixelDataDescriptor::new(19, 21, 16, bits_stored, 1);
            let frame = random_frame(&mut rng, &descriptor);
            roundtrip_lossless(&frame, &descriptor, &CompressionConfiguration::lossless());
        }
    }

    #[test]
    fn test_low_bit_depths() {
        let mut rng = XorShiftRng::seed_from_u64(2);
        for bits_stored in [2, 3, 5, 7] {
            let descriptor = PixelDataDescriptor::new(16, 9, 8, bits_stored, 1);
            let frame = random_frame(&mut rng, &descriptor);
            roundtrip_lossless(&frame, &descriptor, &CompressionConfiguration::lossless());
        }
    }

    #[test]
    fn test_palette_images_exercise_runs() {
        let mut rng = XorShiftRng::seed_from_u64(3);
        let descriptor = PixelDataDescriptor::new(40, 33, 8, 8, 1);
        let frame = palette_frame(&mut rng, &descriptor, &[10, 10, 10, 10, 10, 10, 11, 200]);
        roundtrip_lossless(&frame, &descriptor, &CompressionConfiguration::lossless());

        let descriptor = PixelDataDescriptor::new(24, 31, 8, 8, 3);
        let frame = palette_frame(&mut rng, &descriptor, &[0, 0, 0, 0, 0, 0, 0, 255]);
        for interleave_mode in [InterleaveMode::None, InterleaveMode::Line, InterleaveMode::Sample] {
            let configuration = CompressionConfiguration::lossless().with_interleave_mode(interleave_mode);
            roundtrip_lossless(&frame, &descriptor, &configuration);
        }
    }

    #[test]
    fn test_near_lossless_bound() {
        let mut rng = XorShiftRng::seed_from_u64(4);
        for near_lossless in [1, 3, 7] {
            let pixels: Vec<u8> = (0..32 * 32 * 3).map(|_| rng.random_range(0..=255)).collect();
            for component_count in [1, 3] {
                let frame_info = FrameInfo {
                    width: 32,
                    height: 32 * 3 / component_count as u32,
                    bits_per_sample: 8,
                    component_count,
                };
                let encoded = encode_with_near(frame_info, near_lossless, &pixels);
                assert_within(&decode(&encoded), &pixels, near_lossless);
            }
        }
    }

    #[test]
    fn test_lossy_quality_uses_near_lossless_transfer_syntax() {
        let mut rng = XorShiftRng::seed_from_u64(5);
        let descriptor = PixelDataDescriptor::new(32, 32, 8, 8, 1);
        let frame = random_frame(&mut rng, &descriptor);
        let configuration = CompressionConfiguration::lossy(0.5);

        let codec = JpeglsCodec::new();
        assert_eq!(
            codec.transfer_syntax_for(&configuration),
            JPEG_LS_NEAR_LOSSLESS_TRANSFER_SYNTAX_UID
        );
        assert_eq!(
            codec.transfer_syntax_for(&CompressionConfiguration::lossless()),
            JPEG_LS_LOSSLESS_TRANSFER_SYNTAX_UID
        );

        let encoded = codec.encode_frame(&frame, &descriptor, 0, &configuration).unwrap();
        let decoded = codec.decode_frame(&encoded, &descriptor, 0).unwrap();
        assert_within(&decoded, &frame, 5);
        assert_ne!(decoded, frame);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut rng = XorShiftRng::seed_from_u64(6);
        let descriptor = PixelDataDescriptor::new(20, 20, 16, 12, 3);
        let frame = random_frame(&mut rng, &descriptor);
        let codec = JpeglsCodec::new();
        let configuration = CompressionConfiguration::lossy(0.9);
        let first = codec.encode_frame(&frame, &descriptor, 0, &configuration).unwrap();
        let second = codec.encode_frame(&frame, &descriptor, 1, &configuration).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_uniform_image_run_efficiency() {
        let descriptor = PixelDataDescriptor::new(256, 256, 8, 8, 1);
        let frame = vec![77u8; descriptor.frame_size()];
        let codec = JpeglsCodec::new();
        let encoded = codec
            .encode_frame(&frame, &descriptor, 0, &CompressionConfiguration::lossless())
            .unwrap();
        assert!(encoded.len() < frame.len() / 100, "{} bytes", encoded.len());
        assert_eq!(codec.decode_frame(&encoded, &descriptor, 0).unwrap(), frame);

        let descriptor = PixelDataDescriptor::new(3, 8, 8, 8, 1);
        let frame = vec![5u8; descriptor.frame_size()];
        let encoded = codec
            .encode_frame(&frame, &descriptor, 0, &CompressionConfiguration::lossless())
            .unwrap();
        assert!(encoded.len() < frame.len() + SINGLE_COMPONENT_OVERHEAD);
    }

    #[test]
    fn test_half_range_steps_use_escape_code() {
        // A step of RANGE / 2 wraps to the most negative error value. The
        // first interruption and the first regular sample both escape: 22
        // and 23 zero bits, which fill whole zero bytes of the scan data.
        let codec = JpeglsCodec::new();

        let descriptor = PixelDataDescriptor::new(4, 8, 8, 8, 1);
        let frame: Vec<u8> = (0..descriptor.sample_count())
            .map(|i| if i % 2 == 0 { 0 } else { 128 })
            .collect();
        roundtrip_lossless(&frame, &descriptor, &CompressionConfiguration::lossless());
        let encoded = codec
            .encode_frame(&frame, &descriptor, 0, &CompressionConfiguration::lossless())
            .unwrap();
        let data_offset = scan_data_offset(&encoded);
        assert_eq!(
            encoded[data_offset..data_offset + 8],
            [0x80, 0x00, 0x00, 0xFE, 0x80, 0x00, 0x00, 0xFF]
        );

        let descriptor = PixelDataDescriptor::new(4, 8, 16, 16, 1);
        let frame: Vec<u8> = (0..descriptor.sample_count())
            .flat_map(|i| (if i % 2 == 0 { 0u16 } else { 32768 }).to_le_bytes())
            .collect();
        roundtrip_lossless(&frame, &descriptor, &CompressionConfiguration::lossless());
        let encoded = codec
            .encode_frame(&frame, &descriptor, 0, &CompressionConfiguration::lossless())
            .unwrap();
        let data_offset = scan_data_offset(&encoded);
        assert_eq!(
            encoded[data_offset..data_offset + 8],
            [0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x7F]
        );
    }

    #[test]
    fn test_truncated_stream_reports_end_of_bitstream() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        let descriptor = PixelDataDescriptor::new(32, 32, 8, 8, 1);
        let frame = random_frame(&mut rng, &descriptor);
        let codec = JpeglsCodec::new();
        let encoded = codec
            .encode_frame(&frame, &descriptor, 0, &CompressionConfiguration::lossless())
            .unwrap();

        let data_offset = scan_data_offset(&encoded);
        let data_length = encoded.len() - 2 - data_offset;
        for kept in [0, 1, 7, data_length / 2, data_length - 1, data_length, data_length + 1] {
            assert_eq!(
                codec.decode_frame(&encoded[..data_offset + kept], &descriptor, 0),
                Err(JpeglsError::UnexpectedEndOfBitstream),
                "kept {} of {} scan bytes",
                kept,
                data_length
            );
        }
    }

    #[test]
    fn test_planar_and_line_interleaved_rgb() {
        let mut rng = XorShiftRng::seed_from_u64(8);
        let descriptor = PixelDataDescriptor::new(17, 29, 8, 8, 3);
        let frame = random_frame(&mut rng, &descriptor);
        let codec = JpeglsCodec::new();

        for interleave_mode in [InterleaveMode::None, InterleaveMode::Line] {
            let configuration = CompressionConfiguration::lossless().with_interleave_mode(interleave_mode);
            let encoded = codec.encode_frame(&frame, &descriptor, 0, &configuration).unwrap();
            let scan_count = encoded.windows(2).filter(|pair| *pair == [0xFF, 0xDA]).count();
            if interleave_mode == InterleaveMode::None {
                assert!(scan_count >= 3);
            }

            let mut decoder = JpeglsDecoder::new(&encoded);
            decoder.read_header().unwrap();
            assert_eq!(decoder.interleave_mode(), interleave_mode);
            assert_eq!(codec.decode_frame(&encoded, &descriptor, 0).unwrap(), frame);
        }
    }

    #[test]
    fn test_explicit_default_preset_parameters_decode() {
        let mut rng = XorShiftRng::seed_from_u64(9);
        let descriptor = PixelDataDescriptor::new(16, 16, 8, 8, 1);
        let frame = random_frame(&mut rng, &descriptor);
        let codec = JpeglsCodec::new();
        let encoded = codec
            .encode_frame(&frame, &descriptor, 0, &CompressionConfiguration::lossless())
            .unwrap();

        // SOF55 for one component occupies bytes 2..15.
        let preset_segment = [
            0xFF, 0xF8, 0x00, 0x0D, 0x01, 0x00, 0xFF, 0x00, 0x03, 0x00, 0x07, 0x00, 0x15, 0x00, 0x40,
        ];
        let with_preset: Vec<u8> = [&encoded[..15], &preset_segment[..], &encoded[15..]].concat();

        let mut decoder = JpeglsDecoder::new(&with_preset);
        decoder.read_header().unwrap();
        assert_eq!(decoder.preset_coding_parameters().threshold3, 21);
        assert_eq!(codec.decode_frame(&with_preset, &descriptor, 0).unwrap(), frame);
    }

    #[test]
    fn test_custom_preset_parameters_16_bit() {
        let mut rng = XorShiftRng::seed_from_u64(10);
        let descriptor = PixelDataDescriptor::new(24, 24, 16, 12, 1);
        let frame = random_frame(&mut rng, &descriptor);

        let mut encoder = JpeglsEncoder::new();
        encoder
            .set_frame_info(FrameInfo {
                width: 24,
                height: 24,
                bits_per_sample: 12,
                component_count: 1,
            })
            .unwrap()
            .set_preset_coding_parameters(JpeglsPcParameters {
                maximum_sample_value: 4095,
                threshold1: 40,
                threshold2: 120,
                threshold3: 400,
                reset_value: 32,
            });
        let encoded = encoder.encode(&frame).unwrap();
        assert!(encoded.windows(2).any(|pair| pair == [0xFF, 0xF8]));
        assert_eq!(JpeglsCodec::new().decode_frame(&encoded, &descriptor, 0).unwrap(), frame);
    }

    #[test]
    fn test_decode_into_small_destination() {
        let encoded = encode_with_near(
            FrameInfo {
                width: 4,
                height: 4,
                bits_per_sample: 8,
                component_count: 1,
            },
            0,
            &[9; 16],
        );
        let mut decoder = JpeglsDecoder::new(&encoded);
        assert_eq!(decoder.decode(&mut [0; 15]), Err(JpeglsError::DestinationTooSmall));
    }

    #[test]
    fn test_concurrent_frames_share_one_codec() {
        let codec = JpeglsCodec::new();
        std::thread::scope(|scope| {
            for seed in 0..4u64 {
                let codec = &codec;
                scope.spawn(move || {
                    let mut rng = XorShiftRng::seed_from_u64(100 + seed);
                    let descriptor = PixelDataDescriptor::new(48, 40, 16, 10 + seed as u16, 3);
                    let frame = random_frame(&mut rng, &descriptor);
                    let configuration = CompressionConfiguration::lossless();
                    let encoded = codec
                        .encode_frame(&frame, &descriptor, seed as usize, &configuration)
                        .unwrap();
                    assert_eq!(codec.decode_frame(&encoded, &descriptor, seed as usize).unwrap(), frame);
                });
            }
        });
    }
}
