//! jlscodec CLI - JPEG-LS encoder and decoder for raw pixel files.
//!
//! Raw files hold sample interleaved pixels, one byte per sample up to 8 bits
//! and two little-endian bytes per sample above that.

use clap::{Parser, Subcommand, ValueEnum};
use dicom_jpegls::jpeg_stream_reader::JpegStreamReader;
use dicom_jpegls::{FrameInfo, InterleaveMode, JpeglsDecoder, JpeglsEncoder, JpeglsPcParameters};
use log::{LevelFilter, info};
use simple_logger::SimpleLogger;
use std::fs;
use std::path::PathBuf;

/// JPEG-LS (ITU-T T.87) lossless and near-lossless codec
#[derive(Parser)]
#[command(name = "jlscodec")]
#[command(author = "dicom-jpegls contributors")]
#[command(version)]
#[command(about = "Encode raw pixels to JPEG-LS and decode JPEG-LS back to raw pixels", long_about = None)]
#[command(after_help = "EXAMPLES:
    jlscodec encode -i ct.raw -o ct.jls -w 512 -H 512 -b 12
    jlscodec encode -i rgb.raw -o rgb.jls -w 640 -H 480 -n 3 --interleave line
    jlscodec encode -i us.raw -o us.jls -w 800 -H 600 --near 2
    jlscodec decode -i ct.jls -o ct.raw
    jlscodec info -i ct.jls")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a JPEG-LS stream to raw pixels
    #[command(visible_alias = "d")]
    Decode {
        /// Input JPEG-LS file
        #[arg(short, long, help = "Path to the JPEG-LS file")]
        input: PathBuf,

        /// Output raw pixel file
        #[arg(short, long, help = "Path for the decoded pixels")]
        output: PathBuf,
    },

    /// Encode raw pixels to a JPEG-LS stream
    #[command(visible_alias = "e")]
    Encode {
        /// Input raw pixel file
        #[arg(short, long, help = "Path to raw pixel data file")]
        input: PathBuf,

        /// Output JPEG-LS file
        #[arg(short, long, help = "Path for the encoded output file")]
        output: PathBuf,

        /// Image width in pixels
        #[arg(short, long)]
        width: u32,

        /// Image height in pixels
        #[arg(short = 'H', long)]
        height: u32,

        /// Number of color components (1 to 4)
        #[arg(short = 'n', long, default_value = "1")]
        components: i32,

        /// Bits per sample (2 to 16)
        #[arg(short, long, default_value = "8")]
        bits: i32,

        /// Maximum reconstruction error per sample (0 = lossless)
        #[arg(long, default_value = "0")]
        near: i32,

        /// Interleave mode for multi-component images
        #[arg(long, default_value = "sample", value_enum)]
        interleave: Interleave,

        /// Custom preset thresholds T1,T2,T3 (written as an LSE segment)
        #[arg(long, value_delimiter = ',')]
        thresholds: Option<Vec<i32>>,

        /// Custom context reset interval
        #[arg(long)]
        reset: Option<i32>,
    },

    /// Display the frame and scan parameters of a JPEG-LS stream
    #[command(visible_alias = "i")]
    Info {
        /// Input file path
        #[arg(short, long, help = "Path to the JPEG-LS file to inspect")]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Interleave {
    /// One scan per component
    None,
    /// Components interleaved line by line
    Line,
    /// Components interleaved pixel by pixel
    Sample,
}

impl From<Interleave> for InterleaveMode {
    fn from(value: Interleave) -> Self {
        match value {
            Interleave::None => InterleaveMode::None,
            Interleave::Line => InterleaveMode::Line,
            Interleave::Sample => InterleaveMode::Sample,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    let result = match cli.command {
        Commands::Decode { input, output } => decode_image(&input, &output),
        Commands::Encode {
            input,
            output,
            width,
            height,
            components,
            bits,
            near,
            interleave,
            thresholds,
            reset,
        } => {
            let frame_info = FrameInfo {
                width,
                height,
                bits_per_sample: bits,
                component_count: components,
            };
            preset_parameters(thresholds, reset).and_then(|preset_coding_parameters| {
                encode_image(
                    &input,
                    &output,
                    frame_info,
                    near,
                    interleave.into(),
                    preset_coding_parameters,
                )
            })
        }
        Commands::Info { input } => show_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Warning: logger not initialized: {}", e);
    }
}

fn preset_parameters(
    thresholds: Option<Vec<i32>>,
    reset: Option<i32>,
) -> Result<JpeglsPcParameters, Box<dyn std::error::Error>> {
    let mut preset_coding_parameters = JpeglsPcParameters::default();
    if let Some(thresholds) = thresholds {
        let [threshold1, threshold2, threshold3] = thresholds[..] else {
            return Err(format!("expected 3 thresholds, got {}", thresholds.len()).into());
        };
        preset_coding_parameters.threshold1 = threshold1;
        preset_coding_parameters.threshold2 = threshold2;
        preset_coding_parameters.threshold3 = threshold3;
    }
    if let Some(reset) = reset {
        preset_coding_parameters.reset_value = reset;
    }
    Ok(preset_coding_parameters)
}

fn decode_image(input: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    let mut decoder = JpeglsDecoder::new(&data);
    decoder.read_header()?;
    let frame_info = decoder.frame_info();
    let mut pixels = vec![0u8; decoder.destination_size()];
    decoder.decode(&mut pixels)?;

    fs::write(output, &pixels)?;
    println!(
        "✓ Decoded {}x{} image ({} components, {} bits) to {:?}",
        frame_info.width, frame_info.height, frame_info.component_count, frame_info.bits_per_sample, output
    );
    Ok(())
}

fn encode_image(
    input: &PathBuf,
    output: &PathBuf,
    frame_info: FrameInfo,
    near: i32,
    interleave_mode: InterleaveMode,
    preset_coding_parameters: JpeglsPcParameters,
) -> Result<(), Box<dyn std::error::Error>> {
    let pixels = fs::read(input)?;

    let mut encoder = JpeglsEncoder::new();
    encoder
        .set_frame_info(frame_info)?
        .set_near_lossless(near)?
        .set_interleave_mode(interleave_mode)
        .set_preset_coding_parameters(preset_coding_parameters);
    let encoded = encoder.encode(&pixels)?;

    fs::write(output, &encoded)?;
    info!("compression ratio {:.2}", pixels.len() as f64 / encoded.len() as f64);
    println!(
        "✓ Encoded {}x{} image to {:?} ({} bytes, near {})",
        frame_info.width,
        frame_info.height,
        output,
        encoded.len(),
        near
    );
    Ok(())
}

fn show_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());
    println!();

    let mut reader = JpegStreamReader::new(&data);
    reader.read_header()?;
    let frame_info = reader.frame_info();
    let scan_header = reader.scan_header();
    let preset_coding_parameters = reader.preset_coding_parameters();

    println!("Format: JPEG-LS");
    println!("  Dimensions: {}x{}", frame_info.width, frame_info.height);
    println!("  Bit depth:  {} bits", frame_info.bits_per_sample);
    println!("  Components: {}", frame_info.component_count);
    println!("  Near:       {}", scan_header.coding_parameters.near_lossless);
    println!("  Interleave: {:?}", scan_header.coding_parameters.interleave_mode);
    if preset_coding_parameters != JpeglsPcParameters::default() {
        println!(
            "  Presets:    MAXVAL {} T1 {} T2 {} T3 {} RESET {}",
            preset_coding_parameters.maximum_sample_value,
            preset_coding_parameters.threshold1,
            preset_coding_parameters.threshold2,
            preset_coding_parameters.threshold3,
            preset_coding_parameters.reset_value
        );
    }
    Ok(())
}
