mod audio;
mod progress;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::Level;
use wavecarve_core::{
    read_wav, resize_width, write_wav, DebugListener, Encoding, PipelineListener, SeamCarver,
    Spectrogram, TranscodeOptions, Transcoder, WavHeader, DEFAULT_FRAME_SIZE, SAMPLE_RATE,
};

use crate::progress::CliListener;

#[derive(Parser)]
#[command(
    name = "wavecarve",
    about = "Turn audio into spectrogram images, seam carve them, and turn them back into audio"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log pipeline stages (-v) or every frame and seam (-vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Full pipeline: WAV -> spectrogram -> seam carve -> WAV
    Run {
        #[arg(default_value = "input.wav")]
        input: PathBuf,

        #[arg(default_value = "output.wav")]
        output: PathBuf,

        /// Target width as a percentage of the original
        #[arg(short, long, default_value_t = 50.0)]
        percent: f32,

        /// Also write spectrogram.png and carved.png next to the output
        #[arg(long)]
        save_images: bool,

        #[command(flatten)]
        transcode: TranscodeArgs,
    },

    /// WAV -> spectrogram PNG
    Spectrogram {
        #[arg(default_value = "input.wav")]
        input: PathBuf,

        #[arg(default_value = "spectrogram.png")]
        output: PathBuf,

        #[command(flatten)]
        transcode: TranscodeArgs,
    },

    /// Spectrogram PNG -> narrower (or wider) spectrogram PNG
    Carve {
        #[arg(default_value = "spectrogram.png")]
        input: PathBuf,

        #[arg(default_value = "carved.png")]
        output: PathBuf,

        /// Target width as a percentage of the original
        #[arg(short, long, default_value_t = 50.0)]
        percent: f32,

        #[command(flatten)]
        raster: RasterArgs,
    },

    /// Spectrogram PNG -> WAV
    Recreate {
        #[arg(default_value = "carved.png")]
        input: PathBuf,

        #[arg(default_value = "output.wav")]
        output: PathBuf,

        #[command(flatten)]
        raster: RasterArgs,

        /// Sample rate written to the output header
        #[arg(long, default_value_t = SAMPLE_RATE)]
        sample_rate: u32,
    },

    /// Any audio file (MP3, FLAC, OGG, ...) -> mono 16-bit WAV
    Import {
        input: PathBuf,

        #[arg(default_value = "input.wav")]
        output: PathBuf,

        #[arg(long, default_value_t = SAMPLE_RATE)]
        sample_rate: u32,
    },
}

#[derive(Args)]
struct TranscodeArgs {
    /// Samples per frame; also the spectrogram height. Must be a power of two.
    #[arg(long, default_value_t = DEFAULT_FRAME_SIZE)]
    frame_size: usize,

    /// Pixel layout: magnitude, magnitude-phase or magnitude-phase-amplitude
    #[arg(long, default_value = "magnitude-phase-amplitude", value_parser = parse_encoding)]
    encoding: Encoding,
}

#[derive(Args)]
struct RasterArgs {
    /// Expected frame size. Defaults to the image height.
    #[arg(long)]
    frame_size: Option<usize>,

    /// Override the pixel layout recorded in the image
    #[arg(long, value_parser = parse_encoding)]
    encoding: Option<Encoding>,
}

impl TranscodeArgs {
    fn options(&self) -> TranscodeOptions {
        TranscodeOptions {
            frame_size: self.frame_size,
            encoding: self.encoding,
        }
    }
}

fn parse_encoding(name: &str) -> std::result::Result<Encoding, String> {
    Encoding::parse(name).ok_or_else(|| {
        let choices: Vec<&str> = Encoding::ALL.iter().map(|e| e.as_str()).collect();
        format!("unknown encoding '{}'. Choices: {}", name, choices.join(", "))
    })
}

/// Run one stage and report `"<name>... ok"` once it succeeds.
fn stage<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let value = f()?;
    eprintln!("{}... ok", name);
    Ok(value)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Progress bars and debug logs would fight over stderr
    let progress = CliListener::new();
    let listener: &dyn PipelineListener = if cli.verbose > 0 {
        &DebugListener
    } else {
        &progress
    };

    match cli.command {
        Command::Run {
            input,
            output,
            percent,
            save_images,
            transcode,
        } => run(&input, &output, percent, save_images, &transcode, listener),
        Command::Spectrogram {
            input,
            output,
            transcode,
        } => {
            let transcoder = Transcoder::new(transcode.options())?;
            let wav = read_input(&input)?;
            let spectrogram = stage("Creating spectrogram", || {
                Ok(transcoder.encode_with_listener(&wav.samples, &listener)?)
            })?;
            save_image(&spectrogram, &output)
        }
        Command::Carve {
            input,
            output,
            percent,
            raster,
        } => {
            let spectrogram = open_image(&input, &raster)?;
            let carved = carve(&spectrogram, percent, listener)?;
            save_image(&carved, &output)
        }
        Command::Recreate {
            input,
            output,
            raster,
            sample_rate,
        } => {
            let spectrogram = open_image(&input, &raster)?;
            let transcoder = Transcoder::new(TranscodeOptions {
                frame_size: spectrogram.frame_size(),
                encoding: spectrogram.encoding(),
            })?;
            let samples = stage("Creating audio from spectrogram", || {
                Ok(transcoder.decode_with_listener(&spectrogram, &listener)?)
            })?;
            write_output(&output, &samples, &WavHeader::mono_pcm16(sample_rate))
        }
        Command::Import {
            input,
            output,
            sample_rate,
        } => {
            let n = stage(&format!("Importing {}", input.display()), || {
                audio::import(&input, &output, sample_rate)
            })?;
            eprintln!(
                "  {} samples, {:.1}s, {} Hz, mono -> {}",
                n,
                n as f64 / sample_rate as f64,
                sample_rate,
                output.display()
            );
            Ok(())
        }
    }
}

fn run(
    input: &Path,
    output: &Path,
    percent: f32,
    save_images: bool,
    transcode: &TranscodeArgs,
    listener: &dyn PipelineListener,
) -> Result<()> {
    let transcoder = Transcoder::new(transcode.options())?;
    let wav = read_input(input)?;

    let spectrogram = stage("Creating spectrogram", || {
        Ok(transcoder.encode_with_listener(&wav.samples, &listener)?)
    })?;
    let dir = output.parent().unwrap_or(Path::new(""));
    if save_images {
        save_image(&spectrogram, &dir.join("spectrogram.png"))?;
    }

    let carved = carve(&spectrogram, percent, listener)?;
    if save_images {
        save_image(&carved, &dir.join("carved.png"))?;
    }

    let samples = stage("Creating audio from carved spectrogram", || {
        Ok(transcoder.decode_with_listener(&carved, &listener)?)
    })?;
    write_output(output, &samples, &wav.header)
}

fn carve(
    spectrogram: &Spectrogram,
    percent: f32,
    listener: &dyn PipelineListener,
) -> Result<Spectrogram> {
    stage("Seam carving the spectrogram", || {
        let carver = SeamCarver::with_listener(listener);
        resize_width(spectrogram, &carver, percent).context("Could not carve seams")
    })
}

fn read_input(path: &Path) -> Result<wavecarve_core::Waveform> {
    let wav = stage(&format!("Reading {}", path.display()), || {
        Ok(read_wav(path)?)
    })?;
    eprintln!(
        "  {} samples, {:.1}s, {} Hz, mono",
        wav.samples.len(),
        wav.duration_secs(),
        wav.header.sample_rate,
    );
    Ok(wav)
}

fn write_output(path: &Path, samples: &[i16], header: &WavHeader) -> Result<()> {
    stage(&format!("Writing {}", path.display()), || {
        write_wav(path, samples, header)
            .with_context(|| format!("Failed to write WAV file: {}", path.display()))
    })
}

fn open_image(path: &Path, raster: &RasterArgs) -> Result<Spectrogram> {
    let spectrogram = stage(&format!("Reading {}", path.display()), || {
        let opened = match raster.frame_size {
            Some(frame_size) => Spectrogram::open(path, frame_size),
            None => Spectrogram::load(path),
        };
        opened.with_context(|| format!("Failed to read spectrogram image: {}", path.display()))
    })?;
    eprintln!(
        "  {}x{}, {} samples, {}",
        spectrogram.width(),
        spectrogram.height(),
        spectrogram.sample_count(),
        spectrogram.encoding(),
    );
    Ok(match raster.encoding {
        Some(encoding) => spectrogram.with_encoding(encoding),
        None => spectrogram,
    })
}

fn save_image(spectrogram: &Spectrogram, path: &Path) -> Result<()> {
    stage(&format!("Writing {}", path.display()), || {
        spectrogram
            .save_png(path)
            .with_context(|| format!("Failed to write spectrogram image: {}", path.display()))
    })
}
