//! The spectrogram image: one pixel column per frame, one row per frequency bin.
//!
//! Pixels are stored column-major in a single arena
//! (`pixels[column * frame_size + row]`) so each frame owns a contiguous,
//! independently writable slice. The original sample count travels in a
//! [`SpectrogramHeader`] that only becomes pixel `(0,0)` when rasterized.

pub mod decode;
pub mod encode;
pub mod raster;

use crate::dsp::frame::validate_frame_size;
use crate::dsp::quantize::quantize_phase;
use crate::{Result, WavecarveError};

/// Four 8-bit channels: `[magnitude, phase, amplitude, alpha]` for spectrum
/// pixels, `[high, mid, low, encoding tag]` for the metadata pixel.
pub type Pixel = [u8; 4];

pub(crate) const OPAQUE: u8 = 255;

/// Largest sample count the 24-bit metadata pixel can carry.
pub const MAX_SAMPLE_COUNT: u32 = 0x00FF_FFFF;

/// Channel layout of spectrum pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Grayscale magnitude in all three colour channels; decodes with zero phase.
    Magnitude,
    /// Magnitude in R, phase in G.
    MagnitudePhase,
    /// Magnitude in R, phase in G, per-frame peak amplitude in B.
    #[default]
    MagnitudePhaseAmplitude,
}

impl Encoding {
    pub const ALL: [Encoding; 3] = [
        Encoding::Magnitude,
        Encoding::MagnitudePhase,
        Encoding::MagnitudePhaseAmplitude,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Magnitude => "magnitude",
            Encoding::MagnitudePhase => "magnitude-phase",
            Encoding::MagnitudePhaseAmplitude => "magnitude-phase-amplitude",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }

    pub fn has_phase(&self) -> bool {
        !matches!(self, Encoding::Magnitude)
    }

    pub fn has_amplitude(&self) -> bool {
        matches!(self, Encoding::MagnitudePhaseAmplitude)
    }

    /// Alpha value of the metadata pixel identifying this layout.
    pub fn tag(&self) -> u8 {
        match self {
            Encoding::Magnitude => 253,
            Encoding::MagnitudePhase => 254,
            Encoding::MagnitudePhaseAmplitude => 255,
        }
    }

    /// Unknown tags fall back to the default layout.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            253 => Encoding::Magnitude,
            254 => Encoding::MagnitudePhase,
            _ => Encoding::MagnitudePhaseAmplitude,
        }
    }

    /// Guesses the layout of untagged spectrum pixels.
    ///
    /// `Magnitude` rasters are gray, and `MagnitudePhase` leaves the third
    /// channel at zero. The amplitude layout can only zero that channel for
    /// all-silent frames, which decode to silence under either reading.
    pub fn infer(pixels: &[Pixel]) -> Self {
        if pixels.iter().all(|&[r, g, b, _]| r == g && g == b) {
            Encoding::Magnitude
        } else if pixels.iter().all(|p| p[2] == 0) {
            Encoding::MagnitudePhase
        } else {
            Encoding::MagnitudePhaseAmplitude
        }
    }

    /// A spectrum pixel for a bin at the dB floor with zero phase.
    pub(crate) fn silent_pixel(&self, amplitude: u8) -> Pixel {
        match self {
            Encoding::Magnitude => [0, 0, 0, OPAQUE],
            Encoding::MagnitudePhase => [0, quantize_phase(0.0), 0, OPAQUE],
            Encoding::MagnitudePhaseAmplitude => [0, quantize_phase(0.0), amplitude, OPAQUE],
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata carried alongside the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrogramHeader {
    /// Sample count of the waveform before truncation to whole frames.
    pub sample_count: u32,
    pub encoding: Encoding,
}

impl SpectrogramHeader {
    pub fn new(sample_count: usize, encoding: Encoding) -> Result<Self> {
        let sample_count = u32::try_from(sample_count)
            .ok()
            .filter(|&n| n <= MAX_SAMPLE_COUNT)
            .ok_or_else(|| {
                WavecarveError::Format(format!(
                    "{} samples exceeds the 24-bit limit of {}",
                    sample_count, MAX_SAMPLE_COUNT
                ))
            })?;
        Ok(Self {
            sample_count,
            encoding,
        })
    }

    /// Big-endian 24-bit count in R, G, B; encoding tag in alpha.
    pub fn to_pixel(&self) -> Pixel {
        let [_, high, mid, low] = self.sample_count.to_be_bytes();
        [high, mid, low, self.encoding.tag()]
    }

    pub fn from_pixel(pixel: Pixel) -> Self {
        let [high, mid, low, tag] = pixel;
        Self {
            sample_count: u32::from_be_bytes([0, high, mid, low]),
            encoding: Encoding::from_tag(tag),
        }
    }
}

/// A spectrogram image: `width` columns of `frame_size` pixels plus a header.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    header: SpectrogramHeader,
    frame_size: usize,
    width: usize,
    pixels: Vec<Pixel>,
}

impl Spectrogram {
    /// Assembles a spectrogram from a column-major pixel arena.
    pub fn from_parts(header: SpectrogramHeader, frame_size: usize, pixels: Vec<Pixel>) -> Result<Self> {
        validate_frame_size(frame_size)?;
        if pixels.len() % frame_size != 0 {
            return Err(WavecarveError::Format(format!(
                "{} pixels do not fill whole columns of height {}",
                pixels.len(),
                frame_size
            )));
        }
        Ok(Self {
            header,
            frame_size,
            width: pixels.len() / frame_size,
            pixels,
        })
    }

    pub fn header(&self) -> &SpectrogramHeader {
        &self.header
    }

    pub fn sample_count(&self) -> usize {
        self.header.sample_count as usize
    }

    pub fn encoding(&self) -> Encoding {
        self.header.encoding
    }

    /// Overrides the layout recorded in the header.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.header.encoding = encoding;
        self
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of columns (frames).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows; always equal to the frame size.
    pub fn height(&self) -> usize {
        self.frame_size
    }

    /// Spectrum pixel at `(column, row)`. Never the metadata pixel.
    pub fn pixel(&self, column: usize, row: usize) -> Pixel {
        self.pixels[column * self.frame_size + row]
    }

    pub fn column(&self, column: usize) -> &[Pixel] {
        let start = column * self.frame_size;
        &self.pixels[start..start + self.frame_size]
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }
}
