pub mod carve;
pub mod codec;
pub mod dsp;
pub mod error;
pub mod listener;
mod output;
pub mod spectrogram;
pub mod wav;

pub use carve::{resize_width, SeamCarver, WidthResizer};
pub use dsp::frame::FrameTransform;
pub use error::{Result, WavecarveError};
pub use listener::{DebugListener, NoOpListener, PipelineEvent, PipelineListener};
pub use spectrogram::{Encoding, Pixel, Spectrogram, SpectrogramHeader};
pub use wav::{read_wav, write_wav, WavHeader, Waveform};

use crate::dsp::frame::validate_frame_size;

/// Sample rate of the fixed container configuration.
pub const SAMPLE_RATE: u32 = 44100;
/// Default frame size, and therefore default spectrogram height.
pub const DEFAULT_FRAME_SIZE: usize = 1024;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const NUM_CHANNELS: u16 = 1;

/// Settings shared by the encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeOptions {
    /// Samples per frame; a power of two `>= 2`.
    pub frame_size: usize,
    pub encoding: Encoding,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        TranscodeOptions {
            frame_size: DEFAULT_FRAME_SIZE,
            encoding: Encoding::default(),
        }
    }
}

impl TranscodeOptions {
    pub fn validate(&self) -> Result<()> {
        validate_frame_size(self.frame_size)
    }
}

/// Audio ↔ spectrogram transcoder with a pre-planned frame transform.
///
/// Planning the FFT is the expensive part of setup, so keep one of these
/// around when converting many clips with the same frame size.
pub struct Transcoder {
    options: TranscodeOptions,
    transform: FrameTransform,
}

impl Transcoder {
    pub fn new(options: TranscodeOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            transform: FrameTransform::new(options.frame_size)?,
        })
    }

    pub fn options(&self) -> &TranscodeOptions {
        &self.options
    }

    /// Encode 16-bit samples into a spectrogram.
    pub fn encode(&self, samples: &[i16]) -> Result<Spectrogram> {
        self.encode_with_listener(samples, &NoOpListener)
    }

    /// Encode with a listener for observing progress.
    pub fn encode_with_listener(
        &self,
        samples: &[i16],
        listener: &impl PipelineListener,
    ) -> Result<Spectrogram> {
        spectrogram::encode::encode_frames(
            &self.transform,
            samples,
            self.options.encoding,
            listener,
        )
    }

    /// Decode a spectrogram back into exactly `sample_count` samples.
    pub fn decode(&self, spectrogram: &Spectrogram) -> Result<Vec<i16>> {
        self.decode_with_listener(spectrogram, &NoOpListener)
    }

    /// Decode with a listener for observing progress.
    ///
    /// The spectrogram's own encoding (read from its header) wins over
    /// `options().encoding`.
    pub fn decode_with_listener(
        &self,
        spectrogram: &Spectrogram,
        listener: &impl PipelineListener,
    ) -> Result<Vec<i16>> {
        spectrogram::decode::decode_frames(&self.transform, spectrogram, listener)
    }
}
