//! Waveform → spectrogram.

use rayon::prelude::*;

use super::{Encoding, Pixel, Spectrogram, SpectrogramHeader, OPAQUE};
use crate::codec;
use crate::dsp::frame::{magnitude_db, peak_absolute, phase, FrameTransform, Workspace};
use crate::dsp::quantize::{dequantize_amplitude, quantize_amplitude, quantize_db, quantize_phase};
use crate::listener::{Direction, NoOpListener, PipelineEvent, PipelineListener};
use crate::Result;

/// Encodes `samples` into a spectrogram with `frame_size`-sample columns.
///
/// Trailing samples that do not fill a whole frame are dropped from the image,
/// but the header still records the full count.
pub fn encode(samples: &[i16], frame_size: usize, encoding: Encoding) -> Result<Spectrogram> {
    let transform = FrameTransform::new(frame_size)?;
    encode_frames(&transform, samples, encoding, &NoOpListener)
}

/// Encodes with a pre-planned transform, reporting progress to `listener`.
///
/// Frames are transformed in parallel; each worker writes only its own
/// column of the pixel arena.
pub fn encode_frames(
    transform: &FrameTransform,
    samples: &[i16],
    encoding: Encoding,
    listener: &impl PipelineListener,
) -> Result<Spectrogram> {
    let n = transform.frame_size();
    let header = SpectrogramHeader::new(samples.len(), encoding)?;
    let normalized = codec::normalize(samples);
    let width = normalized.len() / n;

    tracing::debug!(
        samples = samples.len(),
        frame_size = n,
        width,
        %encoding,
        "encoding spectrogram"
    );
    listener.on_event(PipelineEvent::Started {
        direction: Direction::Encode,
        total_frames: width,
    });

    let mut pixels: Vec<Pixel> = vec![[0, 0, 0, OPAQUE]; width * n];
    pixels
        .par_chunks_mut(n)
        .zip(normalized.par_chunks_exact(n))
        .try_for_each_init(
            || (transform.workspace(), vec![0.0f32; n]),
            |(ws, scaled), (column, frame)| {
                encode_column(transform, encoding, frame, column, ws, scaled)?;
                listener.on_event(PipelineEvent::FrameDone {
                    direction: Direction::Encode,
                });
                Ok::<(), crate::WavecarveError>(())
            },
        )?;

    listener.on_event(PipelineEvent::Finished {
        direction: Direction::Encode,
        sample_count: samples.len(),
    });
    Spectrogram::from_parts(header, n, pixels)
}

fn encode_column(
    transform: &FrameTransform,
    encoding: Encoding,
    frame: &[f32],
    column: &mut [Pixel],
    ws: &mut Workspace,
    scaled: &mut [f32],
) -> Result<()> {
    let amplitude_code = quantize_amplitude(peak_absolute(frame));
    let gain = dequantize_amplitude(amplitude_code as f32);

    let input: &[f32] = if encoding.has_amplitude() && gain > 0.0 {
        for (s, x) in scaled.iter_mut().zip(frame) {
            *s = x / gain;
        }
        &*scaled
    } else {
        frame
    };

    let spectrum = transform.forward(input, ws)?;
    for (pixel, bin) in column.iter_mut().zip(spectrum) {
        let magnitude = quantize_db(magnitude_db(*bin));
        *pixel = match encoding {
            Encoding::Magnitude => [magnitude, magnitude, magnitude, OPAQUE],
            Encoding::MagnitudePhase => [magnitude, quantize_phase(phase(*bin)), 0, OPAQUE],
            Encoding::MagnitudePhaseAmplitude => [
                magnitude,
                quantize_phase(phase(*bin)),
                amplitude_code,
                OPAQUE,
            ],
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    fn tone(len: usize, period: usize, amplitude: f32) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let x = amplitude * (2.0 * PI * i as f32 / period as f32).sin();
                (x * 32767.0) as i16
            })
            .collect()
    }

    #[test]
    fn three_frames_make_three_columns() {
        let n = 1024;
        let spec = encode(&tone(3 * n, 64, 0.5), n, Encoding::default()).unwrap();
        assert_eq!(spec.width(), 3);
        assert_eq!(spec.height(), 1024);
        assert_eq!(spec.sample_count(), 3 * n);
        assert_eq!(&spec.header().to_pixel()[..3], &[0x00, 0x0C, 0x00]);
    }

    #[test]
    fn remainder_is_truncated_but_counted() {
        let n = 256;
        let spec = encode(&tone(2 * n + 100, 32, 0.3), n, Encoding::default()).unwrap();
        assert_eq!(spec.width(), 2);
        assert_eq!(spec.sample_count(), 2 * n + 100);
    }

    #[test]
    fn empty_input_has_zero_width() {
        let spec = encode(&[], 512, Encoding::default()).unwrap();
        assert_eq!(spec.width(), 0);
        assert_eq!(spec.sample_count(), 0);
        assert!(spec.pixels().is_empty());
    }

    #[test]
    fn silent_frame_is_at_magnitude_floor() {
        let n = 64;
        let spec = encode(&vec![0i16; n], n, Encoding::default()).unwrap();
        assert!(spec.column(0).iter().all(|p| p[0] == 0 && p[2] == 0));
    }

    #[test]
    fn amplitude_channel_is_constant_per_column() {
        let n = 128;
        let mut samples = tone(n, 16, 0.25);
        samples.extend(tone(n, 16, 0.75));
        let spec = encode(&samples, n, Encoding::MagnitudePhaseAmplitude).unwrap();

        let first = spec.column(0)[0][2];
        let second = spec.column(1)[0][2];
        assert!(spec.column(0).iter().all(|p| p[2] == first));
        assert!(spec.column(1).iter().all(|p| p[2] == second));
        assert_eq!(first, quantize_amplitude(peak_absolute(&codec::normalize(&samples[..n]))));
        assert!(second > first);
    }

    #[test]
    fn magnitude_variant_is_grayscale() {
        let n = 64;
        let spec = encode(&tone(n, 8, 0.5), n, Encoding::Magnitude).unwrap();
        assert!(spec.pixels().iter().all(|p| p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn tone_peaks_in_its_bin() {
        let n = 256;
        // period 32 -> bin 8, magnitude ~0.25 (-12 dB, code ~232)
        let spec = encode(&tone(n, 32, 0.5), n, Encoding::MagnitudePhase).unwrap();
        let column = spec.column(0);
        assert!(column[8][0] > 220);
        assert!(column[n - 8][0] > 220);
        assert!(column[20][0] < 100);
    }

    #[test]
    fn rejects_bad_frame_size() {
        assert!(encode(&[0; 100], 100, Encoding::default()).is_err());
    }
}
