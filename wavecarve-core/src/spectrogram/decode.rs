//! Spectrogram → waveform.

use rayon::prelude::*;
use realfft::num_complex::Complex;

use super::{Encoding, Pixel, Spectrogram};
use crate::codec;
use crate::dsp::frame::{FrameTransform, Workspace};
use crate::dsp::quantize::{dequantize_amplitude, dequantize_magnitude, dequantize_phase};
use crate::listener::{Direction, NoOpListener, PipelineEvent, PipelineListener};
use crate::{Result, WavecarveError};

/// Decodes a spectrogram back into exactly `sample_count` samples.
pub fn decode(spectrogram: &Spectrogram) -> Result<Vec<i16>> {
    let transform = FrameTransform::new(spectrogram.frame_size())?;
    decode_frames(&transform, spectrogram, &NoOpListener)
}

/// Decodes with a pre-planned transform, reporting progress to `listener`.
///
/// Column `i` fills output samples `i*N .. (i+1)*N`, clipped to the recorded
/// sample count. Columns past that count are ignored; if the image is too
/// narrow the tail stays silent. The output length therefore never depends on
/// the image width.
pub fn decode_frames(
    transform: &FrameTransform,
    spectrogram: &Spectrogram,
    listener: &impl PipelineListener,
) -> Result<Vec<i16>> {
    let n = transform.frame_size();
    if spectrogram.frame_size() != n {
        return Err(WavecarveError::Format(format!(
            "spectrogram height {} does not match frame size {}",
            spectrogram.frame_size(),
            n
        )));
    }
    let sample_count = spectrogram.sample_count();
    let encoding = spectrogram.encoding();
    let columns = spectrogram.width().min(sample_count.div_ceil(n));

    tracing::debug!(
        sample_count,
        width = spectrogram.width(),
        columns,
        %encoding,
        "decoding spectrogram"
    );
    listener.on_event(PipelineEvent::Started {
        direction: Direction::Decode,
        total_frames: columns,
    });

    let mut output = vec![0.0f32; sample_count];
    output
        .par_chunks_mut(n)
        .zip(spectrogram.pixels().par_chunks(n))
        .try_for_each_init(
            || (transform.workspace(), vec![Complex::new(0.0f32, 0.0); n]),
            |(ws, bins), (out, column)| {
                decode_column(transform, encoding, column, out, ws, bins)?;
                listener.on_event(PipelineEvent::FrameDone {
                    direction: Direction::Decode,
                });
                Ok::<(), WavecarveError>(())
            },
        )?;

    listener.on_event(PipelineEvent::Finished {
        direction: Direction::Decode,
        sample_count,
    });
    Ok(codec::denormalize(&output))
}

fn decode_column(
    transform: &FrameTransform,
    encoding: Encoding,
    column: &[Pixel],
    out: &mut [f32],
    ws: &mut Workspace,
    bins: &mut [Complex<f32>],
) -> Result<()> {
    for (bin, pixel) in bins.iter_mut().zip(column) {
        let magnitude = dequantize_magnitude(pixel[0]);
        let phase = if encoding.has_phase() {
            dequantize_phase(pixel[1])
        } else {
            0.0
        };
        *bin = Complex::from_polar(magnitude, phase);
    }

    let gain = if encoding.has_amplitude() {
        column_amplitude(column)
    } else {
        1.0
    };

    let samples = transform.inverse(bins, ws)?;
    // The last column may be longer than the remaining output
    for (o, s) in out.iter_mut().zip(samples) {
        *o = s * gain;
    }
    Ok(())
}

/// Mean of the amplitude channel. Untouched columns hold a single value;
/// seam edits can mix neighbouring columns, and the mean blends them.
fn column_amplitude(column: &[Pixel]) -> f32 {
    if column.is_empty() {
        return 0.0;
    }
    let sum: u32 = column.iter().map(|p| p[2] as u32).sum();
    dequantize_amplitude(sum as f32 / column.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrogram::encode::encode;
    use crate::spectrogram::SpectrogramHeader;

    #[test]
    fn output_length_comes_from_header() {
        let n = 64;
        let samples: Vec<i16> = (0..5 * n as i32 + 17).map(|i| (i * 37 % 2000) as i16).collect();
        let spec = encode(&samples, n, Encoding::default()).unwrap();
        let decoded = decode(&spec).unwrap();
        assert_eq!(decoded.len(), samples.len());
        // Truncated remainder decodes as silence
        assert!(decoded[5 * n..].iter().all(|&s| s == 0));
    }

    #[test]
    fn narrow_image_leaves_silent_tail() {
        let n = 16;
        let header = SpectrogramHeader::new(4 * n, Encoding::MagnitudePhase).unwrap();
        let column = vec![[200, 128, 0, 255]; n];
        let spec = Spectrogram::from_parts(header, n, column).unwrap();

        let decoded = decode(&spec).unwrap();
        assert_eq!(decoded.len(), 4 * n);
        assert!(decoded[..n].iter().any(|&s| s != 0));
        assert!(decoded[n..].iter().all(|&s| s == 0));
    }

    #[test]
    fn wide_image_is_clipped_to_sample_count() {
        let n = 16;
        let header = SpectrogramHeader::new(n + 3, Encoding::MagnitudePhase).unwrap();
        let pixels = vec![[180, 128, 0, 255]; 10 * n];
        let spec = Spectrogram::from_parts(header, n, pixels).unwrap();
        assert_eq!(decode(&spec).unwrap().len(), n + 3);
    }

    #[test]
    fn empty_spectrogram_decodes_to_nothing() {
        let spec = encode(&[], 128, Encoding::default()).unwrap();
        assert!(decode(&spec).unwrap().is_empty());
    }

    #[test]
    fn zero_amplitude_column_is_silent() {
        let n = 32;
        let header = SpectrogramHeader::new(n, Encoding::MagnitudePhaseAmplitude).unwrap();
        let spec = Spectrogram::from_parts(header, n, vec![[255, 10, 0, 255]; n]).unwrap();
        assert!(decode(&spec).unwrap().iter().all(|&s| s == 0));
    }

    #[test]
    fn silent_input_stays_silent_without_amplitude() {
        let n = 1024;
        for encoding in [Encoding::Magnitude, Encoding::MagnitudePhase] {
            let spec = encode(&vec![0; 2 * n], n, encoding).unwrap();
            let decoded = decode(&spec).unwrap();
            assert_eq!(decoded.len(), 2 * n);
            assert!(decoded.iter().all(|&s| s == 0), "{}", encoding);
        }
    }

    #[test]
    fn mismatched_transform_is_rejected() {
        let spec = encode(&[0; 256], 64, Encoding::default()).unwrap();
        let transform = FrameTransform::new(128).unwrap();
        let err = decode_frames(&transform, &spec, &NoOpListener).unwrap_err();
        assert!(matches!(err, WavecarveError::Format(_)));
    }

    #[test]
    fn column_amplitude_averages_mixed_columns() {
        let column = [[0, 0, 100, 255], [0, 0, 200, 255]];
        assert!((column_amplitude(&column) - 150.0 / 255.0).abs() < 1e-6);
    }
}
