use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::{Result, WavecarveError};

/// Resample a single channel from `from_rate` to `to_rate`.
///
/// Returns the input unchanged if rates already match.
/// Uses sinc interpolation for high-quality audio resampling. The filter
/// delay is trimmed, so the output is `round(len * to_rate / from_rate)` long
/// and time-aligned with the input.
pub fn resample_channel(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(WavecarveError::Format(format!(
            "cannot resample from {} Hz to {} Hz",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let chunk_size = 1024;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| WavecarveError::Transform(format!("failed to create resampler: {}", e)))?;
    let resample_err = |e: rubato::ResampleError| {
        WavecarveError::Transform(format!("resample error: {}", e))
    };

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut output = Vec::with_capacity(delay + expected + chunk_size);

    // Process full chunks
    let mut chunks = samples.chunks_exact(chunk_size);
    for chunk in &mut chunks {
        let result = resampler.process(&[chunk], None).map_err(resample_err)?;
        output.extend_from_slice(&result[0]);
    }

    // Process remaining samples
    let remaining = chunks.remainder();
    if !remaining.is_empty() {
        let result = resampler
            .process_partial(Some(&[remaining]), None)
            .map_err(resample_err)?;
        output.extend_from_slice(&result[0]);
    }

    // Flush the filter tail
    while output.len() < delay + expected {
        let result = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(resample_err)?;
        if result[0].is_empty() {
            break;
        }
        output.extend_from_slice(&result[0]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_passthrough() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(resample_channel(&samples, 44100, 44100).unwrap(), samples);
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(resample_channel(&[0.0; 4], 0, 44100).is_err());
    }

    #[test]
    fn output_length_follows_ratio() {
        let samples = vec![0.0f32; 4410];
        assert_eq!(resample_channel(&samples, 44100, 22050).unwrap().len(), 2205);
        assert_eq!(resample_channel(&samples, 22050, 44100).unwrap().len(), 8820);
        assert_eq!(resample_channel(&samples, 48000, 44100).unwrap().len(), 4052);
    }

    #[test]
    fn constant_level_survives_interior() {
        let samples = vec![0.5f32; 48000];
        let out = resample_channel(&samples, 48000, 44100).unwrap();
        let interior = &out[out.len() / 4..3 * out.len() / 4];
        assert!(interior.iter().all(|&x| (x - 0.5).abs() < 0.05));
    }
}
