//! Conversion between raw little-endian PCM bytes, `i16` samples and
//! normalized `f32` samples.

use byteorder::{ByteOrder, LittleEndian};

use crate::{Result, WavecarveError};

/// Largest representable sample magnitude; normalization divides by this.
pub const SAMPLE_SCALE: f32 = i16::MAX as f32;

/// Reinterprets a byte buffer as little-endian signed 16-bit samples.
///
/// Fails with [`WavecarveError::Format`] when the buffer length is odd.
pub fn decode_samples(bytes: &[u8]) -> Result<Vec<i16>> {
    if bytes.len() % 2 != 0 {
        return Err(WavecarveError::Format(format!(
            "sample buffer has odd length {}",
            bytes.len()
        )));
    }
    let mut samples = vec![0i16; bytes.len() / 2];
    LittleEndian::read_i16_into(bytes, &mut samples);
    Ok(samples)
}

/// Inverse of [`decode_samples`].
pub fn encode_samples(samples: &[i16]) -> Vec<u8> {
    let mut bytes = vec![0u8; samples.len() * 2];
    LittleEndian::write_i16_into(samples, &mut bytes);
    bytes
}

/// Divides each sample by `32767`, yielding values in `[-1, 1]`
/// (`i16::MIN` lands marginally below `-1`).
pub fn normalize(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / SAMPLE_SCALE).collect()
}

/// Multiplies each value by `32767` and truncates toward zero.
///
/// Out-of-range products saturate at `i16::MIN`/`i16::MAX` and NaN maps to
/// `0`, so amplitude overshoot after reconstruction clips instead of wrapping.
pub fn denormalize(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&x| (x * SAMPLE_SCALE) as i16).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_little_endian() {
        let bytes = [0x01, 0x00, 0xff, 0xff, 0x00, 0x80, 0xff, 0x7f];
        let samples = decode_samples(&bytes).unwrap();
        assert_eq!(samples, vec![1, -1, i16::MIN, i16::MAX]);
    }

    #[test]
    fn decode_rejects_odd_length() {
        let err = decode_samples(&[0, 1, 2]).unwrap_err();
        assert!(matches!(err, WavecarveError::Format(_)));
    }

    #[test]
    fn encode_inverts_decode() {
        let samples = vec![0i16, 12, -12, 32767, -32768, 1000];
        assert_eq!(decode_samples(&encode_samples(&samples)).unwrap(), samples);
    }

    #[test]
    fn normalize_bounds() {
        let normalized = normalize(&[0, i16::MAX, -i16::MAX]);
        assert_eq!(normalized, vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn denormalize_truncates_toward_zero() {
        let samples = denormalize(&[0.5, -0.5, 1.0, -1.0]);
        // 0.5 * 32767 = 16383.5
        assert_eq!(samples, vec![16383, -16383, 32767, -32767]);
    }

    #[test]
    fn denormalize_saturates_out_of_range() {
        let samples = denormalize(&[1.5, -2.0, f32::NAN]);
        assert_eq!(samples, vec![i16::MAX, i16::MIN, 0]);
    }
}
