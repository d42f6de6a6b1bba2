//! 8-bit channel quantization for magnitude (dB), phase and frame amplitude.
//!
//! Magnitude and phase round to the nearest code, so their reconstruction
//! error is at most half a step. Amplitude rounds up, so the dequantized value
//! never undershoots the true peak:
//!
//! | quantity  | range          | step            |
//! |-----------|----------------|-----------------|
//! | magnitude | `[-140, 0]` dB | 140/255 ≈ 0.55 dB |
//! | phase     | one full turn  | 2π/256 rad      |
//! | amplitude | `[0, 1]`       | 1/255           |

use std::f32::consts::PI;

use super::frame::wrap_phase;

/// Floor of the magnitude scale in dB. Anything quieter saturates to code 0.
pub const DB_FLOOR: f32 = -140.0;
/// Ceiling of the magnitude scale in dB. Anything louder saturates to code 255.
pub const DB_CEILING: f32 = 0.0;

const PHASE_LEVELS: f32 = 256.0;

/// Maps a dB value onto `0..=255`, saturating outside `[-140, 0]`.
///
/// `-inf` (a silent bin) and NaN map to `0`.
pub fn quantize_db(db: f32) -> u8 {
    if db.is_nan() {
        return 0;
    }
    let clamped = db.clamp(DB_FLOOR, DB_CEILING);
    ((clamped - DB_FLOOR) * 255.0 / (DB_CEILING - DB_FLOOR)).round() as u8
}

pub fn dequantize_db(code: u8) -> f32 {
    code as f32 * (DB_CEILING - DB_FLOOR) / 255.0 + DB_FLOOR
}

/// Converts a dB value back to linear magnitude.
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Linear magnitude for a magnitude code. Code 0 is the floor and means
/// silence, so it maps to exactly `0.0` rather than `10^(-140/20)`.
pub fn dequantize_magnitude(code: u8) -> f32 {
    if code == 0 {
        return 0.0;
    }
    db_to_linear(dequantize_db(code))
}

/// Maps an angle onto 256 codes covering one full turn.
///
/// The angle is first wrapped into `(-π, π]`, so `φ` and `φ + 2πk` share a
/// code; `π` wraps around to code 0 alongside `-π`.
pub fn quantize_phase(phi: f32) -> u8 {
    if !phi.is_finite() {
        return quantize_phase(0.0);
    }
    let code = ((wrap_phase(phi) + PI) * PHASE_LEVELS / (2.0 * PI)).round() as u32;
    (code % PHASE_LEVELS as u32) as u8
}

/// Inverse of [`quantize_phase`], returning an angle in `[-π, π)`.
pub fn dequantize_phase(code: u8) -> f32 {
    code as f32 * 2.0 * PI / PHASE_LEVELS - PI
}

/// Maps a normalized frame amplitude onto `0..=255`, rounding up.
pub fn quantize_amplitude(amplitude: f32) -> u8 {
    if amplitude.is_nan() {
        return 0;
    }
    (amplitude.clamp(0.0, 1.0) * 255.0).ceil() as u8
}

/// Inverse of [`quantize_amplitude`]. Takes `f32` so a column's codes can be
/// averaged before dequantizing.
pub fn dequantize_amplitude(code: f32) -> f32 {
    code / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_saturates_below_floor() {
        assert_eq!(quantize_db(-140.0), 0);
        assert_eq!(quantize_db(-200.0), 0);
        assert_eq!(quantize_db(f32::NEG_INFINITY), 0);
        assert_eq!(quantize_db(f32::NAN), 0);
    }

    #[test]
    fn magnitude_saturates_above_ceiling() {
        assert_eq!(quantize_db(0.0), 255);
        assert_eq!(quantize_db(12.0), 255);
        assert_eq!(quantize_db(f32::INFINITY), 255);
    }

    #[test]
    fn magnitude_error_within_half_step() {
        let half_step = 140.0 / 255.0 / 2.0 + 1e-4;
        let mut db = -140.0f32;
        while db <= 0.0 {
            let back = dequantize_db(quantize_db(db));
            assert!((back - db).abs() <= half_step, "{db} -> {back}");
            db += 0.37;
        }
    }

    #[test]
    fn dequantized_endpoints() {
        assert_eq!(dequantize_db(0), -140.0);
        assert!(dequantize_db(255).abs() < 1e-4);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn floor_code_is_true_silence() {
        assert_eq!(dequantize_magnitude(0), 0.0);
        assert!((dequantize_magnitude(1) - db_to_linear(dequantize_db(1))).abs() < 1e-12);
        assert!((dequantize_magnitude(255) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn phase_is_periodic() {
        for &phi in &[-3.0f32, -1.2, 0.0, 0.4, 2.9, PI] {
            let base = quantize_phase(phi);
            for k in [-2i32, -1, 1, 2] {
                let shifted = phi + 2.0 * PI * k as f32;
                assert_eq!(quantize_phase(shifted), base, "phi = {phi}, k = {k}");
            }
        }
    }

    #[test]
    fn phase_ends_of_range_share_a_code() {
        assert_eq!(quantize_phase(PI), quantize_phase(-PI));
        assert_eq!(quantize_phase(PI), 0);
        assert_eq!(quantize_phase(0.0), 128);
    }

    #[test]
    fn phase_error_within_half_step() {
        let half_step = PI / 256.0 + 1e-4;
        let mut phi = -PI + 0.01;
        while phi < PI - 0.01 {
            let back = dequantize_phase(quantize_phase(phi));
            // Compare on the circle: codes near π wrap to -π
            let err = wrap_phase(back - phi).abs();
            assert!(err <= half_step, "{phi} -> {back}");
            phi += 0.05;
        }
    }

    #[test]
    fn amplitude_codes() {
        assert_eq!(quantize_amplitude(0.0), 0);
        assert_eq!(quantize_amplitude(1.0), 255);
        assert_eq!(quantize_amplitude(1.7), 255);
        assert_eq!(quantize_amplitude(-0.3), 0);
        assert_eq!(quantize_amplitude(0.5), 128);
        assert_eq!(quantize_amplitude(0.001), 1);
        assert!((dequantize_amplitude(255.0) - 1.0).abs() < 1e-6);
    }
}
