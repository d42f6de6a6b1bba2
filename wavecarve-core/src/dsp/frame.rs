use std::{f32::consts::PI, sync::Arc};

use realfft::{num_complex::Complex, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::{Result, WavecarveError};

/// Per-frame forward/inverse frequency transform over non-overlapping frames.
///
/// **Forward:** a real-input FFT of the `N` samples, completed to all `N` bins
/// by conjugate symmetry and scaled by `1/N`. For samples in `[-1, 1]` every
/// bin then has magnitude `<= 1`, i.e. at most 0 dB.
///
/// **Inverse:** an unnormalized complex inverse FFT of `N` bins; only the real
/// part of each output sample is kept. Edited spectra need not be Hermitian,
/// so the inverse is complex rather than complex-to-real.
///
/// Plans are shared behind `Arc`, so one `FrameTransform` can serve many
/// worker threads, each holding its own [`Workspace`].
pub struct FrameTransform {
    frame_size: usize,
    forward_plan: Arc<dyn RealToComplex<f32>>,
    inverse_plan: Arc<dyn Fft<f32>>,
}

/// Scratch buffers for one worker. Create with [`FrameTransform::workspace`].
pub struct Workspace {
    time: Vec<f32>,
    half_spectrum: Vec<Complex<f32>>,
    forward_scratch: Vec<Complex<f32>>,
    spectrum: Vec<Complex<f32>>,
    inverse_scratch: Vec<Complex<f32>>,
    output: Vec<f32>,
}

impl FrameTransform {
    /// Plans transforms for frames of `frame_size` samples.
    ///
    /// `frame_size` must be a power of two and at least 2.
    pub fn new(frame_size: usize) -> Result<Self> {
        validate_frame_size(frame_size)?;
        let mut real_planner = RealFftPlanner::<f32>::new();
        let mut complex_planner = FftPlanner::<f32>::new();
        Ok(FrameTransform {
            frame_size,
            forward_plan: real_planner.plan_fft_forward(frame_size),
            inverse_plan: complex_planner.plan_fft_inverse(frame_size),
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn workspace(&self) -> Workspace {
        Workspace {
            time: self.forward_plan.make_input_vec(),
            half_spectrum: self.forward_plan.make_output_vec(),
            forward_scratch: self.forward_plan.make_scratch_vec(),
            spectrum: vec![Complex::new(0.0, 0.0); self.frame_size],
            inverse_scratch: vec![
                Complex::new(0.0, 0.0);
                self.inverse_plan.get_inplace_scratch_len()
            ],
            output: vec![0.0; self.frame_size],
        }
    }

    /// Computes the `N`-bin spectrum of one frame.
    ///
    /// The returned slice borrows `ws` and is overwritten by the next call.
    pub fn forward<'a>(&self, frame: &[f32], ws: &'a mut Workspace) -> Result<&'a [Complex<f32>]> {
        self.check_len("forward", frame.len())?;
        let n = self.frame_size;

        ws.time.copy_from_slice(frame);
        self.forward_plan
            .process_with_scratch(&mut ws.time, &mut ws.half_spectrum, &mut ws.forward_scratch)
            .map_err(|e| WavecarveError::Format(format!("forward FFT failed: {}", e)))?;

        let norm = 1.0 / n as f32;
        let half = n / 2;
        for (k, c) in ws.half_spectrum.iter().enumerate() {
            let scaled = *c * norm;
            ws.spectrum[k] = scaled;
            // Mirror the negative frequencies: X[N-k] = conj(X[k])
            if k != 0 && k != half {
                ws.spectrum[n - k] = scaled.conj();
            }
        }
        Ok(&ws.spectrum)
    }

    /// Reconstructs `N` time-domain samples from an `N`-bin spectrum,
    /// discarding the imaginary component.
    ///
    /// The returned slice borrows `ws` and is overwritten by the next call.
    pub fn inverse<'a>(&self, spectrum: &[Complex<f32>], ws: &'a mut Workspace) -> Result<&'a [f32]> {
        self.check_len("inverse", spectrum.len())?;

        ws.spectrum.copy_from_slice(spectrum);
        self.inverse_plan
            .process_with_scratch(&mut ws.spectrum, &mut ws.inverse_scratch);

        for (out, c) in ws.output.iter_mut().zip(ws.spectrum.iter()) {
            *out = c.re;
        }
        Ok(&ws.output)
    }

    fn check_len(&self, op: &str, len: usize) -> Result<()> {
        if len != self.frame_size {
            return Err(WavecarveError::Format(format!(
                "{}: expected {} values, got {}",
                op, self.frame_size, len
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_frame_size(frame_size: usize) -> Result<()> {
    if frame_size < 2 || !frame_size.is_power_of_two() {
        return Err(WavecarveError::Format(format!(
            "frame size must be a power of two >= 2, got {}",
            frame_size
        )));
    }
    Ok(())
}

/// `20 * log10(|c|)`. Yields `-inf` for a zero bin; quantization clamps it.
pub fn magnitude_db(c: Complex<f32>) -> f32 {
    20.0 * c.norm().log10()
}

/// Principal argument in `(-π, π]`.
pub fn phase(c: Complex<f32>) -> f32 {
    wrap_phase(c.arg())
}

/// Folds any angle into `(-π, π]`.
pub fn wrap_phase(phi: f32) -> f32 {
    let wrapped = (phi + PI).rem_euclid(2.0 * PI) - PI;
    // rem_euclid lands on [-π, π); -π is the same angle as π
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// `max(|x|)` over the frame, `0` for an empty or silent frame.
pub fn peak_absolute(frame: &[f32]) -> f32 {
    frame.iter().fold(0.0f32, |peak, x| peak.max(x.abs()))
}
