//! Welch periodogram for reporting the received spectrum.
//!
//! The signal is cut into overlapping Kaiser-windowed segments, each
//! zero-padded to `nfft` and transformed with `rustfft`. Squared magnitudes
//! are averaged over segments, converted to dB and shifted so that bin 0
//! holds the frequency -Fs/2.
//!
//! The window is scaled to unit energy, so white noise of variance `s2`
//! reads `10*log10(s2)` dB in every bin.

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Smallest power reported, keeps empty bins finite in dB.
const POWER_FLOOR: f32 = 1e-20;

/// Modified Bessel function of the first kind, order zero.
fn bessel_i0(x: f32) -> f32 {
    let half = 0.5 * x as f64;
    let mut term = 1.0f64;
    let mut sum = 1.0f64;
    for k in 1..64 {
        term *= half / k as f64;
        let t2 = term * term;
        sum += t2;
        if t2 < sum * 1e-12 {
            break;
        }
    }
    sum as f32
}

/// Kaiser window of length `n` and shape factor `beta`.
pub fn kaiser_window(n: usize, beta: f32) -> Vec<f32> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = bessel_i0(beta);
    (0..n)
        .map(|i| {
            let r = 2.0 * i as f32 / (n - 1) as f32 - 1.0;
            bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / denom
        })
        .collect()
}

fn fftshift<T>(data: &mut [T]) {
    let half = data.len() / 2;
    data.rotate_left(half);
}

/// Averaging spectral estimator.
pub struct Periodogram {
    nfft: usize,
    window: Vec<f32>,
    delay: usize,
    fft: Arc<dyn Fft<f32>>,
}

impl Periodogram {
    /// Periodogram with a Kaiser window.
    ///
    /// # Arguments
    ///
    /// * `nfft` - Transform size
    /// * `window_len` - Segment length (at most `nfft`)
    /// * `delay` - Samples between successive segments
    /// * `beta` - Kaiser shape factor
    pub fn kaiser(nfft: usize, window_len: usize, delay: usize, beta: f32) -> Self {
        let nfft = nfft.max(1);
        let window_len = window_len.clamp(1, nfft);

        let mut window = kaiser_window(window_len, beta);
        let energy: f32 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / energy.sqrt();
        for w in window.iter_mut() {
            *w *= scale;
        }

        let mut planner = FftPlanner::<f32>::new();
        Self {
            nfft,
            window,
            delay: delay.max(1),
            fft: planner.plan_fft_forward(nfft),
        }
    }

    /// Segments of `nfft / 2` samples overlapping by half, Kaiser window
    /// with `beta = 8`.
    pub fn with_defaults(nfft: usize) -> Self {
        Self::kaiser(nfft, nfft / 2, nfft / 4, 8.0)
    }

    /// Transform size.
    pub fn nfft(&self) -> usize {
        self.nfft
    }

    /// Estimate the power spectral density of `x` in dB, centered on DC.
    ///
    /// An input shorter than one segment is zero-padded to a single segment.
    pub fn estimate_psd(&self, x: &[Complex<f32>]) -> Vec<f32> {
        let window_len = self.window.len();
        let mut accum = vec![0.0f32; self.nfft];
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.nfft];
        let mut num_transforms = 0usize;

        let mut start = 0;
        loop {
            buffer.fill(Complex::new(0.0, 0.0));
            for (i, (b, w)) in buffer.iter_mut().zip(&self.window).enumerate() {
                if let Some(s) = x.get(start + i) {
                    *b = *s * *w;
                }
            }
            self.fft.process(&mut buffer);
            for (a, b) in accum.iter_mut().zip(&buffer) {
                *a += b.norm_sqr();
            }
            num_transforms += 1;

            start += self.delay;
            if start + window_len > x.len() {
                break;
            }
        }

        fftshift(&mut accum);
        accum
            .iter()
            .map(|p| 10.0 * (p / num_transforms as f32).max(POWER_FLOOR).log10())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_bessel_i0() {
        assert_relative_eq!(bessel_i0(0.0), 1.0);
        assert_relative_eq!(bessel_i0(1.0), 1.266_065_9, epsilon = 1e-5);
        assert_relative_eq!(bessel_i0(8.0), 427.564_1, max_relative = 1e-5);
    }

    #[test]
    fn test_kaiser_window_shape() {
        let w = kaiser_window(9, 8.0);
        assert_relative_eq!(w[4], 1.0, epsilon = 1e-6);
        assert_relative_eq!(w[0], 1.0 / bessel_i0(8.0), epsilon = 1e-6);
        for i in 0..4 {
            assert_relative_eq!(w[i], w[8 - i], epsilon = 1e-6);
            assert!(w[i] < w[i + 1]);
        }
    }

    #[test]
    fn test_white_noise_level() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let variance = 0.01f32;
        let sigma = (variance / 2.0).sqrt();
        let x: Vec<Complex<f32>> = (0..60_000)
            .map(|_| {
                // uniform components with the requested variance
                let u = Complex::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5);
                u * (sigma * 12.0_f32.sqrt())
            })
            .collect();

        let periodogram = Periodogram::with_defaults(1200);
        let psd = periodogram.estimate_psd(&x);
        assert_eq!(psd.len(), 1200);

        let mean_db = psd.iter().sum::<f32>() / psd.len() as f32;
        assert!((mean_db + 20.0).abs() < 0.5, "mean level {} dB", mean_db);
        assert!(psd.iter().all(|p| (p + 20.0).abs() < 3.0));
    }

    #[test]
    fn test_tone_lands_in_centered_bin() {
        let nfft = 1200;
        let f = 0.1;
        let x: Vec<Complex<f32>> = (0..6000)
            .map(|n| Complex::from_polar(1.0, 2.0 * std::f32::consts::PI * f * n as f32))
            .collect();
        let psd = Periodogram::with_defaults(nfft).estimate_psd(&x);

        let peak = psd
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
            .0;
        assert_eq!(peak, nfft / 2 + (f * nfft as f32).round() as usize);
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let x = vec![Complex::new(1.0f32, 0.0); 10];
        let psd = Periodogram::with_defaults(64).estimate_psd(&x);
        assert_eq!(psd.len(), 64);
        assert!(psd.iter().all(|p| p.is_finite()));
    }
}
