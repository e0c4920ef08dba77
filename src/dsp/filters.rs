//! Filter design helpers.
//!
//! This module provides the coefficient generators shared by the
//! interpolator, the matched filter of the symbol synchronizer and the
//! resampling stage of the channel:
//! - [`design_rrc`]: root-raised-cosine (root-Nyquist) pulse
//! - [`derivative`]: derivative filter used for timing error detection
//! - [`windowed_sinc`]: fractional-delay interpolation kernel
//!
//! # Example
//!
//! ```
//! use chansync::dsp::filters::design_rrc;
//!
//! // 2 samples/symbol, 7 symbols delay, 25% excess bandwidth
//! let h = design_rrc(2, 7, 0.25, 0.0);
//! assert_eq!(h.len(), 2 * 2 * 7 + 1);
//! ```

use std::f32::consts::PI;

/// Root-raised-cosine filter design.
///
/// Generates `2*k*m + 1` coefficients of a root-raised-cosine pulse sampled
/// at `k` samples per symbol, centered at sample `k*m` and delayed by `dt`
/// symbols. The coefficients are not normalized: the pulse has unit energy
/// per symbol, so the sum of squared taps is approximately `k`.
///
/// # Arguments
///
/// * `k` - Samples per symbol
/// * `m` - Filter semi-length (symbols)
/// * `beta` - Excess bandwidth factor in (0, 1]
/// * `dt` - Fractional delay (symbols)
pub fn design_rrc(k: usize, m: usize, beta: f32, dt: f32) -> Vec<f32> {
    let h_len = 2 * k * m + 1;
    let mut h = vec![0.0f32; h_len];

    let kf = k as f32;
    let mf = m as f32;

    for (n, coef) in h.iter_mut().enumerate() {
        // normalized time in symbol periods, centered at m
        let z = n as f32 / kf - mf - dt;

        if z.abs() < 1e-5 {
            *coef = 1.0 - beta + 4.0 * beta / PI;
        } else {
            let g = 1.0 - 16.0 * beta * beta * z * z;

            if g * g < 1e-5 {
                // 16*beta^2*z^2 == 1
                let g1 = 1.0 + 2.0 / PI;
                let g2 = (0.25 * PI / beta).sin();
                let g3 = 1.0 - 2.0 / PI;
                let g4 = (0.25 * PI / beta).cos();
                *coef = beta / 2.0_f32.sqrt() * (g1 * g2 + g3 * g4);
            } else {
                let t1 = ((1.0 + beta) * PI * z).cos();
                let t2 = ((1.0 - beta) * PI * z).sin();
                let t3 = 1.0 / (4.0 * beta * z);
                let t4 = 4.0 * beta / (PI * g);
                *coef = t4 * (t1 + t2 * t3);
            }
        }
    }

    h
}

/// Compute the derivative of filter coefficients.
///
/// Uses central differences (wrapping at the edges) and scales the result so
/// that `max |h[i] * dh[i]|` equals 0.06, which keeps the timing error
/// detector gain independent of the prototype length.
pub fn derivative(h: &[f32]) -> Vec<f32> {
    let h_len = h.len();
    if h_len < 2 {
        return vec![0.0; h_len];
    }

    let mut dh: Vec<f32> = (0..h_len)
        .map(|i| {
            let next = h[(i + 1) % h_len];
            let prev = h[(i + h_len - 1) % h_len];
            next - prev
        })
        .collect();

    let hdh_max = h
        .iter()
        .zip(dh.iter())
        .map(|(a, b)| (a * b).abs())
        .fold(0.0f32, f32::max);

    if hdh_max > 1e-10 {
        let scale = 0.06 / hdh_max;
        for coef in &mut dh {
            *coef *= scale;
        }
    }

    dh
}

/// Blackman window evaluated at offset `u` from the center of a window of
/// half-width `half`. Zero outside `(-half, half)`.
pub fn blackman(u: f32, half: f32) -> f32 {
    if u.abs() >= half {
        return 0.0;
    }
    let x = PI * u / half;
    0.42 + 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
}

/// Fractional-delay interpolation kernel.
///
/// Returns the `2*m` taps that interpolate a sample `mu` in [0, 1] past the
/// newest-but-`m-1` input sample, using a Blackman-windowed sinc with cutoff
/// `fc` (cycles/sample, at most 0.5). Taps are normalized to unity DC gain.
///
/// Tap `i` multiplies input sample `n0 - m + 1 + i`, where `n0` is the integer
/// part of the interpolation instant.
pub fn windowed_sinc(m: usize, mu: f32, fc: f32) -> Vec<f32> {
    let half = m as f32;
    let mut taps: Vec<f32> = (0..2 * m)
        .map(|i| {
            let u = mu + (m - 1) as f32 - i as f32;
            let sinc = if u.abs() < 1e-6 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * u).sin() / (PI * u)
            };
            sinc * blackman(u, half)
        })
        .collect();

    let norm: f32 = taps.iter().sum();
    if norm.abs() > 1e-10 {
        for v in taps.iter_mut() {
            *v /= norm;
        }
    }
    taps
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rrc_filter_design() {
        let h = design_rrc(4, 3, 0.35, 0.0);
        assert_eq!(h.len(), 25);
        let mid = h.len() / 2;
        for i in 0..mid {
            assert!(
                (h[i] - h[h.len() - 1 - i]).abs() < 1e-5,
                "Filter not symmetric at index {}",
                i
            );
        }
        assert_relative_eq!(h[mid], 1.0 - 0.35 + 4.0 * 0.35 / PI, epsilon = 1e-6);
    }

    #[test]
    fn test_rrc_unit_energy_per_symbol() {
        let k = 4;
        let h = design_rrc(k, 8, 0.25, 0.0);
        let energy: f32 = h.iter().map(|v| v * v).sum();
        assert_relative_eq!(energy, k as f32, max_relative = 0.02);
    }

    #[test]
    fn test_rrc_nyquist_zero_crossings() {
        // h convolved with itself must vanish at nonzero multiples of k
        let k = 2;
        let m = 8;
        let h = design_rrc(k, m, 0.3, 0.0);
        let n = h.len();
        let autocorr = |lag: usize| -> f32 { (0..n - lag).map(|i| h[i] * h[i + lag]).sum() };
        let peak = autocorr(0);
        for sym in 1..4 {
            assert!(
                autocorr(sym * k).abs() / peak < 0.02,
                "ISI at lag {} symbols",
                sym
            );
        }
    }

    #[test]
    fn test_rrc_fractional_delay_moves_peak() {
        let h0 = design_rrc(8, 3, 0.5, 0.0);
        let h1 = design_rrc(8, 3, 0.5, 0.25);
        let argmax = |h: &[f32]| {
            h.iter()
                .enumerate()
                .fold((0, f32::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc })
                .0
        };
        assert_eq!(argmax(&h0), 24);
        assert_eq!(argmax(&h1), 26);
    }

    #[test]
    fn test_derivative_filter() {
        let h = vec![1.0, 2.0, 3.0, 2.0, 1.0];
        let dh = derivative(&h);
        assert_eq!(dh.len(), h.len());
        // antisymmetric around the center for a symmetric input
        assert_relative_eq!(dh[1], -dh[3], epsilon = 1e-6);
        assert_relative_eq!(dh[2], 0.0, epsilon = 1e-6);
        let hdh_max = h
            .iter()
            .zip(dh.iter())
            .map(|(a, b)| (a * b).abs())
            .fold(0.0f32, f32::max);
        assert_relative_eq!(hdh_max, 0.06, epsilon = 1e-6);
    }

    #[test]
    fn test_blackman_window() {
        assert_relative_eq!(blackman(0.0, 4.0), 1.0, epsilon = 1e-6);
        assert_eq!(blackman(4.0, 4.0), 0.0);
        assert!(blackman(2.0, 4.0) < 1.0);
    }

    #[test]
    fn test_windowed_sinc_integer_delay_is_identity() {
        let taps = windowed_sinc(8, 0.0, 0.5);
        assert_eq!(taps.len(), 16);
        for (i, &t) in taps.iter().enumerate() {
            if i == 7 {
                assert_relative_eq!(t, 1.0, epsilon = 1e-5);
            } else {
                assert!(t.abs() < 1e-5, "tap {} = {}", i, t);
            }
        }
    }

    #[test]
    fn test_windowed_sinc_unity_dc_gain() {
        for mu in [0.1, 0.25, 0.5, 0.9] {
            let sum: f32 = windowed_sinc(6, mu, 0.45).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_windowed_sinc_half_sample_is_symmetric() {
        let taps = windowed_sinc(4, 0.5, 0.5);
        for i in 0..4 {
            assert_relative_eq!(taps[i], taps[7 - i], epsilon = 1e-6);
        }
    }
}
