//! Polyphase Symbol Synchronizer
//!
//! This module provides a polyphase symbol synchronizer for
//! timing recovery in digital communication systems.
//!
//! # Overview
//!
//! The symbol synchronizer recovers the optimal sampling instants for a
//! digitally modulated signal. It uses a polyphase filter bank approach
//! combined with a timing error detector and loop filter.
//!
//! # Design
//!
//! The synchronizer is built from:
//! - Polyphase matched filter bank with `npfb` phases
//! - Derivative matched filter bank for timing error detection
//! - Matched filter TED: `error = Re(conj(mf) * dmf) / Kd`, where the
//!   detector gain `Kd` is the slope of the noise-free S-curve at zero
//!   error, so the error reads in input samples (limited to half a symbol)
//! - Second-order proportional-integral loop filter with damping 1/√2 and
//!   gains derived from the loop noise bandwidth
//!
//! The fractional timing phase `tau` is the position of the next symbol
//! relative to the newest input sample. It advances by `del` (nominally
//! `k`) at every symbol and retreats by one per input sample; a symbol is
//! produced whenever the matching filterbank index falls inside the bank.
//!
//! # Example
//!
//! ```
//! use chansync::dsp::symsync::SymSync;
//! use num_complex::Complex;

use num_complex::Complex;
use super::filters::{derivative, design_rrc};
use super::firpfb::PolyphaseFilterBank;

/// Largest relative deviation of the symbol period from `k`.
pub const MAX_TIMING_DRIFT: f32 = 0.05;

/// Damping factor of the timing loop.
const DAMPING: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Symbol Synchronizer with polyphase filter bank.
///
/// Performs timing recovery for digital communication signals using a
/// polyphase matched filter approach with timing error detection and
/// loop filtering.
#[derive(Debug, Clone)]
pub struct SymSync {
    /// Samples per symbol (input)
    k: usize,

    /// Number of polyphase filter phases
    npfb: usize,

    /// Matched filter bank
    mf: PolyphaseFilterBank,

    /// Derivative matched filter bank (for timing error detection)
    dmf: PolyphaseFilterBank,

    /// Fractional timing phase (samples until the next symbol)
    tau: f32,

    /// Hard filterbank index
    b: i32,

    /// Loop integrator: symbol period estimate (nominal = k)
    rate: f32,

    /// Timing step applied at the next symbol
    del: f32,

    /// Bounds on rate and del
    del_min: f32,
    del_max: f32,

    /// Detector output slope at zero timing error
    detector_gain: f32,

    /// Normalized timing error of the last symbol, not yet applied
    q: f32,

    /// Proportional and integral loop gains
    kp: f32,
    ki: f32,

    /// Loop noise bandwidth (per symbol)
    bandwidth: f32,
}

impl SymSync {
    /// Create a symbol synchronizer from external filter coefficients.
    ///
    /// # Arguments
    ///
    /// * `k` - Samples per symbol
    /// * `npfb` - Number of polyphase filter phases (typically 32)
    /// * `h` - Matched filter coefficients, designed at `k * npfb`
    ///   samples per symbol
    /// * `bandwidth` - Loop noise bandwidth per symbol [0, 1]
    pub fn new(k: usize, npfb: usize, h: &[f32], bandwidth: f32) -> Self {
        let npfb = npfb.max(1);
        let dh = derivative(h);
        let detector_gain = detector_gain(h, &dh, k, npfb);

        let rate = k as f32;
        let bandwidth = bandwidth.clamp(0.0, 1.0);
        let (kp, ki) = loop_gains(bandwidth);

        Self {
            k,
            npfb,
            mf: PolyphaseFilterBank::new(h, npfb),
            dmf: PolyphaseFilterBank::new(&dh, npfb),
            tau: 0.0,
            b: 0,
            rate,
            del: rate,
            del_min: rate / (1.0 + MAX_TIMING_DRIFT),
            del_max: rate / (1.0 - MAX_TIMING_DRIFT),
            detector_gain,
            q: 0.0,
            kp,
            ki,
            bandwidth,
        }
    }

    /// Create a symbol synchronizer with root-raised-cosine matched filter.
    ///
    /// # Arguments
    ///
    /// * `k` - Samples per symbol
    /// * `npfb` - Number of polyphase filter phases (typically 32)
    /// * `m` - Filter semi-length in symbols
    /// * `beta` - Rolloff factor (0, 1]
    /// * `bandwidth` - Loop noise bandwidth per symbol [0, 1]
    pub fn new_rnyquist(k: usize, npfb: usize, m: usize, beta: f32, bandwidth: f32) -> Self {
        let h = design_rrc(k * npfb, m, beta, 0.0);
        Self::new(k, npfb, &h, bandwidth)
    }

    /// Set the loop noise bandwidth (clamped to [0, 1]). A zero bandwidth
    /// freezes the loop.
    pub fn set_bandwidth(&mut self, bandwidth: f32) {
        self.bandwidth = bandwidth.clamp(0.0, 1.0);
        (self.kp, self.ki) = loop_gains(self.bandwidth);
    }

    /// Get the loop noise bandwidth.
    pub fn bandwidth(&self) -> f32 {
        self.bandwidth
    }

    /// Samples per symbol.
    pub fn samples_per_symbol(&self) -> usize {
        self.k
    }

    /// Shortest possible symbol period in samples.
    pub fn min_symbol_period(&self) -> f32 {
        self.del_min
    }

    /// Get the current timing phase, in samples until the next symbol.
    pub fn tau(&self) -> f32 {
        self.tau
    }

    /// Get the current symbol period estimate (samples per symbol).
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Reset the synchronizer state.
    pub fn reset(&mut self) {
        self.mf.reset();
        self.dmf.reset();
        self.tau = 0.0;
        self.b = 0;
        self.rate = self.k as f32;
        self.del = self.rate;
        self.q = 0.0;
    }

    /// Push a sample and potentially get an output symbol.
    ///
    /// Call it once per input sample. Because `del` always exceeds one
    /// sample, at most one symbol is produced per input sample.
    pub fn push(&mut self, x: Complex<f32>) -> Option<Complex<f32>> {
        self.mf.push(x);
        self.dmf.push(x);

        let mut output = None;

        if self.b < self.npfb as i32 {
            let phase = self.b.max(0) as usize;
            let mf = self.mf.execute(phase);
            let dmf = self.dmf.execute(phase);
            output = Some(mf / self.k as f32);

            self.advance_loop(mf, dmf);

            self.tau += self.del;
            self.b = (self.tau * self.npfb as f32).round() as i32;
        }

        // one input sample consumed
        self.tau -= 1.0;
        self.b -= self.npfb as i32;

        output
    }

    fn advance_loop(&mut self, mf: Complex<f32>, dmf: Complex<f32>) {
        // Errors are applied one symbol late: consecutive detector outputs
        // share symbols, and feeding one straight into the next sampling
        // instant biases the period estimate.
        let e = self.q;
        self.rate = (self.rate + self.ki * e).clamp(self.del_min, self.del_max);
        self.del = (self.rate + self.kp * e).clamp(self.del_min, self.del_max);

        // Re(conj(mf) * dmf), in samples, limited to half a symbol
        let q = mf.re * dmf.re + mf.im * dmf.im;
        let limit = 0.5 * self.k as f32;
        self.q = (q / self.detector_gain).clamp(-limit, limit);
    }

    /// Process a batch of samples.
    pub fn execute(&mut self, input: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let mut output = Vec::with_capacity(input.len() / self.k + 1);

        for &x in input {
            if let Some(sym) = self.push(x) {
                output.push(sym);
            }
        }

        output
    }
}

/// Proportional and integral gains of a second-order loop with noise
/// bandwidth `bandwidth` per symbol, unit detector gain and damping
/// [`DAMPING`].
fn loop_gains(bandwidth: f32) -> (f32, f32) {
    let theta = bandwidth / (DAMPING + 0.25 / DAMPING);
    let d = 1.0 + 2.0 * DAMPING * theta + theta * theta;
    (4.0 * DAMPING * theta / d, 4.0 * theta * theta / d)
}

/// Slope of the mean detector output at zero timing error, per input
/// sample, for unit-power symbols shaped by `h`.
///
/// Falls back to 1 when the filter has no usable slope.
fn detector_gain(h: &[f32], dh: &[f32], k: usize, npfb: usize) -> f32 {
    let step = (k * npfb) as i64;
    let span = h.len() as i64 / step + 2;

    // every symbol in the span contributes Re(conj(g) * dg)
    let s_curve = |offset: i64| -> f64 {
        (-span..=span)
            .map(|i| {
                let d = offset + i * step;
                pulse_response(h, h, d, npfb) * pulse_response(dh, h, d, npfb)
            })
            .sum()
    };

    let gain = -(s_curve(1) - s_curve(-1)) / 2.0 * npfb as f64;
    if gain.is_finite() && gain > 1e-6 {
        gain as f32
    } else {
        1.0
    }
}

/// Output of filter `f` (bank phase resolution) for a pulse `h` sent at
/// one sample per `npfb` coefficients, `d` filter phases past the peak.
fn pulse_response(f: &[f32], h: &[f32], d: i64, npfb: usize) -> f64 {
    let npfb = npfb as i64;
    let center = (h.len() as i64 - 1) / 2;
    let t = d + 2 * center;
    let (r, p) = (t.div_euclid(npfb), t.rem_euclid(npfb));

    let tap = |v: &[f32], i: i64| -> f64 {
        usize::try_from(i)
            .ok()
            .and_then(|i| v.get(i))
            .map_or(0.0, |&c| c as f64)
    };

    (0..=r)
        .map(|j| tap(f, p + j * npfb) * tap(h, (r - j) * npfb))
        .sum()
}
