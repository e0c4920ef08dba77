//! Root-Nyquist interpolator.
//!
//! Maps one complex symbol to `k` waveform samples by polyphase filtering
//! with a root-raised-cosine pulse. A symbol pushed at index `i` peaks at
//! output sample `i*k + k*m`.
//!
//! # Example
//!
//! ```
//! use chansync::dsp::firinterp::FirInterp;
//! use num_complex::Complex;
//!
//! let mut interp = FirInterp::new_rnyquist(2, 7, 0.25, 0.0);
//! let samples = interp.execute(Complex::new(1.0, 0.0));
//! assert_eq!(samples.len(), 2);
//! ```

use num_complex::Complex;

use super::filters::design_rrc;
use super::firpfb::PolyphaseFilterBank;

/// Interpolating FIR filter (symbols in, `k` samples per symbol out).
#[derive(Debug, Clone)]
pub struct FirInterp {
    /// Interpolation factor (samples per symbol)
    k: usize,
    /// One phase per output sample of a symbol
    bank: PolyphaseFilterBank,
}

impl FirInterp {
    /// Create an interpolator from arbitrary prototype coefficients.
    pub fn new(k: usize, h: &[f32]) -> Self {
        Self {
            k,
            bank: PolyphaseFilterBank::new(h, k),
        }
    }

    /// Create a root-raised-cosine interpolator.
    ///
    /// # Arguments
    ///
    /// * `k` - Samples per symbol
    /// * `m` - Filter delay (symbols)
    /// * `beta` - Excess bandwidth factor
    /// * `dt` - Fractional timing offset (symbols)
    pub fn new_rnyquist(k: usize, m: usize, beta: f32, dt: f32) -> Self {
        Self::new(k, &design_rrc(k, m, beta, dt))
    }

    /// Interpolation factor.
    pub fn samples_per_symbol(&self) -> usize {
        self.k
    }

    /// Interpolate a single symbol into `k` samples.
    pub fn execute(&mut self, symbol: Complex<f32>) -> Vec<Complex<f32>> {
        let mut out = vec![Complex::new(0.0, 0.0); self.k];
        self.execute_into(symbol, &mut out);
        out
    }

    /// Interpolate a single symbol, writing `k` samples into `out`.
    ///
    /// `out` must hold at least `k` samples; extra samples are left untouched.
    pub fn execute_into(&mut self, symbol: Complex<f32>, out: &mut [Complex<f32>]) {
        self.bank.push(symbol);
        for (phase, y) in out.iter_mut().take(self.k).enumerate() {
            *y = self.bank.execute(phase);
        }
    }

    /// Interpolate a block of symbols.
    pub fn execute_block(&mut self, symbols: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let mut out = vec![Complex::new(0.0, 0.0); symbols.len() * self.k];
        for (symbol, chunk) in symbols.iter().zip(out.chunks_exact_mut(self.k)) {
            self.execute_into(*symbol, chunk);
        }
        out
    }

    /// Clear the interpolator history.
    pub fn reset(&mut self) {
        self.bank.reset();
    }
}
