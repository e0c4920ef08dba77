//! Polyphase filter bank.
//!
//! A prototype filter `h` is decomposed into `npfb` sub-filters, sub-filter
//! `p` holding taps `h[p], h[p + npfb], h[p + 2*npfb], ...`. All sub-filters
//! share one input history, so evaluating sub-filter `p` after a push yields
//! the prototype output at fractional phase `p / npfb`.
//!
//! The same structure serves as the symbol-rate interpolator (one push per
//! symbol, every phase evaluated) and as the matched filter of the symbol
//! synchronizer (one push per sample, one phase evaluated per symbol).

use num_complex::Complex;

/// Polyphase filter bank over complex samples.
#[derive(Debug, Clone)]
pub struct PolyphaseFilterBank {
    /// Number of filter phases
    npfb: usize,
    /// Sub-filter length
    h_sub_len: usize,
    /// Filter coefficients [npfb][h_sub_len]
    filters: Vec<Vec<f32>>,
    /// Input history (ring buffer)
    buffer: Vec<Complex<f32>>,
    /// Write index into buffer
    buf_idx: usize,
}

impl PolyphaseFilterBank {
    /// Create a new polyphase filter bank from a prototype filter.
    ///
    /// The prototype is zero-padded to a multiple of `npfb` taps.
    pub fn new(h: &[f32], npfb: usize) -> Self {
        let npfb = npfb.max(1);
        let h_sub_len = h.len().div_ceil(npfb).max(1);

        let mut filters = vec![vec![0.0f32; h_sub_len]; npfb];
        for (i, &coef) in h.iter().enumerate() {
            filters[i % npfb][i / npfb] = coef;
        }

        Self {
            npfb,
            h_sub_len,
            filters,
            buffer: vec![Complex::new(0.0, 0.0); h_sub_len],
            buf_idx: 0,
        }
    }

    /// Number of filter phases.
    pub fn num_phases(&self) -> usize {
        self.npfb
    }

    /// Length of each sub-filter.
    pub fn sub_len(&self) -> usize {
        self.h_sub_len
    }

    /// Push a new sample into the shared history.
    pub fn push(&mut self, x: Complex<f32>) {
        self.buffer[self.buf_idx] = x;
        self.buf_idx = (self.buf_idx + 1) % self.h_sub_len;
    }

    /// Execute the sub-filter at the given phase index.
    ///
    /// Phases beyond the last one are clamped.
    pub fn execute(&self, phase: usize) -> Complex<f32> {
        let filter = &self.filters[phase.min(self.npfb - 1)];
        let mut sum = Complex::new(0.0f32, 0.0);

        for (j, &coef) in filter.iter().enumerate() {
            // newest sample first (convolution order)
            let idx = (self.buf_idx + self.h_sub_len - 1 - j) % self.h_sub_len;
            sum += self.buffer[idx] * coef;
        }

        sum
    }

    /// Clear the input history.
    pub fn reset(&mut self) {
        self.buffer.fill(Complex::new(0.0, 0.0));
        self.buf_idx = 0;
    }
}
