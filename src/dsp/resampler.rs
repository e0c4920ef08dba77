//! Arbitrary-rate fractional resampler
//!
//! Resamples a finite block of complex samples by a rate close to one, as
//! needed to emulate a sample clock offset between transmitter and receiver.
//!
//! # Design
//!
//! Output sample `j` is the input signal evaluated at time
//! `timing_offset + j / rate` (in input samples). The value is interpolated
//! with a bank of `npfb + 1` Blackman-windowed sinc kernels tabulated at
//! fractional delays `p / npfb`; the two kernels bracketing the exact delay
//! are blended linearly. Samples outside the input block are treated as
//! zero.
//!
//! # Example
//!
//! ```
//! use chansync::dsp::resampler::FractionalResampler;
//! use num_complex::Complex;
//!
//! let resampler = FractionalResampler::new(0.0, 1.001).unwrap();
//! let input = vec![Complex::new(1.0, 0.0); 1000];
//! let output = resampler.process(&input);
//! assert_eq!(output.len(), resampler.output_len(input.len()));
//! ```

use num_complex::Complex;

use super::filters::windowed_sinc;
use crate::error::{Error, Result};

/// Lowest supported resampling rate
pub const RATE_MIN: f32 = 0.98;

/// Highest supported resampling rate
pub const RATE_MAX: f32 = 1.02;

/// Kernel semi-length (taps on each side of the interpolation instant)
const KERNEL_SEMI_LEN: usize = 8;

/// Number of tabulated fractional delays
const NUM_PHASES: usize = 64;

/// Fractional-delay resampler over finite blocks.
#[derive(Debug, Clone)]
pub struct FractionalResampler {
    /// Output rate relative to input rate
    rate: f64,
    /// Input time of the first output sample
    timing_offset: f64,
    /// Kernels for delays 0, 1/npfb, ..., 1 (npfb + 1 entries)
    kernels: Vec<Vec<f32>>,
}

impl FractionalResampler {
    /// Create a resampler.
    ///
    /// # Arguments
    ///
    /// * `timing_offset` - Input time of the first output sample, in [-1, 1]
    /// * `rate` - Output/input rate, in [`RATE_MIN`, `RATE_MAX`]
    pub fn new(timing_offset: f32, rate: f32) -> Result<Self> {
        if !(RATE_MIN..=RATE_MAX).contains(&rate) {
            return Err(Error::configuration(format!(
                "resampling rate {} outside [{}, {}]",
                rate, RATE_MIN, RATE_MAX
            )));
        }
        if !(-1.0..=1.0).contains(&timing_offset) {
            return Err(Error::configuration(format!(
                "timing offset {} outside [-1, 1]",
                timing_offset
            )));
        }

        // cutoff tracks the narrower of the two sample rates
        let fc = 0.5 * rate.min(1.0);
        let kernels = (0..=NUM_PHASES)
            .map(|p| windowed_sinc(KERNEL_SEMI_LEN, p as f32 / NUM_PHASES as f32, fc))
            .collect();

        Ok(Self {
            rate: rate as f64,
            timing_offset: timing_offset as f64,
            kernels,
        })
    }

    /// Output/input rate.
    pub fn rate(&self) -> f32 {
        self.rate as f32
    }

    /// Input time of the first output sample.
    pub fn timing_offset(&self) -> f32 {
        self.timing_offset as f32
    }

    /// A-priori output length estimate: `ceil(rate * n)`.
    pub fn estimate_output_len(&self, n: usize) -> usize {
        (self.rate * n as f64).ceil() as usize
    }

    /// Exact number of samples produced for an input of `n` samples.
    ///
    /// Every output instant `timing_offset + j / rate` lies before the end of
    /// the input, which gives `ceil((n - timing_offset) * rate)`.
    pub fn output_len(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let span = (n as f64 - self.timing_offset) * self.rate;
        if span <= 0.0 {
            0
        } else {
            span.ceil() as usize
        }
    }

    /// Resample `input` into `output`, returning the number of samples
    /// written.
    ///
    /// Writes `min(output_len(input.len()), output.len())` samples.
    pub fn process_into(&self, input: &[Complex<f32>], output: &mut [Complex<f32>]) -> usize {
        let n_out = self.output_len(input.len()).min(output.len());

        for (j, y) in output.iter_mut().take(n_out).enumerate() {
            let t = self.timing_offset + j as f64 / self.rate;
            let base = t.floor();
            let mu = t - base;

            let pos = mu * NUM_PHASES as f64;
            let p = (pos.floor() as usize).min(NUM_PHASES - 1);
            let frac = (pos - p as f64) as f32;

            let first = base as i64 - KERNEL_SEMI_LEN as i64 + 1;
            let lo = self.dot(&self.kernels[p], input, first);
            let hi = self.dot(&self.kernels[p + 1], input, first);
            *y = lo * (1.0 - frac) + hi * frac;
        }

        n_out
    }

    /// Resample `input` into a new vector of `output_len(input.len())` samples.
    pub fn process(&self, input: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let mut output = vec![Complex::new(0.0, 0.0); self.output_len(input.len())];
        self.process_into(input, &mut output);
        output
    }

    fn dot(&self, kernel: &[f32], input: &[Complex<f32>], first: i64) -> Complex<f32> {
        let mut sum = Complex::new(0.0f32, 0.0);
        for (i, &coef) in kernel.iter().enumerate() {
            let idx = first + i as i64;
            if idx >= 0 && (idx as usize) < input.len() {
                sum += input[idx as usize] * coef;
            }
        }
        sum
    }
}
