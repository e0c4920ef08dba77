//! Automatic Gain Control (AGC)
//!
//! This module provides a log-domain AGC for
//! normalizing signal power ahead of symbol synchronization.
//!
//! # Overview
//!
//! The AGC automatically adjusts gain to hold the output signal level at
//! unity. It tracks the output power with an exponential moving average and
//! corrects the gain in the logarithmic domain, which keeps the loop stable
//! over a wide range of input levels (a -30 dB input converges as reliably
//! as a +30 dB one).
//!
//! # Design
//!
//! For each sample `x`:
//!
//! ```text
//! y   = g * x
//! y2 <- (1 - bw) * y2 + bw * |y|^2
//! g  <- g * exp(-0.5 * bw * ln(y2))
//! ```
//!
//! # Example
//!
//! ```
//! use chansync::dsp::agc::Agc;
//! use num_complex::Complex;
//!
//! let mut agc = Agc::new(0.01);
//! let y = agc.execute(Complex::new(0.5, 0.3));
//! ```

use num_complex::Complex;

/// Automatic Gain Control for complex signals.
#[derive(Debug, Clone)]
pub struct Agc {
    /// Loop bandwidth (controls attack/decay rate)
    bandwidth: f32,

    /// Current gain value
    gain: f32,

    /// Output signal level estimate (power)
    y2_prime: f32,

    /// Minimum gain (to prevent instability)
    gain_min: f32,

    /// Maximum gain (to prevent noise amplification)
    gain_max: f32,
}

impl Agc {
    /// Create a new AGC with specified bandwidth.
    ///
    /// # Arguments
    ///
    /// * `bandwidth` - Loop bandwidth [0, 1]. Lower values provide smoother
    ///   gain adjustment but slower response to level changes.
    pub fn new(bandwidth: f32) -> Self {
        Self {
            bandwidth: bandwidth.clamp(0.0, 1.0),
            gain: 1.0,
            y2_prime: 1.0,
            gain_min: 1e-6,
            gain_max: 1e6,
        }
    }

    /// Get the current gain value.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Reset the AGC state.
    pub fn reset(&mut self) {
        self.gain = 1.0;
        self.y2_prime = 1.0;
    }

    /// Process a complex sample through the AGC.
    pub fn execute(&mut self, x: Complex<f32>) -> Complex<f32> {
        let y = x * self.gain;

        self.y2_prime = (1.0 - self.bandwidth) * self.y2_prime + self.bandwidth * y.norm_sqr();

        // an all-zero input would otherwise drive ln() to -inf
        let level = self.y2_prime.max(1e-16);
        self.gain *= (-0.5 * self.bandwidth * level.ln()).exp();
        self.gain = self.gain.clamp(self.gain_min, self.gain_max);

        y
    }

    /// Process a batch of complex samples.
    pub fn execute_block(&mut self, input: &[Complex<f32>]) -> Vec<Complex<f32>> {
        input.iter().map(|&x| self.execute(x)).collect()
    }
}

impl Default for Agc {
    fn default() -> Self {
        Self::new(0.01)
    }
}
