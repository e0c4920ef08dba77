//! Numerically Controlled Oscillator (NCO) with Phase-Locked Loop (PLL)
//!
//! This module provides the NCO used for carrier
//! recovery at symbol rate.
//!
//! # Design
//!
//! - Phase is represented as a value in [0, 1) representing one full cycle
//! - Frequency is in cycles per step (one step per processed symbol)
//! - The PLL uses a second-order loop filter with proportional (beta) and
//!   integral (alpha) gains
//!
//! # Example
//!
//! ```
//! use chansync::dsp::nco::Nco;
//! use num_complex::Complex;
//!
//! let mut nco = Nco::new(0.0);
//! nco.set_pll_bandwidth(0.02);
//!
//! let z = nco.mix_down(Complex::new(0.0, 1.0));
//! nco.pll_step(0.1);
//! nco.step();
//! ```

use std::f64::consts::PI;

use num_complex::Complex;

/// Numerically Controlled Oscillator with integrated Phase-Locked Loop.
#[derive(Debug, Clone)]
pub struct Nco {
    /// Current phase in cycles [0, 1)
    phase: f64,

    /// Frequency in cycles per step
    frequency: f64,

    /// PLL frequency proportion (integral gain)
    alpha: f64,

    /// PLL phase proportion (proportional gain)
    beta: f64,
}

impl Nco {
    /// Create a new NCO at the given frequency (radians per step).
    pub fn new(frequency: f32) -> Self {
        let mut nco = Self::default();
        nco.set_frequency(frequency);
        nco
    }

    /// Set the PLL loop bandwidth.
    ///
    /// The proportional gain is the bandwidth itself and the integral gain
    /// is `bandwidth^2 / 2`, which gives a damping factor of 1/sqrt(2).
    pub fn set_pll_bandwidth(&mut self, bandwidth: f32) {
        let bw = bandwidth.max(0.0) as f64;
        self.beta = bw;
        self.alpha = 0.5 * bw * bw;
    }

    /// Get the current phase in radians [0, 2*PI).
    pub fn phase(&self) -> f32 {
        (self.phase * 2.0 * PI) as f32
    }

    /// Set the phase in radians.
    pub fn set_phase(&mut self, phase: f32) {
        let cycles = phase as f64 / (2.0 * PI);
        self.phase = cycles - cycles.floor();
    }

    /// Get the current frequency in radians per step.
    pub fn frequency(&self) -> f32 {
        (self.frequency * 2.0 * PI) as f32
    }

    /// Set the frequency in radians per step.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency as f64 / (2.0 * PI);
    }

    fn adjust_frequency(&mut self, delta: f64) {
        self.frequency += delta;
    }

    fn adjust_phase(&mut self, delta: f64) {
        self.phase += delta;
        self.phase -= self.phase.floor();
    }

    /// Get the current complex phasor exp(j * 2*PI * phase).
    pub fn phasor(&self) -> Complex<f32> {
        let theta = 2.0 * PI * self.phase;
        Complex::new(theta.cos() as f32, theta.sin() as f32)
    }

    /// Step the NCO phase forward by the current frequency.
    pub fn step(&mut self) {
        self.adjust_phase(self.frequency);
    }

    /// Multiply `x` by exp(-j * theta) (shift down by the NCO phase).
    pub fn mix_down(&self, x: Complex<f32>) -> Complex<f32> {
        x * self.phasor().conj()
    }

    /// Update the PLL with a phase error in radians.
    ///
    /// - Frequency is adjusted by `error * alpha` (integral path)
    /// - Phase is adjusted by `error * beta` (proportional path)
    pub fn pll_step(&mut self, phase_error: f32) {
        let error_cycles = phase_error as f64 / (2.0 * PI);
        self.adjust_frequency(error_cycles * self.alpha);
        self.adjust_phase(error_cycles * self.beta);
    }

    /// Reset the NCO completely (phase and frequency).
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.frequency = 0.0;
    }
}

impl Default for Nco {
    fn default() -> Self {
        Self {
            phase: 0.0,
            frequency: 0.0,
            alpha: 0.1,
            beta: 0.1_f64.sqrt(),
        }
    }
}
