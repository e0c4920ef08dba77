//! Digital Signal Processing (DSP) module.
//!
//! This module provides the building blocks shared by the channel model and
//! the symbol synchronizer. All blocks operate on `Complex<f32>` samples.
//!
//! # Modules
//! - `agc`: Automatic gain control.
//! - `filters`: Root-raised-cosine, derivative and windowed-sinc design.
//! - `firinterp`: Root-Nyquist interpolator (symbols to samples).
//! - `firpfb`: Polyphase filter bank.
//! - `modem`: Constellations and decision rules.
//! - `nco`: Numerically controlled oscillator with PLL.
//! - `resampler`: Arbitrary-rate fractional resampler.
//! - `rotate`: Phase-accumulating complex rotator.
//! - `symsync`: Polyphase symbol timing synchronizer.
//!
//! # Traits
//! - [`DspBlock`]: A trait representing a generic DSP processing block that
//!   operates on slices of complex samples.
use num_complex::Complex;

pub mod agc;
pub mod filters;
pub mod firinterp;
pub mod firpfb;
pub mod modem;
pub mod nco;
pub mod resampler;
pub mod rotate;
pub mod symsync;

/// A processing stage mapping a block of samples to a new block.
///
/// Output length may differ from input length. Stateful implementations
/// carry their state from one call to the next.
pub trait DspBlock {
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>>;
}
