//! Run settings and their validation.

use std::path::PathBuf;

use chansync::channel::{RATE_MAX, RATE_MIN};
use chansync::{Error, Result};

/// Seed used when none is given on the command line.
pub const DEFAULT_SEED: u64 = 0x5eed;

/// Parameters of one demo run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Samples per symbol
    pub k: usize,
    /// Filter delay (symbols)
    pub m: usize,
    /// Excess bandwidth factor
    pub beta: f32,
    /// Signal-to-noise ratio (dB)
    pub snr_db: f32,
    /// Synchronizer loop bandwidth
    pub bandwidth: f32,
    /// Number of transmitted symbols
    pub num_symbols: usize,
    /// Fractional timing offset of the transmitter (symbols)
    pub tau: f32,
    /// Sample rate offset of the channel
    pub rate: f32,
    /// Script written at the end of the run
    pub output: PathBuf,
    /// Seed for symbols, noise and multipath taps
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            k: 2,
            m: 7,
            beta: 0.25,
            snr_db: 30.0,
            bandwidth: 0.02,
            num_symbols: 4000,
            tau: -0.2,
            rate: 1.001,
            output: PathBuf::from("channel_example.m"),
            seed: DEFAULT_SEED,
        }
    }
}

impl Settings {
    /// Check every parameter; the first violation is reported.
    pub fn validate(&self) -> Result<()> {
        let problem = if self.k < 2 {
            "k (samples/symbol) must be greater than 1"
        } else if self.m < 1 {
            "m (filter delay) must be greater than 0"
        } else if !(self.beta > 0.0 && self.beta <= 1.0) {
            "beta (excess bandwidth factor) must be in (0,1]"
        } else if !self.snr_db.is_finite() {
            "signal-to-noise ratio must be finite"
        } else if !(self.bandwidth > 0.0 && self.bandwidth.is_finite()) {
            "timing PLL bandwidth must be greater than 0"
        } else if self.num_symbols == 0 {
            "number of symbols must be greater than 0"
        } else if !(-1.0..=1.0).contains(&self.tau) {
            "timing phase offset must be in [-1,1]"
        } else if !(RATE_MIN..=RATE_MAX).contains(&self.rate) {
            "timing rate offset must be in [0.98,1.02]"
        } else {
            return Ok(());
        };
        Err(Error::configuration(problem))
    }
}
