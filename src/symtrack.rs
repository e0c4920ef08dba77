//! Streaming symbol synchronizer
//!
//! [`SymbolSynchronizer`] recovers one complex symbol per transmitted symbol
//! from an oversampled, impaired waveform. Every input sample goes through:
//!
//! 1. automatic gain control, normalizing the sample power to unity;
//! 2. a polyphase matched filter and timing loop ([`SymSync`]), which emits
//!    a symbol whenever the recovered sampling instant falls on this sample;
//! 3. carrier recovery: the symbol is derotated by an NCO whose PLL is
//!    driven by the decision-directed phase error of the modulation slicer.
//!
//! The derotated soft symbol is the output; no hard decision is forced.
//!
//! All loop state lives in [`SynchronizerState`] and persists between calls,
//! so a stream split into blocks of any size yields exactly the symbols a
//! single call over the whole stream would.
//!
//! # Example
//!
//! ```
//! use chansync::symtrack::{SymbolSynchronizer, SymtrackConfig};
//! use num_complex::Complex;
//!
//! let mut sync = SymbolSynchronizer::new(SymtrackConfig::default())?;
//!
//! let input = vec![Complex::new(0.7, 0.7); 400];
//! let mut output = vec![Complex::new(0.0, 0.0); input.len() / 2 + 16];
//! let n = sync.execute_block(&input, &mut output)?;
//! assert!(n <= output.len());
//! # Ok::<(), chansync::Error>(())
//! ```

use num_complex::Complex;
use tracing::{debug, trace};

use crate::dsp::agc::Agc;
use crate::dsp::modem::Modulation;
use crate::dsp::nco::Nco;
use crate::dsp::symsync::SymSync;
use crate::dsp::DspBlock;
use crate::error::{Error, Result};

/// Number of matched filter phases.
pub const NUM_FILTER_PHASES: usize = 32;

/// AGC loop bandwidth.
pub const AGC_BANDWIDTH: f32 = 0.005;

/// Transmit pulse family the matched filter is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PulseShape {
    /// Root-raised-cosine
    #[default]
    Rrc,
}

/// Synchronizer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymtrackConfig {
    /// Pulse shape of the transmitter
    pub shape: PulseShape,
    /// Samples per symbol (at least 2)
    pub k: usize,
    /// Filter delay in symbols (at least 1)
    pub m: usize,
    /// Excess bandwidth factor in (0, 1]
    pub beta: f32,
    /// Modulation used for carrier phase decisions
    pub modulation: Modulation,
    /// Timing and carrier loop bandwidth (positive)
    pub bandwidth: f32,
}

impl Default for SymtrackConfig {
    fn default() -> Self {
        Self {
            shape: PulseShape::Rrc,
            k: 2,
            m: 7,
            beta: 0.25,
            modulation: Modulation::Qpsk,
            bandwidth: 0.02,
        }
    }
}

impl SymtrackConfig {
    /// Check every parameter against its valid domain.
    pub fn validate(&self) -> Result<()> {
        if self.k < 2 {
            return Err(Error::configuration(format!(
                "samples per symbol must be at least 2, got {}",
                self.k
            )));
        }
        if self.m < 1 {
            return Err(Error::configuration("filter delay must be at least 1 symbol"));
        }
        if !(self.beta > 0.0 && self.beta <= 1.0) {
            return Err(Error::configuration(format!(
                "excess bandwidth must be in (0, 1], got {}",
                self.beta
            )));
        }
        validate_bandwidth(self.bandwidth)
    }
}

fn validate_bandwidth(bandwidth: f32) -> Result<()> {
    if bandwidth.is_finite() && bandwidth > 0.0 {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "loop bandwidth must be positive, got {}",
            bandwidth
        )))
    }
}

/// Loop state of a [`SymbolSynchronizer`].
///
/// Every field persists across calls; there is no per-call scratch state.
#[derive(Debug, Clone)]
pub struct SynchronizerState {
    /// Gain estimate and output level
    agc: Agc,
    /// Matched filter history, timing phase and loop filter
    symsync: SymSync,
    /// Carrier phase and frequency
    nco: Nco,
    /// Symbols produced since creation or the last reset
    num_symbols: u64,
}

impl SynchronizerState {
    /// Current AGC gain.
    pub fn gain(&self) -> f32 {
        self.agc.gain()
    }

    /// Fractional timing phase (samples until the next symbol).
    pub fn tau(&self) -> f32 {
        self.symsync.tau()
    }

    /// Recovered symbol period in samples.
    pub fn rate(&self) -> f32 {
        self.symsync.rate()
    }

    /// Carrier phase estimate in radians.
    pub fn carrier_phase(&self) -> f32 {
        self.nco.phase()
    }

    /// Carrier frequency estimate in radians per symbol.
    pub fn carrier_frequency(&self) -> f32 {
        self.nco.frequency()
    }

    /// Symbols produced so far.
    pub fn num_symbols(&self) -> u64 {
        self.num_symbols
    }

    fn push(&mut self, modulation: Modulation, x: Complex<f32>) -> Option<Complex<f32>> {
        let y = self.agc.execute(x);
        let v = self.symsync.push(y)?;

        let z = self.nco.mix_down(v);
        let phase_error = modulation.phase_error(z);
        self.nco.pll_step(phase_error);
        self.nco.step();
        self.num_symbols += 1;

        trace!(
            n = self.num_symbols,
            tau = self.symsync.tau(),
            rate = self.symsync.rate(),
            phase_error,
            "symtrack: symbol"
        );
        Some(z)
    }

    /// Run `input` through the loops, writing the symbols that fit into
    /// `output`. Returns the number of symbols produced, which may exceed
    /// `output.len()`.
    fn run_block(&mut self, modulation: Modulation, input: &[Complex<f32>], output: &mut [Complex<f32>]) -> usize {
        let mut count = 0;
        for &x in input {
            if let Some(z) = self.push(modulation, x) {
                if let Some(slot) = output.get_mut(count) {
                    *slot = z;
                }
                count += 1;
            }
        }
        count
    }
}

/// Block-streaming symbol synchronizer.
#[derive(Debug, Clone)]
pub struct SymbolSynchronizer {
    config: SymtrackConfig,
    state: SynchronizerState,
}

impl SymbolSynchronizer {
    /// Create a synchronizer, validating the configuration.
    pub fn new(config: SymtrackConfig) -> Result<Self> {
        config.validate()?;

        let symsync = match config.shape {
            PulseShape::Rrc => SymSync::new_rnyquist(
                config.k,
                NUM_FILTER_PHASES,
                config.m,
                config.beta,
                config.bandwidth.min(1.0),
            ),
        };
        let mut nco = Nco::new(0.0);
        nco.set_pll_bandwidth(config.bandwidth);

        debug!(
            k = config.k,
            m = config.m,
            beta = config.beta,
            modulation = %config.modulation,
            bandwidth = config.bandwidth,
            "symtrack: created"
        );

        Ok(Self {
            config,
            state: SynchronizerState {
                agc: Agc::new(AGC_BANDWIDTH),
                symsync,
                nco,
                num_symbols: 0,
            },
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &SymtrackConfig {
        &self.config
    }

    /// Loop state.
    pub fn state(&self) -> &SynchronizerState {
        &self.state
    }

    /// Retune the timing and carrier loops.
    ///
    /// Larger values track faster but noisier. Fails on a non-positive
    /// bandwidth, leaving the loops untouched.
    pub fn set_bandwidth(&mut self, bandwidth: f32) -> Result<()> {
        validate_bandwidth(bandwidth)?;

        self.config.bandwidth = bandwidth;
        self.state.symsync.set_bandwidth(bandwidth.min(1.0));
        self.state.nco.set_pll_bandwidth(bandwidth);
        debug!(bandwidth, "symtrack: bandwidth set");
        Ok(())
    }

    /// Buffer length that always holds the symbols of `n` samples.
    ///
    /// `floor(n / k)` plus a margin for the timing loop running at its
    /// fastest allowed symbol rate, `k / (1 + MAX_TIMING_DRIFT)`. Shorter
    /// buffers are accepted by [`SymbolSynchronizer::execute_block`] as long
    /// as the block fits.
    pub fn max_output_len(&self, n: usize) -> usize {
        let del_min = self.state.symsync.min_symbol_period();
        ((n as f32 + 1.0) / del_min).floor() as usize + 1
    }

    /// Clear all loop state, as if newly created.
    pub fn reset(&mut self) {
        self.state.agc.reset();
        self.state.symsync.reset();
        self.state.nco.reset();
        self.state.num_symbols = 0;
    }

    /// Process one block of samples into `output`.
    ///
    /// Returns the number of symbols written. Fails with
    /// [`Error::Capacity`] when the block yields more symbols than `output`
    /// holds; the loop state is then left as it was before the call and the
    /// contents of `output` are unspecified.
    pub fn execute_block(&mut self, input: &[Complex<f32>], output: &mut [Complex<f32>]) -> Result<usize> {
        let modulation = self.config.modulation;

        let written = if output.len() >= self.max_output_len(input.len()) {
            let written = self.state.run_block(modulation, input, output);
            debug_assert!(written <= output.len());
            written
        } else {
            // may overflow: run on a copy, committed only when every symbol fits
            let mut state = self.state.clone();
            let produced = state.run_block(modulation, input, output);
            if produced > output.len() {
                return Err(Error::capacity(produced, output.len()));
            }
            self.state = state;
            produced
        };

        debug!(
            input_len = input.len(),
            symbols = written,
            total = self.state.num_symbols,
            gain = self.state.agc.gain(),
            rate = self.state.symsync.rate(),
            "symtrack: block"
        );
        Ok(written)
    }

    /// Process one block of samples, returning the recovered symbols.
    pub fn execute(&mut self, input: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let modulation = self.config.modulation;
        let mut output = Vec::with_capacity(self.max_output_len(input.len()));
        for &x in input {
            if let Some(z) = self.state.push(modulation, x) {
                output.push(z);
            }
        }
        output
    }
}

impl DspBlock for SymbolSynchronizer {
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>> {
        self.execute(data)
    }
}
