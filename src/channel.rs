//! Channel impairment model
//!
//! A [`ChannelModel`] is an ordered list of [`Impairment`] stages applied to
//! a finite block of complex samples. Stages run in insertion order, each
//! one consuming the previous stage's output:
//!
//! - additive white Gaussian noise at a target SNR above a noise floor,
//! - carrier frequency and phase offset,
//! - multipath propagation (convolution with complex taps),
//! - sample-rate offset (fractional resampling).
//!
//! All randomness (noise samples and random multipath taps) is drawn from a
//! generator owned by the model and seeded explicitly, so a given seed and
//! configuration always produce the same output.
//!
//! # Example
//!
//! ```
//! use chansync::channel::ChannelModel;
//! use num_complex::Complex;
//!
//! let mut channel = ChannelModel::new(1);
//! channel.add_awgn(-60.0, 30.0)?;
//! channel.add_carrier_offset(0.0, 2.1)?;
//! channel.add_multipath(None, 3)?;
//! channel.add_resample(0.0, 1.001)?;
//!
//! let input = vec![Complex::new(1.0, 0.0); 1000];
//! let mut output = vec![Complex::new(0.0, 0.0); 1064];
//! let written = channel.execute(&input, &mut output)?;
//! assert_eq!(written, channel.output_len(input.len()));
//! # Ok::<(), chansync::Error>(())
//! ```

use num_complex::Complex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use tracing::debug;

use crate::dsp::resampler::FractionalResampler;
use crate::dsp::rotate::Rotate;
use crate::dsp::DspBlock;
use crate::error::{Error, Result};

pub use crate::dsp::resampler::{RATE_MAX, RATE_MIN};

/// A single channel impairment.
#[derive(Debug, Clone)]
pub enum Impairment {
    /// Scale to `snr_db` above `noise_floor_db` and add complex white
    /// Gaussian noise of power `10^(noise_floor_db / 10)`.
    AdditiveNoise { noise_floor_db: f32, snr_db: f32 },
    /// Multiply sample `n` of each block by `exp(j(phase + n * frequency))`.
    CarrierOffset { frequency: f32, phase: f32 },
    /// Convolve with the given taps.
    Multipath { taps: Vec<Complex<f32>> },
    /// Resample at a rate close to one.
    Resample(FractionalResampler),
}

impl Impairment {
    /// Number of samples this stage produces from `n` input samples.
    pub fn output_len(&self, n: usize) -> usize {
        match self {
            Impairment::AdditiveNoise { .. } | Impairment::CarrierOffset { .. } => n,
            Impairment::Multipath { taps } => {
                if n == 0 {
                    0
                } else {
                    n + taps.len() - 1
                }
            }
            Impairment::Resample(resampler) => resampler.output_len(n),
        }
    }

    /// A-priori output length, `ceil(rate * n)` for the resampling stage.
    pub fn estimate_output_len(&self, n: usize) -> usize {
        match self {
            Impairment::Resample(resampler) => resampler.estimate_output_len(n),
            other => other.output_len(n),
        }
    }

    /// Apply the stage. `output` must hold exactly `output_len(input.len())`
    /// samples.
    fn apply<R: Rng>(&self, input: &[Complex<f32>], output: &mut [Complex<f32>], rng: &mut R) {
        match self {
            Impairment::AdditiveNoise {
                noise_floor_db,
                snr_db,
            } => {
                let gain = 10.0_f32.powf((snr_db + noise_floor_db) / 20.0);
                // N0 / 2 per component
                let sigma = 10.0_f32.powf(noise_floor_db / 20.0) * std::f32::consts::FRAC_1_SQRT_2;
                for (y, x) in output.iter_mut().zip(input) {
                    let noise = Complex::new(
                        rng.sample::<f32, _>(StandardNormal),
                        rng.sample::<f32, _>(StandardNormal),
                    );
                    *y = *x * gain + noise * sigma;
                }
            }
            Impairment::CarrierOffset { frequency, phase } => {
                output.copy_from_slice(input);
                Rotate::with_phase(*frequency, *phase).process_in_place(output);
            }
            Impairment::Multipath { taps } => {
                for (i, y) in output.iter_mut().enumerate() {
                    let mut sum = Complex::new(0.0f32, 0.0);
                    for (j, tap) in taps.iter().enumerate() {
                        if let Some(x) = i.checked_sub(j).and_then(|idx| input.get(idx)) {
                            sum += tap * x;
                        }
                    }
                    *y = sum;
                }
            }
            Impairment::Resample(resampler) => {
                resampler.process_into(input, output);
            }
        }
    }
}

/// Ordered composition of channel impairments.
#[derive(Debug, Clone)]
pub struct ChannelModel {
    stages: Vec<Impairment>,
    rng: ChaCha8Rng,
}

impl ChannelModel {
    /// Create an empty channel whose random source is seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Create an empty channel drawing from the given generator.
    pub fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            stages: Vec::new(),
            rng,
        }
    }

    /// Configured stages, in application order.
    pub fn stages(&self) -> &[Impairment] {
        &self.stages
    }

    /// Append an additive white Gaussian noise stage.
    ///
    /// The input is assumed to have unit average power. It is scaled so its
    /// power sits `snr_db` above the noise floor, then noise of power
    /// `10^(noise_floor_db / 10)` is added.
    pub fn add_awgn(&mut self, noise_floor_db: f32, snr_db: f32) -> Result<()> {
        if !noise_floor_db.is_finite() || !snr_db.is_finite() {
            return Err(Error::configuration(format!(
                "noise floor ({} dB) and SNR ({} dB) must be finite",
                noise_floor_db, snr_db
            )));
        }
        let gain = 10.0_f32.powf((snr_db + noise_floor_db) / 20.0);
        let sigma = 10.0_f32.powf(noise_floor_db / 20.0);
        if !gain.is_finite() || !sigma.is_finite() {
            return Err(Error::configuration(format!(
                "noise floor {} dB with SNR {} dB overflows",
                noise_floor_db, snr_db
            )));
        }

        debug!(noise_floor_db, snr_db, "channel: add awgn");
        self.stages.push(Impairment::AdditiveNoise {
            noise_floor_db,
            snr_db,
        });
        Ok(())
    }

    /// Append a carrier offset stage.
    ///
    /// * `frequency` - Offset in radians per sample
    /// * `phase` - Phase of the first sample of every block, in radians
    pub fn add_carrier_offset(&mut self, frequency: f32, phase: f32) -> Result<()> {
        if !frequency.is_finite() || !phase.is_finite() {
            return Err(Error::configuration(format!(
                "carrier offset ({}, {}) must be finite",
                frequency, phase
            )));
        }

        debug!(frequency, phase, "channel: add carrier offset");
        self.stages.push(Impairment::CarrierOffset { frequency, phase });
        Ok(())
    }

    /// Append a multipath stage.
    ///
    /// With `taps`, the given coefficients are used as is and `tap_count`
    /// must equal their number. Without, `tap_count` taps with Rayleigh
    /// magnitude and uniform phase are drawn and normalized to unit energy.
    pub fn add_multipath(&mut self, taps: Option<Vec<Complex<f32>>>, tap_count: usize) -> Result<()> {
        let taps = match taps {
            Some(taps) => {
                if taps.is_empty() {
                    return Err(Error::configuration("multipath taps must not be empty"));
                }
                if taps.len() != tap_count {
                    return Err(Error::configuration(format!(
                        "multipath tap count {} does not match {} taps",
                        tap_count,
                        taps.len()
                    )));
                }
                if taps.iter().any(|t| !t.re.is_finite() || !t.im.is_finite()) {
                    return Err(Error::configuration("multipath taps must be finite"));
                }
                taps
            }
            None => {
                if tap_count == 0 {
                    return Err(Error::configuration("multipath tap count must be at least 1"));
                }
                self.random_taps(tap_count)
            }
        };

        debug!(tap_count = taps.len(), "channel: add multipath");
        self.stages.push(Impairment::Multipath { taps });
        Ok(())
    }

    fn random_taps(&mut self, tap_count: usize) -> Vec<Complex<f32>> {
        loop {
            let mut taps: Vec<Complex<f32>> = (0..tap_count)
                .map(|_| {
                    Complex::new(
                        self.rng.sample::<f32, _>(StandardNormal),
                        self.rng.sample::<f32, _>(StandardNormal),
                    )
                })
                .collect();

            let energy: f32 = taps.iter().map(|t| t.norm_sqr()).sum();
            if energy > f32::EPSILON {
                let norm = energy.sqrt();
                for t in taps.iter_mut() {
                    *t /= norm;
                }
                return taps;
            }
        }
    }

    /// Append a resampling stage.
    ///
    /// * `timing_offset` - Input time of the first output sample, in [-1, 1]
    /// * `rate` - Output/input rate, in [`RATE_MIN`, `RATE_MAX`]
    pub fn add_resample(&mut self, timing_offset: f32, rate: f32) -> Result<()> {
        let resampler = FractionalResampler::new(timing_offset, rate)?;

        debug!(timing_offset, rate, "channel: add resample");
        self.stages.push(Impairment::Resample(resampler));
        Ok(())
    }

    /// A-priori output length for `n` input samples.
    pub fn estimate_output_len(&self, n: usize) -> usize {
        self.stages
            .iter()
            .fold(n, |len, stage| stage.estimate_output_len(len))
    }

    /// Exact number of samples [`ChannelModel::execute`] writes for `n`
    /// input samples.
    pub fn output_len(&self, n: usize) -> usize {
        self.stages.iter().fold(n, |len, stage| stage.output_len(len))
    }

    /// Largest buffer any stage needs for `n` input samples.
    pub fn required_capacity(&self, n: usize) -> usize {
        let mut len = n;
        let mut required = n;
        for stage in &self.stages {
            len = stage.output_len(len);
            required = required.max(len);
        }
        required
    }

    /// Run every stage over `input`, writing the result into `output`.
    ///
    /// Returns the number of samples written. Fails with
    /// [`Error::Capacity`] before touching any state when an intermediate
    /// or final block would not fit in `output`.
    pub fn execute(&mut self, input: &[Complex<f32>], output: &mut [Complex<f32>]) -> Result<usize> {
        let required = self.required_capacity(input.len());
        if required > output.len() {
            return Err(Error::capacity(required, output.len()));
        }

        let result = self.run(input);
        output[..result.len()].copy_from_slice(&result);

        debug!(
            input_len = input.len(),
            output_len = result.len(),
            stages = self.stages.len(),
            "channel: executed"
        );
        Ok(result.len())
    }

    fn run(&mut self, input: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let mut current = input.to_vec();
        for stage in &self.stages {
            let mut next = vec![Complex::new(0.0, 0.0); stage.output_len(current.len())];
            stage.apply(&current, &mut next, &mut self.rng);
            current = next;
        }
        current
    }
}

impl DspBlock for ChannelModel {
    /// Run the channel without a capacity limit.
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>> {
        self.run(data)
    }
}
