//! End-to-end run: symbols, pulse shaping, channel, synchronizer, spectrum.

use chansync::dsp::firinterp::FirInterp;
use chansync::{ChannelModel, Modulation, Result, SymbolSynchronizer, SymtrackConfig};
use num_complex::Complex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::settings::Settings;
use crate::spgram::Periodogram;

/// Noise floor of the additive noise stage (dB)
pub const NOISE_FLOOR_DB: f32 = -60.0;
/// Carrier frequency offset (radians/sample)
pub const CARRIER_FREQUENCY: f32 = 0.0;
/// Carrier phase offset (radians)
pub const CARRIER_PHASE: f32 = 2.1;
/// Number of random multipath taps
pub const MULTIPATH_TAPS: usize = 3;
/// Transform size of the reported spectrum
pub const NFFT: usize = 1200;
/// Slack added to every output buffer
pub const CAPACITY_MARGIN: usize = 64;

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Transmitted samples
    pub nx: usize,
    /// Channel output buffer size
    pub ny_capacity: usize,
    /// Channel output samples
    pub ny: usize,
    pub symbols_in: usize,
    pub symbols_out: usize,
    pub nfft: usize,
    /// Recovered symbols
    #[serde(skip)]
    pub symbols: Vec<Complex<f32>>,
    /// Spectrum of the channel output (dB, centered)
    #[serde(skip)]
    pub psd: Vec<f32>,
}

/// Run the complete chain described by `settings`.
pub fn run(settings: &Settings) -> Result<Report> {
    settings.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let symbols: Vec<Complex<f32>> = (0..settings.num_symbols)
        .map(|_| Modulation::Qpsk.symbol(rng.gen_range(0..4)))
        .collect();

    let mut interp = FirInterp::new_rnyquist(settings.k, settings.m, settings.beta, settings.tau);
    let x = interp.execute_block(&symbols);
    let nx = x.len();
    debug!("interpolated {} symbols into {} samples", symbols.len(), nx);

    let mut channel = ChannelModel::new(rng.gen());
    channel.add_awgn(NOISE_FLOOR_DB, settings.snr_db)?;
    channel.add_carrier_offset(CARRIER_FREQUENCY, CARRIER_PHASE)?;
    channel.add_multipath(None, MULTIPATH_TAPS)?;
    channel.add_resample(0.0, settings.rate)?;

    let ny_capacity = (settings.rate * nx as f32).ceil() as usize + CAPACITY_MARGIN;
    let mut y = vec![Complex::new(0.0, 0.0); ny_capacity];
    let ny = channel.execute(&x, &mut y)?;
    y.truncate(ny);
    info!("channel: {} samples in, {} samples out", nx, ny);

    let config = SymtrackConfig {
        k: settings.k,
        m: settings.m,
        beta: settings.beta,
        bandwidth: settings.bandwidth,
        ..SymtrackConfig::default()
    };
    let mut sync = SymbolSynchronizer::new(config)?;
    let mut z = vec![Complex::new(0.0, 0.0); settings.num_symbols + CAPACITY_MARGIN];
    let nz = sync.execute_block(&y, &mut z)?;
    z.truncate(nz);
    info!(
        "synchronizer: {} symbols out, rate {:.5}, carrier phase {:.3}",
        nz,
        sync.state().rate(),
        sync.state().carrier_phase()
    );

    let psd = Periodogram::with_defaults(NFFT).estimate_psd(&y);

    Ok(Report {
        nx,
        ny_capacity,
        ny,
        symbols_in: settings.num_symbols,
        symbols_out: nz,
        nfft: NFFT,
        symbols: z,
        psd,
    })
}
