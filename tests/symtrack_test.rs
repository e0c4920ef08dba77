//! End-to-end tests: pulse shaping, channel impairments and symbol recovery

mod helpers;

use chansync::{ChannelModel, Error, SymbolSynchronizer, SymtrackConfig};
use helpers::{power, random_chunks, random_qpsk, shape, tail_evm};
use num_complex::Complex;

fn impaired_waveform(num_symbols: usize, snr_db: f32, rate: f32, tau: f32, seed: u64) -> Vec<Complex<f32>> {
    let config = SymtrackConfig::default();
    let symbols = random_qpsk(num_symbols, seed);
    let x = shape(&symbols, config.k, config.m, config.beta, tau);

    let mut channel = ChannelModel::new(seed);
    channel.add_awgn(-60.0, snr_db).unwrap();
    channel.add_carrier_offset(0.0, 2.1).unwrap();
    channel.add_multipath(None, 3).unwrap();
    channel.add_resample(0.0, rate).unwrap();
    run_channel(&mut channel, &x)
}

fn run_channel(channel: &mut ChannelModel, x: &[Complex<f32>]) -> Vec<Complex<f32>> {
    let mut y = vec![Complex::new(0.0, 0.0); channel.required_capacity(x.len())];
    let ny = channel.execute(x, &mut y).unwrap();
    y.truncate(ny);
    y
}

/// Default-config waveform through noise, a carrier offset and a rate
/// offset only
fn clean_channel_waveform(num_symbols: usize, dphi: f32, rate: f32, seed: u64) -> Vec<Complex<f32>> {
    let config = SymtrackConfig::default();
    let symbols = random_qpsk(num_symbols, seed);
    let x = shape(&symbols, config.k, config.m, config.beta, -0.2);

    let mut channel = ChannelModel::new(seed);
    channel.add_awgn(-60.0, 30.0).unwrap();
    channel.add_carrier_offset(dphi, 2.1).unwrap();
    channel.add_resample(0.0, rate).unwrap();
    run_channel(&mut channel, &x)
}

#[test]
fn test_streaming_equivalence() {
    let y = impaired_waveform(1500, 25.0, 1.001, -0.2, 17);

    let mut whole = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
    let expected = whole.execute(&y);

    let mut chunked = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
    let mut recovered = Vec::new();
    let mut offset = 0;
    for len in random_chunks(y.len(), 97, 5) {
        let block = &y[offset..offset + len];
        let mut out = vec![Complex::new(0.0, 0.0); chunked.max_output_len(len)];
        let n = chunked.execute_block(block, &mut out).unwrap();
        recovered.extend_from_slice(&out[..n]);
        offset += len;
    }

    assert_eq!(recovered.len(), expected.len());
    assert_eq!(recovered, expected);
    assert_eq!(
        chunked.state().num_symbols(),
        whole.state().num_symbols()
    );
}

#[test]
fn test_single_sample_blocks() {
    let y = impaired_waveform(300, 30.0, 0.999, 0.1, 23);

    let mut whole = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
    let expected = whole.execute(&y);

    let mut chunked = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
    let mut recovered = Vec::new();
    let mut out = [Complex::new(0.0, 0.0); 2];
    for sample in y.chunks(1) {
        let n = chunked.execute_block(sample, &mut out).unwrap();
        recovered.extend_from_slice(&out[..n]);
    }
    assert_eq!(recovered, expected);
}

#[test]
fn test_zero_impairment_round_trip() {
    let config = SymtrackConfig::default();
    let symbols = random_qpsk(3000, 99);
    let x = shape(&symbols, config.k, config.m, config.beta, 0.0);

    let mut channel = ChannelModel::new(0);
    channel.add_carrier_offset(0.0, 0.0).unwrap();
    channel.add_resample(0.0, 1.0).unwrap();
    let mut y = vec![Complex::new(0.0, 0.0); channel.required_capacity(x.len())];
    let ny = channel.execute(&x, &mut y).unwrap();
    assert_eq!(ny, x.len());

    let mut sync = SymbolSynchronizer::new(config).unwrap();
    let z = sync.execute(&y[..ny]);

    // steady state only
    let start = 1000;
    let end = z.len() - 50;
    let mse_at = |delay: usize| {
        (start..end)
            .map(|i| (z[i] - symbols[i - delay]).norm_sqr())
            .sum::<f32>()
            / (end - start) as f32
    };
    let (delay, mse) = (0..=40)
        .map(|d| (d, mse_at(d)))
        .fold((0, f32::MAX), |best, cur| if cur.1 < best.1 { cur } else { best });

    assert_eq!(delay, 2 * config.m);
    assert!(mse < 0.05, "mean squared error {}", mse);

    let rotation: Complex<f32> = (start..end)
        .map(|i| z[i] * symbols[i - delay].conj())
        .sum();
    assert!(rotation.arg().abs() < 0.05, "residual rotation {}", rotation.arg());
}

#[test]
fn test_concrete_scenario() {
    let num_symbols = 4000;
    let rate = 1.001f32;
    let config = SymtrackConfig::default();

    let symbols = random_qpsk(num_symbols, 1);
    let x = shape(&symbols, config.k, config.m, config.beta, -0.2);
    assert_eq!(x.len(), 8000);
    assert!((power(&x[100..7900]) - 1.0).abs() < 0.1);

    let mut channel = ChannelModel::new(1);
    channel.add_awgn(-60.0, 30.0).unwrap();
    channel.add_carrier_offset(0.0, 2.1).unwrap();
    channel.add_multipath(None, 3).unwrap();
    channel.add_resample(0.0, rate).unwrap();

    let capacity = (rate * x.len() as f32).ceil() as usize + 64;
    assert!((8072..=8073).contains(&capacity));
    let mut y = vec![Complex::new(0.0, 0.0); capacity];
    let ny = channel.execute(&x, &mut y).unwrap();
    assert_eq!(ny, channel.output_len(x.len()));
    assert!((8008..=8016).contains(&ny), "ny = {}", ny);
    assert!(channel.estimate_output_len(x.len()).abs_diff(ny) <= 2);

    let mut sync = SymbolSynchronizer::new(config).unwrap();
    let mut z = vec![Complex::new(0.0, 0.0); num_symbols + 64];
    let nz = sync.execute_block(&y[..ny], &mut z).unwrap();
    assert!(nz.abs_diff(num_symbols) <= 40, "{} symbols out", nz);
    assert!(z[..nz].iter().all(|s| s.re.is_finite() && s.im.is_finite()));

    // the random taps leave some intersymbol interference, but the timing
    // loop still settles on the stretched symbol period
    let period = sync.state().rate();
    assert!((period - 2.0 * rate).abs() < 0.03, "symbol period {}", period);
}

#[test]
fn test_concrete_scenario_tail_quality() {
    let num_symbols = 4000;
    let config = SymtrackConfig::default();
    let symbols = random_qpsk(num_symbols, 1);
    let x = shape(&symbols, config.k, config.m, config.beta, -0.2);

    // dominant direct path with two weak echoes
    let taps = vec![
        Complex::new(1.0, 0.0),
        Complex::from_polar(0.2, 0.7),
        Complex::from_polar(0.1, -1.9),
    ];
    let mut channel = ChannelModel::new(1);
    channel.add_awgn(-60.0, 30.0).unwrap();
    channel.add_carrier_offset(0.0, 2.1).unwrap();
    channel.add_multipath(Some(taps), 3).unwrap();
    channel.add_resample(0.0, 1.001).unwrap();
    let y = run_channel(&mut channel, &x);

    let mut sync = SymbolSynchronizer::new(config).unwrap();
    let mut z = vec![Complex::new(0.0, 0.0); num_symbols + 64];
    let nz = sync.execute_block(&y, &mut z).unwrap();
    assert!(nz.abs_diff(num_symbols) <= 8, "{} symbols out", nz);

    let evm = tail_evm(&z[..nz]);
    assert!(evm < 0.03, "tail error {}", evm);
}

#[test]
fn test_rate_band_edges() {
    let num_symbols = 4000;
    for rate in [0.98f32, 1.02] {
        let y = clean_channel_waveform(num_symbols, 0.0, rate, 5);

        let mut sync = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
        let mut z = vec![Complex::new(0.0, 0.0); num_symbols + 64];
        let nz = sync.execute_block(&y, &mut z).unwrap();

        assert!(nz.abs_diff(num_symbols) <= 20, "rate {}: {} symbols out", rate, nz);
        let evm = tail_evm(&z[..nz]);
        assert!(evm < 0.02, "rate {}: tail error {}", rate, evm);
        let period = sync.state().rate();
        assert!((period - 2.0 * rate).abs() < 0.03, "rate {}: symbol period {}", rate, period);
    }
}

#[test]
fn test_carrier_frequency_recovery() {
    let dphi = 0.002;
    let y = clean_channel_waveform(4000, dphi, 1.0, 11);

    let mut sync = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
    let z = sync.execute(&y);

    // radians per sample at the channel, radians per symbol at the loop
    let expected = 2.0 * dphi;
    let frequency = sync.state().carrier_frequency();
    assert!((frequency - expected).abs() < 2e-4, "carrier frequency {}", frequency);
    assert!(tail_evm(&z) < 0.02, "tail error {}", tail_evm(&z));
}

#[test]
fn test_configuration_errors_at_call() {
    let mut sync = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
    assert!(matches!(sync.set_bandwidth(0.0), Err(Error::Configuration(_))));

    let mut channel = ChannelModel::new(0);
    assert!(matches!(
        channel.add_resample(0.0, 1.5),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_deterministic_for_fixed_seed() {
    let a = impaired_waveform(500, 20.0, 1.002, -0.2, 8);
    let b = impaired_waveform(500, 20.0, 1.002, -0.2, 8);
    assert_eq!(a, b);

    let mut sa = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
    let mut sb = SymbolSynchronizer::new(SymtrackConfig::default()).unwrap();
    assert_eq!(sa.execute(&a), sb.execute(&b));
}
