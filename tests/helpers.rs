//! Test helper utilities for generating synthetic symbol streams and waveforms
#![allow(dead_code)]

use chansync::dsp::firinterp::FirInterp;
use chansync::Modulation;
use num_complex::Complex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate random QPSK symbols `exp(j*PI/2*(r + 1/2))`
///
/// # Arguments
/// * `num_symbols` - Number of symbols to generate
/// * `seed` - Seed of the symbol generator
pub fn random_qpsk(num_symbols: usize, seed: u64) -> Vec<Complex<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..num_symbols)
        .map(|_| Modulation::Qpsk.symbol(rng.gen_range(0..4)))
        .collect()
}

/// Pulse-shape symbols with a root-raised-cosine interpolator
///
/// # Arguments
/// * `symbols` - Symbols to interpolate
/// * `k` - Samples per symbol
/// * `m` - Filter delay (symbols)
/// * `beta` - Excess bandwidth factor
/// * `tau` - Fractional timing offset (symbols)
///
/// # Returns
/// `symbols.len() * k` samples
pub fn shape(symbols: &[Complex<f32>], k: usize, m: usize, beta: f32, tau: f32) -> Vec<Complex<f32>> {
    let mut interp = FirInterp::new_rnyquist(k, m, beta, tau);
    interp.execute_block(symbols)
}

/// Mean squared distance to the nearest QPSK point over the last half of
/// `z`, once the loops have settled
pub fn tail_evm(z: &[Complex<f32>]) -> f32 {
    let tail = &z[z.len() / 2..];
    tail.iter()
        .map(|s| (s - Modulation::Qpsk.decide(*s)).norm_sqr())
        .sum::<f32>()
        / tail.len() as f32
}

/// Average power of a block of samples
pub fn power(x: &[Complex<f32>]) -> f32 {
    x.iter().map(|s| s.norm_sqr()).sum::<f32>() / x.len() as f32
}

/// Split `n` into consecutive chunk lengths drawn from `1..=max_chunk`
pub fn random_chunks(n: usize, max_chunk: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut lengths = Vec::new();
    let mut remaining = n;
    while remaining > 0 {
        let len = rng.gen_range(1..=max_chunk).min(remaining);
        lengths.push(len);
        remaining -= len;
    }
    lengths
}
