//! Linear modulation schemes.
//!
//! Constellations are scaled to unit average energy. The synchronizer only
//! needs the slicer ([`Modulation::decide`]) and the decision-directed phase
//! error derived from it; [`Modulation::symbol`] maps symbol indices to
//! constellation points for test signal generation.

use std::f32::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;

use num_complex::Complex;

/// Supported modulation schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modulation {
    /// Binary phase-shift keying
    Bpsk,
    /// Quadrature phase-shift keying, points at odd multiples of PI/4
    #[default]
    Qpsk,
    /// 8-ary phase-shift keying, points at multiples of PI/4
    Psk8,
    /// 16-point square QAM
    Qam16,
}

/// Per-axis amplitude levels of 16-QAM before energy normalization.
const QAM16_LEVELS: [f32; 4] = [-3.0, -1.0, 1.0, 3.0];

impl Modulation {
    /// Number of constellation points.
    pub fn order(self) -> usize {
        match self {
            Modulation::Bpsk => 2,
            Modulation::Qpsk => 4,
            Modulation::Psk8 => 8,
            Modulation::Qam16 => 16,
        }
    }

    /// Bits carried by one symbol.
    pub fn bits_per_symbol(self) -> u32 {
        self.order().trailing_zeros()
    }

    /// Constellation point for a symbol index (taken modulo the order).
    pub fn symbol(self, index: usize) -> Complex<f32> {
        let index = index % self.order();
        match self {
            Modulation::Bpsk => {
                if index == 0 {
                    Complex::new(1.0, 0.0)
                } else {
                    Complex::new(-1.0, 0.0)
                }
            }
            Modulation::Qpsk => Complex::from_polar(1.0, 0.5 * PI * (index as f32 + 0.5)),
            Modulation::Psk8 => Complex::from_polar(1.0, 0.25 * PI * index as f32),
            Modulation::Qam16 => {
                let scale = 1.0 / 10.0_f32.sqrt();
                Complex::new(QAM16_LEVELS[index % 4], QAM16_LEVELS[index / 4]) * scale
            }
        }
    }

    /// Nearest constellation point (hard decision).
    pub fn decide(self, z: Complex<f32>) -> Complex<f32> {
        match self {
            Modulation::Bpsk => Complex::new(if z.re >= 0.0 { 1.0 } else { -1.0 }, 0.0),
            Modulation::Qpsk => Complex::new(
                if z.re >= 0.0 { FRAC_1_SQRT_2 } else { -FRAC_1_SQRT_2 },
                if z.im >= 0.0 { FRAC_1_SQRT_2 } else { -FRAC_1_SQRT_2 },
            ),
            Modulation::Psk8 => {
                let sector = (z.arg() / (0.25 * PI)).round();
                Complex::from_polar(1.0, 0.25 * PI * sector)
            }
            Modulation::Qam16 => {
                let scale = 10.0_f32.sqrt();
                Complex::new(
                    qam16_level(z.re * scale) / scale,
                    qam16_level(z.im * scale) / scale,
                )
            }
        }
    }

    /// Decision-directed phase error (radians, small-angle approximation).
    ///
    /// Computed as `Im(z * conj(d)) / |d|^2` against the hard decision `d`
    /// and clipped to [-1, 1].
    pub fn phase_error(self, z: Complex<f32>) -> f32 {
        let d = self.decide(z);
        let error = (z * d.conj()).im / d.norm_sqr();
        error.clamp(-1.0, 1.0)
    }
}

fn qam16_level(v: f32) -> f32 {
    if v < -2.0 {
        -3.0
    } else if v < 0.0 {
        -1.0
    } else if v < 2.0 {
        1.0
    } else {
        3.0
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modulation::Bpsk => "bpsk",
            Modulation::Qpsk => "qpsk",
            Modulation::Psk8 => "psk8",
            Modulation::Qam16 => "qam16",
        };
        write!(f, "{}", name)
    }
}
