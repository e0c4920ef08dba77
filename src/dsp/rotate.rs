/// A DSP block that applies a complex rotation to a sequence of samples.
///
/// Sample `n` (counted from construction or the last [`Rotate::reset`]) is
/// multiplied by `exp(j*(phase + n*angle))`. The phase is accumulated in
/// double precision and evaluated directly, so long streams do not drift in
/// magnitude.
///
/// # Example
/// ```
/// use num_complex::Complex;
/// use chansync::dsp::{DspBlock, rotate::Rotate};
///
/// let mut rotator = Rotate::new(std::f32::consts::FRAC_PI_2); // 90 degrees per sample
/// let input = vec![Complex::new(1.0, 0.0); 4];
/// let output = rotator.process(&input);
/// assert!((output[1] - Complex::new(0.0, 1.0)).norm() < 1e-6);
/// ```
use std::f64::consts::TAU;

use num_complex::Complex;

use crate::dsp::DspBlock;

#[derive(Debug, Clone)]
pub struct Rotate {
    /// Phase applied to the next sample (radians, wrapped to [0, 2*PI))
    phase: f64,
    /// Phase at construction
    initial_phase: f64,
    /// Per-sample phase increment (radians)
    angle: f64,
}

impl Rotate {
    /// Create a new Rotate DSP block with the specified rotation angle in radians
    pub fn new(angle: f32) -> Self {
        Self::with_phase(angle, 0.0)
    }

    /// Create a Rotate block with a per-sample angle and an initial phase (radians)
    pub fn with_phase(angle: f32, phase: f32) -> Self {
        let phase = (phase as f64).rem_euclid(TAU);
        Self {
            phase,
            initial_phase: phase,
            angle: angle as f64,
        }
    }

    /// Phase that will be applied to the next sample (radians).
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Restart the rotation at the initial phase.
    pub fn reset(&mut self) {
        self.phase = self.initial_phase;
    }

    /// Rotate samples in place.
    pub fn process_in_place(&mut self, data: &mut [Complex<f32>]) {
        for s in data.iter_mut() {
            let (sin, cos) = self.phase.sin_cos();
            *s *= Complex::new(cos as f32, sin as f32);
            self.phase = (self.phase + self.angle).rem_euclid(TAU);
        }
    }
}

impl DspBlock for Rotate {
    /// Process a slice of complex samples, applying the rotation
    fn process(&mut self, data: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let mut out = data.to_vec();
        self.process_in_place(&mut out);
        out
    }
}
