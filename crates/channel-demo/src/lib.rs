//! Channel emulation and symbol synchronization demo.
//!
//! Runs the complete chain on random QPSK data:
//! - root-Nyquist pulse shaping
//! - channel impairments (noise, carrier offset, multipath, rate offset)
//! - streaming symbol synchronization
//! - periodogram of the received signal
//!
//! and exports the recovered symbols and spectrum as an Octave/MATLAB script.

pub mod export;
pub mod pipeline;
pub mod settings;
pub mod spgram;
