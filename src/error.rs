//! Error handling for the chansync library
//!
//! This module provides a unified error type for configuration of channel
//! impairments and synchronizers, for buffer capacity contracts, and for the
//! I/O performed by reporting code built on top of the library.

use thiserror::Error;

/// A specialized Result type for chansync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for chansync operations
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter is outside its valid domain.
    ///
    /// Raised when a channel stage is added or a synchronizer is created or
    /// retuned, never during steady-state execution.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A caller-provided output buffer cannot hold the computed output.
    #[error("Capacity error: {required} samples required, buffer holds {capacity}")]
    Capacity {
        /// Number of samples the operation needs to write
        required: usize,
        /// Length of the buffer supplied by the caller
        capacity: usize,
    },

    /// I/O error (report export, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a capacity error
    pub fn capacity(required: usize, capacity: usize) -> Self {
        Error::Capacity { required, capacity }
    }
}
