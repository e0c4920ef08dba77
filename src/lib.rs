#![doc = include_str!("../readme.md")]

pub mod channel;
pub mod dsp;
pub mod error;
pub mod symtrack;

pub use channel::{ChannelModel, Impairment};
pub use dsp::modem::Modulation;
pub use error::{Error, Result};
pub use symtrack::{PulseShape, SymbolSynchronizer, SymtrackConfig, SynchronizerState};
