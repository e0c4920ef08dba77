//! Channel impairment and symbol synchronization demo
//!
//! Generates random QPSK symbols, passes the pulse-shaped waveform through a
//! noisy, phase-rotated, multipath, rate-offset channel and recovers the
//! symbols with the streaming synchronizer. The recovered constellation and
//! the received spectrum are written as an Octave/MATLAB script.
//!
//! # Usage Examples
//!
//! ## Default run
//! ```bash
//! channel_demo
//! ```
//!
//! ## Low SNR with a wider loop
//! ```bash
//! channel_demo -s 12 -w 0.05 -o low_snr.m -v
//! ```
//!
//! ## Run summary as JSON
//! ```bash
//! channel_demo -n 2000 -r 0.995 --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use channel_demo::export::export_script;
use channel_demo::pipeline;
use channel_demo::settings::{Settings, DEFAULT_SEED};
use chansync::Error;
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Channel impairments and symbol synchronization demo", long_about = None)]
struct Args {
    /// Samples per symbol
    #[arg(short = 'k', long, default_value_t = 2)]
    samples_per_symbol: usize,

    /// Filter delay (symbols)
    #[arg(short, long = "delay", default_value_t = 7)]
    m: usize,

    /// Filter excess bandwidth factor
    #[arg(short, long, default_value_t = 0.25)]
    beta: f32,

    /// Signal-to-noise ratio (dB)
    #[arg(short, long, default_value_t = 30.0, allow_hyphen_values = true)]
    snr: f32,

    /// Synchronizer loop bandwidth
    #[arg(short = 'w', long, default_value_t = 0.02)]
    bandwidth: f32,

    /// Number of symbols
    #[arg(short, long, default_value_t = 4000)]
    num_symbols: usize,

    /// Fractional timing offset of the transmitter (symbols)
    #[arg(short, long, default_value_t = -0.2, allow_hyphen_values = true)]
    tau: f32,

    /// Sample rate offset of the channel
    #[arg(short, long, default_value_t = 1.001)]
    rate: f32,

    /// Output script
    #[arg(short, long, default_value = "channel_example.m")]
    output: PathBuf,

    /// Seed for symbols, noise and multipath taps
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Verbosity level (-v=info, -vv=debug, -vvv=trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Print the run summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl From<&Args> for Settings {
    fn from(args: &Args) -> Self {
        Settings {
            k: args.samples_per_symbol,
            m: args.m,
            beta: args.beta,
            snr_db: args.snr,
            bandwidth: args.bandwidth,
            num_symbols: args.num_symbols,
            tau: args.tau,
            rate: args.rate,
            output: args.output.clone(),
            seed: args.seed,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    // 0 = WARN (quiet), 1 = INFO, 2 = DEBUG, 3+ = TRACE
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .try_init();

    let settings = Settings::from(&args);
    if let Err(e) = settings.validate() {
        eprintln!("error: {}", rejection_message(&e));
        eprintln!("{}", Args::command().render_usage());
        return ExitCode::FAILURE;
    }

    match run(&settings, args.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Bare description for rejected settings, the full error for anything else.
fn rejection_message(err: &Error) -> String {
    match err {
        Error::Configuration(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn run(settings: &Settings, json: bool) -> chansync::Result<()> {
    info!("running with {:?}", settings);
    let report = pipeline::run(settings)?;

    println!("        nx  : {}", report.nx);
    println!("        ny  : {}", report.ny_capacity);
    println!("symbols in  : {}", report.symbols_in);
    println!("symbols out : {}", report.symbols_out);

    export_script(&settings.output, &report.symbols, &report.psd)?;
    println!("results written to {}.", settings.output.display());

    if json {
        match serde_json::to_string(&report) {
            Ok(line) => println!("{}", line),
            Err(e) => return Err(std::io::Error::other(e).into()),
        }
    }

    println!("done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let args = Args::try_parse_from(["channel_demo"]).unwrap();
        let settings = Settings::from(&args);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.num_symbols, 4000);
        assert_eq!(settings.tau, -0.2);
    }

    #[test]
    fn test_rejected_settings_are_reported() {
        let args = Args::try_parse_from(["channel_demo", "-k", "1"]).unwrap();
        let err = Settings::from(&args).validate().unwrap_err();
        assert_eq!(rejection_message(&err), "k (samples/symbol) must be greater than 1");
    }

    #[test]
    fn test_other_errors_keep_their_description() {
        let err = Error::capacity(10, 4);
        assert_eq!(rejection_message(&err), err.to_string());
    }

    #[test]
    fn test_negative_values_parse() {
        let args = Args::try_parse_from(["channel_demo", "-s", "-3", "-t", "-0.5"]).unwrap();
        assert_eq!(args.snr, -3.0);
        assert_eq!(args.tau, -0.5);
    }
}
