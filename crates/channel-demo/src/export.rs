//! Octave/MATLAB script export.
//!
//! The script defines `num_symbols`, the recovered symbols `z(i)`, `nfft`
//! and the spectrum `psd(i)` (both 1-indexed), then plots the constellation
//! of the first and last half of the symbols above the spectrum. Numbers use
//! fixed-width formatting (`%3u`, `%12.8f`) so the output can be parsed
//! line by line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use num_complex::Complex;

const PLOT_DIRECTIVES: &str = "\
iz0 = 1:round(length(z)*0.5);
iz1 = round(length(z)*0.5):length(z);
figure('Color','white','position',[500 500 800 800]);
subplot(2,2,1);
plot(real(z(iz0)),imag(z(iz0)),'x','MarkerSize',4);
  axis square;
  grid on;
  axis([-1 1 -1 1]*1.6);
  xlabel('In-phase');
  ylabel('Quadrature');
  title('First 50% of symbols');
subplot(2,2,2);
  plot(real(z(iz1)),imag(z(iz1)),'x','MarkerSize',4);
  axis square;
  grid on;
  axis([-1 1 -1 1]*1.5);
  xlabel('In-phase');
  ylabel('Quadrature');
  title('Last 50% of symbols');
subplot(2,2,3:4);
  plot(f, psd, 'LineWidth',1.5,'Color',[0 0.5 0.2]);
  grid on;
  pmin = 10*floor(0.1*min(psd - 5));
  pmax = 10*ceil (0.1*max(psd + 5));
  axis([-0.5 0.5 pmin pmax]);
  xlabel('Normalized Frequency [f/F_s]');
  ylabel('Power Spectral Density [dB]');
";

/// Write the script to `w`. `name` appears in the header comment.
pub fn write_script<W: Write>(
    w: &mut W,
    name: &str,
    symbols: &[Complex<f32>],
    psd: &[f32],
) -> std::io::Result<()> {
    writeln!(w, "% {}, auto-generated file\n", name)?;
    writeln!(w, "close all;\nclear all;\n")?;

    writeln!(w, "num_symbols={};", symbols.len())?;
    for (i, z) in symbols.iter().enumerate() {
        writeln!(w, "z({:3}) = {:12.8} + j*{:12.8};", i + 1, z.re, z.im)?;
    }

    writeln!(w, "nfft = {};", psd.len())?;
    writeln!(w, "f=[0:(nfft-1)]/nfft - 0.5;")?;
    writeln!(w, "psd = zeros(1,nfft);")?;
    for (i, p) in psd.iter().enumerate() {
        writeln!(w, "psd({:3}) = {:12.8};", i + 1, p)?;
    }

    w.write_all(PLOT_DIRECTIVES.as_bytes())
}

/// Create (or truncate) the file at `path` and write the script into it.
pub fn export_script(path: &Path, symbols: &[Complex<f32>], psd: &[f32]) -> chansync::Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut w = BufWriter::new(File::create(path)?);
    write_script(&mut w, &name, symbols, psd)?;
    w.flush()?;
    Ok(())
}
