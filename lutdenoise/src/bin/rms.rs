//! Prints the RMS difference of two grayscale images, scaled to `[0, 1]`.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use common::log_setup::setup_logging;
use lutdenoise::{metrics, pgm, Error};

const USAGE: &str = "usage: rms a.pgm b.pgm";

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [a, b] = args.as_slice() else {
        return Err(Error::Usage(USAGE.to_string()).into());
    };

    let a = pgm::read_gray_file(Path::new(a))?;
    let b = pgm::read_gray_file(Path::new(b))?;
    let rmse = metrics::rmse(&a, &b)?;
    tracing::debug!(psnr = metrics::psnr(&a, &b)?, "Compared images");
    println!("{rmse:.6}");
    Ok(())
}

fn main() -> ExitCode {
    setup_logging("warn");
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
