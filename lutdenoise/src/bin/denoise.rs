//! Denoises one grayscale image with a trained model.
//!
//! ```bash
//! denoise model.lut < noisy.pgm > clean.pgm
//! ```
//!
//! `LUTDENOISE_PASSES` must match the pass count the model was trained with
//! when the model is in the legacy layout.

use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use common::log_setup::setup_logging;
use lutdenoise::{denoise_image, pgm, Cascade, Config, Error};

const USAGE: &str = "usage: denoise fn.lut < in.pgm > out.pgm";

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [model_path] = args.as_slice() else {
        return Err(Error::Usage(USAGE.to_string()).into());
    };

    let config = Config::from_env()?;
    let cascade = Cascade::load(Path::new(model_path), config.passes)?;
    let image = pgm::read_gray(io::stdin().lock())?;
    let restored = denoise_image(&cascade, &image, config.border)?;

    let mut out = BufWriter::new(io::stdout().lock());
    pgm::write_pgm(&mut out, &restored)?;
    out.flush().context("Failed to write image to stdout")?;
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
