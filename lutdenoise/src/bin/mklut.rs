//! Trains a cascade from a list of image pairs.
//!
//! ```bash
//! ls train/*.pgm | mklut > model.lut
//! ```
//!
//! The list on stdin is whitespace separated and grouped into consecutive
//! `(input, reference)` pairs. The model is written to stdout in the format
//! selected by `LUTDENOISE_FORMAT`.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use common::log_setup::setup_logging;
use common::words::read_words;
use lutdenoise::{train_from_list, Config, Error};

const USAGE: &str = "usage: mklut < file_list.txt > fn.lut";

fn run() -> Result<()> {
    if std::env::args().len() != 1 {
        return Err(Error::Usage(USAGE.to_string()).into());
    }

    let config = Config::from_env()?;
    let names = read_words(io::stdin().lock()).context("Failed to read file list from stdin")?;
    let cascade = train_from_list(&names, config.clone())?;

    let mut out = BufWriter::new(io::stdout().lock());
    cascade
        .write(&mut out, config.model_format)
        .context("Failed to write model to stdout")?;
    out.flush().context("Failed to write model to stdout")?;
    Ok(())
}

fn main() -> ExitCode {
    setup_logging("info");
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
