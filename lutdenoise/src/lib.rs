//! Context-model lookup-table denoiser for 8-bit grayscale images.
//!
//! Every sample is predicted from itself and its two neighbours along one
//! axis. A [`Codec`] keeps, for each of the 2^24 possible triples, how often
//! it was seen during training and the sum of the matching reference
//! samples; denoising replaces the sample with their rounded mean. A
//! [`Cascade`] chains several codecs with alternating orientation, each one
//! trained on the output of the stages before it.
//!
//! ```no_run
//! use lutdenoise::{denoise_image, pgm, Cascade, Config, Trainer};
//!
//! # fn main() -> lutdenoise::Result<()> {
//! let pairs = lutdenoise::pairs_from_list(&["a0.pgm", "a1.pgm"])?;
//! let config = Config::default().with_passes(2);
//! let cascade: Cascade = Trainer::new(config.clone()).train(pairs.as_slice())?;
//!
//! let noisy = pgm::read_gray_file("noisy.pgm".as_ref())?;
//! let clean = denoise_image(&cascade, &noisy, config.border)?;
//! pgm::write_pgm_file("clean.pgm".as_ref(), &clean)?;
//! # Ok(())
//! # }
//! ```

pub mod cascade;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod infer;
pub mod metrics;
pub mod pgm;
pub mod table;
pub mod train;

#[cfg(test)]
mod testing;

/// 8-bit single-channel image, indexed `(x, y)`.
pub type GrayImage = common::Buffer2<u8>;

pub use cascade::{Cascade, ModelFormat};
pub use codec::Codec;
pub use config::{min_border, Config, DEFAULT_BORDER, DEFAULT_PASSES};
pub use context::{ContextKey, Orientation, KEY_SPACE};
pub use error::{Error, Result};
pub use infer::denoise_image;
pub use table::LutTable;
pub use train::{
    pairs_from_list, train_from_list, CancelToken, PairSource, ProgressCallback, Trainer,
    TrainingPair, TrainingProgress,
};
