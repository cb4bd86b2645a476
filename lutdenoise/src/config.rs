//! Training and inference settings.

use std::str::FromStr;

use crate::cascade::ModelFormat;
use crate::error::{Error, Result};

/// Stages in a cascade unless configured otherwise.
pub const DEFAULT_PASSES: usize = 3;

/// Mirrored margin added around an image before denoising.
///
/// Far above [`min_border`] for any practical pass count; kept for output
/// parity with models and images produced by earlier tooling.
pub const DEFAULT_BORDER: usize = 32;

pub const ENV_PASSES: &str = "LUTDENOISE_PASSES";
pub const ENV_BORDER: &str = "LUTDENOISE_BORDER";
pub const ENV_FORMAT: &str = "LUTDENOISE_FORMAT";
pub const ENV_THREADS: &str = "LUTDENOISE_THREADS";

/// Smallest border that keeps image-edge effects out of the cropped result.
///
/// Each pass leaves its first and last sample along the context axis
/// untouched, so the unprocessed band grows by at most one sample per pass.
pub const fn min_border(passes: usize) -> usize {
    passes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of cascade stages.
    pub passes: usize,
    /// Mirrored margin used by inference.
    pub border: usize,
    /// Also train on each pair flipped along the context axis.
    pub mirror_augment: bool,
    /// Layout written by the training tool.
    pub model_format: ModelFormat,
    /// Worker threads for training. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            passes: DEFAULT_PASSES,
            border: DEFAULT_BORDER,
            mirror_augment: true,
            model_format: ModelFormat::Legacy,
            threads: None,
        }
    }
}

impl Config {
    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    pub fn with_border(mut self, border: usize) -> Self {
        self.border = border;
        self
    }

    pub fn with_mirror_augment(mut self, enabled: bool) -> Self {
        self.mirror_augment = enabled;
        self
    }

    pub fn with_model_format(mut self, format: ModelFormat) -> Self {
        self.model_format = format;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Defaults overridden by `LUTDENOISE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, validating the result.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PASSES) {
            self.passes = parse_var(ENV_PASSES, &value)?;
        }
        if let Some(value) = lookup(ENV_BORDER) {
            self.border = parse_var(ENV_BORDER, &value)?;
        }
        if let Some(value) = lookup(ENV_FORMAT) {
            self.model_format = parse_var(ENV_FORMAT, &value)?;
        }
        if let Some(value) = lookup(ENV_THREADS) {
            self.threads = Some(parse_var(ENV_THREADS, &value)?);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.passes == 0 {
            return Err(Error::Config("passes must be at least 1".to_string()));
        }
        if self.border < min_border(self.passes) {
            return Err(Error::Config(format!(
                "border {} is narrower than the {} samples needed for {} passes",
                self.border,
                min_border(self.passes),
                self.passes
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::Config("threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name}={value:?} is not a valid value")))
}
