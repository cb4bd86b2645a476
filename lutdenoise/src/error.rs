//! Error types for training, inference and model I/O.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the denoiser.
///
/// Variants fall into configuration problems, I/O failures, malformed data
/// and cancellation. Lookup of an unobserved bin is not an error: it is an
/// invariant violation and panics.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("Expected an even number of file names, got {count}")]
    OddFileCount { count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read image '{path}': {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open model '{path}': {source}")]
    OpenModel {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode image from {origin}: {source}")]
    DecodeImage {
        origin: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image: {0}")]
    EncodeImage(#[source] image::ImageError),

    #[error("Unsupported image from {origin}: {reason}")]
    UnsupportedImage { origin: String, reason: String },

    #[error("Image dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Malformed model: {0}")]
    MalformedModel(String),

    #[error("Training cancelled during pass {pass}")]
    Cancelled { pass: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn dimension_mismatch<A, B>(
        left: &common::Buffer2<A>,
        right: &common::Buffer2<B>,
    ) -> Self {
        Error::DimensionMismatch {
            left: (left.width(), left.height()),
            right: (right.width(), right.height()),
        }
    }

    /// Turns an early end of stream into a model-format error.
    pub(crate) fn from_model_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::MalformedModel("file is shorter than the expected table size".to_string())
        } else {
            Error::Io(err)
        }
    }
}
