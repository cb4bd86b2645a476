//! Low-level utilities shared by the denoiser crate and its tools.

pub mod buffer2;
pub mod log_setup;
pub mod raster_ops;
pub mod words;

pub use buffer2::Buffer2;
