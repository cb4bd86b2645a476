//! Whole-image inference: pad, run the cascade, crop.

use common::raster_ops::{crop, mirror_border};

use crate::cascade::Cascade;
use crate::config::min_border;
use crate::error::{Error, Result};
use crate::GrayImage;

/// Denoises `image` with a mirrored margin of `border` samples so that the
/// unprocessed edge band of every pass falls outside the returned area.
pub fn denoise_image(cascade: &Cascade, image: &GrayImage, border: usize) -> Result<GrayImage> {
    if image.is_empty() {
        return Err(Error::UnsupportedImage {
            origin: "input".to_string(),
            reason: "image has no samples".to_string(),
        });
    }
    let required = min_border(cascade.passes());
    if border < required {
        return Err(Error::Config(format!(
            "border {border} is narrower than the {required} samples needed for {} passes",
            cascade.passes()
        )));
    }

    tracing::debug!(
        width = image.width(),
        height = image.height(),
        border,
        passes = cascade.passes(),
        "Denoising image"
    );
    let padded = mirror_border(image, border);
    let restored = cascade.denoise(&padded);
    Ok(crop(&restored, border))
}
