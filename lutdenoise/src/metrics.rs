//! Image quality measures used to evaluate trained models.

use crate::error::{Error, Result};
use crate::GrayImage;

fn check_shapes(a: &GrayImage, b: &GrayImage) -> Result<()> {
    if a.same_shape(b) {
        Ok(())
    } else {
        Err(Error::dimension_mismatch(a, b))
    }
}

/// Mean squared difference in sample units. Zero for empty images.
pub fn mse(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    check_shapes(a, b)?;
    if a.is_empty() {
        return Ok(0.0);
    }
    let sse: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum();
    Ok(sse as f64 / a.len() as f64)
}

/// Root mean squared difference with samples scaled to `[0, 1]`.
pub fn rmse(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    Ok(mse(a, b)?.sqrt() / 255.0)
}

/// Peak signal-to-noise ratio in dB; infinite for identical images.
pub fn psnr(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    let mse = mse(a, b)?;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (255.0 * 255.0 / mse).log10())
}
