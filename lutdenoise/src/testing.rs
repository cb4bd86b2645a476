//! Synthetic images and helpers shared by the unit tests.

use common::Buffer2;
use parking_lot::{Mutex, MutexGuard};
use rand::Rng;

use crate::GrayImage;

/// Piecewise-flat scene with a short intensity ramp along the top edge.
pub fn synthetic_scene(width: usize, height: usize) -> GrayImage {
    Buffer2::from_fn(width, height, |x, y| {
        if y < height / 8 {
            (40 + 4 * x).min(220) as u8
        } else if (width / 4..width / 2).contains(&x) && (height / 4..3 * height / 4).contains(&y) {
            180
        } else if x >= 5 * width / 8 && y >= height / 2 {
            120
        } else {
            60
        }
    })
}

/// `clean` plus independent uniform integer noise in `[-amplitude, amplitude]`.
pub fn noisy_copy<R: Rng>(clean: &GrayImage, amplitude: i16, rng: &mut R) -> GrayImage {
    Buffer2::from_fn(clean.width(), clean.height(), |x, y| {
        let noise = rng.random_range(-amplitude..=amplitude);
        (clean[(x, y)] as i16 + noise).clamp(0, 255) as u8
    })
}

pub fn init_tracing() {
    common::log_setup::setup_test_logging();
}

/// Unique path under the system temp directory for this process.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("lutdenoise_{}_{}", std::process::id(), name))
}

static FULL_TABLES: Mutex<()> = Mutex::new(());

/// Serializes tests that allocate full-size tables (256 MiB per pass).
pub fn full_tables() -> MutexGuard<'static, ()> {
    FULL_TABLES.lock()
}
