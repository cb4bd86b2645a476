//! Ordered chain of single-pass codecs with alternating context orientation.

mod format;


pub use format::{legacy_model_len, ModelFormat, PORTABLE_MAGIC};

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::GrayImage;

/// Multi-pass denoiser.
///
/// Stage `k` only ever sees images already processed by stages `0..k`, so it
/// is trained on references passed through those stages first (see
/// [`Cascade::restore`]). Passes must be trained in order and never
/// concurrently; pairs within one pass may be trained in parallel.
#[derive(Debug)]
pub struct Cascade {
    codecs: Vec<Codec>,
    mirror_augment: bool,
}

impl Cascade {
    /// Cascade of `passes` seeded codecs.
    pub fn new(passes: usize) -> Self {
        assert!(passes > 0, "a cascade needs at least one pass");
        tracing::debug!(passes, "Seeding cascade tables");
        Self {
            codecs: (0..passes).map(Codec::new).collect(),
            mirror_augment: true,
        }
    }

    /// Cascade around codecs already filled by a model reader.
    fn from_codecs(codecs: Vec<Codec>) -> Self {
        Self {
            codecs,
            mirror_augment: true,
        }
    }

    /// Enables or disables mirror augmentation for subsequent training.
    pub fn with_mirror_augment(mut self, enabled: bool) -> Self {
        self.mirror_augment = enabled;
        self
    }

    #[inline]
    pub fn passes(&self) -> usize {
        self.codecs.len()
    }

    #[inline]
    pub fn codec(&self, pass: usize) -> &Codec {
        &self.codecs[pass]
    }

    /// `reference` as stage `pass` would receive it at inference time: run
    /// through stages `0..pass`.
    pub fn restore(&self, reference: &GrayImage, pass: usize) -> GrayImage {
        assert!(
            pass <= self.passes(),
            "pass {pass} out of range for {} passes",
            self.passes()
        );
        self.codecs[..pass]
            .iter()
            .fold(reference.clone(), |image, codec| codec.apply(&image))
    }

    /// Trains stage `pass` on `input` against the restored `reference`.
    ///
    /// Stages before `pass` must be fully trained; concurrent calls for the
    /// same `pass` are fine.
    pub fn train_pass(&self, pass: usize, input: &GrayImage, reference: &GrayImage) -> Result<()> {
        assert!(
            pass < self.passes(),
            "pass {pass} out of range for {} passes",
            self.passes()
        );
        if !input.same_shape(reference) {
            return Err(Error::dimension_mismatch(input, reference));
        }
        let restored = self.restore(reference, pass);
        self.codecs[pass].train_with(input, &restored, self.mirror_augment)
    }

    /// Runs every stage in order. Does not modify the cascade.
    pub fn denoise(&self, image: &GrayImage) -> GrayImage {
        self.restore(image, self.passes())
    }
}

impl PartialEq for Cascade {
    fn eq(&self, other: &Self) -> bool {
        self.codecs == other.codecs
    }
}
