//! A single denoising pass: one context orientation, one lookup table.

use common::raster_ops::{flip_horizontal, flip_vertical};

use crate::context::{Orientation, KEY_SPACE};
use crate::error::{Error, Result};
use crate::table::LutTable;
use crate::GrayImage;

/// Lookup table from a line context to the expected clean center sample.
///
/// Starts from the uniform prior (identity on the center sample), learns from
/// `(input, reference)` pairs, and replaces each interior sample with the
/// table's estimate when applied.
#[derive(Debug, PartialEq)]
pub struct Codec {
    table: LutTable,
    orientation: Orientation,
}

impl Codec {
    /// Seeded codec for cascade stage `pass`.
    pub fn new(pass: usize) -> Self {
        Self::with_orientation(Orientation::for_pass(pass))
    }

    pub fn with_orientation(orientation: Orientation) -> Self {
        Self {
            table: LutTable::with_uniform_prior(),
            orientation,
        }
    }

    /// All-zero table, only valid once a model reader has filled it.
    pub(crate) fn unseeded(pass: usize) -> Self {
        Self {
            table: LutTable::new(KEY_SPACE),
            orientation: Orientation::for_pass(pass),
        }
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[inline]
    pub fn table(&self) -> &LutTable {
        &self.table
    }

    /// Learns from a pair and from its mirror image along the context axis.
    pub fn train(&self, input: &GrayImage, reference: &GrayImage) -> Result<()> {
        self.train_with(input, reference, true)
    }

    /// Accumulates `input` samples under contexts read from `reference`.
    ///
    /// Safe to call concurrently from several threads on the same codec.
    pub fn train_with(
        &self,
        input: &GrayImage,
        reference: &GrayImage,
        mirror_augment: bool,
    ) -> Result<()> {
        if !input.same_shape(reference) {
            return Err(Error::dimension_mismatch(input, reference));
        }

        self.accumulate(input, reference);

        if mirror_augment {
            let flip: fn(&GrayImage) -> GrayImage = match self.orientation {
                Orientation::Horizontal => flip_horizontal::<u8>,
                Orientation::Vertical => flip_vertical::<u8>,
            };
            self.accumulate(&flip(input), &flip(reference));
        }
        Ok(())
    }

    fn accumulate(&self, input: &GrayImage, reference: &GrayImage) {
        let orientation = self.orientation;
        for (x, y) in orientation.interior(reference.width(), reference.height()) {
            let key = orientation.key_at(reference, x, y);
            self.table.update(key.index(), input[(x, y)] as u64);
        }
    }

    /// Denoised copy of `image`.
    ///
    /// Samples without both context neighbours are copied through unchanged.
    pub fn apply(&self, image: &GrayImage) -> GrayImage {
        let orientation = self.orientation;
        let mut out = image.clone();
        for (x, y) in orientation.interior(image.width(), image.height()) {
            let key = orientation.key_at(image, x, y);
            out[(x, y)] = self.table.estimate(key.index());
        }
        out
    }
}
