//! Three-sample line contexts and their packed table keys.

use crate::GrayImage;

/// Number of distinct context keys: three 8-bit samples.
pub const KEY_SPACE: usize = 1 << 24;

/// Three consecutive samples `(a, b, c)` packed as `(a << 16) | (b << 8) | c`.
///
/// `b` is always the sample being estimated; `a` and `c` are its neighbours
/// along the context axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey(u32);

impl ContextKey {
    #[inline]
    pub fn pack(a: u8, b: u8, c: u8) -> Self {
        Self(((a as u32) << 16) | ((b as u32) << 8) | c as u32)
    }

    /// Key for a raw table index. Panics outside `0..KEY_SPACE`.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        assert!(index < KEY_SPACE, "context index {index} out of range");
        Self(index as u32)
    }

    #[inline]
    pub fn unpack(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }

    #[inline]
    pub fn center(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The key the same neighbourhood produces after a flip along its axis.
    #[inline]
    pub fn mirrored(self) -> Self {
        let (a, b, c) = self.unpack();
        Self::pack(c, b, a)
    }
}

/// Axis along which the three context samples are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `(x - 1, y)`, `(x, y)`, `(x + 1, y)`.
    Horizontal,
    /// `(x, y - 1)`, `(x, y)`, `(x, y + 1)`.
    Vertical,
}

impl Orientation {
    /// Passes alternate, starting horizontal.
    #[inline]
    pub fn for_pass(pass: usize) -> Self {
        if pass % 2 == 0 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Context key centred on `(x, y)`. Both neighbours must exist.
    #[inline]
    pub fn key_at(self, image: &GrayImage, x: usize, y: usize) -> ContextKey {
        match self {
            Orientation::Horizontal => ContextKey::pack(
                image[(x - 1, y)],
                image[(x, y)],
                image[(x + 1, y)],
            ),
            Orientation::Vertical => ContextKey::pack(
                image[(x, y - 1)],
                image[(x, y)],
                image[(x, y + 1)],
            ),
        }
    }

    /// Positions whose context lies fully inside a `width` x `height` image,
    /// in row order. Only the first and last sample along the context axis
    /// are excluded.
    pub fn interior(self, width: usize, height: usize) -> impl Iterator<Item = (usize, usize)> {
        let (xs, ys) = match self {
            Orientation::Horizontal => (1..width.saturating_sub(1), 0..height),
            Orientation::Vertical => (0..width, 1..height.saturating_sub(1)),
        };
        ys.flat_map(move |y| xs.clone().map(move |x| (x, y)))
    }
}
