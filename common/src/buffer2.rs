use std::ops::{Index, IndexMut};
use std::slice;

/// Row-major 2-D buffer addressed as `(x, y)`.
///
/// Element access is bounds-checked in every build; a coordinate outside the
/// buffer is a caller bug and panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Builds a buffer by evaluating `f(x, y)` for every position in row order.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} buffer",
            self.width,
            self.height
        );
        &self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} buffer",
            self.width,
            self.height
        );
        &mut self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// True when both buffers have the same width and height.
    #[inline]
    pub fn same_shape<U>(&self, other: &Buffer2<U>) -> bool {
        self.width == other.width() && self.height == other.height()
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.pixels
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.pixels
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row {y} outside buffer of height {}", self.height);
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    /// Iterates rows top to bottom. Yields nothing for a zero-width buffer.
    #[inline]
    pub fn rows(&self) -> slice::ChunksExact<'_, T> {
        self.pixels.chunks_exact(self.width.max(1))
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.pixels.iter()
    }
}

impl<T: Clone> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }
}

impl<T: Default + Clone> Buffer2<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, T::default())
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        self.get(x, y)
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        self.get_mut(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_row_major() {
        let buf = Buffer2::from_fn(3, 2, |x, y| (y * 10 + x) as u8);
        assert_eq!(buf.pixels(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(buf[(2, 1)], 12);
        assert_eq!(buf.row(1), &[10, 11, 12]);
    }

    #[test]
    fn test_rows_iteration() {
        let buf = Buffer2::from_fn(4, 3, |_, y| y as u8);
        let rows: Vec<&[u8]> = buf.rows().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[2].iter().all(|&v| v == 2));
    }

    #[test]
    fn test_zero_width_has_no_rows() {
        let buf: Buffer2<u8> = Buffer2::new(0, 5, Vec::new());
        assert!(buf.is_empty());
        assert_eq!(buf.rows().count(), 0);
    }

    #[test]
    fn test_index_mut() {
        let mut buf = Buffer2::new_default(2, 2);
        buf[(1, 0)] = 7u8;
        *buf.get_mut(0, 1) = 9;
        assert_eq!(buf.into_vec(), vec![0, 7, 9, 0]);
    }

    #[test]
    fn test_same_shape() {
        let a = Buffer2::new_filled(3, 4, 0u8);
        let b = Buffer2::new_filled(3, 4, 1.0f32);
        let c = Buffer2::new_filled(4, 3, 0u8);
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    #[should_panic(expected = "outside 2x2 buffer")]
    fn test_out_of_bounds_panics() {
        let buf = Buffer2::new_filled(2, 2, 0u8);
        let _ = buf[(2, 0)];
    }

    #[test]
    #[should_panic(expected = "pixels length must equal width * height")]
    fn test_new_rejects_wrong_length() {
        Buffer2::new(2, 2, vec![0u8; 3]);
    }
}
