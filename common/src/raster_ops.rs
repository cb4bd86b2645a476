//! Geometric raster helpers: flips, mirrored border extension and cropping.

use crate::Buffer2;

/// Left-right mirror image.
pub fn flip_horizontal<T: Copy>(src: &Buffer2<T>) -> Buffer2<T> {
    let width = src.width();
    Buffer2::from_fn(width, src.height(), |x, y| *src.get(width - 1 - x, y))
}

/// Top-bottom mirror image.
pub fn flip_vertical<T: Copy>(src: &Buffer2<T>) -> Buffer2<T> {
    let height = src.height();
    Buffer2::from_fn(src.width(), height, |x, y| *src.get(x, height - 1 - y))
}

/// Maps a possibly out-of-range coordinate back into `0..len` by reflecting
/// about the edge samples without repeating them (`2 1 | 0 1 2 | 1 0`).
/// Coordinates farther out than one image length keep folding.
#[inline]
fn reflect(pos: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let folded = pos.rem_euclid(period);
    if folded < len as isize {
        folded as usize
    } else {
        (period - folded) as usize
    }
}

/// Grows `src` by `border` samples on every side, filling the new area with a
/// mirror reflection of the interior.
///
/// An empty buffer is returned unchanged since there is nothing to reflect.
pub fn mirror_border<T: Copy>(src: &Buffer2<T>, border: usize) -> Buffer2<T> {
    if src.is_empty() {
        return src.clone();
    }
    let (width, height) = (src.width(), src.height());
    let offset = border as isize;
    Buffer2::from_fn(width + 2 * border, height + 2 * border, |x, y| {
        let sx = reflect(x as isize - offset, width);
        let sy = reflect(y as isize - offset, height);
        *src.get(sx, sy)
    })
}

/// Removes `border` samples from every side.
pub fn crop<T: Copy>(src: &Buffer2<T>, border: usize) -> Buffer2<T> {
    assert!(
        2 * border <= src.width() && 2 * border <= src.height(),
        "cannot crop {border} from each side of a {}x{} buffer",
        src.width(),
        src.height()
    );
    Buffer2::from_fn(
        src.width() - 2 * border,
        src.height() - 2 * border,
        |x, y| *src.get(x + border, y + border),
    )
}
