//! 8-bit grayscale image files.
//!
//! Binary PGM (`P5`) is parsed here so samples are kept exactly as stored
//! for any maxval up to 255. Other content goes through the `image` crate
//! (PNG as a convenience) and must decode to single-channel 8-bit data.
//! Writing always produces binary PGM (`P5`, maxval 255).

use std::io::{Read, Write};
use std::path::Path;

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ColorType, ExtendedColorType, ImageEncoder};

use crate::error::{Error, Result};
use crate::GrayImage;

/// Decodes a whole stream, e.g. stdin.
pub fn read_gray<R: Read>(mut reader: R) -> Result<GrayImage> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_gray(&bytes, "standard input")
}

pub fn read_gray_file(path: &Path) -> Result<GrayImage> {
    let bytes = std::fs::read(path).map_err(|source| Error::ReadImage {
        path: path.to_path_buf(),
        source,
    })?;
    decode_gray(&bytes, &path.display().to_string())
}

fn decode_gray(bytes: &[u8], origin: &str) -> Result<GrayImage> {
    if bytes.starts_with(b"P5") {
        return decode_p5(bytes, origin);
    }

    let decoded = image::load_from_memory(bytes).map_err(|source| Error::DecodeImage {
        origin: origin.to_string(),
        source,
    })?;

    if decoded.color() != ColorType::L8 {
        return Err(Error::UnsupportedImage {
            origin: origin.to_string(),
            reason: format!("expected 8-bit grayscale, found {:?}", decoded.color()),
        });
    }

    let (width, height) = (decoded.width() as usize, decoded.height() as usize);
    Ok(GrayImage::new(width, height, decoded.into_bytes()))
}

/// Binary graymap with raw samples kept as stored.
///
/// Samples are not rescaled to the full 8-bit range for `maxval < 255`, so
/// the values reaching the tables are the ones in the file.
fn decode_p5(bytes: &[u8], origin: &str) -> Result<GrayImage> {
    let unsupported = |reason: String| Error::UnsupportedImage {
        origin: origin.to_string(),
        reason,
    };

    let mut pos = 2;
    let mut fields = [0usize; 3];
    for field in &mut fields {
        *field = header_number(bytes, &mut pos)
            .ok_or_else(|| unsupported("malformed PGM header".to_string()))?;
    }
    let [width, height, maxval] = fields;
    if maxval == 0 || maxval > 255 {
        return Err(unsupported(format!(
            "expected 8-bit grayscale, found maxval {maxval}"
        )));
    }

    // Exactly one whitespace byte separates the header from the samples.
    let start = pos + 1;
    let len = width
        .checked_mul(height)
        .ok_or_else(|| unsupported(format!("image size {width}x{height} overflows")))?;
    let samples = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| {
            unsupported(format!(
                "truncated sample data, expected {len} bytes for {width}x{height}"
            ))
        })?;
    Ok(GrayImage::new(width, height, samples.to_vec()))
}

/// Next decimal header field, skipping whitespace and `#` comments.
fn header_number(bytes: &[u8], pos: &mut usize) -> Option<usize> {
    loop {
        match *bytes.get(*pos)? {
            b'#' => {
                while *bytes.get(*pos)? != b'\n' {
                    *pos += 1;
                }
            }
            c if c.is_ascii_whitespace() => *pos += 1,
            _ => break,
        }
    }
    let start = *pos;
    while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
        *pos += 1;
    }
    std::str::from_utf8(&bytes[start..*pos]).ok()?.parse().ok()
}

pub fn write_pgm<W: Write>(writer: W, image: &GrayImage) -> Result<()> {
    let encoder =
        PnmEncoder::new(writer).with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary));
    encoder
        .write_image(
            image.pixels(),
            image.width() as u32,
            image.height() as u32,
            ExtendedColorType::L8,
        )
        .map_err(Error::EncodeImage)
}

pub fn write_pgm_file(path: &Path, image: &GrayImage) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_pgm(&mut writer, image)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{synthetic_scene, temp_path};
    use common::Buffer2;

    #[test]
    fn test_write_header() {
        let image = Buffer2::new(3, 2, vec![0u8, 1, 2, 253, 254, 255]);
        let mut bytes = Vec::new();
        write_pgm(&mut bytes, &image).unwrap();
        assert!(bytes.starts_with(b"P5"));
        assert!(bytes.ends_with(&[0, 1, 2, 253, 254, 255]));
    }

    #[test]
    fn test_read_handwritten_pgm() {
        let mut bytes = b"P5\n# comment\n4 2\n255\n".to_vec();
        bytes.extend_from_slice(&[10, 20, 30, 40, 50, 60, 70, 80]);
        let image = read_gray(bytes.as_slice()).unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
        assert_eq!(image[(3, 1)], 80);
    }

    #[test]
    fn test_stream_round_trip() {
        let image = synthetic_scene(19, 7);
        let mut bytes = Vec::new();
        write_pgm(&mut bytes, &image).unwrap();
        assert_eq!(read_gray(bytes.as_slice()).unwrap(), image);
    }

    #[test]
    fn test_file_round_trip() {
        let image = synthetic_scene(8, 8);
        let path = temp_path("file_round_trip.pgm");
        write_pgm_file(&path, &image).unwrap();
        let back = read_gray_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, image);
    }

    #[test]
    fn test_rejects_color() {
        let mut bytes = b"P6\n1 1\n255\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        let err = read_gray(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedImage { .. }));
    }

    #[test]
    fn test_rejects_sixteen_bit() {
        let mut bytes = b"P5\n1 1\n65535\n".to_vec();
        bytes.extend_from_slice(&[1, 2]);
        let err = read_gray(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedImage { .. }));
    }

    #[test]
    fn test_low_maxval_keeps_raw_samples() {
        let mut bytes = b"P5\n2 1\n100\n".to_vec();
        bytes.extend_from_slice(&[50, 100]);
        let image = read_gray(bytes.as_slice()).unwrap();
        assert_eq!(image.pixels(), &[50, 100]);
    }

    #[test]
    fn test_rejects_truncated_samples() {
        let mut bytes = b"P5 3 3 255\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        let err = read_gray(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedImage { reason, .. } if reason.contains("truncated")));
    }

    #[test]
    fn test_rejects_malformed_header() {
        for header in [&b"P5\n"[..], b"P5 4 x 255\n", b"P5 2 2 0\n"] {
            let err = read_gray(header).unwrap_err();
            assert!(matches!(err, Error::UnsupportedImage { .. }), "{header:?}");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        let err = read_gray(&b"not an image"[..]).unwrap_err();
        assert!(matches!(err, Error::DecodeImage { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = read_gray_file(&temp_path("missing.pgm")).unwrap_err();
        assert!(matches!(err, Error::ReadImage { .. }));
    }
}
