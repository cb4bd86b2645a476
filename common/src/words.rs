//! Whitespace-delimited word lists, as used for file name lists on stdin.

use std::io::{self, Read};

/// Reads the whole stream and splits it on any whitespace, dropping empties.
pub fn read_words<R: Read>(mut reader: R) -> io::Result<Vec<String>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text.split_whitespace().map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_separators() {
        let input = "a.pgm b.pgm\n\tc.pgm\r\n\n  d.pgm  ";
        let words = read_words(input.as_bytes()).unwrap();
        assert_eq!(words, vec!["a.pgm", "b.pgm", "c.pgm", "d.pgm"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(read_words(&b""[..]).unwrap().is_empty());
        assert!(read_words(&b" \n \n"[..]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let err = read_words(&[0xff, 0xfe, b'\n'][..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
