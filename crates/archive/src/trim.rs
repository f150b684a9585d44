//! Leading whitespace removal for archive streams.
//!
//! Saved pages regularly begin with stray blank lines, which make the
//! top-level header block unparseable.

use std::io::{Read, Result as IoResult};

/// A [`Read`]er that strips leading Unicode whitespace from the first chunk
/// returned by the wrapped reader, then passes everything through untouched.
///
/// Trimming happens on the first read only. Whitespace split across two
/// underlying reads is not trimmed past the first one.
pub struct TrimReader<R> {
    inner: R,
    trimmed: bool,
}

impl<R: Read> TrimReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, trimmed: false }
    }

    /// Returns `true` once the first read has happened.
    pub fn is_trimmed(&self) -> bool {
        self.trimmed
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for TrimReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        let bytes = self.inner.read(buf)?;
        if self.trimmed {
            return Ok(bytes);
        }
        self.trimmed = true;
        let skip = leading_whitespace(&buf[..bytes]);
        if skip == 0 {
            return Ok(bytes);
        }
        buf.copy_within(skip..bytes, 0);
        let remaining = bytes - skip;
        if remaining == 0 && bytes > 0 {
            // Returning zero here would read as end-of-stream.
            return self.inner.read(buf);
        }
        Ok(remaining)
    }
}

/// Number of bytes taken up by leading Unicode whitespace.
///
/// Only the valid UTF-8 prefix is inspected; a multi-byte character cut off
/// at the end of the chunk stops the scan.
fn leading_whitespace(bytes: &[u8]) -> usize {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => std::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default(),
    };
    text.len() - text.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    fn read_all(reader: impl Read) -> Vec<u8> {
        let mut output = Vec::new();
        TrimReader::new(reader).read_to_end(&mut output).unwrap();
        output
    }

    #[rstest]
    #[case(b"MIME-Version: 1.0", b"MIME-Version: 1.0")]
    #[case(b"\r\n\r\nMIME-Version: 1.0", b"MIME-Version: 1.0")]
    #[case(b" \t\n From: <Saved by Blink>", b"From: <Saved by Blink>")]
    #[case("\u{2003}\u{00A0}\u{0085}Subject: x".as_bytes(), b"Subject: x")]
    #[case(b"", b"")]
    fn trims_leading_whitespace(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(read_all(Cursor::new(input)), expected);
    }

    #[test]
    fn keeps_whitespace_after_content() {
        let input = b"\n\nFrom: a\r\n\r\n  body  \n\n";
        assert_eq!(read_all(Cursor::new(input)), b"From: a\r\n\r\n  body  \n\n");
    }

    #[test]
    fn trims_only_the_first_read() {
        // `Chain` serves each cursor in a separate read.
        let reader = Cursor::new(b"  \n".to_vec()).chain(Cursor::new(b"  From: a".to_vec()));
        assert_eq!(read_all(reader), b"  From: a");
    }

    #[test]
    fn whitespace_only_first_chunk_is_not_end_of_stream() {
        let reader = Cursor::new(b"\r\n".to_vec()).chain(Cursor::new(b"From: a".to_vec()));
        let mut trim = TrimReader::new(reader);
        let mut buf = [0u8; 32];
        let bytes = trim.read(&mut buf).unwrap();
        assert_eq!(&buf[..bytes], b"From: a");
        assert!(trim.is_trimmed());
    }

    #[test]
    fn invalid_utf8_stops_the_scan() {
        assert_eq!(read_all(Cursor::new(b"  \xff\xfe rest")), b"\xff\xfe rest");
    }
}
