//! Multipart MIME decoding.
//!
//! The archive starts with a top-level header block whose `Content-Type`
//! declares the boundary separating the parts of the body. Each part has its
//! own header block and a body that is decoded according to its
//! `Content-Transfer-Encoding`. Nested multiparts are flattened into the same
//! ordered list.

use crate::error::{ErrorKind, Result};
use crate::part::{CONTENT_TRANSFER_ENCODING, CONTENT_TYPE, Headers, MediaType, Part};
use base64::Engine as _;
use base64::alphabet::STANDARD as STANDARD_ALPHABET;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use exn::{OptionExt, ResultExt};
use memchr::{memchr, memmem};
use quoted_printable::ParseMode;
use tracing::instrument;

/// Nested multiparts deeper than this are treated as malformed.
const MAX_NESTING: usize = 8;

/// Line-wrapped, sometimes unpadded base64 as found in saved pages.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &STANDARD_ALPHABET,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes a complete archive into its ordered parts.
///
/// Expects any leading whitespace to be gone already, see
/// [`TrimReader`](crate::TrimReader).
///
/// # Errors
///
/// Returns [`ErrorKind::Decode`] if the top-level header block is missing or
/// has no content type, if a multipart declares no boundary, or if the body
/// cannot be split on that boundary.
#[instrument(skip(raw), fields(archive_size = raw.len(), parts))]
pub fn decode(raw: &[u8]) -> Result<Vec<Part>> {
    let (headers, offset) = header_block(raw)?;
    if headers.is_empty() {
        exn::bail!(ErrorKind::Decode("missing top-level headers"));
    }
    let value = headers
        .get(CONTENT_TYPE)
        .filter(|value| !value.is_empty())
        .ok_or_raise(|| ErrorKind::Decode("missing top-level content type"))?;
    MediaType::parse(value).or_raise(|| ErrorKind::Decode("invalid top-level content type"))?;
    let mut parts = Vec::new();
    collect(headers, &raw[offset..], &mut parts, 0)?;
    tracing::Span::current().record("parts", parts.len());
    Ok(parts)
}

/// Parses a header block, returning the headers and the offset of the body.
fn header_block(raw: &[u8]) -> Result<(Headers, usize)> {
    let (headers, offset) = mailparse::parse_headers(raw).or_raise(|| ErrorKind::Decode("unreadable header block"))?;
    Ok((Headers::from(headers), offset))
}

fn collect(headers: Headers, body: &[u8], parts: &mut Vec<Part>, depth: usize) -> Result<()> {
    // Parts with a missing or broken content type are kept as leaves; the
    // classifier reports them.
    let multipart = headers
        .get(CONTENT_TYPE)
        .and_then(|value| MediaType::parse(value).ok())
        .filter(MediaType::is_multipart);
    let Some(media) = multipart else {
        let body = transfer_decode(&headers, body);
        tracing::trace!(
            content_type = headers.get(CONTENT_TYPE),
            bytes = body.len(),
            depth,
            "Decoded part"
        );
        parts.push(Part::new(headers, body));
        return Ok(());
    };
    if depth >= MAX_NESTING {
        exn::bail!(ErrorKind::Decode("multipart nested too deeply"));
    }
    let boundary = media
        .param("boundary")
        .filter(|boundary| !boundary.is_empty())
        .ok_or_raise(|| ErrorKind::Decode("missing multipart boundary"))?;
    for raw in split(body, boundary)? {
        let (headers, offset) = header_block(raw)?;
        collect(headers, &raw[offset..], parts, depth + 1)?;
    }
    Ok(())
}

/// Splits a multipart body into the raw bytes (headers and body) of each part.
///
/// A delimiter is `--boundary` at the start of a line, followed either by
/// optional transport padding and a line break, or by `--` when it closes the
/// multipart. The line break before a delimiter belongs to the delimiter.
/// Anything before the first delimiter (the preamble) is skipped.
pub(crate) fn split<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let mut delimiters = memmem::find_iter(body, delimiter.as_bytes())
        .filter(|&position| position == 0 || body[position - 1] == b'\n')
        .filter(|&position| is_delimiter_line(&body[position + delimiter.len()..]));
    let mut position = delimiters.next().ok_or_raise(|| ErrorKind::Decode("boundary not found in body"))?;
    let mut parts = Vec::new();
    loop {
        let rest = position + delimiter.len();
        if body[rest..].starts_with(b"--") {
            return Ok(parts);
        }
        let start = memchr(b'\n', &body[rest..])
            .map(|newline| rest + newline + 1)
            .ok_or_raise(|| ErrorKind::Decode("unterminated boundary line"))?;
        let next = delimiters
            .find(|&next| next >= start)
            .ok_or_raise(|| ErrorKind::Decode("missing closing boundary"))?;
        parts.push(&body[start..strip_line_break(body, start, next)]);
        position = next;
    }
}

/// Whether the bytes following a `--boundary` match complete the delimiter.
fn is_delimiter_line(rest: &[u8]) -> bool {
    if rest.starts_with(b"--") {
        return true;
    }
    let line = match memchr(b'\n', rest) {
        Some(newline) => &rest[..newline],
        None => rest,
    };
    line.trim_ascii().is_empty()
}

/// End of a part's content, excluding the CRLF or LF owned by the delimiter.
fn strip_line_break(body: &[u8], start: usize, delimiter: usize) -> usize {
    let mut end = delimiter;
    if end > start && body[end - 1] == b'\n' {
        end -= 1;
        if end > start && body[end - 1] == b'\r' {
            end -= 1;
        }
    }
    end
}

/// Undoes the part's `Content-Transfer-Encoding`.
///
/// Bodies that fail to decode are kept as they are; content sniffing later
/// decides whether they are usable.
fn transfer_decode(headers: &Headers, body: &[u8]) -> Vec<u8> {
    let encoding = headers.get(CONTENT_TRANSFER_ENCODING).map(|value| value.trim().to_ascii_lowercase());
    match encoding.as_deref() {
        Some("base64") => {
            let compact: Vec<u8> = body.iter().copied().filter(|byte| !byte.is_ascii_whitespace()).collect();
            BASE64.decode(compact).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Invalid base64 body; keeping it undecoded");
                body.to_vec()
            })
        },
        Some("quoted-printable") => quoted_printable::decode(body, ParseMode::Robust).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Invalid quoted-printable body; keeping it undecoded");
            body.to_vec()
        }),
        _ => body.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::CONTENT_LOCATION;
    use rstest::rstest;

    const BOUNDARY: &str = "----MultipartBoundary--abc123----";

    fn archive(parts: &[&str]) -> Vec<u8> {
        let mut raw = format!(
            "From: <Saved by Blink>\r\nSubject: Page\r\nMIME-Version: 1.0\r\n\
             Content-Type: multipart/related;\r\n\ttype=\"text/html\";\r\n\tboundary=\"{BOUNDARY}\"\r\n\r\n\r\n"
        );
        for part in parts {
            raw.push_str(&format!("--{BOUNDARY}\r\n{part}\r\n"));
        }
        raw.push_str(&format!("--{BOUNDARY}--\r\n"));
        raw.into_bytes()
    }

    #[test]
    fn decodes_parts_in_order() {
        let raw = archive(&[
            "Content-Type: text/html\r\nContent-Location: https://x/\r\n\r\n<html></html>",
            "Content-Type: text/css\r\nContent-Location: https://x/a.css\r\n\r\nbody {}",
        ]);
        let parts = decode(&raw).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].body(), b"<html></html>");
        assert_eq!(parts[0].location(), Some("https://x/"));
        assert_eq!(parts[1].header().get(CONTENT_TYPE), Some("text/css"));
        assert_eq!(parts[1].body(), b"body {}");
    }

    #[test]
    fn decodes_transfer_encodings() {
        let raw = archive(&[
            "Content-Type: text/html\r\nContent-Transfer-Encoding: quoted-printable\r\n\r\n\
             <p class=3D\"a\">caf=C3=A9 soft=\r\nbreak</p>",
            "Content-Type: image/png\r\nContent-Transfer-Encoding: base64\r\n\r\niVBORw0K\r\nGgo=",
            "Content-Type: text/plain\r\nContent-Transfer-Encoding: 8bit\r\n\r\nplain =41",
        ]);
        let parts = decode(&raw).unwrap();
        assert_eq!(parts[0].body(), "<p class=\"a\">café softbreak</p>".as_bytes());
        assert_eq!(parts[1].body(), b"\x89PNG\r\n\x1a\n");
        assert_eq!(parts[2].body(), b"plain =41");
    }

    #[test]
    fn keeps_broken_base64_raw() {
        let raw = archive(&["Content-Type: image/png\r\nContent-Transfer-Encoding: base64\r\n\r\n!!not base64!!"]);
        let parts = decode(&raw).unwrap();
        assert_eq!(parts[0].body(), b"!!not base64!!");
    }

    #[test]
    fn flattens_nested_multiparts() {
        let inner = "--inner\r\nContent-Type: text/html\r\n\r\n<p>a</p>\r\n\
                     --inner\r\nContent-Type: image/gif\r\n\r\nGIF89a\r\n--inner--";
        let raw = archive(&[
            &format!("Content-Type: multipart/alternative; boundary=inner\r\n\r\n{inner}"),
            "Content-Type: text/css\r\n\r\np {}",
        ]);
        let parts = decode(&raw).unwrap();
        let bodies: Vec<&[u8]> = parts.iter().map(Part::body).collect();
        assert_eq!(bodies, vec![&b"<p>a</p>"[..], b"GIF89a", b"p {}"]);
    }

    #[test]
    fn single_part_document() {
        let raw = b"Content-Type: text/html\r\nContent-Location: https://x/\r\n\r\n<html></html>";
        let parts = decode(raw).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body(), b"<html></html>");
    }

    #[test]
    fn keeps_parts_without_content_type() {
        let raw = archive(&["Content-Location: https://x/a.png\r\n\r\ndata"]);
        let parts = decode(&raw).unwrap();
        assert_eq!(parts[0].header().get(CONTENT_TYPE), None);
        assert_eq!(parts[0].location(), Some("https://x/a.png"));
    }

    #[rstest]
    #[case(b"".as_slice(), "missing top-level headers")]
    #[case(b"Subject: x\r\n\r\nbody".as_slice(), "missing top-level content type")]
    #[case(b"Content-Type: nonsense\r\n\r\nbody".as_slice(), "invalid top-level content type")]
    #[case(b"Content-Type: multipart/related\r\n\r\nbody".as_slice(), "missing multipart boundary")]
    #[case(b"Content-Type: multipart/related; boundary=b\r\n\r\nno delimiters".as_slice(), "boundary not found in body")]
    #[case(
        b"Content-Type: multipart/related; boundary=b\r\n\r\n--b\r\nContent-Type: text/html\r\n\r\nx".as_slice(),
        "missing closing boundary"
    )]
    fn rejects_malformed_archives(#[case] raw: &[u8], #[case] reason: &'static str) {
        assert_eq!(*decode(raw).unwrap_err(), ErrorKind::Decode(reason));
    }

    #[test]
    fn split_skips_preamble_and_padding() {
        let body = b"preamble --b inline\r\n--b  \r\nfirst\r\n--b\nsecond\n--b--\r\nepilogue";
        let parts = split(body, "b").unwrap();
        assert_eq!(parts, vec![&b"first"[..], b"second"]);
    }

    #[test]
    fn split_ignores_longer_boundaries() {
        let body = b"--b\r\nContent-Type: text/plain\r\n\r\n--bb is not a delimiter\r\n--b--";
        let parts = split(body, "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].ends_with(b"--bb is not a delimiter"));
    }

    #[test]
    fn split_keeps_empty_parts() {
        let parts = split(b"--b\r\n\r\n--b--", "b").unwrap();
        assert_eq!(parts, vec![&b""[..]]);
    }

    #[test]
    fn header_values_are_unfolded() {
        let raw = archive(&["Content-Type: text/html\r\nContent-Location: https://x/\r\n  folded\r\n\r\nx"]);
        let parts = decode(&raw).unwrap();
        assert!(parts[0].header().get(CONTENT_LOCATION).unwrap().starts_with("https://x/"));
    }
}
