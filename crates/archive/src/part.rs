//! Decoded archive parts and their headers.

use crate::error::{ErrorKind, Result};
use crate::resource::Resource;
use exn::OptionExt;
use mailparse::MailHeader;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LOCATION: &str = "Content-Location";
pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";

/// RFC 2045 token characters on either side of the slash.
static MEDIA_TYPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[!#$%&'*+.^_`|~0-9a-z-]+/[!#$%&'*+.^_`|~0-9a-z-]+$").unwrap());

/// Ordered header fields with case-insensitive lookup.
///
/// Repeated fields are kept in the order they appeared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value of the named field, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.iter().filter(move |(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> From<Vec<MailHeader<'a>>> for Headers {
    fn from(headers: Vec<MailHeader<'a>>) -> Self {
        headers.iter().map(|header| (header.get_key(), header.get_value().trim().to_string())).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}

/// A parsed `Content-Type` value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    params: BTreeMap<String, String>,
}

impl MediaType {
    /// Parses a header value such as `text/html; charset="utf-8"`.
    ///
    /// The `type/subtype` essence is lowercased and must consist of token
    /// characters. Parameter names are lowercased, values keep their case.
    pub fn parse(value: &str) -> Result<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if !MEDIA_TYPE_REGEX.is_match(&essence) {
            exn::bail!(ErrorKind::InvalidContentType(value.to_string()));
        }
        let params = mailparse::parse_content_type(value)
            .params
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Ok(Self { essence, params })
    }

    /// The lowercased `type/subtype`.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_multipart(&self) -> bool {
        self.essence.starts_with("multipart/")
    }

    pub fn is_html(&self) -> bool {
        self.essence == "text/html"
    }
}

/// One decoded body part of an archive.
///
/// The body is fully buffered and already transfer-decoded. A part is
/// materialized into a temporary [`Resource`] at most once.
#[derive(Debug)]
pub struct Part {
    header: Headers,
    body: Vec<u8>,
    resource: Option<Resource>,
}

impl Part {
    pub fn new(header: Headers, body: impl Into<Vec<u8>>) -> Self {
        Self { header, body: body.into(), resource: None }
    }

    pub fn header(&self) -> &Headers {
        &self.header
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The declared media type.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::MissingContentType`] if the header is absent or empty
    /// - [`ErrorKind::InvalidContentType`] if the value cannot be parsed
    pub fn media_type(&self) -> Result<MediaType> {
        let value = self
            .header
            .get(CONTENT_TYPE)
            .filter(|value| !value.is_empty())
            .ok_or_raise(|| ErrorKind::MissingContentType)?;
        MediaType::parse(value)
    }

    /// The declared `Content-Location`, if any.
    pub fn location(&self) -> Option<&str> {
        self.header.get(CONTENT_LOCATION).filter(|location| !location.is_empty())
    }

    /// The resource realized from this part's body, if it has been
    /// materialized already.
    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    /// Realizes the body as a temporary resource, reusing the previous one on
    /// repeated calls.
    pub fn materialize(&mut self) -> Result<Resource> {
        if let Some(resource) = &self.resource {
            return Ok(resource.clone());
        }
        let resource = Resource::realize(&self.body)?;
        tracing::trace!(path = %resource.path().display(), bytes = self.body.len(), "Materialized part");
        self.resource = Some(resource.clone());
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers: Headers = [("content-type", "text/html"), ("Content-Location", "https://x/")].into_iter().collect();
        assert_eq!(headers.get("Content-Type"), Some("text/html"));
        assert_eq!(headers.get("CONTENT-LOCATION"), Some("https://x/"));
        assert_eq!(headers.get("Content-Id"), None);
    }

    #[test]
    fn header_value_outlives_lookup_name() {
        let headers: Headers = [("Content-Type", "text/css")].into_iter().collect();
        let value = {
            let name = CONTENT_TYPE.to_ascii_lowercase();
            headers.get(&name)
        };
        assert_eq!(value, Some("text/css"));
    }

    #[test]
    fn header_keeps_first_of_repeated_fields() {
        let headers: Headers = [("Content-Location", "https://a/"), ("Content-Location", "https://b/")]
            .into_iter()
            .collect();
        assert_eq!(headers.get(CONTENT_LOCATION), Some("https://a/"));
        assert_eq!(headers.get_all(CONTENT_LOCATION).collect::<Vec<_>>(), vec!["https://a/", "https://b/"]);
        assert_eq!(headers.len(), 2);
    }

    #[rstest]
    #[case("text/html", "text/html")]
    #[case("Text/HTML; charset=utf-8", "text/html")]
    #[case("  image/svg+xml ", "image/svg+xml")]
    #[case("multipart/related; type=\"text/html\"; boundary=\"----Boundary--\"", "multipart/related")]
    fn parses_media_type(#[case] value: &str, #[case] essence: &str) {
        assert_eq!(MediaType::parse(value).unwrap().essence(), essence);
    }

    #[rstest]
    #[case("text")]
    #[case("text/")]
    #[case("/html")]
    #[case("text/html/extra")]
    #[case("te xt/html")]
    #[case(";charset=utf-8")]
    fn rejects_invalid_media_type(#[case] value: &str) {
        let err = MediaType::parse(value).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidContentType(value.to_string()));
    }

    #[test]
    fn media_type_parameters() {
        let media = MediaType::parse("multipart/related; type=\"text/html\"; Boundary=\"--abc\"").unwrap();
        assert!(media.is_multipart());
        assert!(!media.is_html());
        assert_eq!(media.param("boundary"), Some("--abc"));
        assert_eq!(media.param("TYPE"), Some("text/html"));
    }

    #[test]
    fn part_without_content_type() {
        let part = Part::new(Headers::new(), b"body".to_vec());
        assert_eq!(*part.media_type().unwrap_err(), ErrorKind::MissingContentType);

        let headers: Headers = [(CONTENT_TYPE, "")].into_iter().collect();
        let part = Part::new(headers, b"body".to_vec());
        assert_eq!(*part.media_type().unwrap_err(), ErrorKind::MissingContentType);
    }

    #[test]
    fn materializes_once() {
        let headers: Headers = [(CONTENT_TYPE, "image/png")].into_iter().collect();
        let mut part = Part::new(headers, b"\x89PNG\r\n\x1a\nrest".to_vec());
        assert!(part.resource().is_none());
        let first = part.materialize().unwrap();
        let second = part.materialize().unwrap();
        assert!(first.same_as(&second));
        assert_eq!(std::fs::read(first.path()).unwrap(), part.body());
    }
}
