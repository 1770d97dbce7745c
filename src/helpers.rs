use std::borrow::Cow;
use std::convert::TryFrom;

use encoding_rs::{Encoding, UTF_8};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use httparse::Header;

/// Raw headers that can't be represented as `http` headers are skipped.
pub(crate) fn convert_raw_headers_to_header_map(raw_headers: &[Header<'_>]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name);
        let value = HeaderValue::try_from(raw_header.value);

        if let (Ok(name), Ok(value)) = (name, value) {
            headers.insert(name, value);
        }
    }

    headers
}

/// Reads a header block line by line, keeping every `Name: value` line and
/// skipping the rest.
pub(crate) fn scan_header_lines(header_bytes: &[u8]) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for line in header_bytes.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        let colon = match memchr::memchr(b':', line) {
            Some(idx) => idx,
            None => continue,
        };

        let name = HeaderName::from_bytes(trim_whitespace(&line[..colon]));
        let value = HeaderValue::from_bytes(trim_whitespace(&line[colon + 1..]));

        if let (Ok(name), Ok(value)) = (name, value) {
            headers.insert(name, value);
        }
    }

    headers
}

fn trim_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !first.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }

    while let [rest @ .., last] = bytes {
        if !last.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }

    bytes
}

/// Removes at most one trailing `\r\n`, or a bare `\n`, from `bytes`.
pub(crate) fn strip_trailing_line_break(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_suffix(b"\r\n")
        .or_else(|| bytes.strip_suffix(b"\n"))
        .unwrap_or(bytes)
}

/// Decodes text using the `charset` parameter of `content_type`, falling back
/// to UTF-8 for a missing or unknown label.
pub(crate) fn decode_text(bytes: &[u8], content_type: Option<&mime::Mime>) -> String {
    let encoding = content_type
        .and_then(|mime| mime.get_param(mime::CHARSET))
        .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(bytes);

    match text {
        Cow::Owned(s) => s,
        Cow::Borrowed(s) => String::from(s),
    }
}
