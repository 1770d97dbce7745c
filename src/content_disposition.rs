use std::borrow::Cow;

use encoding_rs::UTF_8;
use http::header::{self, HeaderMap};

/// The `name` and `filename` parameters of a part's `Content-Disposition`.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ContentDisposition {
    pub(crate) field_name: Option<String>,
    pub(crate) file_name: Option<String>,
}

impl ContentDisposition {
    /// Returns `None` when the header is missing.
    ///
    /// An empty `name` is treated as absent, an empty `filename` is kept: its
    /// presence alone marks the part as a file.
    pub fn parse(headers: &HeaderMap) -> Option<ContentDisposition> {
        let value = headers.get(header::CONTENT_DISPOSITION)?;
        let (value, _) = UTF_8.decode_without_bom_handling(value.as_bytes());

        let mut content_disposition = ContentDisposition::default();

        for (key, val) in Params::new(&value) {
            if key.eq_ignore_ascii_case("name") {
                content_disposition.field_name = Some(val.into_owned()).filter(|name| !name.is_empty());
            } else if key.eq_ignore_ascii_case("filename") {
                content_disposition.file_name = Some(val.into_owned());
            }
        }

        Some(content_disposition)
    }
}

/// Iterates over the `key=value` parameters following the first `;` of a
/// header value.
/// Quoted values may contain `;` and escaped quotes.
pub(crate) struct Params<'a> {
    rest: &'a str,
}

impl<'a> Params<'a> {
    pub(crate) fn new(value: &'a str) -> Params<'a> {
        let rest = match value.find(';') {
            Some(idx) => &value[idx + 1..],
            None => "",
        };

        Params { rest }
    }
}

impl<'a> Iterator for Params<'a> {
    type Item = (&'a str, Cow<'a, str>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.rest = self.rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
            if self.rest.is_empty() {
                return None;
            }

            let key_end = self.rest.find(|c: char| c == '=' || c == ';').unwrap_or(self.rest.len());
            let key = self.rest[..key_end].trim();
            self.rest = &self.rest[key_end..];

            // A bare token without a value.
            if !self.rest.starts_with('=') {
                continue;
            }

            self.rest = self.rest[1..].trim_start();

            let val = if let Some(quoted) = self.rest.strip_prefix('"') {
                let (val, consumed) = unquote(quoted);
                self.rest = &quoted[consumed..];
                val
            } else {
                let val_end = self.rest.find(';').unwrap_or(self.rest.len());
                let val = self.rest[..val_end].trim_end();
                self.rest = &self.rest[val_end..];
                Cow::Borrowed(val)
            };

            return Some((key, val));
        }
    }
}

/// Reads a quoted string whose opening quote is already stripped. Returns the
/// value and the number of bytes consumed, closing quote included. Only `\"`
/// is unescaped so that Windows paths keep their backslashes.
fn unquote(quoted: &str) -> (Cow<'_, str>, usize) {
    let bytes = quoted.as_bytes();
    let mut escaped = false;
    let mut idx = 0;

    while idx < bytes.len() {
        match bytes[idx] {
            b'"' => break,
            b'\\' if bytes.get(idx + 1) == Some(&b'"') => {
                escaped = true;
                idx += 2;
            }
            _ => idx += 1,
        }
    }

    let raw = &quoted[..idx];
    let consumed = if idx < bytes.len() { idx + 1 } else { idx };

    if escaped {
        (Cow::Owned(raw.replace("\\\"", "\"")), consumed)
    } else {
        (Cow::Borrowed(raw), consumed)
    }
}
