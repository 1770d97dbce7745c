use bytes::Bytes;
use http::header::{self, HeaderMap};
use memchr::memmem;

use crate::constants::{self, LineBreak};
use crate::content_disposition::ContentDisposition;
use crate::helpers;
use crate::part::{File, Part};

/// Why a segment between two boundary markers was not accepted as a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Malformed {
    NoHeaderTerminator,
    NoContentDisposition,
    NoName,
}

/// A part that passed header parsing, with the raw length of its content.
pub(crate) struct RawPart {
    pub(crate) part: Part,
    pub(crate) content_len: usize,
}

/// Iterates over the parts of a fully buffered `multipart/form-data` body, in
/// the order they appear.
///
/// Segments that can't be decoded as a part are skipped and counted, see
/// [`Parts::discarded`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use formdecode::{Part, Parts};
///
/// let body = Bytes::from_static(b"--X\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHello\r\n--X--\r\n");
/// let parts: Vec<Part> = Parts::new(body, "X")?.collect();
///
/// assert_eq!(parts, vec![Part::Field { name: "title".to_owned(), value: "Hello".to_owned() }]);
/// # Ok::<(), formdecode::Error>(())
/// ```
pub struct Parts {
    inner: RawParts,
}

impl Parts {
    /// Splits `body` on `--<boundary>`.
    ///
    /// Fails with [`Error::NoBoundary`](crate::Error::NoBoundary) when
    /// `boundary` is empty.
    pub fn new<B: AsRef<str>>(body: Bytes, boundary: B) -> crate::Result<Parts> {
        Ok(Parts {
            inner: RawParts::new(body, boundary.as_ref())?,
        })
    }

    /// Number of segments skipped so far because they were not valid parts.
    pub fn discarded(&self) -> usize {
        self.inner.discarded
    }
}

impl Iterator for Parts {
    type Item = Part;

    fn next(&mut self) -> Option<Part> {
        self.inner.next().map(|raw| raw.part)
    }
}

pub(crate) struct RawParts {
    segments: Segments,
    pub(crate) discarded: usize,
}

impl RawParts {
    pub(crate) fn new(body: Bytes, boundary: &str) -> crate::Result<RawParts> {
        if boundary.is_empty() {
            return Err(crate::Error::NoBoundary);
        }

        Ok(RawParts {
            segments: Segments::new(body, boundary),
            discarded: 0,
        })
    }
}

impl Iterator for RawParts {
    type Item = RawPart;

    fn next(&mut self) -> Option<RawPart> {
        for (idx, segment) in &mut self.segments {
            match decode_segment(segment) {
                Ok(raw) => return Some(raw),
                Err(reason) => {
                    debug!("discarding segment {}: {:?}", idx, reason);
                    self.discarded += 1;
                }
            }
        }

        None
    }
}

/// Cuts a body into the segments between consecutive `--<boundary>` markers,
/// dropping the preamble, the closing delimiter and the epilogue. Yields each
/// segment with its position.
struct Segments {
    body: Bytes,
    marker: Vec<u8>,
    cursor: Option<usize>,
    next_idx: usize,
    done: bool,
}

impl Segments {
    fn new(body: Bytes, boundary: &str) -> Segments {
        let marker = format!("{}{}", constants::BOUNDARY_EXT, boundary).into_bytes();

        Segments {
            body,
            marker,
            cursor: None,
            next_idx: 0,
            done: false,
        }
    }

    fn find_marker(&self, from: usize) -> Option<usize> {
        memmem::find(&self.body[from..], &self.marker).map(|idx| from + idx)
    }
}

impl Iterator for Segments {
    type Item = (usize, Bytes);

    fn next(&mut self) -> Option<(usize, Bytes)> {
        if self.done {
            return None;
        }

        let start = match self.cursor {
            Some(cursor) => cursor,
            None => match self.find_marker(0) {
                Some(idx) => idx + self.marker.len(),
                None => {
                    self.done = true;
                    return None;
                }
            },
        };

        let end = match self.find_marker(start) {
            Some(idx) => {
                self.cursor = Some(idx + self.marker.len());
                idx
            }
            None => {
                self.done = true;
                self.body.len()
            }
        };

        if self.body[start..end].starts_with(constants::BOUNDARY_EXT.as_bytes()) {
            self.done = true;
            return None;
        }

        let idx = self.next_idx;
        self.next_idx += 1;

        Some((idx, self.body.slice(start..end)))
    }
}

fn decode_segment(segment: Bytes) -> Result<RawPart, Malformed> {
    // Transport padding may follow the marker on its line.
    let padding = segment
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();

    let rest = &segment[padding..];
    let (line_break, header_start) = match LineBreak::detect(rest) {
        Some(line_break) => (line_break, padding + line_break.as_bytes().len()),
        // Headers starting on the marker line itself.
        None => (LineBreak::find(rest).ok_or(Malformed::NoHeaderTerminator)?, padding),
    };

    // Searching from the line break itself lets an empty header block match.
    let terminator = line_break.header_terminator();
    let content_start = memmem::find(rest, terminator)
        .map(|idx| padding + idx + terminator.len())
        .ok_or(Malformed::NoHeaderTerminator)?;

    let headers = parse_headers(&segment[header_start..content_start]);

    let content_disposition = ContentDisposition::parse(&headers).ok_or(Malformed::NoContentDisposition)?;
    let name = content_disposition.field_name.ok_or(Malformed::NoName)?;

    let content = helpers::strip_trailing_line_break(&segment[content_start..]);
    let content_len = content.len();

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<mime::Mime>().ok());

    let part = match content_disposition.file_name {
        Some(file_name) => {
            let data = segment.slice_ref(content);
            let content_type = content_type.unwrap_or(mime::APPLICATION_OCTET_STREAM);

            Part::File(File::new(name, file_name, content_type, data))
        }
        None => Part::Field {
            name,
            value: helpers::decode_text(content, content_type.as_ref()),
        },
    };

    Ok(RawPart { part, content_len })
}

fn parse_headers(header_bytes: &[u8]) -> HeaderMap {
    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    match httparse::parse_headers(header_bytes, &mut headers) {
        Ok(httparse::Status::Complete((_, raw_headers))) => helpers::convert_raw_headers_to_header_map(raw_headers),
        Ok(httparse::Status::Partial) | Err(_) => {
            trace!("falling back to a line by line header scan");
            helpers::scan_header_lines(header_bytes)
        }
    }
}
