pub(crate) const DEFAULT_WHOLE_STREAM_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_PER_FIELD_SIZE_LIMIT: u64 = u64::MAX;

pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const LF: &str = "\n";
pub(crate) const CRLF_CRLF: &str = "\r\n\r\n";
pub(crate) const LF_LF: &str = "\n\n";

/// The line break style a part is written in, detected from the line break
/// right after its boundary marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineBreak {
    CrLf,
    Lf,
}

impl LineBreak {
    /// Matches a line break at the start of `bytes`.
    pub(crate) fn detect(bytes: &[u8]) -> Option<LineBreak> {
        if bytes.starts_with(CRLF.as_bytes()) {
            Some(LineBreak::CrLf)
        } else if bytes.starts_with(LF.as_bytes()) {
            Some(LineBreak::Lf)
        } else {
            None
        }
    }

    /// The style of the first line break anywhere in `bytes`.
    pub(crate) fn find(bytes: &[u8]) -> Option<LineBreak> {
        let idx = memchr::memchr(b'\n', bytes)?;

        if idx > 0 && bytes[idx - 1] == b'\r' {
            Some(LineBreak::CrLf)
        } else {
            Some(LineBreak::Lf)
        }
    }

    pub(crate) fn as_bytes(self) -> &'static [u8] {
        match self {
            LineBreak::CrLf => CRLF.as_bytes(),
            LineBreak::Lf => LF.as_bytes(),
        }
    }

    /// The blank line that ends a header block in this style.
    pub(crate) fn header_terminator(self) -> &'static [u8] {
        match self {
            LineBreak::CrLf => CRLF_CRLF.as_bytes(),
            LineBreak::Lf => LF_LF.as_bytes(),
        }
    }
}
