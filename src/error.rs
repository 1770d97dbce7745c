use std::fmt::{self, Debug, Display, Formatter};
use std::path::PathBuf;

use derive_more::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while decoding a `multipart/form-data`
/// request body or persisting one of its files.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// A named part was found that is not in the
    /// [`allowed_fields`](crate::Constraints::allowed_fields) list.
    #[display(fmt = "unknown field received: {}", "field_name.as_deref().unwrap_or(\"<unknown>\")")]
    UnknownField { field_name: Option<String> },

    /// The content of a part exceeded its size limit.
    #[display(
        fmt = "field '{}' exceeded the maximum size limit: {} bytes",
        "field_name.as_deref().unwrap_or(\"<unknown>\")",
        limit
    )]
    FieldSizeExceeded { limit: u64, field_name: Option<String> },

    /// The request body exceeded the whole stream size limit.
    #[display(fmt = "stream size exceeded the maximum limit: {} bytes", limit)]
    StreamSizeExceeded { limit: u64 },

    /// The underlying body stream yielded an error.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(BoxError),

    /// No boundary found in a `multipart/form-data` `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Writing a file's content to its destination failed.
    #[display(fmt = "failed to persist file to {}: {}", "path.display()", cause)]
    PersistFailed { path: PathBuf, cause: std::io::Error },

    /// Failed to decode a text field as `JSON` in
    /// [`FormData::json`](crate::FormData::json).
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    #[display(fmt = "failed to decode field data as JSON: {}", _0)]
    DecodeJson(serde_json::Error),
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + 'static) = match self {
            Error::StreamReadFailed(cause) => cause.as_ref(),
            Error::PersistFailed { cause, .. } => cause,
            _ => return None,
        };

        Some(cause)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
