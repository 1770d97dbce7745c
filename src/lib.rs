//! A buffered decoder for `multipart/form-data` request bodies.
//!
//! The request body stream is collected in full, then cut into parts on the
//! boundary marker taken from the `Content-Type` header. Each part becomes
//! either a text field or a file, collected by name into a [`FormData`].
//! Decoding is binary safe: file content is kept byte for byte.
//!
//! # Examples
//!
//! ```no_run
//! use bytes::Bytes;
//! use futures_util::stream::Stream;
//!
//! # async fn run(stream: impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static) -> formdecode::Result<()> {
//! let content_type = Some("multipart/form-data; boundary=X-BOUNDARY");
//! let form_data = formdecode::parse_form_data(content_type, stream).await?;
//!
//! if let Some(title) = form_data.field("title") {
//!     println!("title: {}", title);
//! }
//!
//! if let Some(audio) = form_data.file("audio") {
//!     println!("{} ({}, {} bytes)", audio.file_name(), audio.content_type(), audio.size());
//!     audio.persist("/var/uploads/audio.bin").await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Optional features
//!
//! - `json`: [`FormData::json`] to deserialize a text field.
//! - `tokio-io`: [`Multipart::with_reader`] to read from an `AsyncRead`.
//! - `log`: log decode events through the [`log`](https://docs.rs/log) crate.

#![cfg_attr(nightly, feature(doc_cfg))]

use bytes::Bytes;
use futures_util::stream::Stream;

use crate::content_disposition::Params;

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => (::log::trace!($($t)*););
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($t:tt)*) => (::log::debug!($($t)*););
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {
        if false {
            let _ = format_args!($($t)*);
        }
    };
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($t:tt)*) => {
        if false {
            let _ = format_args!($($t)*);
        }
    };
}

pub use bytes;
pub use constraints::Constraints;
pub use error::Error;
pub use form_data::FormData;
pub use multipart::Multipart;
pub use parser::Parts;
pub use part::{File, Part};
pub use size_limit::SizeLimit;

mod buffer;
mod constants;
mod constraints;
mod content_disposition;
mod error;
mod form_data;
mod helpers;
mod multipart;
mod parser;
mod part;
mod size_limit;

/// A Result type often returned from methods that can have `formdecode`
/// errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// Returns `Ok(None)` when the content type does not start with
/// `multipart/form-data` (matched case-sensitively), which is not an error:
/// such a request simply carries no form data. The boundary is taken
/// verbatim, with surrounding quotes removed, and its characters are not
/// checked.
///
/// # Examples
///
/// ```
/// let boundary = formdecode::parse_boundary("multipart/form-data; boundary=----=_Part_0_123");
/// assert_eq!(boundary, Ok(Some("----=_Part_0_123".to_owned())));
///
/// assert_eq!(formdecode::parse_boundary("application/json"), Ok(None));
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<Option<String>> {
    let content_type = content_type.as_ref();

    if !content_type
        .trim_start()
        .starts_with(mime::MULTIPART_FORM_DATA.essence_str())
    {
        return Ok(None);
    }

    Params::new(content_type)
        .find(|(key, _)| key.eq_ignore_ascii_case(mime::BOUNDARY.as_str()))
        .map(|(_, val)| val.into_owned())
        .filter(|boundary| !boundary.is_empty())
        .map(Some)
        .ok_or(Error::NoBoundary)
}

/// Buffers `stream` and decodes it as `multipart/form-data` with the default
/// [`Constraints`].
///
/// A missing or non-multipart `content_type` resolves to an empty
/// [`FormData`].
pub async fn parse_form_data<'r, S, O, E>(content_type: Option<&str>, stream: S) -> Result<FormData>
where
    S: Stream<Item = std::result::Result<O, E>> + Send + 'r,
    O: Into<Bytes> + 'r,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
{
    Multipart::new(stream, content_type).form_data().await
}
