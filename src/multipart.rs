use bytes::Bytes;
use futures_util::stream::{Stream, TryStreamExt};
use http::header::{self, HeaderMap};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

use crate::buffer::StreamBuffer;
use crate::constraints::Constraints;
use crate::form_data::FormData;

/// Decodes a `multipart/form-data` request body into [`FormData`].
///
/// The whole body is buffered before decoding starts, so a boundary marker
/// split across two chunks is never missed.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use formdecode::Multipart;
/// use futures_util::stream::once;
/// use std::convert::Infallible;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let multipart = Multipart::new(stream, Some("multipart/form-data; boundary=X-BOUNDARY"));
///
/// let form_data = multipart.form_data().await.unwrap();
/// assert_eq!(form_data.field("my_text_field"), Some("abcd"));
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
pub struct Multipart<'r> {
    buffer: StreamBuffer<'r>,
    content_type: Option<String>,
    constraints: Constraints,
}

impl<'r> Multipart<'r> {
    /// Construct a new `Multipart` instance with the given [`Bytes`] stream
    /// and the request's `Content-Type` header value, if any.
    pub fn new<S, O, E>(stream: S, content_type: Option<&str>) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
    {
        Multipart::with_constraints(stream, content_type, Constraints::default())
    }

    /// Construct a new `Multipart` instance with the given [`Bytes`] stream,
    /// the `Content-Type` header value and the constraints.
    pub fn with_constraints<S, O, E>(stream: S, content_type: Option<&str>, constraints: Constraints) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
    {
        let stream = stream
            .map_ok(|b| b.into())
            .map_err(|err| crate::Error::StreamReadFailed(err.into()));

        Multipart {
            buffer: StreamBuffer::new(stream, constraints.size_limit.whole_stream),
            content_type: content_type.map(str::to_owned),
            constraints,
        }
    }

    /// Construct a new `Multipart` instance reading the `Content-Type` from
    /// the request headers. A header value that isn't visible ASCII counts as
    /// absent.
    pub fn from_headers<S, O, E>(stream: S, headers: &HeaderMap, constraints: Constraints) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
    {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok());

        Multipart::with_constraints(stream, content_type, constraints)
    }

    /// Construct a new `Multipart` instance with the given [`AsyncRead`]
    /// reader and the `Content-Type` header value.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use formdecode::Multipart;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let reader = data.as_bytes();
    /// let multipart = Multipart::with_reader(reader, Some("multipart/form-data; boundary=X-BOUNDARY"));
    ///
    /// let form_data = multipart.form_data().await.unwrap();
    /// assert_eq!(form_data.field("my_text_field"), Some("abcd"));
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub fn with_reader<R>(reader: R, content_type: Option<&str>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'r,
    {
        let stream = ReaderStream::new(reader);
        Multipart::new(stream, content_type)
    }

    /// Construct a new `Multipart` instance with the given [`AsyncRead`]
    /// reader, the `Content-Type` header value and the constraints.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub fn with_reader_with_constraints<R>(reader: R, content_type: Option<&str>, constraints: Constraints) -> Self
    where
        R: AsyncRead + Unpin + Send + 'r,
    {
        let stream = ReaderStream::new(reader);
        Multipart::with_constraints(stream, content_type, constraints)
    }

    /// Buffers the body and decodes it.
    ///
    /// A missing or non-multipart `Content-Type` resolves to an empty
    /// [`FormData`] without reading the stream. A multipart `Content-Type`
    /// without a boundary fails before reading it.
    pub async fn form_data(self) -> crate::Result<FormData> {
        let boundary = match self.content_type.as_deref() {
            Some(content_type) => crate::parse_boundary(content_type)?,
            None => None,
        };

        let boundary = match boundary {
            Some(boundary) => boundary,
            None => {
                trace!("not a multipart request: {:?}", self.content_type);
                return Ok(FormData::default());
            }
        };

        let body = self.buffer.read_to_end().await?;

        FormData::decode(body, boundary, &self.constraints)
    }
}
