use std::path::Path;

use bytes::Bytes;

/// A single decoded part of a `multipart/form-data` body.
///
/// A part is a file when its `Content-Disposition` carries a `filename`
/// parameter, and a text field otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// A text field.
    Field {
        /// The `name` parameter of the part's `Content-Disposition`.
        name: String,
        /// The decoded text content.
        value: String,
    },
    /// A file attachment.
    File(File),
}

impl Part {
    /// The name the part was submitted under.
    pub fn name(&self) -> &str {
        match self {
            Part::Field { name, .. } => name,
            Part::File(file) => file.name(),
        }
    }
}

/// A file attachment decoded from a `multipart/form-data` body.
///
/// The content is an exact copy of the bytes between the part's header block
/// and the next boundary marker, minus the line break preceding the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub(crate) name: String,
    pub(crate) file_name: String,
    pub(crate) content_type: mime::Mime,
    pub(crate) data: Bytes,
}

impl File {
    pub(crate) fn new(name: String, file_name: String, content_type: mime::Mime, data: Bytes) -> File {
        File {
            name,
            file_name,
            content_type,
            data,
        }
    }

    /// The field name found in the `Content-Disposition` header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file name found in the `Content-Disposition` header. May be empty,
    /// as browsers send `filename=""` for an empty file input.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The declared `Content-Type` of the part, `application/octet-stream`
    /// when none was declared.
    pub fn content_type(&self) -> &mime::Mime {
        &self.content_type
    }

    /// The file content.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Length of the file content in bytes, always `data().len()`.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Consumes the file and returns its content.
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Writes the file content to `path` verbatim, creating or truncating the
    /// destination.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run(form_data: formdecode::FormData) -> formdecode::Result<()> {
    /// if let Some(file) = form_data.file("audio") {
    ///     file.persist("/var/uploads/song.mp3").await?;
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn persist<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();

        tokio::fs::write(path, &self.data)
            .await
            .map_err(|cause| crate::Error::PersistFailed {
                path: path.to_path_buf(),
                cause,
            })?;

        debug!("persisted file '{}' ({} bytes) to {}", self.name, self.size(), path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> File {
        File::new(
            "audio".to_owned(),
            "song.mp3".to_owned(),
            "audio/mpeg".parse().unwrap(),
            Bytes::from_static(&[0x00, 0xff, 0x10]),
        )
    }

    #[test]
    fn test_file_accessors() {
        let file = song();

        assert_eq!(file.name(), "audio");
        assert_eq!(file.file_name(), "song.mp3");
        assert_eq!(file.content_type().essence_str(), "audio/mpeg");
        assert_eq!(&file.data()[..], &[0x00, 0xff, 0x10]);
        assert_eq!(file.size(), 3);
        assert_eq!(file.into_data(), Bytes::from_static(&[0x00, 0xff, 0x10]));
    }

    #[test]
    fn test_part_name() {
        let field = Part::Field {
            name: "title".to_owned(),
            value: "Hello".to_owned(),
        };
        assert_eq!(field.name(), "title");
        assert_eq!(Part::File(song()).name(), "audio");
    }

    #[tokio::test]
    async fn test_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");

        song().persist(&path).await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![0x00, 0xff, 0x10]);
    }

    #[tokio::test]
    async fn test_persist_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("song.mp3");

        match song().persist(&path).await {
            Err(crate::Error::PersistFailed { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
