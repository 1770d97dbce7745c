use std::collections::HashMap;
use std::iter::FromIterator;

use bytes::Bytes;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

use crate::constraints::Constraints;
use crate::parser::RawParts;
use crate::part::{File, Part};

/// The decoded content of a `multipart/form-data` body: text fields and file
/// attachments, each keyed by name.
///
/// When several parts of the same kind share a name, the one appearing last
/// in the body wins.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use formdecode::{Constraints, FormData};
///
/// let body = Bytes::from_static(
///     b"--X\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHello\r\n--X--\r\n",
/// );
/// let form_data = FormData::decode(body, "X", &Constraints::default()).unwrap();
///
/// assert_eq!(form_data.field("title"), Some("Hello"));
/// assert!(form_data.files().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, File>,
    discarded: usize,
}

impl FormData {
    /// Decodes an already buffered body with the given boundary.
    ///
    /// Malformed parts are skipped. The decode fails when `boundary` is empty
    /// or when a part breaks one of the `constraints`.
    pub fn decode<B: AsRef<str>>(body: Bytes, boundary: B, constraints: &Constraints) -> crate::Result<FormData> {
        let mut form_data = FormData::default();
        let mut parts = RawParts::new(body, boundary.as_ref())?;

        for raw in &mut parts {
            let name = raw.part.name();

            if !constraints.is_it_allowed(Some(name)) {
                return Err(crate::Error::UnknownField {
                    field_name: Some(name.to_owned()),
                });
            }

            let limit = constraints.size_limit.extract_size_limit_for(Some(name));
            if raw.content_len as u64 > limit {
                return Err(crate::Error::FieldSizeExceeded {
                    limit,
                    field_name: Some(name.to_owned()),
                });
            }

            form_data.insert(raw.part);
        }

        form_data.discarded = parts.discarded;

        debug!(
            "decoded {} fields and {} files, discarded {} segments",
            form_data.fields.len(),
            form_data.files.len(),
            form_data.discarded
        );

        Ok(form_data)
    }

    fn insert(&mut self, part: Part) {
        match part {
            Part::Field { name, value } => {
                self.fields.insert(name, value);
            }
            Part::File(file) => {
                self.files.insert(file.name.clone(), file);
            }
        }
    }

    /// All text fields by name.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// All files by name.
    pub fn files(&self) -> &HashMap<String, File> {
        &self.files
    }

    /// The value of the text field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The file submitted as `name`.
    pub fn file(&self, name: &str) -> Option<&File> {
        self.files.get(name)
    }

    /// Moves the file submitted as `name` out of the form data.
    pub fn remove_file(&mut self, name: &str) -> Option<File> {
        self.files.remove(name)
    }

    /// Number of fields and files.
    pub fn len(&self) -> usize {
        self.fields.len() + self.files.len()
    }

    /// Returns `true` when the body held no fields and no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of segments skipped while decoding because they were not valid
    /// parts.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Splits into the fields and files maps.
    pub fn into_parts(self) -> (HashMap<String, String>, HashMap<String, File>) {
        (self.fields, self.files)
    }

    /// Deserializes the text field `name` as JSON. Returns `Ok(None)` when no
    /// such field exists.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> crate::Result<Option<T>> {
        self.field(name)
            .map(|value| serde_json::from_str(value).map_err(crate::Error::DecodeJson))
            .transpose()
    }
}

impl Extend<Part> for FormData {
    fn extend<I: IntoIterator<Item = Part>>(&mut self, iter: I) {
        for part in iter {
            self.insert(part);
        }
    }
}

impl FromIterator<Part> for FormData {
    fn from_iter<I: IntoIterator<Item = Part>>(iter: I) -> Self {
        let mut form_data = FormData::default();
        form_data.extend(iter);
        form_data
    }
}
