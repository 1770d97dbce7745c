use crate::size_limit::SizeLimit;

/// Represents some rules to be applied while decoding a request body.
///
/// # Examples
///
/// ```
/// use formdecode::{Constraints, SizeLimit};
///
/// let constraints = Constraints::new()
///     .allowed_fields(vec!["title", "audio"])
///     .size_limit(
///         SizeLimit::new()
///             .whole_stream(20 * 1024 * 1024)
///             .per_field(15 * 1024 * 1024)
///             .for_field("title", 200),
///     );
/// # drop(constraints);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
    pub(crate) allowed_fields: Option<Vec<String>>,
}

impl Constraints {
    /// Creates a set of rules with default behaviour.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies rules on the body size and on each part's content size.
    pub fn size_limit(self, size_limit: SizeLimit) -> Constraints {
        Constraints {
            size_limit,
            allowed_fields: self.allowed_fields,
        }
    }

    /// Specify which fields are allowed. A named part outside this list fails
    /// the decode with [`Error::UnknownField`](crate::Error::UnknownField).
    pub fn allowed_fields<N: Into<String>>(self, allowed_fields: Vec<N>) -> Constraints {
        let allowed_fields = allowed_fields.into_iter().map(|item| item.into()).collect();

        Constraints {
            size_limit: self.size_limit,
            allowed_fields: Some(allowed_fields),
        }
    }

    pub(crate) fn is_it_allowed(&self, field: Option<&str>) -> bool {
        if let Some(ref allowed_fields) = self.allowed_fields {
            field
                .map(|field| allowed_fields.iter().any(|item| item == field))
                .unwrap_or(false)
        } else {
            true
        }
    }
}
