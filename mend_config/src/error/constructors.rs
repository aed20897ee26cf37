//! Constructors for `MendError` used by the store and the views.

use std::error::Error;
use std::fmt::Display;

use super::MendError;

impl MendError {
    /// Construct a [`MendError::Parse`] for `resource`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mend_config::MendError;
    /// let err = MendError::parse("config.toml", std::io::Error::other("bad"));
    /// assert!(matches!(err, MendError::Parse { .. }));
    /// ```
    #[must_use]
    pub fn parse(
        resource: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Parse {
            resource: resource.into(),
            source: source.into(),
        }
    }

    /// Construct a [`MendError::Persist`] for `resource`.
    #[must_use]
    pub fn persist(
        resource: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Persist {
            resource: resource.into(),
            source: source.into(),
        }
    }

    pub(crate) fn missing_key(path: impl Display, key: impl Display) -> Self {
        Self::MissingKey {
            path: path.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn value_not_found(path: impl Display) -> Self {
        Self::ValueNotFound {
            path: path.to_string(),
        }
    }

    pub(crate) fn detached(path: impl Display, expected: &'static str) -> Self {
        Self::Detached {
            path: path.to_string(),
            expected,
        }
    }

    pub(crate) fn not_indexed(schema: impl Into<String>) -> Self {
        Self::NotIndexed {
            schema: schema.into(),
        }
    }

    /// Returns `true` when the error reports an absent field, position or
    /// list value.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::MissingKey { .. } | Self::ValueNotFound { .. })
    }
}
