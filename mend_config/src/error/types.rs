//! Primary error enum for schema, store and view operations.

use std::error::Error;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type MendResult<T> = Result<T, MendError>;

/// Errors surfaced by schema introspection, the store and the views.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MendError {
    /// A field declares a type no zero-value rule can fill and carries no
    /// default.
    #[error("cannot derive a default for '{schema}.{field}': unsupported type '{type_name}'")]
    Schema {
        /// Schema that declared the field.
        schema: String,
        /// Field whose default could not be derived.
        field: String,
        /// Rendered form of the declared type.
        type_name: String,
    },

    /// The backing document could not be parsed.
    #[error("failed to parse configuration document '{resource}': {source}")]
    Parse {
        /// Human-readable description of the backing resource.
        resource: String,
        /// Underlying parser error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// The document could not be written to its backing resource.
    #[error("failed to persist configuration document '{resource}': {source}")]
    Persist {
        /// Human-readable description of the backing resource.
        resource: String,
        /// Underlying render or I/O error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// The backing resource could not be read or created.
    #[error("failed to prepare configuration resource '{resource}': {source}")]
    Resource {
        /// Human-readable description of the backing resource.
        resource: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A keyed lookup was attempted on a list whose element schema declares no
    /// key field.
    #[error("list of '{schema}' records is not indexed: no key field declared")]
    NotIndexed {
        /// Element schema of the list.
        schema: String,
    },

    /// A delete targeted a field or position that does not exist.
    #[error("no entry '{key}' at '{path}'")]
    MissingKey {
        /// Path of the node that was searched.
        path: String,
        /// Field name or list position that was requested.
        key: String,
    },

    /// A list removal did not find the requested value.
    #[error("value not present in list at '{path}'")]
    ValueNotFound {
        /// Path of the list that was searched.
        path: String,
    },

    /// A view's path no longer resolves to a node of the expected shape.
    #[error("view at '{path}' no longer resolves to a {expected}")]
    Detached {
        /// Path the view is bound to.
        path: String,
        /// Node shape the view requires.
        expected: &'static str,
    },

    /// The document was accessed again from inside a `read` or `update`
    /// closure on the same thread.
    #[error("configuration document '{resource}' is already borrowed by this thread")]
    Reentrant {
        /// Human-readable description of the backing resource.
        resource: String,
    },

    /// A plain value could not be converted into a document node.
    #[error("failed to convert value into a configuration node: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The requested document format is not available in this build.
    #[error("unsupported configuration format for '{resource}': {reason}")]
    UnsupportedFormat {
        /// Resource whose format was requested.
        resource: String,
        /// Explanation, typically naming the Cargo feature to enable.
        reason: String,
    },
}
