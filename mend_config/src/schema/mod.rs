//! Schema descriptors consumed by the store.
//!
//! A [`RecordSchema`] describes one record: its ordered fields, each with a
//! [`FieldKind`] and an optional [`FieldDefault`], plus an optional key field
//! used when the record appears as a list element. Descriptors are built once,
//! either by hand through [`RecordSchema::builder`] or by
//! `#[derive(ConfigSchema)]`, and shared behind [`Arc`].
//!
//! ```
//! use mend_config::{FieldDefault, FieldKind, FieldSchema, RecordSchema};
//!
//! let server = RecordSchema::builder("Server")
//!     .field(FieldSchema::new("host", FieldKind::String).with_default(FieldDefault::value("localhost")))
//!     .build();
//! let app = RecordSchema::builder("App")
//!     .field(FieldSchema::new("retries", FieldKind::Integer))
//!     .field(FieldSchema::new("server", FieldKind::record(server)))
//!     .build();
//! assert_eq!(app.fields().len(), 2);
//! assert!(app.field("server").is_some());
//! ```

mod defaults;
mod kind;

use std::sync::Arc;

pub use defaults::{BooleanZero, declared_default, derive_defaults};
pub use kind::{DefaultValue, FieldDefault, FieldKind, SchemaRef};


/// Types that expose a schema descriptor.
///
/// Usually implemented through `#[derive(ConfigSchema)]`, which caches the
/// descriptor so repeated calls return the same [`Arc`].
pub trait ConfigSchema {
    /// Returns the descriptor for this type.
    fn schema() -> Arc<RecordSchema>;
}

/// One declared field of a record.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    name: String,
    kind: FieldKind,
    default: Option<FieldDefault>,
}

impl FieldSchema {
    /// Declare a field without a default.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Attach a default value or factory to the field.
    #[must_use]
    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Field name as stored in the document.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind.
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Declared default, if any.
    #[must_use]
    pub const fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }
}

/// Descriptor for a record: ordered fields plus an optional key field.
#[derive(Clone, Debug)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldSchema>,
    key_field: Option<String>,
}

impl RecordSchema {
    /// Start building a schema named `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            schema: Self {
                name: name.into(),
                fields: Vec::new(),
                key_field: None,
            },
        }
    }

    /// Schema name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Look up a field by its stored name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Name of the field used to index lists of this record.
    #[must_use]
    pub fn key_field(&self) -> Option<&str> {
        self.key_field.as_deref()
    }
}

/// Builder returned by [`RecordSchema::builder`].
#[derive(Clone, Debug)]
pub struct RecordSchemaBuilder {
    schema: RecordSchema,
}

impl RecordSchemaBuilder {
    /// Append a field. A field with the same name replaces the earlier
    /// declaration in place.
    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        match self
            .schema
            .fields
            .iter_mut()
            .find(|existing| existing.name == field.name)
        {
            Some(existing) => *existing = field,
            None => self.schema.fields.push(field),
        }
        self
    }

    /// Designate the field whose value keys list elements of this record.
    #[must_use]
    pub fn key_field(mut self, name: impl Into<String>) -> Self {
        self.schema.key_field = Some(name.into());
        self
    }

    /// Finish the descriptor.
    #[must_use]
    pub fn build(self) -> RecordSchema {
        self.schema
    }

    /// Finish the descriptor and wrap it for sharing.
    #[must_use]
    pub fn shared(self) -> Arc<RecordSchema> {
        Arc::new(self.schema)
    }
}
