//! Field kinds, defaults and nested schema references.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::RecordSchema;
use crate::{MendResult, RawNode};

/// Reference to a nested schema.
///
/// Derived schemas refer to nested records lazily through the nested type's
/// `schema` function, so self-referential record types never recurse while
/// their descriptor is being built.
#[derive(Clone)]
pub struct SchemaRef(Source);

#[derive(Clone)]
enum Source {
    Shared(Arc<RecordSchema>),
    Lazy(fn() -> Arc<RecordSchema>),
}

impl SchemaRef {
    /// Refer to an already built schema.
    #[must_use]
    pub const fn shared(schema: Arc<RecordSchema>) -> Self {
        Self(Source::Shared(schema))
    }

    /// Refer to a schema produced on demand by `resolve`.
    #[must_use]
    pub const fn lazy(resolve: fn() -> Arc<RecordSchema>) -> Self {
        Self(Source::Lazy(resolve))
    }

    /// Obtain the referenced schema.
    #[must_use]
    pub fn resolve(&self) -> Arc<RecordSchema> {
        match &self.0 {
            Source::Shared(schema) => Arc::clone(schema),
            Source::Lazy(resolve) => resolve(),
        }
    }
}

impl From<Arc<RecordSchema>> for SchemaRef {
    fn from(schema: Arc<RecordSchema>) -> Self {
        Self::shared(schema)
    }
}

impl From<RecordSchema> for SchemaRef {
    fn from(schema: RecordSchema) -> Self {
        Self::shared(Arc::new(schema))
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Source::Shared(schema) => write!(f, "SchemaRef({})", schema.name()),
            Source::Lazy(_) => f.write_str("SchemaRef(<lazy>)"),
        }
    }
}

/// Declared type of a field.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum FieldKind {
    /// Any integer type.
    Integer,
    /// Any floating-point type.
    Float,
    /// Text.
    String,
    /// Boolean flag.
    Boolean,
    /// Sequence whose elements have the given kind.
    Sequence(Box<FieldKind>),
    /// Free-form mapping.
    Mapping,
    /// Nested record.
    Record(SchemaRef),
    /// A type no zero-value rule covers; carries the rendered type name.
    Unresolved(String),
}

impl FieldKind {
    /// Sequence of `element`.
    #[must_use]
    pub fn sequence(element: Self) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// Nested record described by `schema`.
    #[must_use]
    pub fn record(schema: impl Into<SchemaRef>) -> Self {
        Self::Record(schema.into())
    }

    /// Schema of the nested record, when this kind is a record.
    #[must_use]
    pub fn record_schema(&self) -> Option<Arc<RecordSchema>> {
        match self {
            Self::Record(schema) => Some(schema.resolve()),
            _ => None,
        }
    }

    /// Schema of the elements, when this kind is a sequence of records.
    #[must_use]
    pub fn element_schema(&self) -> Option<Arc<RecordSchema>> {
        match self {
            Self::Sequence(element) => element.record_schema(),
            _ => None,
        }
    }
}

/// Value produced by a field default.
#[derive(Clone, Debug)]
pub enum DefaultValue {
    /// A node used as-is.
    Raw(RawNode),
    /// A schema-typed value; its record's own defaults are used instead.
    Record(SchemaRef),
}

impl DefaultValue {
    /// Wrap anything convertible into a node.
    #[must_use]
    pub fn raw(value: impl Into<RawNode>) -> Self {
        Self::Raw(value.into())
    }

    /// Serialize `value` into a node.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MendError::Encode`] when `value` has no node
    /// representation, for example an out-of-range `u64`.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> MendResult<Self> {
        Ok(Self::Raw(RawNode::try_from(value)?))
    }
}

type Factory = dyn Fn() -> MendResult<DefaultValue> + Send + Sync;

/// Default declared for a field: a concrete value or a factory.
#[derive(Clone)]
pub enum FieldDefault {
    /// Concrete default.
    Value(DefaultValue),
    /// Factory invoked once per default derivation.
    Factory(Arc<Factory>),
}

impl FieldDefault {
    /// Concrete default from anything convertible into a node.
    #[must_use]
    pub fn value(value: impl Into<RawNode>) -> Self {
        Self::Value(DefaultValue::raw(value))
    }

    /// Default taken from the defaults of another schema.
    #[must_use]
    pub fn record(schema: impl Into<SchemaRef>) -> Self {
        Self::Value(DefaultValue::Record(schema.into()))
    }

    /// Infallible factory.
    #[must_use]
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> DefaultValue + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(move || Ok(factory())))
    }

    /// Factory that may fail; the error aborts default derivation.
    #[must_use]
    pub fn try_factory<F>(factory: F) -> Self
    where
        F: Fn() -> MendResult<DefaultValue> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// Produce the default, invoking the factory if there is one.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by a fallible factory.
    pub fn produce(&self) -> MendResult<DefaultValue> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}
