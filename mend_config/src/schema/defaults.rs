//! Default tree derivation from schema descriptors.

use toml::{Table, Value};

use super::{DefaultValue, FieldDefault, FieldKind, FieldSchema, RecordSchema};
use crate::{MendError, MendResult, RawNode};

/// Zero value used for boolean fields that declare no default.
///
/// Early releases of the format filled such fields with `true`; documents
/// written by them can be kept stable with [`BooleanZero::True`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BooleanZero {
    /// Fill with `false`.
    #[default]
    False,
    /// Fill with `true`.
    True,
}

impl BooleanZero {
    const fn value(self) -> bool {
        matches!(self, Self::True)
    }
}

/// Derive the full default tree for `schema`.
///
/// Declared defaults win; factories run exactly once per call. A default that
/// is itself schema-typed contributes its own record's defaults. Fields
/// without a default are zero-filled by kind and nested records recurse.
///
/// # Examples
///
/// ```
/// use mend_config::{BooleanZero, FieldKind, FieldSchema, RecordSchema, derive_defaults};
///
/// let schema = RecordSchema::builder("App")
///     .field(FieldSchema::new("retries", FieldKind::Integer))
///     .field(FieldSchema::new("verbose", FieldKind::Boolean))
///     .build();
/// let tree = derive_defaults(&schema, BooleanZero::False)?;
/// assert_eq!(tree.get("retries").and_then(toml::Value::as_integer), Some(0));
/// assert_eq!(tree.get("verbose").and_then(toml::Value::as_bool), Some(false));
/// # Ok::<_, mend_config::MendError>(())
/// ```
///
/// # Errors
///
/// Returns [`MendError::Schema`] when a field of kind
/// [`FieldKind::Unresolved`] has no default, and propagates factory errors.
pub fn derive_defaults(schema: &RecordSchema, booleans: BooleanZero) -> MendResult<Table> {
    let mut tree = Table::new();
    for field in schema.fields() {
        let value = match field.default() {
            Some(default) => resolve(default, booleans)?,
            None => zero_value(schema, field, booleans)?,
        };
        tree.insert(field.name().to_owned(), value);
    }
    Ok(tree)
}

/// Resolve the explicitly declared default of the field `name`.
///
/// Returns `Ok(None)` when the schema has no such field or the field declares
/// no default; zero values are never produced here.
///
/// # Errors
///
/// Propagates errors from factories and from nested record derivation.
pub fn declared_default(
    schema: &RecordSchema,
    name: &str,
    booleans: BooleanZero,
) -> MendResult<Option<RawNode>> {
    schema
        .field(name)
        .and_then(FieldSchema::default)
        .map(|default| resolve(default, booleans))
        .transpose()
}

fn resolve(default: &FieldDefault, booleans: BooleanZero) -> MendResult<RawNode> {
    match default.produce()? {
        DefaultValue::Raw(node) => Ok(node),
        DefaultValue::Record(schema) => derive_defaults(&schema.resolve(), booleans).map(Value::Table),
    }
}

fn zero_value(schema: &RecordSchema, field: &FieldSchema, booleans: BooleanZero) -> MendResult<RawNode> {
    let value = match field.kind() {
        FieldKind::Integer => Value::Integer(0),
        FieldKind::Float => Value::Float(0.0),
        FieldKind::String => Value::String(String::new()),
        FieldKind::Boolean => Value::Boolean(booleans.value()),
        FieldKind::Sequence(_) => Value::Array(Vec::new()),
        FieldKind::Mapping => Value::Table(Table::new()),
        FieldKind::Record(nested) => Value::Table(derive_defaults(&nested.resolve(), booleans)?),
        FieldKind::Unresolved(type_name) => {
            return Err(MendError::Schema {
                schema: schema.name().to_owned(),
                field: field.name().to_owned(),
                type_name: type_name.clone(),
            });
        }
    };
    Ok(value)
}
