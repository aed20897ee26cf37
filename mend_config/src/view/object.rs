//! Record view over a table node.

use std::sync::Arc;

use toml::{Table, Value};
use tracing::trace;

use super::{Binding, Entry, IndexedListView, IntoNode, NodePath, holds_records};
use crate::{FieldSchema, MendError, MendResult, RecordSchema, declared_default};

/// View over one record of the document.
///
/// Reads wrap nested records and keyed lists in further views; writes persist
/// the whole document before returning.
///
/// A view of a keyed list element follows its record by key. Changing the
/// record's key through the view therefore detaches it; obtain a fresh view
/// through the new key.
#[derive(Clone, Debug)]
pub struct ProxyObject {
    binding: Binding,
    path: NodePath,
    schema: Arc<RecordSchema>,
}

impl ProxyObject {
    pub(crate) const fn new(binding: Binding, path: NodePath, schema: Arc<RecordSchema>) -> Self {
        Self {
            binding,
            path,
            schema,
        }
    }

    /// Read the field `name`.
    ///
    /// A stored value is wrapped according to the field's declared kind: a
    /// table under a record field becomes [`Entry::Object`] and an array under
    /// a sequence-of-records field becomes [`Entry::List`]. Anything else,
    /// including undeclared fields and values whose shape does not match the
    /// declaration, is returned as [`Entry::Raw`].
    ///
    /// A missing field with a declared default yields that default without
    /// writing it. A missing field without one yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when this view no longer resolves to a
    /// table, and propagates default factory errors.
    pub fn get(&self, name: &str) -> MendResult<Option<Entry>> {
        let stored = self.binding.store.read(|doc| {
            let table = self.binding.table(doc, &self.path).ok_or_else(|| self.detached())?;
            Ok::<_, MendError>(table.get(name).map(|node| self.wrap(name, node)))
        })?;
        if stored.is_some() {
            return Ok(stored);
        }
        let fallback = declared_default(&self.schema, name, self.binding.booleans)?;
        if fallback.is_some() {
            trace!(path = %self.path, field = name, "serving declared default for missing field");
        }
        Ok(fallback.map(Entry::Raw))
    }

    fn wrap(&self, name: &str, node: &Value) -> Entry {
        let kind = self.schema.field(name).map(FieldSchema::kind);
        match (kind, node) {
            (Some(kind), Value::Table(_)) => match kind.record_schema() {
                Some(schema) => Entry::Object(Self::new(
                    self.binding.clone(),
                    self.path.child_key(name),
                    schema,
                )),
                None => Entry::Raw(node.clone()),
            },
            (Some(kind), Value::Array(items)) => match kind.element_schema() {
                Some(schema) => Entry::List(IndexedListView::new(
                    self.binding.clone(),
                    self.path.child_key(name),
                    schema,
                    items,
                )),
                None => Entry::Raw(node.clone()),
            },
            _ => Entry::Raw(node.clone()),
        }
    }

    /// Nested record view for `name`, if the field holds one.
    ///
    /// # Errors
    ///
    /// See [`ProxyObject::get`].
    pub fn object(&self, name: &str) -> MendResult<Option<Self>> {
        Ok(self.get(name)?.and_then(Entry::into_object))
    }

    /// List view for `name`, if the field holds a sequence of records.
    ///
    /// # Errors
    ///
    /// See [`ProxyObject::get`].
    pub fn list(&self, name: &str) -> MendResult<Option<IndexedListView>> {
        Ok(self.get(name)?.and_then(Entry::into_list))
    }

    /// Write `value` under `name` and persist.
    ///
    /// Views passed as the value contribute a copy of their live node.
    ///
    /// # Errors
    ///
    /// Returns conversion errors from `value`, [`MendError::Detached`] when
    /// this view no longer resolves, and [`MendError::Persist`] when the save
    /// fails. A failed save keeps the write in memory.
    pub fn set(&self, name: &str, value: impl IntoNode) -> MendResult<()> {
        let node = value.into_node()?;
        self.binding.store.modify(|doc| {
            let table = self
                .binding
                .table_mut(doc, &self.path)
                .ok_or_else(|| self.detached())?;
            let replaced = table.insert(name.to_owned(), node);
            if replaced.as_ref().is_some_and(holds_records) {
                self.binding.shift();
            }
            Ok(())
        })
    }

    /// Remove `name` and persist.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::MissingKey`] when the field is not stored,
    /// [`MendError::Detached`] when this view no longer resolves, and
    /// [`MendError::Persist`] when the save fails.
    pub fn delete(&self, name: &str) -> MendResult<()> {
        self.binding.store.modify(|doc| {
            let table = self
                .binding
                .table_mut(doc, &self.path)
                .ok_or_else(|| self.detached())?;
            let removed = table
                .remove(name)
                .ok_or_else(|| MendError::missing_key(&self.path, name))?;
            if holds_records(&removed) {
                self.binding.shift();
            }
            Ok(())
        })
    }

    /// Whether `name` is stored. Declared defaults do not count.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when this view no longer resolves.
    pub fn contains(&self, name: &str) -> MendResult<bool> {
        self.with_table(|table| table.contains_key(name))
    }

    /// Stored field names in document order.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when this view no longer resolves.
    pub fn keys(&self) -> MendResult<Vec<String>> {
        self.with_table(|table| table.keys().cloned().collect())
    }

    /// Copy of the live table.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when this view no longer resolves.
    pub fn to_raw(&self) -> MendResult<Table> {
        self.with_table(Table::clone)
    }

    /// Location of the wrapped table.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Schema describing the wrapped table.
    #[must_use]
    pub const fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    fn with_table<R>(&self, f: impl FnOnce(&Table) -> R) -> MendResult<R> {
        self.binding.store.read(|doc| {
            self.binding
                .table(doc, &self.path)
                .map(f)
                .ok_or_else(|| self.detached())
        })
    }

    fn detached(&self) -> MendError {
        MendError::detached(&self.path, "table")
    }
}
