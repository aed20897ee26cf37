//! Keyed list view over an array of records.

use std::sync::Arc;

use toml::{Table, Value};

use super::index::{ListIndex, key_of};
use super::{Binding, Entry, IndexKey, IntoNode, NodePath, ProxyObject};
use crate::{MendError, MendResult, RecordSchema};

/// View over a sequence of records.
///
/// When the element schema declares a key field the view keeps a key to
/// position index. The index is rebuilt from scratch after every mutating
/// call made through this view; changes made through other views are picked
/// up the next time this view mutates or is re-obtained.
///
/// Element views of keyed records follow the record by key. Other element
/// views are bound to their position and detach once a `set`, `delete`,
/// `remove` or `clear` through any view may have moved them. `append` leaves
/// them valid.
#[derive(Clone, Debug)]
pub struct IndexedListView {
    binding: Binding,
    path: NodePath,
    schema: Arc<RecordSchema>,
    index: Option<ListIndex>,
}

impl IndexedListView {
    pub(crate) fn new(
        binding: Binding,
        path: NodePath,
        schema: Arc<RecordSchema>,
        items: &[Value],
    ) -> Self {
        let index = build_index(&schema, items);
        Self {
            binding,
            path,
            schema,
            index,
        }
    }

    /// Element at `position`, or `None` past the end.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when this view no longer resolves to a
    /// sequence.
    pub fn get(&self, position: usize) -> MendResult<Option<Entry>> {
        self.with_items(|items| items.get(position).map(|item| self.wrap(items, position, item)))
    }

    /// Element whose key field equals `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::NotIndexed`] when the element schema declares no
    /// key field, and [`MendError::Detached`] when this view no longer
    /// resolves.
    pub fn find(&self, key: impl Into<IndexKey>) -> MendResult<Option<Entry>> {
        let (index, key_field) = self.index_parts()?;
        let key = key.into();
        let Some(position) = index.position(&key) else {
            return Ok(None);
        };
        self.with_items(|items| {
            items
                .get(position)
                .filter(|item| key_of(key_field, item).as_ref() == Some(&key))
                .map(|item| self.wrap(items, position, item))
        })
    }

    /// Indexed keys in build order.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::NotIndexed`] when the element schema declares no
    /// key field.
    pub fn keys(&self) -> MendResult<Vec<IndexKey>> {
        let (index, _) = self.index_parts()?;
        Ok(index.keys().cloned().collect())
    }

    /// Replace the element at `position` and persist.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::MissingKey`] when `position` is out of range,
    /// conversion errors from `value`, and [`MendError::Persist`] when the
    /// save fails.
    pub fn set(&mut self, position: usize, value: impl IntoNode) -> MendResult<()> {
        let node = value.into_node()?;
        self.mutate(true, |items, path| {
            let slot = items
                .get_mut(position)
                .ok_or_else(|| MendError::missing_key(path, position))?;
            *slot = node;
            Ok(())
        })
    }

    /// Remove the element at `position` and persist.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::MissingKey`] when `position` is out of range and
    /// [`MendError::Persist`] when the save fails.
    pub fn delete(&mut self, position: usize) -> MendResult<()> {
        self.mutate(true, |items, path| {
            if position >= items.len() {
                return Err(MendError::missing_key(path, position));
            }
            items.remove(position);
            Ok(())
        })
    }

    /// Append `value` and persist.
    ///
    /// # Errors
    ///
    /// Returns conversion errors from `value` and [`MendError::Persist`] when
    /// the save fails.
    pub fn append(&mut self, value: impl IntoNode) -> MendResult<()> {
        let node = value.into_node()?;
        self.mutate(false, |items, _| {
            items.push(node);
            Ok(())
        })
    }

    /// Remove the first element equal to `value` and persist.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::ValueNotFound`] when no element matches and
    /// [`MendError::Persist`] when the save fails.
    pub fn remove(&mut self, value: impl IntoNode) -> MendResult<()> {
        let node = value.into_node()?;
        self.mutate(true, |items, path| {
            let position = items
                .iter()
                .position(|item| *item == node)
                .ok_or_else(|| MendError::value_not_found(path))?;
            items.remove(position);
            Ok(())
        })
    }

    /// Remove every element and persist.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Persist`] when the save fails.
    pub fn clear(&mut self) -> MendResult<()> {
        self.mutate(true, |items, _| {
            items.clear();
            Ok(())
        })
    }

    /// Number of elements.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when this view no longer resolves.
    pub fn len(&self) -> MendResult<usize> {
        self.with_items(Vec::len)
    }

    /// Whether the sequence is empty.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when this view no longer resolves.
    pub fn is_empty(&self) -> MendResult<bool> {
        self.with_items(Vec::is_empty)
    }

    /// Copy of the live sequence.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when this view no longer resolves.
    pub fn to_raw(&self) -> MendResult<Vec<Value>> {
        self.with_items(Vec::clone)
    }

    /// Iterate over the elements, re-reading each one by position.
    ///
    /// Calling `iter` again starts over from the first element.
    #[must_use]
    pub const fn iter(&self) -> ListIter<'_> {
        ListIter {
            view: self,
            position: 0,
            failed: false,
        }
    }

    /// Location of the wrapped sequence.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Schema describing each element.
    #[must_use]
    pub const fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Wrap `item`, found at `position` of the live `items`.
    ///
    /// A record is addressed by key when it is the last one carrying that
    /// key. Any other record is addressed by position under a pinned binding.
    fn wrap(&self, items: &[Value], position: usize, item: &Value) -> Entry {
        if !item.is_table() {
            return Entry::Raw(item.clone());
        }
        let keyed = self.schema.key_field().and_then(|field| {
            let key = key_of(field, item)?;
            let last = items
                .iter()
                .rposition(|other| key_of(field, other).as_ref() == Some(&key));
            (last == Some(position)).then_some((field, key))
        });
        let (binding, path) = match keyed {
            Some((field, key)) => (self.binding.clone(), self.path.child_keyed(field, key)),
            None => (self.binding.pinned(), self.path.child_index(position)),
        };
        Entry::Object(ProxyObject::new(binding, path, Arc::clone(&self.schema)))
    }

    fn index_parts(&self) -> MendResult<(&ListIndex, &str)> {
        match (&self.index, self.schema.key_field()) {
            (Some(index), Some(key_field)) => Ok((index, key_field)),
            _ => Err(MendError::not_indexed(self.schema.name())),
        }
    }

    fn with_items<R>(&self, f: impl FnOnce(&Vec<Value>) -> R) -> MendResult<R> {
        self.binding.store.read(|doc| {
            self.binding
                .array(doc, &self.path)
                .map(f)
                .ok_or_else(|| MendError::detached(&self.path, "sequence"))
        })
    }

    /// Apply `op` to the live sequence, persist, and rebuild the index.
    /// `shifts` marks operations that can move existing elements.
    fn mutate<R>(
        &mut self,
        shifts: bool,
        op: impl FnOnce(&mut Vec<Value>, &NodePath) -> MendResult<R>,
    ) -> MendResult<R> {
        let Self {
            binding,
            path,
            schema,
            index,
        } = self;
        binding.store.modify(|doc: &mut Table| {
            let items = binding
                .array_mut(doc, path)
                .ok_or_else(|| MendError::detached(&*path, "sequence"))?;
            let out = op(&mut *items, path)?;
            if shifts {
                binding.shift();
            }
            *index = build_index(schema, items);
            Ok(out)
        })
    }
}

fn build_index(schema: &RecordSchema, items: &[Value]) -> Option<ListIndex> {
    schema
        .key_field()
        .map(|key_field| ListIndex::build(key_field, items))
}

/// Iterator returned by [`IndexedListView::iter`].
#[derive(Debug)]
pub struct ListIter<'a> {
    view: &'a IndexedListView,
    position: usize,
    failed: bool,
}

impl Iterator for ListIter<'_> {
    type Item = MendResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.view.get(self.position) {
            Ok(Some(entry)) => {
                self.position += 1;
                Some(Ok(entry))
            }
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl<'a> IntoIterator for &'a IndexedListView {
    type Item = MendResult<Entry>;
    type IntoIter = ListIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
