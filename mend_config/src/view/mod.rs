//! Schema-aware views over the live document.
//!
//! Views never own data. A [`ProxyObject`] or [`IndexedListView`] holds a
//! handle to the [`ConfigStore`], the [`NodePath`] of the node it wraps and
//! the schema describing that node. Every call resolves the node afresh under
//! the store lock, and every write persists the whole document before
//! returning. A view whose path no longer resolves, for example because the
//! field was deleted through another view, reports [`MendError::Detached`].
//!
//! Records inside a keyed list are addressed by their key, so their views
//! follow the record when other elements are removed or reordered. Records
//! without a usable key are addressed by position; such views detach as soon
//! as any change may have moved list elements, instead of silently reaching a
//! neighbouring record.

mod index;
mod list;
mod object;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use toml::{Table, Value};

pub use index::IndexKey;
use index::key_of;
pub use list::{IndexedListView, ListIter};
pub use object::ProxyObject;

use crate::{BooleanZero, ConfigStore, MendError, MendResult, RawNode};

#[cfg(test)]
mod tests;

/// One step from a node to its child.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Field of a table.
    Key(String),
    /// Position in an array.
    Index(usize),
    /// Last record in an array whose `field` holds `key`.
    Keyed {
        /// Key field of the element schema.
        field: String,
        /// Key value of the record.
        key: IndexKey,
    },
}

/// Location of a node relative to the document root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<Segment>);

impl NodePath {
    /// The document root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Whether this path denotes the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the field `key` below this node.
    #[must_use]
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.into()));
        Self(segments)
    }

    /// Path of the element at `position` below this node.
    #[must_use]
    pub fn child_index(&self, position: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(position));
        Self(segments)
    }

    /// Path of the record keyed by `key` in the array below this node.
    #[must_use]
    pub fn child_keyed(&self, field: impl Into<String>, key: IndexKey) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Keyed {
            field: field.into(),
            key,
        });
        Self(segments)
    }

    /// Segments from the root down.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("(root)");
        }
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if position == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Keyed { field, key } => write!(f, "[{field}={key}]")?,
            }
        }
        Ok(())
    }
}

pub(crate) fn value_at<'a>(doc: &'a Table, path: &NodePath) -> Option<&'a Value> {
    let (Segment::Key(first), rest) = path.0.split_first()? else {
        return None;
    };
    let mut node = doc.get(first)?;
    for segment in rest {
        node = match (segment, node) {
            (Segment::Key(key), Value::Table(table)) => table.get(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
            (Segment::Keyed { field, key }, Value::Array(items)) => items
                .iter()
                .rev()
                .find(|item| key_of(field, item).as_ref() == Some(key))?,
            _ => return None,
        };
    }
    Some(node)
}

pub(crate) fn value_at_mut<'a>(doc: &'a mut Table, path: &NodePath) -> Option<&'a mut Value> {
    let (Segment::Key(first), rest) = path.0.split_first()? else {
        return None;
    };
    let mut node = doc.get_mut(first)?;
    for segment in rest {
        node = match (segment, node) {
            (Segment::Key(key), Value::Table(table)) => table.get_mut(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get_mut(*index)?,
            (Segment::Keyed { field, key }, Value::Array(items)) => items
                .iter_mut()
                .rev()
                .find(|item| key_of(field, item).as_ref() == Some(key))?,
            _ => return None,
        };
    }
    Some(node)
}

pub(crate) fn table_at<'a>(doc: &'a Table, path: &NodePath) -> Option<&'a Table> {
    if path.is_root() {
        return Some(doc);
    }
    value_at(doc, path)?.as_table()
}

pub(crate) fn table_at_mut<'a>(doc: &'a mut Table, path: &NodePath) -> Option<&'a mut Table> {
    if path.is_root() {
        return Some(doc);
    }
    value_at_mut(doc, path)?.as_table_mut()
}

pub(crate) fn array_at<'a>(doc: &'a Table, path: &NodePath) -> Option<&'a Vec<Value>> {
    value_at(doc, path)?.as_array()
}

pub(crate) fn array_at_mut<'a>(doc: &'a mut Table, path: &NodePath) -> Option<&'a mut Vec<Value>> {
    value_at_mut(doc, path)?.as_array_mut()
}

/// Whether replacing or removing `node` can move a record that a view is
/// bound to by position.
pub(crate) fn holds_records(node: &Value) -> bool {
    match node {
        Value::Array(items) => items.iter().any(|item| item.is_table() || holds_records(item)),
        Value::Table(table) => table.values().any(holds_records),
        _ => false,
    }
}

/// Store handle and read policy shared by every view derived from one
/// [`crate::ConfigManager::typed_view`] call.
///
/// A binding reached through a list position carries a pin: the store's
/// layout count when the position was resolved. Once the count moves on, the
/// position may hold another record and the binding stops resolving. Views
/// derived from the same positioned record share one pin, so shifts they make
/// themselves below that record keep it valid.
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) store: Arc<ConfigStore>,
    pub(crate) booleans: BooleanZero,
    pin: Option<Arc<AtomicU64>>,
}

impl Binding {
    pub(crate) const fn new(store: Arc<ConfigStore>, booleans: BooleanZero) -> Self {
        Self {
            store,
            booleans,
            pin: None,
        }
    }

    /// Binding for a record addressed by list position.
    pub(crate) fn pinned(&self) -> Self {
        let mut binding = self.clone();
        binding.pin = Some(Arc::new(AtomicU64::new(self.store.layout())));
        binding
    }

    /// Record a change that may have moved list elements.
    pub(crate) fn shift(&self) {
        let layout = self.store.shift_layout();
        if let Some(pin) = &self.pin {
            pin.store(layout, Ordering::Relaxed);
        }
    }

    fn current(&self) -> bool {
        self.pin
            .as_ref()
            .is_none_or(|pin| pin.load(Ordering::Relaxed) == self.store.layout())
    }

    pub(crate) fn table<'a>(&self, doc: &'a Table, path: &NodePath) -> Option<&'a Table> {
        self.current().then(|| table_at(doc, path)).flatten()
    }

    pub(crate) fn table_mut<'a>(&self, doc: &'a mut Table, path: &NodePath) -> Option<&'a mut Table> {
        self.current().then(|| table_at_mut(doc, path)).flatten()
    }

    pub(crate) fn array<'a>(&self, doc: &'a Table, path: &NodePath) -> Option<&'a Vec<Value>> {
        self.current().then(|| array_at(doc, path)).flatten()
    }

    pub(crate) fn array_mut<'a>(
        &self,
        doc: &'a mut Table,
        path: &NodePath,
    ) -> Option<&'a mut Vec<Value>> {
        self.current().then(|| array_at_mut(doc, path)).flatten()
    }
}

/// Value returned by view reads.
#[derive(Debug)]
pub enum Entry {
    /// Scalar, free-form mapping or sequence, copied out of the document.
    Raw(RawNode),
    /// Nested record.
    Object(ProxyObject),
    /// Sequence of records.
    List(IndexedListView),
}

impl Entry {
    /// Borrow the raw node when this entry is not a view.
    #[must_use]
    pub const fn as_raw(&self) -> Option<&RawNode> {
        match self {
            Self::Raw(node) => Some(node),
            Self::Object(_) | Self::List(_) => None,
        }
    }

    /// Raw node behind this entry; views yield their live node.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Detached`] when a view no longer resolves.
    pub fn into_raw(self) -> MendResult<RawNode> {
        match self {
            Self::Raw(node) => Ok(node),
            Self::Object(object) => object.to_raw().map(Value::Table),
            Self::List(list) => list.to_raw().map(Value::Array),
        }
    }

    /// The nested record view, if this entry is one.
    #[must_use]
    pub fn into_object(self) -> Option<ProxyObject> {
        match self {
            Self::Object(object) => Some(object),
            Self::Raw(_) | Self::List(_) => None,
        }
    }

    /// The list view, if this entry is one.
    #[must_use]
    pub fn into_list(self) -> Option<IndexedListView> {
        match self {
            Self::List(list) => Some(list),
            Self::Raw(_) | Self::Object(_) => None,
        }
    }
}

/// Plain value serialized with serde before being written.
///
/// ```
/// use mend_config::{IntoNode, Serialized};
///
/// #[derive(serde::Serialize)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// let node = Serialized(Server { host: "example".into(), port: 8080 }).into_node()?;
/// assert_eq!(node.get("port").and_then(toml::Value::as_integer), Some(8080));
/// # Ok::<_, mend_config::MendError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Serialized<T>(pub T);

/// Conversion of values accepted by view writes into document nodes.
pub trait IntoNode {
    /// Produce the node to store.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Encode`] for values with no node representation
    /// and [`MendError::Detached`] for views that no longer resolve.
    fn into_node(self) -> MendResult<RawNode>;
}

macro_rules! into_node_via_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoNode for $ty {
                fn into_node(self) -> MendResult<RawNode> {
                    Ok(RawNode::from(self))
                }
            }
        )*
    };
}

into_node_via_from!(&str, String, i64, i32, f64, bool, Table, Vec<RawNode>);

impl IntoNode for RawNode {
    fn into_node(self) -> MendResult<RawNode> {
        Ok(self)
    }
}

impl IntoNode for Entry {
    fn into_node(self) -> MendResult<RawNode> {
        self.into_raw()
    }
}

impl IntoNode for &ProxyObject {
    fn into_node(self) -> MendResult<RawNode> {
        self.to_raw().map(Value::Table)
    }
}

impl IntoNode for ProxyObject {
    fn into_node(self) -> MendResult<RawNode> {
        (&self).into_node()
    }
}

impl IntoNode for &IndexedListView {
    fn into_node(self) -> MendResult<RawNode> {
        self.to_raw().map(Value::Array)
    }
}

impl IntoNode for IndexedListView {
    fn into_node(self) -> MendResult<RawNode> {
        (&self).into_node()
    }
}

impl<T: Serialize> IntoNode for Serialized<T> {
    fn into_node(self) -> MendResult<RawNode> {
        RawNode::try_from(self.0).map_err(MendError::from)
    }
}
