//! Key index for sequences of records.

use std::fmt;

use indexmap::IndexMap;
use toml::Value;

/// Scalar key value used to look up list elements.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    /// Text key.
    String(String),
    /// Integer key.
    Integer(i64),
    /// Boolean key.
    Boolean(bool),
}

impl IndexKey {
    /// Key for `node`, or `None` when the node is not an indexable scalar.
    #[must_use]
    pub fn from_node(node: &Value) -> Option<Self> {
        match node {
            Value::String(text) => Some(Self::String(text.clone())),
            Value::Integer(number) => Some(Self::Integer(*number)),
            Value::Boolean(flag) => Some(Self::Boolean(*flag)),
            _ => None,
        }
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for IndexKey {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for IndexKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for IndexKey {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(text) => f.write_str(text),
            Self::Integer(number) => write!(f, "{number}"),
            Self::Boolean(flag) => write!(f, "{flag}"),
        }
    }
}

/// Key value to position map, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ListIndex {
    positions: IndexMap<IndexKey, usize>,
}

impl ListIndex {
    /// Scan `items` once. Elements that are not tables, lack `key_field` or
    /// carry a non-scalar key are skipped. A repeated key keeps its first
    /// slot in the ordering but points at the last element carrying it.
    pub(crate) fn build(key_field: &str, items: &[Value]) -> Self {
        let mut positions = IndexMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if let Some(key) = key_of(key_field, item) {
                positions.insert(key, position);
            }
        }
        Self { positions }
    }

    pub(crate) fn position(&self, key: &IndexKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &IndexKey> {
        self.positions.keys()
    }
}

pub(crate) fn key_of(key_field: &str, item: &Value) -> Option<IndexKey> {
    item.as_table()?.get(key_field).and_then(IndexKey::from_node)
}
