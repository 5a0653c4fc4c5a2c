//! The hierarchical configuration tree.
//!
//! A [`Config`] is a mapping from string keys to [`Value`]s, where each
//! value is either a scalar leaf or another `Config`. Children are owned
//! exclusively by their parent's map, so cloning deep-copies and no node
//! can be reached through two parents.
//!
//! Positions in the tree are addressed by dotted paths (`"a.b.c"`), one
//! tree level per segment. Lookups never fail with an error: a missing
//! segment at any depth simply yields `None`.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as Raw;

use crate::error::{ConfigError, Result};
use crate::loader::{Loader, Source};

/// A single tree position: a scalar leaf or a nested subtree.
///
/// There is no null variant; "not set" is expressed by a key being
/// absent, never by a null value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean leaf.
    Bool(bool),
    /// Integer leaf.
    Int(i64),
    /// Floating-point leaf.
    Float(f64),
    /// String leaf.
    Str(String),
    /// Nested subtree.
    Tree(Config),
}

impl Value {
    /// Build a value from a raw JSON value.
    ///
    /// Nulls disappear (the key is simply not inserted); arrays become
    /// subtrees keyed by their index rendered as a string.
    pub(crate) fn from_raw(raw: Raw) -> Option<Value> {
        match raw {
            Raw::Null => None,
            Raw::Bool(b) => Some(Value::Bool(b)),
            Raw::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            Raw::String(s) => Some(Value::Str(s)),
            Raw::Array(items) => {
                let mut tree = Config::new();
                for (index, item) in items.into_iter().enumerate() {
                    if let Some(value) = Value::from_raw(item) {
                        tree.data.insert(index.to_string(), value);
                    }
                }
                Some(Value::Tree(tree))
            }
            Raw::Object(map) => Some(Value::Tree(Config::from_object(map))),
        }
    }

    /// Flatten this value back into a raw JSON value.
    pub fn to_raw(&self) -> Raw {
        match self {
            Value::Bool(b) => Raw::Bool(*b),
            Value::Int(i) => Raw::Number((*i).into()),
            // non-finite floats have no JSON number form; fall back to
            // their natural textual representation
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Raw::Number)
                .unwrap_or_else(|| Raw::String(f.to_string())),
            Value::Str(s) => Raw::String(s.clone()),
            Value::Tree(tree) => tree.to_value(),
        }
    }

    /// Return the boolean leaf value, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Return the integer leaf value, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Return the float leaf value, if this is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Return the string leaf value, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Return the nested subtree, if this is one.
    pub fn as_tree(&self) -> Option<&Config> {
        match self {
            Value::Tree(tree) => Some(tree),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Config> for Value {
    fn from(v: Config) -> Self {
        Value::Tree(v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            // fully qualified: Config's inherent snapshot `serialize`
            // would otherwise shadow the trait method
            Value::Tree(tree) => Serialize::serialize(tree, serializer),
        }
    }
}

/// Iterator over the direct children of a node, in insertion order.
pub type Iter<'a> = indexmap::map::Iter<'a, String, Value>;

/// A hierarchical configuration node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    data: IndexMap<String, Value>,
}

impl Config {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a raw nested mapping.
    ///
    /// The top-level raw value must be a mapping; nested mappings become
    /// child trees recursively.
    pub fn from_value(value: Raw) -> Result<Self> {
        match value {
            Raw::Object(map) => Ok(Self::from_object(map)),
            other => Err(ConfigError::InvalidSource(format!(
                "expected a mapping, got {other}"
            ))),
        }
    }

    pub(crate) fn from_object(map: serde_json::Map<String, Raw>) -> Self {
        let mut data = IndexMap::new();
        for (key, raw) in map {
            if let Some(value) = Value::from_raw(raw) {
                data.insert(key, value);
            }
        }
        Config { data }
    }

    /// Load a tree from any supported source.
    ///
    /// Equivalent to `Loader::default().load(source)`; see [`Loader`] for
    /// the file, directory, mapping and tree source kinds.
    pub fn load(source: impl Into<Source>) -> Result<Self> {
        Loader::default().load(source)
    }

    /// Save this tree to a path, picking the driver by file extension.
    ///
    /// Equivalent to `Loader::default().save(self, path)`.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        Loader::default().save(self, path.as_ref())
    }

    /// Look up a value by dotted path.
    ///
    /// Descends one segment per tree level. Returns `None` as soon as any
    /// segment is absent or a non-terminal segment is not a subtree.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = self;
        let mut parts = path.split('.').peekable();

        loop {
            let part = parts.next()?;
            let value = node.data.get(part)?;

            if parts.peek().is_none() {
                return Some(value);
            }

            match value {
                Value::Tree(tree) => node = tree,
                _ => return None,
            }
        }
    }

    /// Set a value at a dotted path.
    ///
    /// Intermediate nodes are created as needed; any scalar found along
    /// the way is destructively replaced by a subtree. The final segment
    /// replaces whatever was there, including a whole subtree.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        self.set_value(path, value.into());
    }

    fn set_value(&mut self, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                self.data.insert(path.to_string(), value);
            }
            Some((head, rest)) => {
                let entry = self
                    .data
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Tree(Config::new()));

                if let Value::Tree(child) = entry {
                    child.set_value(rest, value);
                } else {
                    let mut child = Config::new();
                    child.set_value(rest, value);
                    *entry = Value::Tree(child);
                }
            }
        }
    }

    /// Remove the value at a dotted path.
    ///
    /// A missing intermediate segment, or a missing final key, is a
    /// silent no-op.
    pub fn remove(&mut self, path: &str) {
        match path.split_once('.') {
            None => {
                self.data.shift_remove(path);
            }
            Some((head, rest)) => {
                if let Some(Value::Tree(child)) = self.data.get_mut(head) {
                    child.remove(rest);
                }
            }
        }
    }

    /// Check whether a dotted path resolves to a value.
    pub fn exists(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Deep-merge another tree into this one.
    ///
    /// Keys absent here are adopted; keys that are subtrees on both sides
    /// merge recursively; everything else is overwritten by the incoming
    /// value. Sibling keys not present in `other` are never discarded.
    pub fn append(&mut self, other: Config) {
        for (key, incoming) in other.data {
            match (self.data.get_mut(&key), incoming) {
                (Some(Value::Tree(existing)), Value::Tree(new)) => existing.append(new),
                (_, incoming) => {
                    self.data.insert(key, incoming);
                }
            }
        }
    }

    /// Deep-merge a raw nested mapping into this tree.
    ///
    /// Fails with [`ConfigError::InvalidSource`] if the raw value is not
    /// a mapping.
    pub fn append_value(&mut self, value: Raw) -> Result<()> {
        self.append(Config::from_value(value)?);
        Ok(())
    }

    /// Flatten the tree back into a raw nested mapping.
    ///
    /// The inverse of [`Config::from_value`] for the scalar and
    /// nested-mapping subset of the type space.
    pub fn to_value(&self) -> Raw {
        Raw::Object(
            self.data
                .iter()
                .map(|(key, value)| (key.clone(), value.to_raw()))
                .collect(),
        )
    }

    /// Number of direct children at this node.
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Whether this node has no children.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over direct children in stable insertion order.
    pub fn iter(&self) -> Iter<'_> {
        self.data.iter()
    }

    /// Encode the tree as an opaque byte snapshot.
    ///
    /// Lossless for the scalar/nested-mapping subset; the encoding is not
    /// human-readable and not guaranteed stable across crate versions.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Rebuild a tree from a byte snapshot produced by [`Config::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let raw: Raw = rmp_serde::from_slice(bytes)?;
        Config::from_value(raw)
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, value) in &self.data {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
