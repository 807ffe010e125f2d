//! JSON seeding and snapshots.
//!
//! JSON objects map to contexts and every other JSON value maps to a leaf.
//! Snapshots render the tree back the same way; subscriptions and root
//! references are not part of a snapshot.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::node::{Context, Entry};
use crate::store::Seed;

impl From<Value> for Seed<Value> {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Seed::map(map.into_iter().map(|(k, v)| (k, Seed::from(v)))),
            other => Seed::Leaf(other),
        }
    }
}

impl Context<Value> {
    /// Build a context tree from a JSON object.
    ///
    /// Nested objects become nested contexts. Keys are applied as topics, so
    /// a key like `"batch/gt"` lands under `batch`.
    pub fn from_json(document: Map<String, Value>) -> Result<Self> {
        Context::with_entries(document.into_iter().map(|(k, v)| (k, Seed::from(v))))
    }

    /// Load a JSON object into this context, notifying subscribers.
    pub fn load_json(&self, document: Map<String, Value>) -> Result<()> {
        self.bulk_load(document.into_iter().map(|(k, v)| (k, Seed::from(v))))
    }
}

impl<V: Serialize> Context<V> {
    /// Snapshot the tree below this context as a JSON object.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl<V: Serialize> Serialize for Context<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let inner = self.inner().borrow();
        let mut map = serializer.serialize_map(Some(inner.entries.len()))?;
        for (key, entry) in &inner.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl<V: Serialize> Serialize for Entry<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Entry::Leaf(value) => value.serialize(serializer),
            Entry::Node(node) => node.serialize(serializer),
        }
    }
}
