//! Per-node subscription registry.
//!
//! Each node keeps its own registry keyed by leaf segment only, not by the
//! full path from the root. Two nodes holding a leaf with the same name never
//! share callbacks, and every write of that leaf on a node fires that node's
//! whole list for it.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::node::{Context, Entry};

/// A change callback.
///
/// Receives the effective root of the tree and the value just written.
/// Callbacks run synchronously inside the write that triggered them and may
/// write back into the tree. Nothing guards against a callback re-triggering
/// itself: a callback that writes to its own leaf recurses until the stack
/// runs out.
pub type Callback<V> = Rc<dyn Fn(&Context<V>, &Entry<V>)>;

/// Callbacks registered on one node, grouped by leaf segment.
pub(crate) struct SubscriptionRegistry<V> {
    topics: HashMap<String, Vec<Callback<V>>>,
}

impl<V> Default for SubscriptionRegistry<V> {
    fn default() -> Self {
        Self {
            topics: HashMap::new(),
        }
    }
}

impl<V> SubscriptionRegistry<V> {
    /// Append a callback for a leaf. Duplicates are kept.
    pub fn register(&mut self, leaf: &str, callback: Callback<V>) {
        self.topics
            .entry(leaf.to_string())
            .or_default()
            .push(callback);
    }

    /// Snapshot of the callbacks for a leaf, in registration order.
    ///
    /// Returned by value so dispatch can run with no borrow on the node held.
    pub fn callbacks(&self, leaf: &str) -> Vec<Callback<V>> {
        self.topics.get(leaf).cloned().unwrap_or_default()
    }

    /// Number of callbacks registered for a leaf.
    pub fn count(&self, leaf: &str) -> usize {
        self.topics.get(leaf).map_or(0, Vec::len)
    }

    /// Callback count per leaf, ordered by leaf.
    pub fn counts(&self) -> BTreeMap<&str, usize> {
        self.topics
            .iter()
            .map(|(leaf, callbacks)| (leaf.as_str(), callbacks.len()))
            .collect()
    }

    /// Number of callbacks registered on this node across all leaves.
    pub fn total(&self) -> usize {
        self.topics.values().map(Vec::len).sum()
    }
}
