//! Reading, writing and notification.
//!
//! A write resolves its topic (creating missing intermediate nodes), stores
//! the value on the owning node, adopts it if it is a node, then runs the
//! owning node's callbacks for the leaf in registration order. Everything
//! happens before `write` returns.
//!
//! Callbacks run with no borrow held on any node, so they are free to read
//! and write the tree. There is no cycle or depth guard: a callback that
//! writes the leaf that triggered it re-enters `write` and recurses.

use std::rc::Rc;

use tracing::debug;

use crate::error::{ContextError, Result};
use crate::node::{Context, Entry};
use crate::path::Topic;
use crate::resolve::{resolve, Mode};

/// Input for [`Context::bulk_load`] and [`Context::with_entries`].
///
/// `Map` is a plain nested mapping. Loaded onto a key that already holds a
/// context it is merged into that context; otherwise it is wrapped into a
/// fresh context before it is stored.
pub enum Seed<V = serde_json::Value> {
    /// Leaf value
    Leaf(V),
    /// Plain mapping, merged into an existing context or wrapped into a new one
    Map(Vec<(String, Seed<V>)>),
    /// Existing context, adopted as is
    Node(Context<V>),
}

impl<V> Seed<V> {
    /// Build a seed mapping from `(key, seed)` pairs.
    pub fn map<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Seed<V>)>,
        K: Into<String>,
    {
        Seed::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<V> From<Entry<V>> for Seed<V> {
    fn from(entry: Entry<V>) -> Self {
        match entry {
            Entry::Leaf(value) => Seed::Leaf(value),
            Entry::Node(node) => Seed::Node(node),
        }
    }
}

impl<V> From<Context<V>> for Seed<V> {
    fn from(node: Context<V>) -> Self {
        Seed::Node(node)
    }
}

impl<V: Clone> Context<V> {
    /// Create a context pre-populated from `(key, seed)` pairs.
    ///
    /// Plain mappings are wrapped recursively. Keys containing `/` are
    /// treated as topics.
    pub fn with_entries<I, K>(seeds: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Seed<V>)>,
        K: Into<String>,
    {
        let ctx = Context::new();
        ctx.bulk_load(seeds)?;
        Ok(ctx)
    }

    /// Store `value` at `topic` and notify the leaf's subscribers.
    ///
    /// Missing intermediate nodes are created. Storing a context that already
    /// belongs to a tree fails with [`ContextError::AlreadyRooted`]; the value
    /// is then left unset and no callback runs.
    pub fn write(&self, topic: &str, value: impl Into<Entry<V>>) -> Result<()> {
        let topic = Topic::new(topic);
        let owner = resolve(self, &topic, Mode::Create)?;
        owner.store_leaf(&topic, value.into())
    }

    /// Store a leaf value at `topic`. Shorthand for `write(topic, Entry::Leaf(value))`.
    pub fn set(&self, topic: &str, value: V) -> Result<()> {
        self.write(topic, Entry::Leaf(value))
    }

    fn store_leaf(&self, topic: &Topic<'_>, entry: Entry<V>) -> Result<()> {
        let root = self.root();
        if let Entry::Node(child) = &entry {
            child.adopt_into(&root, topic.as_str())?;
        }

        let replaced = self
            .inner()
            .borrow_mut()
            .entries
            .insert(topic.leaf().to_string(), entry.clone());
        // dropped only after the borrow is released
        drop(replaced);

        self.dispatch(topic, &root, &entry);
        Ok(())
    }

    /// Run this node's callbacks for the leaf of `topic`.
    fn dispatch(&self, topic: &Topic<'_>, root: &Context<V>, entry: &Entry<V>) {
        let callbacks = self.inner().borrow().subscriptions.callbacks(topic.leaf());
        if !callbacks.is_empty() {
            debug!(
                topic = topic.as_str(),
                count = callbacks.len(),
                "Dispatching callbacks"
            );
        }
        for callback in callbacks {
            callback(root, entry);
        }
    }

    /// Register `callback` for the leaf of `topic`.
    ///
    /// Missing intermediate nodes are created. The callback is attached to
    /// the node owning the leaf and fires on every write of that leaf on that
    /// node, whichever handle the write goes through.
    pub fn subscribe<F>(&self, topic: &str, callback: F) -> Result<()>
    where
        F: Fn(&Context<V>, &Entry<V>) + 'static,
    {
        let topic = Topic::new(topic);
        let owner = resolve(self, &topic, Mode::Create)?;
        owner
            .inner()
            .borrow_mut()
            .subscriptions
            .register(topic.leaf(), Rc::new(callback));
        debug!(topic = topic.as_str(), "Subscribed");
        Ok(())
    }

    /// Number of callbacks registered for the leaf of `topic`.
    ///
    /// Never creates nodes; a missing path has no subscribers.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let topic = Topic::new(topic);
        resolve(self, &topic, Mode::Lookup)
            .map(|owner| owner.inner().borrow().subscriptions.count(topic.leaf()))
            .unwrap_or(0)
    }

    /// Read the value at `topic`.
    pub fn read(&self, topic: &str) -> Result<Entry<V>> {
        let topic = Topic::new(topic);
        let owner = resolve(self, &topic, Mode::Lookup)?;
        let found = owner.inner().borrow().entries.get(topic.leaf()).cloned();
        found.ok_or_else(|| ContextError::not_found(topic.as_str(), topic.leaf()))
    }

    /// Read the value at `topic`, or `None` if any segment is missing.
    pub fn get(&self, topic: &str) -> Option<Entry<V>> {
        self.read(topic).ok()
    }

    /// Read a leaf value.
    ///
    /// A nested context at `topic` is not a leaf and reports
    /// [`ContextError::NotFound`].
    pub fn get_leaf(&self, topic: &str) -> Result<V> {
        match self.read(topic)? {
            Entry::Leaf(value) => Ok(value),
            Entry::Node(_) => Err(ContextError::not_found(topic, Topic::new(topic).leaf())),
        }
    }

    /// Read a nested context.
    pub fn get_node(&self, topic: &str) -> Result<Context<V>> {
        match self.read(topic)? {
            Entry::Node(node) => Ok(node),
            Entry::Leaf(_) => Err(ContextError::not_a_node(topic, Topic::new(topic).leaf())),
        }
    }

    /// True if a value exists at `topic`. Never creates nodes.
    pub fn contains_key(&self, topic: &str) -> bool {
        let topic = Topic::new(topic);
        resolve(self, &topic, Mode::Lookup)
            .map(|owner| owner.inner().borrow().entries.contains_key(topic.leaf()))
            .unwrap_or(false)
    }

    /// Remove the value at `topic` and return it.
    ///
    /// Removing a nested context drops its whole subtree from the tree,
    /// including callbacks registered below it. Deletion does not notify.
    pub fn delete(&self, topic: &str) -> Result<Entry<V>> {
        let topic = Topic::new(topic);
        let owner = resolve(self, &topic, Mode::Lookup)?;
        let removed = owner
            .inner()
            .borrow_mut()
            .entries
            .shift_remove(topic.leaf());
        removed.ok_or_else(|| ContextError::not_found(topic.as_str(), topic.leaf()))
    }

    /// Replace the leaf at `topic` with `f(old)` and notify like [`write`](Self::write).
    ///
    /// Only leaves can be modified: a nested context at `topic` reports
    /// [`ContextError::NotFound`] (see [`get_leaf`](Self::get_leaf)) and is
    /// left untouched.
    pub fn modify<F>(&self, topic: &str, f: F) -> Result<()>
    where
        F: FnOnce(V) -> V,
    {
        let current = self.get_leaf(topic)?;
        self.write(topic, Entry::Leaf(f(current)))
    }

    /// Write every `(key, seed)` pair in order.
    ///
    /// Leaves and contexts go through [`write`](Self::write), so subscribers
    /// fire as they would for individual writes. A plain mapping loaded onto
    /// a key that already holds a context is merged into it key by key, which
    /// fires that context's subscribers, and then the key's own subscribers
    /// fire with the merged context. Keys absent from the mapping are kept.
    /// Otherwise the mapping is wrapped into a new context and written. Stops at the first error; pairs written
    /// before it stay written.
    pub fn bulk_load<I, K>(&self, seeds: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Seed<V>)>,
        K: Into<String>,
    {
        for (key, seed) in seeds {
            let key = key.into();
            match seed {
                Seed::Leaf(value) => self.write(&key, Entry::Leaf(value))?,
                Seed::Node(node) => self.write(&key, Entry::Node(node))?,
                Seed::Map(pairs) => self.load_map(&key, pairs)?,
            }
        }
        Ok(())
    }

    fn load_map(&self, key: &str, pairs: Vec<(String, Seed<V>)>) -> Result<()> {
        if let Some(Entry::Node(existing)) = self.get(key) {
            existing.bulk_load(pairs)?;
            let topic = Topic::new(key);
            let owner = resolve(self, &topic, Mode::Lookup)?;
            owner.dispatch(&topic, &owner.root(), &Entry::Node(existing));
            return Ok(());
        }
        let node = Context::with_entries(pairs)?;
        self.write(key, node)
    }
}
