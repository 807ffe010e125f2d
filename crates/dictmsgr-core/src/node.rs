//! Context tree nodes.
//!
//! A [`Context`] is a handle to one mapping level of the tree. Handles are
//! cheap to clone and all clones observe the same node. A parent owns the
//! children stored in its entries; the `root` back-reference held by every
//! adopted node is weak and never keeps the root alive.
//!
//! The tree is single-threaded (`Rc`/`RefCell`). Callers that share it across
//! threads must serialize access themselves.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{ContextError, Result};
use crate::subscription::SubscriptionRegistry;

/// A value stored in the tree: either an opaque leaf or a nested node.
pub enum Entry<V = serde_json::Value> {
    /// Opaque leaf value
    Leaf(V),
    /// Nested context
    Node(Context<V>),
}

impl<V> Entry<V> {
    /// Get the leaf value, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&V> {
        match self {
            Entry::Leaf(value) => Some(value),
            Entry::Node(_) => None,
        }
    }

    /// Take the leaf value, if this is a leaf.
    pub fn into_leaf(self) -> Option<V> {
        match self {
            Entry::Leaf(value) => Some(value),
            Entry::Node(_) => None,
        }
    }

    /// Get the nested node, if this is a node.
    pub fn as_node(&self) -> Option<&Context<V>> {
        match self {
            Entry::Node(node) => Some(node),
            Entry::Leaf(_) => None,
        }
    }

    /// Take the nested node, if this is a node.
    pub fn into_node(self) -> Option<Context<V>> {
        match self {
            Entry::Node(node) => Some(node),
            Entry::Leaf(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Entry::Node(_))
    }
}

impl<V: Clone> Clone for Entry<V> {
    fn clone(&self) -> Self {
        match self {
            Entry::Leaf(value) => Entry::Leaf(value.clone()),
            Entry::Node(node) => Entry::Node(node.clone()),
        }
    }
}

/// Leaves compare by value, nodes by identity.
impl<V: PartialEq> PartialEq for Entry<V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Entry::Leaf(a), Entry::Leaf(b)) => a == b,
            (Entry::Node(a), Entry::Node(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Entry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
            Entry::Node(node) => f.debug_tuple("Node").field(node).finish(),
        }
    }
}

impl<V> From<Context<V>> for Entry<V> {
    fn from(node: Context<V>) -> Self {
        Entry::Node(node)
    }
}

impl From<serde_json::Value> for Entry<serde_json::Value> {
    fn from(value: serde_json::Value) -> Self {
        Entry::Leaf(value)
    }
}

/// Shared state behind a [`Context`] handle.
pub(crate) struct Inner<V> {
    /// Entries in insertion order
    pub(crate) entries: IndexMap<String, Entry<V>>,
    /// Local callbacks keyed by leaf segment
    pub(crate) subscriptions: SubscriptionRegistry<V>,
    /// Set once, when this node is first stored under a parent
    pub(crate) root: Option<Weak<RefCell<Inner<V>>>>,
}

/// A node of the context tree.
///
/// A freshly created context has no root and acts as the root of its own
/// tree. It is given a root when it is first stored under another context,
/// and it can never be stored anywhere else afterwards.
pub struct Context<V = serde_json::Value> {
    inner: Rc<RefCell<Inner<V>>>,
}

impl<V> Clone for Context<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> Default for Context<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Context<V> {
    /// Create an empty, unrooted context.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                entries: IndexMap::new(),
                subscriptions: SubscriptionRegistry::default(),
                root: None,
            })),
        }
    }

    pub(crate) fn inner(&self) -> &RefCell<Inner<V>> {
        &self.inner
    }

    /// True if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Context<V>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// True once this context has been stored under a parent.
    pub fn is_rooted(&self) -> bool {
        self.inner.borrow().root.is_some()
    }

    /// The effective root of the tree this context belongs to.
    ///
    /// Follows root references up to a context that has none. A context that
    /// was never adopted is its own root. If the root has already been
    /// dropped, the last live context on the way is returned.
    pub fn root(&self) -> Context<V> {
        let mut current = self.clone();
        loop {
            let next = current.inner.borrow().root.as_ref().and_then(Weak::upgrade);
            match next {
                Some(inner) => current = Context { inner },
                None => return current,
            }
        }
    }

    /// Fix this context's root as part of storing it under a parent whose
    /// effective root is `root`.
    ///
    /// Fails if this context already has a root, or if it is `root` itself
    /// (storing a tree's root inside its own subtree).
    pub(crate) fn adopt_into(&self, root: &Context<V>, path: &str) -> Result<()> {
        if self.ptr_eq(root) {
            return Err(ContextError::already_rooted(path));
        }
        let mut inner = self.inner.borrow_mut();
        if inner.root.is_some() {
            return Err(ContextError::already_rooted(path));
        }
        inner.root = Some(Rc::downgrade(&root.inner));
        debug!(path = path, "Adopted nested context");
        Ok(())
    }

    /// Get or create the child node under `segment`, without notification.
    ///
    /// Returns `Ok(None)` when the segment is absent and `create` is false.
    pub(crate) fn child_node(
        &self,
        segment: &str,
        create: bool,
        path: &str,
    ) -> Result<Option<Context<V>>> {
        let found = match self.inner.borrow().entries.get(segment) {
            Some(Entry::Node(node)) => Some(node.clone()),
            Some(Entry::Leaf(_)) => return Err(ContextError::not_a_node(path, segment)),
            None => None,
        };
        if found.is_some() || !create {
            return Ok(found);
        }

        let child = Context::new();
        child.adopt_into(&self.root(), path)?;
        self.inner
            .borrow_mut()
            .entries
            .insert(segment.to_string(), Entry::Node(child.clone()));
        trace!(segment = segment, path = path, "Created intermediate context");
        Ok(Some(child))
    }

    /// Number of direct entries.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Direct entry keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().entries.keys().cloned().collect()
    }

    /// Number of callbacks registered directly on this node, across all leaves.
    pub fn subscription_total(&self) -> usize {
        self.inner.borrow().subscriptions.total()
    }
}

impl<V: Clone> Context<V> {
    /// Direct entry values in insertion order.
    pub fn values(&self) -> Vec<Entry<V>> {
        self.inner.borrow().entries.values().cloned().collect()
    }

    /// Direct `(key, value)` pairs in insertion order.
    pub fn entries(&self) -> Vec<(String, Entry<V>)> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }
}

/// Renders entries and, per leaf, how many callbacks are registered.
impl<V: fmt::Debug> fmt::Debug for Context<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Context")
                .field("entries", &inner.entries)
                .field("subscriptions", &inner.subscriptions.counts())
                .finish(),
            Err(_) => f.write_str("Context { <borrowed> }"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_context_is_its_own_root() {
        let ctx = Context::<i32>::new();
        assert!(!ctx.is_rooted());
        assert!(ctx.root().ptr_eq(&ctx));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_adopt_sets_root_once() {
        let root = Context::<i32>::new();
        let child = Context::<i32>::new();
        child.adopt_into(&root, "child").unwrap();
        assert!(child.is_rooted());
        assert!(child.root().ptr_eq(&root));

        let other = Context::<i32>::new();
        assert_eq!(
            child.adopt_into(&other, "again"),
            Err(ContextError::AlreadyRooted {
                path: "again".to_string()
            })
        );
        assert!(child.root().ptr_eq(&root));
    }

    #[test]
    fn test_adopt_into_self_is_rejected() {
        let root = Context::<i32>::new();
        assert!(root.adopt_into(&root, "me").is_err());
        assert!(!root.is_rooted());
    }

    #[test]
    fn test_root_follows_chain() {
        let top = Context::<i32>::new();
        let middle = Context::<i32>::new();
        let bottom = Context::<i32>::new();
        bottom.adopt_into(&middle, "b").unwrap();
        middle.adopt_into(&top, "m").unwrap();
        assert!(bottom.root().ptr_eq(&top));
    }

    #[test]
    fn test_root_falls_back_when_dropped() {
        let child = Context::<i32>::new();
        {
            let root = Context::<i32>::new();
            child.adopt_into(&root, "child").unwrap();
        }
        assert!(child.is_rooted());
        assert!(child.root().ptr_eq(&child));
    }

    #[test]
    fn test_child_node_create_and_lookup() {
        let root = Context::<i32>::new();
        assert!(root.child_node("a", false, "a/x").unwrap().is_none());
        assert!(root.is_empty());

        let created = root.child_node("a", true, "a/x").unwrap().unwrap();
        assert!(created.root().ptr_eq(&root));
        assert_eq!(root.keys(), vec!["a".to_string()]);

        let found = root.child_node("a", false, "a/x").unwrap().unwrap();
        assert!(found.ptr_eq(&created));
    }

    #[test]
    fn test_child_node_through_leaf_fails() {
        let root = Context::<i32>::new();
        root.inner()
            .borrow_mut()
            .entries
            .insert("a".to_string(), Entry::Leaf(1));
        assert_eq!(
            root.child_node("a", true, "a/b").unwrap_err(),
            ContextError::NotANode {
                path: "a/b".to_string(),
                segment: "a".to_string()
            }
        );
    }

    #[test]
    fn test_entry_equality() {
        let node = Context::<i32>::new();
        assert_eq!(Entry::Leaf(1), Entry::Leaf(1));
        assert_ne!(Entry::Leaf(1), Entry::Leaf(2));
        assert_eq!(Entry::Node(node.clone()), Entry::Node(node.clone()));
        assert_ne!(Entry::Node(node), Entry::Node(Context::new()));
    }

    #[test]
    fn test_debug_shows_callback_counts() {
        let ctx = Context::<i32>::new();
        ctx.subscribe("a", |_, _| {}).unwrap();
        ctx.subscribe("a", |_, _| {}).unwrap();
        ctx.set("a", 1).unwrap();
        ctx.set("b/c", 2).unwrap();

        assert_eq!(
            format!("{ctx:?}"),
            "Context { entries: {\"a\": Leaf(1), \"b\": Node(Context { entries: \
             {\"c\": Leaf(2)}, subscriptions: {} })}, subscriptions: {\"a\": 2} }"
        );
    }
}
