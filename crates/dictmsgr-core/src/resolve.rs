//! Path resolution.
//!
//! Walks the intermediate segments of a topic from a starting context and
//! returns the context that directly owns the leaf. The walk is iterative so
//! deep topics do not grow the call stack.

use tracing::trace;

use crate::error::{ContextError, Result};
use crate::node::Context;
use crate::path::Topic;

/// Whether resolution may create missing intermediate nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Create missing nodes (write, subscribe)
    Create,
    /// Fail on missing nodes (read, delete)
    Lookup,
}

/// Resolve `topic` to the context owning its leaf.
///
/// The leaf itself is not looked at; the caller reads, writes, deletes or
/// subscribes it on the returned context.
pub(crate) fn resolve<V>(start: &Context<V>, topic: &Topic<'_>, mode: Mode) -> Result<Context<V>> {
    let mut current = start.clone();
    for segment in topic.parents() {
        let next = current.child_node(segment, mode == Mode::Create, topic.as_str())?;
        current = match next {
            Some(node) => node,
            None => return Err(ContextError::not_found(topic.as_str(), segment)),
        };
    }
    trace!(topic = topic.as_str(), ?mode, "Resolved topic");
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Entry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_direct_topic_resolves_to_start() {
        let root = Context::<i32>::new();
        let owner = resolve(&root, &Topic::new("counter"), Mode::Lookup).unwrap();
        assert!(owner.ptr_eq(&root));
    }

    #[test]
    fn test_create_builds_chain() {
        let root = Context::<i32>::new();
        let owner = resolve(&root, &Topic::new("a/b/c"), Mode::Create).unwrap();

        let a = root.child_node("a", false, "a").unwrap().unwrap();
        let b = a.child_node("b", false, "b").unwrap().unwrap();
        assert!(owner.ptr_eq(&b));
        assert!(owner.root().ptr_eq(&root));
        // the leaf is never created
        assert!(owner.is_empty());
    }

    #[test]
    fn test_lookup_missing_segment() {
        let root = Context::<i32>::new();
        resolve(&root, &Topic::new("a/x"), Mode::Create).unwrap();

        let err = resolve(&root, &Topic::new("a/b/c"), Mode::Lookup).unwrap_err();
        assert_eq!(
            err,
            ContextError::NotFound {
                path: "a/b/c".to_string(),
                segment: "b".to_string()
            }
        );
        // lookup never creates
        let a = root.child_node("a", false, "a").unwrap().unwrap();
        assert!(a.is_empty());
    }

    #[test]
    fn test_reuses_existing_nodes() {
        let root = Context::<i32>::new();
        let first = resolve(&root, &Topic::new("a/b/x"), Mode::Create).unwrap();
        let second = resolve(&root, &Topic::new("a/b/y"), Mode::Create).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn test_descending_through_leaf_fails() {
        let root = Context::<i32>::new();
        root.inner()
            .borrow_mut()
            .entries
            .insert("a".to_string(), Entry::Leaf(1));

        for mode in [Mode::Create, Mode::Lookup] {
            let err = resolve(&root, &Topic::new("a/b"), mode).unwrap_err();
            assert!(matches!(err, ContextError::NotANode { .. }));
        }
    }

    #[test]
    fn test_empty_segment_is_a_key() {
        let root = Context::<i32>::new();
        resolve(&root, &Topic::new("/x"), Mode::Create).unwrap();
        assert_eq!(root.keys(), vec![String::new()]);
    }
}
