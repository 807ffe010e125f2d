//! Error types for context tree operations.

/// Errors returned by path-addressed operations on a [`Context`](crate::Context).
///
/// Every variant carries the full path that was requested so callers can
/// report it without keeping their own copy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// A segment of the path does not exist.
    ///
    /// Only raised by non-creating operations (`read`, `delete`, `modify`,
    /// `get_node`); `write` and `subscribe` create missing intermediate nodes.
    #[error("Path not found: '{path}' (missing segment '{segment}')")]
    NotFound { path: String, segment: String },

    /// A segment the path needs to descend through holds a leaf value.
    #[error("Path '{path}' descends through leaf value at segment '{segment}'")]
    NotANode { path: String, segment: String },

    /// The node being stored already belongs to a tree.
    ///
    /// A node is adopted at most once; it also cannot be adopted into its
    /// own subtree.
    #[error("Nested context can not be reassigned (at '{path}')")]
    AlreadyRooted { path: String },
}

impl ContextError {
    pub(crate) fn not_found(path: &str, segment: &str) -> Self {
        ContextError::NotFound {
            path: path.to_string(),
            segment: segment.to_string(),
        }
    }

    pub(crate) fn not_a_node(path: &str, segment: &str) -> Self {
        ContextError::NotANode {
            path: path.to_string(),
            segment: segment.to_string(),
        }
    }

    pub(crate) fn already_rooted(path: &str) -> Self {
        ContextError::AlreadyRooted {
            path: path.to_string(),
        }
    }

    /// The path this error was raised for.
    pub fn path(&self) -> &str {
        match self {
            ContextError::NotFound { path, .. }
            | ContextError::NotANode { path, .. }
            | ContextError::AlreadyRooted { path } => path,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ContextError> = std::result::Result<T, E>;
