//! Topic parsing.
//!
//! Topics are slash-separated strings like "batch/img_metas". The last
//! segment is the leaf that is actually read, written, deleted or subscribed;
//! every segment before it names an intermediate node.
//!
//! Segments are taken verbatim. A leading, trailing or doubled `/` yields an
//! empty segment, and the empty string is a valid key like any other.

/// The hierarchy delimiter.
pub const DELIMITER: char = '/';

/// A parsed topic borrowing from the original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic<'a> {
    /// The original topic string
    raw: &'a str,
    /// Segments split by '/', always at least one
    segments: Vec<&'a str>,
}

impl<'a> Topic<'a> {
    /// Split a topic string into segments.
    pub fn new(topic: &'a str) -> Self {
        Self {
            raw: topic,
            segments: topic.split(DELIMITER).collect(),
        }
    }

    /// Get the raw topic string.
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Get all segments, leaf included.
    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Segments naming the intermediate nodes, in walk order.
    pub fn parents(&self) -> &[&'a str] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The final segment.
    pub fn leaf(&self) -> &'a str {
        // split always yields at least one item
        self.segments[self.segments.len() - 1]
    }

    /// True when the topic addresses an entry of the node it is applied to.
    pub fn is_direct(&self) -> bool {
        self.segments.len() == 1
    }
}

impl std::fmt::Display for Topic<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<'a> From<&'a str> for Topic<'a> {
    fn from(s: &'a str) -> Self {
        Topic::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_direct_topic() {
        let topic = Topic::new("global_iters");
        assert!(topic.is_direct());
        assert!(topic.parents().is_empty());
        assert_eq!(topic.leaf(), "global_iters");
    }

    #[test]
    fn test_nested_topic() {
        let topic = Topic::new("batch/multi/level/assign");
        assert!(!topic.is_direct());
        assert_eq!(topic.parents(), &["batch", "multi", "level"]);
        assert_eq!(topic.leaf(), "assign");
        assert_eq!(topic.to_string(), "batch/multi/level/assign");
    }

    #[test]
    fn test_empty_segments_are_kept() {
        let leading = Topic::new("/a");
        assert_eq!(leading.parents(), &[""]);
        assert_eq!(leading.leaf(), "a");

        let trailing = Topic::new("a/");
        assert_eq!(trailing.parents(), &["a"]);
        assert_eq!(trailing.leaf(), "");

        let doubled = Topic::new("a//b");
        assert_eq!(doubled.segments(), &["a", "", "b"]);
    }

    #[test]
    fn test_empty_topic() {
        let topic = Topic::new("");
        assert!(topic.is_direct());
        assert_eq!(topic.leaf(), "");
    }
}
