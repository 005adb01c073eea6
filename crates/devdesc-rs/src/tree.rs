// crates/devdesc-rs/src/tree.rs

//! A generic, format-neutral document tree used by the diff analyzer.
//!
//! IODD documents map elements to nodes directly. EDS documents map each
//! section to a `Section` node and each entry to an `Entry` child.

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocNode {
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Trimmed text content, if any.
    pub text: Option<String>,
    pub children: Vec<DocNode>,
}

impl DocNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: DocNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&DocNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Number of nodes in this subtree, counting elements and attributes.
    pub fn node_count(&self) -> usize {
        1 + self.attributes.len() + self.children.iter().map(DocNode::node_count).sum::<usize>()
    }

    /// Finds a descendant by a `/`-separated path of element names.
    pub fn find_path(&self, path: &str) -> Option<&DocNode> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }
}
