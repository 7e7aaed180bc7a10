#![forbid(unsafe_code)]

//! NodeSet type for canonicalization and transforms.
//!
//! A `NodeSet` is the set of document nodes a reference selects. Attributes
//! and namespace declarations are not separate nodes in [`XmlDocument`]; they
//! are rendered whenever their element is in the set.

use crate::document::{NodeId, NodeKind, XmlDocument};
use std::collections::HashSet;

/// A set of XML document nodes identified by [`NodeId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: HashSet<NodeId>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every node reachable from the document node.
    pub fn all(doc: &XmlDocument) -> Self {
        Self::tree(doc, doc.root(), true)
    }

    /// Every node reachable from the document node except comments.
    ///
    /// This is what a same-document `URI=""` reference selects.
    pub fn all_without_comments(doc: &XmlDocument) -> Self {
        Self::tree(doc, doc.root(), false)
    }

    /// `root` and its descendants, optionally dropping comments.
    pub fn tree(doc: &XmlDocument, root: NodeId, with_comments: bool) -> Self {
        let nodes = doc
            .descendants(root)
            .filter(|&n| with_comments || !matches!(doc.kind(n), Some(NodeKind::Comment(_))))
            .collect();
        Self { nodes }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn insert(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    pub fn remove(&mut self, id: NodeId) {
        self.nodes.remove(&id);
    }

    /// Remove `root` and all of its descendants.
    pub fn remove_subtree(&mut self, doc: &XmlDocument, root: NodeId) {
        for n in doc.descendants(root) {
            self.nodes.remove(&n);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
