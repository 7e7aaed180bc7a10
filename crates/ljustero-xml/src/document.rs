#![forbid(unsafe_code)]

//! Owned XML document tree on top of uppsala's arena DOM.
//!
//! Node handles are [`NodeId`]s into the document's arena and are only
//! meaningful for the document that issued them. Every accessor returns
//! `None` (or an error) for a handle the document does not know, instead of
//! panicking. Detaching a node unlinks it from the tree but keeps its arena
//! slot until the document is dropped, so handles stay stable; every
//! traversal starts from [`XmlDocument::root`] and never sees detached nodes.

use ljustero_core::Error;
use std::borrow::Cow;
use std::collections::BTreeMap;
use uppsala::Document;

pub use uppsala::{Attribute, Element, NodeId, NodeKind, QName};

/// An owned, mutable, namespace-aware XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    doc: Document<'static>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Create an empty document holding only the document node.
    pub fn new() -> Self {
        Self { doc: Document::new() }
    }

    /// Parse XML text into an owned tree.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let doc = uppsala::parse(text)
            .map_err(|e| Error::XmlParse(e.to_string()))?
            .into_static();
        tracing::debug!(bytes = text.len(), "parsed XML document");
        Ok(Self { doc })
    }

    /// Parse XML from bytes (UTF-8, or UTF-16 with a byte order mark).
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        let doc = uppsala::parse_bytes(data).map_err(|e| Error::XmlParse(e.to_string()))?;
        tracing::debug!(bytes = data.len(), "parsed XML document");
        Ok(Self { doc })
    }

    /// Serialize the document without pretty-printing.
    pub fn to_xml(&self) -> String {
        self.doc.to_xml()
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.doc.root()
    }

    /// The single top-level element.
    pub fn root_element(&self) -> Option<NodeId> {
        self.doc.document_element()
    }

    // ── Node accessors ───────────────────────────────────────────────

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind<'static>> {
        self.doc.node_kind(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.doc.parent(id)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.doc.children(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element<'static>> {
        self.doc.element(id)
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element<'static>, Error> {
        self.doc
            .element_mut(id)
            .ok_or_else(|| Error::XmlStructure("node is not an element".into()))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Check whether `id` is an element with the given namespace and local
    /// name. An empty `namespace` matches elements in no namespace.
    pub fn is_named(&self, id: NodeId, namespace: &str, local: &str) -> bool {
        self.element(id).is_some_and(|e| {
            e.name.local_name == local && e.name.namespace_uri.as_deref().unwrap_or("") == namespace
        })
    }

    /// Value of an unqualified attribute.
    pub fn attribute(&self, id: NodeId, local: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|a| a.name.namespace_uri.is_none() && a.name.local_name == local)
            .map(|a| a.value.as_ref())
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        self.doc.text_content_deep(id)
    }

    /// Pre-order traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        let below = if self.kind(id).is_some() {
            self.doc.descendants(id)
        } else {
            Vec::new()
        };
        std::iter::once(id)
            .filter(|&n| self.kind(n).is_some())
            .chain(below)
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Check if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.doc.ancestors(node).contains(&ancestor)
    }

    /// Namespace bindings in scope at `id`, keyed by prefix (`""` for the
    /// default namespace). The implicit `xml` binding is not included.
    pub fn in_scope_namespaces(&self, id: NodeId) -> BTreeMap<String, String> {
        let mut chain: Vec<&Element<'static>> = self.element(id).into_iter().collect();
        chain.extend(self.doc.ancestors(id).into_iter().filter_map(|a| self.element(a)));

        let mut result: BTreeMap<String, String> = BTreeMap::new();
        for element in chain.into_iter().rev() {
            for (prefix, uri) in &element.namespace_declarations {
                if prefix == "xml" {
                    continue;
                }
                if uri.is_empty() {
                    result.remove(prefix.as_ref());
                } else {
                    result.insert(prefix.to_string(), uri.to_string());
                }
            }
        }
        result
    }

    // ── Searching ────────────────────────────────────────────────────

    /// Find the first descendant element with the given namespace and local name.
    pub fn find_element(&self, namespace: &str, local: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|&n| self.is_named(n, namespace, local))
    }

    /// Find all descendant elements with the given namespace and local name.
    pub fn find_elements(&self, namespace: &str, local: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|&n| self.is_named(n, namespace, local))
            .collect()
    }

    /// Find the first child element with the given namespace and local name.
    pub fn find_child_element(&self, parent: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.doc
            .children_iter(parent)
            .find(|&c| self.is_named(c, namespace, local))
    }

    /// Find all child elements with the given namespace and local name.
    pub fn find_child_elements(&self, parent: NodeId, namespace: &str, local: &str) -> Vec<NodeId> {
        self.doc
            .children_iter(parent)
            .filter(|&c| self.is_named(c, namespace, local))
            .collect()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Create a detached element.
    pub fn create_element(&mut self, prefix: Option<&str>, local: &str, namespace: Option<&str>) -> NodeId {
        let name = QName {
            namespace_uri: namespace.map(|n| Cow::Owned(n.to_owned())),
            prefix: prefix.map(|p| Cow::Owned(p.to_owned())),
            local_name: Cow::Owned(local.to_owned()),
        };
        self.doc.create_element(name)
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.doc.create_text(text.to_owned())
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        prefix: Option<&str>,
        local: &str,
        namespace: Option<&str>,
    ) -> Result<NodeId, Error> {
        let id = self.create_element(prefix, local, namespace);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        let (Some(parent_kind), Some(child_kind)) = (self.kind(parent), self.kind(child)) else {
            return Err(Error::XmlStructure("node does not belong to this document".into()));
        };
        if matches!(child_kind, NodeKind::Document | NodeKind::Attribute(..)) {
            return Err(Error::XmlStructure("the document node cannot be a child".into()));
        }
        if !matches!(parent_kind, NodeKind::Document | NodeKind::Element(_)) {
            return Err(Error::XmlStructure("only elements and the document have children".into()));
        }
        if self.parent(child).is_some() {
            return Err(Error::XmlStructure("node is already attached".into()));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::XmlStructure("cannot append a node below itself".into()));
        }
        if parent == self.root() && self.is_element(child) && self.root_element().is_some() {
            return Err(Error::XmlStructure("document already has a root element".into()));
        }
        self.doc.append_child(parent, child);
        Ok(())
    }

    /// Remove `id` from its parent. The subtree stays valid and can be
    /// re-attached; its arena slots are released with the document.
    pub fn detach(&mut self, id: NodeId) {
        self.doc.detach(id);
    }

    /// Set (or replace) an unqualified attribute.
    pub fn set_attribute(&mut self, id: NodeId, local: &str, value: &str) -> Result<(), Error> {
        let element = self.element_mut(id)?;
        element.set_attribute(QName::local(local.to_owned()), Cow::Owned(value.to_owned()));
        Ok(())
    }

    /// Declare a namespace binding on an element.
    pub fn declare_namespace(&mut self, id: NodeId, prefix: Option<&str>, uri: &str) -> Result<(), Error> {
        if self.doc.declare_namespace(id, prefix, uri.to_owned()) {
            Ok(())
        } else {
            Err(Error::XmlStructure("node is not an element".into()))
        }
    }

    /// Replace all children of `id` with a single text node.
    ///
    /// An existing lone text child is rewritten in place.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), Error> {
        self.element_mut(id)?;
        let children = self.doc.children(id);
        if let [only] = children.as_slice() {
            if !text.is_empty() {
                if let Some(NodeKind::Text(existing)) = self.doc.node_kind_mut(*only) {
                    *existing = Cow::Owned(text.to_owned());
                    return Ok(());
                }
            }
        }
        for child in children {
            self.doc.detach(child);
        }
        if !text.is_empty() {
            let t = self.create_text(text);
            self.doc.append_child(id, t);
        }
        Ok(())
    }

    /// Copy the root element of `other` into this document, consuming `other`.
    ///
    /// The returned element is detached; attach it with [`append_child`].
    ///
    /// [`append_child`]: XmlDocument::append_child
    pub fn adopt(&mut self, other: XmlDocument) -> Result<NodeId, Error> {
        let source_root = other
            .root_element()
            .ok_or_else(|| Error::XmlStructure("adopted document has no root element".into()))?;
        self.doc
            .import_subtree(&other.doc, source_root)
            .ok_or_else(|| Error::XmlStructure("adopted root element was not copied".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixes_and_namespaces() {
        let doc = XmlDocument::parse(
            r#"<a:root xmlns:a="urn:a" xmlns="urn:d" a:x="1" y="2"><child/></a:root>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        let e = doc.element(root).unwrap();
        assert_eq!(e.name.prefixed_name(), "a:root");
        assert_eq!(e.name.namespace_uri.as_deref(), Some("urn:a"));
        assert_eq!(e.namespace_declarations.len(), 2);
        assert_eq!(doc.attribute(root, "y"), Some("2"));
        assert_eq!(doc.attribute(root, "x"), None);

        let child = doc.find_element("urn:d", "child").unwrap();
        assert!(doc.element(child).unwrap().namespace_declarations.is_empty());
        assert_eq!(doc.in_scope_namespaces(child).get(""), Some(&"urn:d".to_owned()));
    }

    #[test]
    fn test_default_namespace_undeclaration() {
        let doc = XmlDocument::parse(r#"<r xmlns="urn:d"><c xmlns=""/></r>"#).unwrap();
        let c = doc.find_element("", "c").unwrap();
        assert!(doc.in_scope_namespaces(c).is_empty());
    }

    #[test]
    fn test_unprefixed_names_keep_default_namespace() {
        let src = r#"<a xmlns:p="urn:u" xmlns="urn:u"><b>x</b><p:c/></a>"#;
        let doc = XmlDocument::parse(src).unwrap();
        let b = doc.find_element("urn:u", "b").unwrap();
        assert_eq!(doc.element(b).unwrap().name.prefix, None);
        assert_eq!(doc.to_xml(), src);
    }

    #[test]
    fn test_mutation_and_text() {
        let mut doc = XmlDocument::parse("<r><v>old</v></r>").unwrap();
        let v = doc.find_element("", "v").unwrap();
        let text = doc.children(v)[0];
        doc.set_text(v, "new").unwrap();
        doc.set_attribute(v, "Id", "x").unwrap();
        assert_eq!(doc.text_content(v), "new");
        assert_eq!(doc.children(v), vec![text]);
        assert_eq!(doc.to_xml(), r#"<r><v Id="x">new</v></r>"#);

        doc.set_text(v, "").unwrap();
        assert!(doc.children(v).is_empty());
    }

    #[test]
    fn test_append_and_detach() {
        let mut doc = XmlDocument::parse("<r/>").unwrap();
        let root = doc.root_element().unwrap();
        let e = doc.create_element(None, "e", None);
        doc.append_child(root, e).unwrap();
        assert!(doc.append_child(root, e).is_err());
        assert!(doc.append_child(e, root).is_err());
        doc.detach(e);
        assert_eq!(doc.to_xml(), "<r/>");
        assert!(doc.parent(e).is_none());
    }

    #[test]
    fn test_second_root_element_rejected() {
        let mut doc = XmlDocument::parse("<r/>").unwrap();
        let e = doc.create_element(None, "other", None);
        let root = doc.root();
        assert!(doc.append_child(root, e).is_err());
    }

    #[test]
    fn test_foreign_node_id_is_rejected() {
        let mut doc = XmlDocument::parse("<r/>").unwrap();
        let root = doc.root_element().unwrap();
        let stranger = NodeId::new(10_000);
        assert!(doc.kind(stranger).is_none());
        assert!(doc.element(stranger).is_none());
        assert!(doc.children(stranger).is_empty());
        assert_eq!(doc.descendants(stranger).count(), 0);
        assert!(doc.append_child(root, stranger).is_err());
        assert!(doc.set_text(stranger, "x").is_err());
    }

    #[test]
    fn test_adopt_copies_subtree() {
        let mut target = XmlDocument::parse("<r/>").unwrap();
        let source = XmlDocument::parse(r#"<p:a xmlns:p="urn:p"><p:b>t</p:b><!--c--></p:a>"#).unwrap();
        let adopted = target.adopt(source).unwrap();
        assert!(target.parent(adopted).is_none());
        let root = target.root_element().unwrap();
        target.append_child(root, adopted).unwrap();
        assert_eq!(
            target.to_xml(),
            r#"<r><p:a xmlns:p="urn:p"><p:b>t</p:b><!--c--></p:a></r>"#
        );
        let b = target.find_element("urn:p", "b").unwrap();
        assert_eq!(target.parent(b), Some(adopted));
    }

    #[test]
    fn test_reparse_preserves_tree() {
        let src = "<?pi data?><!--lead--><r xmlns:p=\"urn:p\" a=\"x&#xA;y\"><p:c>a &amp; b<![CDATA[<raw>]]></p:c></r>";
        let doc = XmlDocument::parse(src).unwrap();
        let out = doc.to_xml();
        let again = XmlDocument::parse(&out).unwrap();
        assert_eq!(again.to_xml(), out);
        let c = again.find_element("urn:p", "c").unwrap();
        assert_eq!(again.text_content(c), "a & b<raw>");
        let r = again.root_element().unwrap();
        assert_eq!(again.attribute(r, "a"), Some("x\ny"));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            XmlDocument::parse("<r><unclosed></r>"),
            Err(Error::XmlParse(_))
        ));
        assert!(XmlDocument::parse_bytes(b"<r>").is_err());
    }
}
