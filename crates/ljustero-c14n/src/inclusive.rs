#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 (C14N 1.0).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! The canonical form:
//! - Outputs namespace declarations sorted by prefix (default first)
//! - Outputs attributes sorted by (namespace-URI, local-name)
//! - Escapes text and attribute values per C14N rules
//! - Optionally preserves or strips comments
//! - Supports document-subset canonicalization via NodeSet

use crate::escape::Escape;
use crate::render::{Attr, NsDecl};
use ljustero_core::{ns, Error};
use ljustero_xml::{NodeId, NodeKind, NodeSet, XmlDocument};
use std::collections::BTreeMap;

/// Which `xml:*` attributes an orphaned subset element picks up from its
/// ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XmlAttrInheritance {
    /// C14N 1.0: every `xml:*` attribute.
    All,
    /// C14N 1.1: only `xml:lang` and `xml:space`.
    LangAndSpace,
}

/// Canonicalize a document using Inclusive C14N 1.0.
pub fn canonicalize(
    doc: &XmlDocument,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    canonicalize_with(doc, with_comments, node_set, XmlAttrInheritance::All)
}

pub(crate) fn canonicalize_with(
    doc: &XmlDocument,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inheritance: XmlAttrInheritance,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = C14nContext {
        doc,
        with_comments,
        node_set,
        inheritance,
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct C14nContext<'a> {
    doc: &'a XmlDocument,
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    inheritance: XmlAttrInheritance,
}

impl C14nContext<'_> {
    fn is_visible(&self, id: NodeId) -> bool {
        self.node_set.map_or(true, |ns| ns.contains(id))
    }

    fn process_node(
        &self,
        id: NodeId,
        output: &mut Vec<u8>,
        inherited_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match self.doc.kind(id) {
            Some(NodeKind::Document) => {
                for child in self.doc.children(id) {
                    self.process_node(child, output, inherited_ns)?;
                }
            }
            Some(NodeKind::Element(_)) => self.process_element(id, output, inherited_ns)?,
            Some(NodeKind::Text(text)) | Some(NodeKind::CData(text)) => {
                if self.is_visible(id) {
                    Escape::Text.write(text, output);
                }
            }
            Some(NodeKind::Comment(text)) => {
                if self.with_comments && self.is_visible(id) {
                    self.document_level(id, output, |out| {
                        out.extend_from_slice(b"<!--");
                        out.extend_from_slice(text.as_bytes());
                        out.extend_from_slice(b"-->");
                    });
                }
            }
            Some(NodeKind::ProcessingInstruction(pi)) => {
                if self.is_visible(id) {
                    self.document_level(id, output, |out| {
                        out.extend_from_slice(b"<?");
                        out.extend_from_slice(pi.target.as_bytes());
                        if let Some(data) = pi.data.as_deref().filter(|d| !d.is_empty()) {
                            out.push(b' ');
                            Escape::ProcessingInstruction.write(data, out);
                        }
                        out.extend_from_slice(b"?>");
                    });
                }
            }
            Some(NodeKind::Attribute(..)) | None => {}
        }
        Ok(())
    }

    /// Comments and PIs outside the document element are separated from it
    /// by a line feed: after the node when it precedes the element, before
    /// it when it follows.
    fn document_level(&self, id: NodeId, output: &mut Vec<u8>, write: impl FnOnce(&mut Vec<u8>)) {
        let parent = self.doc.parent(id);
        let top_level = parent.is_some_and(|p| p == self.doc.root());
        let (before, after) = match parent {
            Some(p) if top_level => {
                let siblings = self.doc.children(p);
                let pos = siblings.iter().position(|&s| s == id).unwrap_or(0);
                let is_elem = |s: &NodeId| self.doc.is_element(*s);
                (
                    siblings[..pos].iter().any(is_elem),
                    siblings[pos + 1..].iter().any(is_elem),
                )
            }
            _ => (false, false),
        };
        if before {
            output.push(b'\n');
        }
        write(output);
        if after {
            output.push(b'\n');
        }
    }

    fn process_element(
        &self,
        id: NodeId,
        output: &mut Vec<u8>,
        inherited_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        let Some(element) = self.doc.element(id) else {
            return Err(Error::Canonicalization("expected an element".into()));
        };

        if !self.is_visible(id) {
            // Invisible elements contribute nothing themselves; visible
            // descendants still compare against the nearest visible ancestor.
            for child in self.doc.children(id) {
                self.process_node(child, output, inherited_ns)?;
            }
            return Ok(());
        }

        // Output a declaration when it is new or differs from what the
        // nearest rendered ancestor put in scope.
        let current_ns = self.doc.in_scope_namespaces(id);
        let mut ns_decls: Vec<NsDecl> = current_ns
            .iter()
            .filter(|(prefix, uri)| inherited_ns.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl {
                prefix: prefix.clone(),
                uri: uri.clone(),
            })
            .collect();
        let inherited_default = inherited_ns.get("").is_some_and(|u| !u.is_empty());
        if inherited_default && !current_ns.contains_key("") {
            ns_decls.push(NsDecl {
                prefix: String::new(),
                uri: String::new(),
            });
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = element.attributes.iter().map(Attr::from).collect();
        if self.node_set.is_some() {
            let parent_hidden = self
                .doc
                .parent(id)
                .map_or(true, |p| !self.doc.is_element(p) || !self.is_visible(p));
            if parent_hidden {
                let extra = self.collect_inherited_xml_attrs(id, &attrs);
                attrs.extend(extra);
            }
        }
        attrs.sort();

        let name = element.name.prefixed_name();
        output.push(b'<');
        output.extend_from_slice(name.as_bytes());
        for decl in &ns_decls {
            decl.write(output);
        }
        for attr in &attrs {
            attr.write(output);
        }
        output.push(b'>');

        for child in self.doc.children(id) {
            self.process_node(child, output, &current_ns)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(name.as_bytes());
        output.push(b'>');
        Ok(())
    }

    /// `xml:*` attributes an element inherits when its parent is not in the
    /// node-set. The nearest ancestor wins; attributes already on the
    /// element are kept.
    fn collect_inherited_xml_attrs(&self, id: NodeId, existing: &[Attr]) -> Vec<Attr> {
        let mut inherited: BTreeMap<String, String> = BTreeMap::new();
        let mut current = self.doc.parent(id);
        while let Some(ancestor) = current {
            if let Some(element) = self.doc.element(ancestor) {
                for attr in &element.attributes {
                    if attr.name.namespace_uri.as_deref() == Some(ns::XML) {
                        inherited
                            .entry(attr.name.local_name.to_string())
                            .or_insert_with(|| attr.value.to_string());
                    }
                }
            }
            current = self.doc.parent(ancestor);
        }

        inherited
            .into_iter()
            .filter(|(name, _)| match self.inheritance {
                XmlAttrInheritance::All => true,
                XmlAttrInheritance::LangAndSpace => name == "lang" || name == "space",
            })
            .filter(|(name, _)| {
                !existing
                    .iter()
                    .any(|a| a.ns_uri == ns::XML && a.local_name == *name)
            })
            .map(|(name, value)| Attr {
                ns_uri: ns::XML.to_owned(),
                qualified_name: format!("xml:{name}"),
                local_name: name,
                value,
            })
            .collect()
    }
}
