#![forbid(unsafe_code)]

//! Identifier index for same-document fragment references.
//!
//! Parsing carries no DTD or schema ID typing, so identifiers are found by
//! convention: any attribute whose name is one of the configured ID
//! attribute names. The index must be rebuilt for every freshly parsed tree.

use crate::document::{NodeId, XmlDocument};
use ljustero_core::Error;
use std::collections::HashMap;

/// Default identifier attribute names.
pub const DEFAULT_ID_ATTRS: [&str; 3] = ["Id", "ID", "id"];

/// Mapping from identifier value to the element(s) carrying it.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    ids: HashMap<String, Vec<NodeId>>,
}

impl IdIndex {
    /// Scan `doc` for unqualified attributes named in `id_attrs`.
    ///
    /// When `elements` is given, only elements whose `(namespace, local name)`
    /// is listed are indexed.
    pub fn build(doc: &XmlDocument, id_attrs: &[String], elements: Option<&[(String, String)]>) -> Self {
        let mut index = Self::default();
        for node in doc.descendants(doc.root()) {
            if !doc.is_element(node) {
                continue;
            }
            if let Some(filter) = elements {
                if !filter.iter().any(|(ns, local)| doc.is_named(node, ns, local)) {
                    continue;
                }
            }
            for name in id_attrs {
                if let Some(value) = doc.attribute(node, name) {
                    index.register(value, node);
                }
            }
        }
        tracing::debug!(ids = index.ids.len(), "built id index");
        index
    }

    /// Build with the default `Id`/`ID`/`id` names over all elements.
    pub fn build_default(doc: &XmlDocument) -> Self {
        let names: Vec<String> = DEFAULT_ID_ATTRS.iter().map(|s| s.to_string()).collect();
        Self::build(doc, &names, None)
    }

    /// Record that `node` carries identifier `id`.
    pub fn register(&mut self, id: &str, node: NodeId) {
        let owners = self.ids.entry(id.to_owned()).or_default();
        if !owners.contains(&node) {
            owners.push(node);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Resolve `#X` (or a bare `X`) to the unique element carrying `X`.
    pub fn resolve(&self, reference: &str) -> Result<NodeId, Error> {
        let id = reference.strip_prefix('#').unwrap_or(reference);
        match self.ids.get(id).map(Vec::as_slice) {
            Some([node]) => Ok(*node),
            Some(owners) if owners.len() > 1 => Err(Error::IdResolution(format!(
                "{} elements carry id {id:?}",
                owners.len()
            ))),
            _ => Err(Error::IdResolution(format!("no element carries id {id:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unique() {
        let doc = XmlDocument::parse(r#"<r><a Id="x"/><b ID="y"/><c id="z"/></r>"#).unwrap();
        let index = IdIndex::build_default(&doc);
        let a = doc.find_element("", "a").unwrap();
        assert_eq!(index.resolve("#x").unwrap(), a);
        assert!(index.resolve("y").is_ok());
        assert!(index.resolve("#z").is_ok());
    }

    #[test]
    fn test_missing_and_ambiguous() {
        let doc = XmlDocument::parse(r#"<r><a Id="x"/><b id="x"/></r>"#).unwrap();
        let index = IdIndex::build_default(&doc);
        assert!(matches!(index.resolve("#x"), Err(Error::IdResolution(_))));
        assert!(matches!(index.resolve("#nope"), Err(Error::IdResolution(_))));
    }

    #[test]
    fn test_same_element_counted_once() {
        let doc = XmlDocument::parse(r#"<r><a Id="x" id="x"/></r>"#).unwrap();
        let index = IdIndex::build_default(&doc);
        assert!(index.resolve("#x").is_ok());
    }

    #[test]
    fn test_element_filter() {
        let doc = XmlDocument::parse(r#"<r xmlns:p="urn:p"><p:a Id="x"/><b Id="x"/></r>"#).unwrap();
        let names = vec!["Id".to_owned()];
        let filter = vec![("urn:p".to_owned(), "a".to_owned())];
        let index = IdIndex::build(&doc, &names, Some(&filter));
        let a = doc.find_element("urn:p", "a").unwrap();
        assert_eq!(index.resolve("#x").unwrap(), a);
    }
}
