#![forbid(unsafe_code)]

//! Same-document URI resolution and reference digesting.
//!
//! Handles:
//! - Empty URI (`""`): the whole document, comments excluded
//! - Fragment (`#id`): the identified element's subtree, comments excluded
//!
//! Anything else is an external reference, which is not supported.

use crate::pipeline::{TransformData, TransformPipeline};
use ljustero_core::Error;
use ljustero_crypto::DigestMethod;
use ljustero_xml::{IdIndex, NodeSet, XmlDocument};

/// Resolves reference URIs against one document and its id index.
pub struct ReferenceResolver<'a> {
    doc: &'a XmlDocument,
    ids: &'a IdIndex,
    debug: bool,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(doc: &'a XmlDocument, ids: &'a IdIndex) -> Self {
        Self {
            doc,
            ids,
            debug: false,
        }
    }

    /// Log the octets that are about to be digested.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Resolve `uri` to the node-set it selects.
    pub fn resolve(&self, uri: &str) -> Result<NodeSet, Error> {
        if uri.is_empty() {
            return Ok(NodeSet::all_without_comments(self.doc));
        }
        match uri.strip_prefix('#') {
            Some(id) if !id.is_empty() => {
                let node = self.ids.resolve(id)?;
                Ok(NodeSet::tree(self.doc, node, false))
            }
            _ => Err(Error::MalformedReference(format!(
                "unsupported reference URI: {uri:?}"
            ))),
        }
    }

    /// Resolve `uri`, run `transforms` over it and return the resulting octets.
    pub fn transformed_octets(&self, uri: &str, transforms: &TransformPipeline) -> Result<Vec<u8>, Error> {
        let node_set = self.resolve(uri)?;
        let output = transforms.execute(self.doc, TransformData::Xml(node_set))?;
        let bytes = output.into_binary(self.doc)?;
        if self.debug {
            tracing::trace!(
                uri,
                octets = %String::from_utf8_lossy(&bytes),
                "pre-digest octets"
            );
        }
        Ok(bytes)
    }

    /// Compute `DigestValue` for a reference.
    pub fn digest(&self, uri: &str, transforms: &TransformPipeline, method: DigestMethod) -> Result<Vec<u8>, Error> {
        let bytes = self.transformed_octets(uri, transforms)?;
        let digest = method.digest(&bytes);
        tracing::debug!(uri, bytes = bytes.len(), digest_method = method.uri(), "digested reference");
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ljustero_core::algorithm;

    fn fixture() -> XmlDocument {
        XmlDocument::parse(r#"<r><!--note--><a Id="p"><!--inner-->x</a></r>"#).unwrap()
    }

    #[test]
    fn test_empty_uri_selects_document_without_comments() {
        let doc = fixture();
        let ids = IdIndex::build_default(&doc);
        let resolver = ReferenceResolver::new(&doc, &ids);
        let root = doc.root_element().unwrap();
        let pipeline = TransformPipeline::from_uris(&[algorithm::C14N11_WITH_COMMENTS], root).unwrap();
        let bytes = resolver.transformed_octets("", &pipeline).unwrap();
        assert_eq!(bytes, br#"<r><a Id="p">x</a></r>"#);
    }

    #[test]
    fn test_fragment_selects_subtree() {
        let doc = fixture();
        let ids = IdIndex::build_default(&doc);
        let resolver = ReferenceResolver::new(&doc, &ids);
        let root = doc.root_element().unwrap();
        let pipeline = TransformPipeline::from_uris(&[algorithm::C14N11], root).unwrap();
        let bytes = resolver.transformed_octets("#p", &pipeline).unwrap();
        assert_eq!(bytes, br#"<a Id="p">x</a>"#);

        let digest = resolver.digest("#p", &pipeline, DigestMethod::Sha256).unwrap();
        assert_eq!(digest, DigestMethod::Sha256.digest(&bytes));
    }

    #[test]
    fn test_unresolvable() {
        let doc = fixture();
        let ids = IdIndex::build_default(&doc);
        let resolver = ReferenceResolver::new(&doc, &ids);
        assert!(matches!(resolver.resolve("#missing"), Err(Error::IdResolution(_))));
        assert!(matches!(
            resolver.resolve("http://example.com/doc.xml"),
            Err(Error::MalformedReference(_))
        ));
        assert!(matches!(resolver.resolve("#"), Err(Error::MalformedReference(_))));
    }
}
