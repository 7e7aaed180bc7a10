#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for the ljustero signing library.
//!
//! Implements the four inclusive W3C variants:
//! - Canonical XML 1.0 (with and without comments)
//! - Canonical XML 1.1 (with and without comments)

pub mod escape;
pub mod inclusive;
pub mod inclusive11;
pub mod render;

use ljustero_core::{algorithm, Error};
use ljustero_xml::{NodeId, NodeSet, XmlDocument};

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
    /// Canonical XML 1.1
    Inclusive11,
    /// Canonical XML 1.1 with comments
    Inclusive11WithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
            Self::Inclusive11 => algorithm::C14N11,
            Self::Inclusive11WithComments => algorithm::C14N11_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            algorithm::C14N11 => Some(Self::Inclusive11),
            algorithm::C14N11_WITH_COMMENTS => Some(Self::Inclusive11WithComments),
            _ => None,
        }
    }

    /// Like [`from_uri`](Self::from_uri) but unknown URIs are an error.
    pub fn require(uri: &str) -> Result<Self, Error> {
        Self::from_uri(uri).ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {uri}")))
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments | Self::Inclusive11WithComments)
    }
}

/// Canonicalize a document, or the part of it selected by `node_set`.
pub fn canonicalize(
    doc: &XmlDocument,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let out = match mode {
        C14nMode::Inclusive | C14nMode::InclusiveWithComments => {
            inclusive::canonicalize(doc, mode.with_comments(), node_set)
        }
        C14nMode::Inclusive11 | C14nMode::Inclusive11WithComments => {
            inclusive11::canonicalize(doc, mode.with_comments(), node_set)
        }
    }?;
    tracing::trace!(mode = mode.uri(), bytes = out.len(), "canonicalized");
    Ok(out)
}

/// Canonicalize the subtree rooted at `node`.
///
/// Comments inside the subtree are kept only by the `WithComments` modes.
pub fn canonicalize_subtree(doc: &XmlDocument, node: NodeId, mode: C14nMode) -> Result<Vec<u8>, Error> {
    let set = NodeSet::tree(doc, node, mode.with_comments());
    canonicalize(doc, mode, Some(&set))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_uris() {
        for mode in [
            C14nMode::Inclusive,
            C14nMode::InclusiveWithComments,
            C14nMode::Inclusive11,
            C14nMode::Inclusive11WithComments,
        ] {
            assert_eq!(C14nMode::from_uri(mode.uri()), Some(mode));
        }
        assert!(matches!(
            C14nMode::require("http://www.w3.org/2001/10/xml-exc-c14n#"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_formatting_independent() {
        let a = XmlDocument::parse(r#"<r b='2'   a="1"><x><![CDATA[v&]]></x><y/></r>"#).unwrap();
        let b = XmlDocument::parse(r#"<r a="1" b="2"><x>v&amp;</x><y></y></r>"#).unwrap();
        let mode = C14nMode::Inclusive11WithComments;
        assert_eq!(canonicalize(&a, mode, None).unwrap(), canonicalize(&b, mode, None).unwrap());
    }

    #[test]
    fn test_subtree_comments_follow_mode() {
        let doc = XmlDocument::parse("<r><s><!--c-->v</s></r>").unwrap();
        let s = doc.find_element("", "s").unwrap();
        let with = canonicalize_subtree(&doc, s, C14nMode::Inclusive11WithComments).unwrap();
        let without = canonicalize_subtree(&doc, s, C14nMode::Inclusive11).unwrap();
        assert_eq!(with, b"<s><!--c-->v</s>");
        assert_eq!(without, b"<s>v</s>");
    }
}
