#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.1 (C14N 1.1).
//!
//! Algorithm URI: `http://www.w3.org/2006/12/xml-c14n11`
//! With comments: `http://www.w3.org/2006/12/xml-c14n11#WithComments`
//!
//! Identical to 1.0 except for document subsets: an element whose parent is
//! outside the node-set inherits only `xml:lang` and `xml:space`. `xml:id`
//! is never inherited and `xml:base` is left as written on the element.

use crate::inclusive::{canonicalize_with, XmlAttrInheritance};
use ljustero_core::Error;
use ljustero_xml::{NodeSet, XmlDocument};

/// Canonicalize using Inclusive C14N 1.1.
pub fn canonicalize(
    doc: &XmlDocument,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    canonicalize_with(doc, with_comments, node_set, XmlAttrInheritance::LangAndSpace)
}
