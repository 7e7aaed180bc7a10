#![forbid(unsafe_code)]

//! Namespace declarations and attributes in canonical order.
//!
//! Field order matters: the derived `Ord` impls sort declarations by prefix
//! (the default namespace has the empty prefix and comes first) and
//! attributes by `(namespace URI, local name)` with unqualified attributes
//! first.

use crate::escape::Escape;
use ljustero_xml::Attribute;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NsDecl {
    /// `""` for the default namespace.
    pub prefix: String,
    pub uri: String,
}

impl NsDecl {
    pub fn write(&self, out: &mut Vec<u8>) {
        if self.prefix.is_empty() {
            out.extend_from_slice(b" xmlns=\"");
        } else {
            out.extend_from_slice(b" xmlns:");
            out.extend_from_slice(self.prefix.as_bytes());
            out.extend_from_slice(b"=\"");
        }
        Escape::Attribute.write(&self.uri, out);
        out.push(b'"');
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attr {
    pub ns_uri: String,
    pub local_name: String,
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        out.extend_from_slice(self.qualified_name.as_bytes());
        out.extend_from_slice(b"=\"");
        Escape::Attribute.write(&self.value, out);
        out.push(b'"');
    }
}

impl From<&Attribute<'_>> for Attr {
    fn from(a: &Attribute<'_>) -> Self {
        Self {
            ns_uri: a.name.namespace_uri.as_deref().unwrap_or_default().to_owned(),
            local_name: a.name.local_name.to_string(),
            qualified_name: a.name.prefixed_name().into_owned(),
            value: a.value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(ns: &str, local: &str) -> Attr {
        Attr {
            ns_uri: ns.into(),
            local_name: local.into(),
            qualified_name: local.into(),
            value: String::new(),
        }
    }

    #[test]
    fn test_default_namespace_first() {
        let mut decls = vec![
            NsDecl { prefix: "b".into(), uri: "urn:b".into() },
            NsDecl { prefix: String::new(), uri: "urn:d".into() },
            NsDecl { prefix: "a".into(), uri: "urn:a".into() },
        ];
        decls.sort();
        let prefixes: Vec<_> = decls.iter().map(|d| d.prefix.as_str()).collect();
        assert_eq!(prefixes, ["", "a", "b"]);
    }

    #[test]
    fn test_unqualified_attributes_first() {
        let mut attrs = vec![attr("urn:z", "a"), attr("", "z"), attr("urn:a", "b"), attr("", "c")];
        attrs.sort();
        let keys: Vec<_> = attrs
            .iter()
            .map(|a| (a.ns_uri.as_str(), a.local_name.as_str()))
            .collect();
        assert_eq!(keys, [("", "c"), ("", "z"), ("urn:a", "b"), ("urn:z", "a")]);
    }
}
