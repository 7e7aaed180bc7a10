#![forbid(unsafe_code)]

//! XML document model for the ljustero signing library.
//!
//! [`XmlDocument`] wraps uppsala's mutable DOM: the signers append
//! `Signature` elements and move subtrees across documents, and the
//! serializer keeps every prefix as it was parsed or created. [`NodeSet`]
//! and [`IdIndex`] provide the selection machinery used by references.

pub mod document;
pub mod idindex;
pub mod nodeset;

pub use document::{Attribute, Element, NodeId, NodeKind, QName, XmlDocument};
pub use idindex::IdIndex;
pub use nodeset::NodeSet;
