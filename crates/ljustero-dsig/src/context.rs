#![forbid(unsafe_code)]

//! DSig context: configuration shared by signing and verification.

use ljustero_core::ns;
use ljustero_keys::{KeyInfoKeySelector, KeySelector};
use ljustero_xml::idindex::DEFAULT_ID_ATTRS;
use ljustero_xml::{IdIndex, XmlDocument};

/// Context for XML-DSig operations.
pub struct DsigContext {
    /// Attribute names treated as identifiers when building the id index.
    pub id_attrs: Vec<String>,
    /// When set, only these `(namespace, local name)` elements are indexed.
    /// `None` indexes every element.
    pub id_elements: Option<Vec<(String, String)>>,
    /// Prefix for generated XML-DSig elements. `None` uses a default
    /// namespace declaration on `Signature`.
    pub prefix: Option<String>,
    /// Debug mode: log pre-digest and pre-signature octets at trace level.
    pub debug: bool,
    key_selector: Box<dyn KeySelector>,
}

impl Default for DsigContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DsigContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsigContext")
            .field("id_attrs", &self.id_attrs)
            .field("id_elements", &self.id_elements)
            .field("prefix", &self.prefix)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl DsigContext {
    /// A context with the `Id`/`ID`/`id` attribute names, the `ds` prefix
    /// and a selector that trusts the signature's own `KeyInfo`.
    ///
    /// Same-document references resolve only against `SignedProperties`
    /// and `QualifyingProperties`; see [`index_all_elements`].
    ///
    /// [`index_all_elements`]: DsigContext::index_all_elements
    pub fn new() -> Self {
        Self {
            id_attrs: DEFAULT_ID_ATTRS.iter().map(|s| s.to_string()).collect(),
            id_elements: Some(
                [ns::node::SIGNED_PROPERTIES, ns::node::QUALIFYING_PROPERTIES]
                    .into_iter()
                    .map(|local| (ns::XADES.to_owned(), local.to_owned()))
                    .collect(),
            ),
            prefix: Some(ns::DSIG_PREFIX.to_owned()),
            debug: false,
            key_selector: Box::new(KeyInfoKeySelector),
        }
    }

    /// Replace the verification key selector.
    pub fn with_key_selector(mut self, selector: impl KeySelector + 'static) -> Self {
        self.key_selector = Box::new(selector);
        self
    }

    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_owned);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Add an ID attribute name to register during processing.
    pub fn add_id_attr(&mut self, name: &str) {
        if !self.id_attrs.iter().any(|a| a == name) {
            self.id_attrs.push(name.to_owned());
        }
    }

    /// Also resolve identifiers carried by elements with this expanded name.
    /// Has no effect once every element is indexed.
    pub fn add_id_element(&mut self, namespace: &str, local: &str) {
        if let Some(elements) = self.id_elements.as_mut() {
            let entry = (namespace.to_owned(), local.to_owned());
            if !elements.contains(&entry) {
                elements.push(entry);
            }
        }
    }

    /// Resolve identifiers on any element of the document.
    pub fn index_all_elements(mut self) -> Self {
        self.id_elements = None;
        self
    }

    pub fn key_selector(&self) -> &dyn KeySelector {
        self.key_selector.as_ref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Index the identifiers of `doc` that references may resolve to.
    pub fn build_id_index(&self, doc: &XmlDocument) -> IdIndex {
        IdIndex::build(doc, &self.id_attrs, self.id_elements.as_deref())
    }

    /// Every identifier of `doc`, whatever element carries it. Generated
    /// ids must avoid all of these.
    pub fn build_used_ids(&self, doc: &XmlDocument) -> IdIndex {
        IdIndex::build(doc, &self.id_attrs, None)
    }
}
