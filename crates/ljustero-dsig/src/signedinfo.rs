#![forbid(unsafe_code)]

//! `<ds:SignedInfo>` construction and parsing.
//!
//! The builder checks every algorithm and reference URI before anything is
//! written, so an unsupported configuration never touches the document.
//! `DigestValue` elements are written empty and filled once all reference
//! digests are known.

use ljustero_c14n::C14nMode;
use ljustero_core::{algorithm, ns, Error};
use ljustero_crypto::{DigestMethod, SignatureMethod};
use ljustero_keys::keyinfo::decode_base64;
use ljustero_xml::{NodeId, XmlDocument};

/// One `Reference` to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSpec {
    /// `""` for the whole document or `#id` for a fragment.
    pub uri: String,
    /// Optional `Type` attribute.
    pub ref_type: Option<String>,
    /// Transform algorithm URIs, applied in order.
    pub transforms: Vec<String>,
    pub digest_method: String,
}

impl ReferenceSpec {
    /// A reference with no transforms and the default digest.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ref_type: None,
            transforms: Vec::new(),
            digest_method: algorithm::DEFAULT_DIGEST.to_owned(),
        }
    }

    /// The whole-document reference of an enveloped signature:
    /// enveloped-signature removal followed by `c14n`.
    pub fn enveloped_document(c14n: &str) -> Self {
        Self::new("")
            .with_transform(algorithm::ENVELOPED_SIGNATURE)
            .with_transform(c14n)
    }

    pub fn with_transform(mut self, uri: &str) -> Self {
        self.transforms.push(uri.to_owned());
        self
    }

    pub fn with_type(mut self, ref_type: &str) -> Self {
        self.ref_type = Some(ref_type.to_owned());
        self
    }

    pub fn with_digest_method(mut self, uri: &str) -> Self {
        self.digest_method = uri.to_owned();
        self
    }

    fn check(&self) -> Result<DigestMethod, Error> {
        if !self.uri.is_empty() && self.uri.strip_prefix('#').map_or(true, str::is_empty) {
            return Err(Error::MalformedReference(format!(
                "only same-document references are supported: {:?}",
                self.uri
            )));
        }
        for t in &self.transforms {
            if t != algorithm::ENVELOPED_SIGNATURE && C14nMode::from_uri(t).is_none() {
                return Err(Error::UnsupportedAlgorithm(format!("transform: {t}")));
            }
        }
        DigestMethod::from_uri(&self.digest_method)
    }
}

/// Assembles a `SignedInfo` element.
#[derive(Debug, Clone)]
pub struct SignedInfoBuilder {
    c14n: String,
    signature_method: String,
    references: Vec<ReferenceSpec>,
}

/// Node handles of a freshly written `SignedInfo`.
#[derive(Debug, Clone)]
pub struct WrittenSignedInfo {
    pub node: NodeId,
    /// One empty `DigestValue` per reference, in reference order.
    pub digest_values: Vec<NodeId>,
}

impl SignedInfoBuilder {
    pub fn new(c14n: &str, signature_method: &str) -> Self {
        Self {
            c14n: c14n.to_owned(),
            signature_method: signature_method.to_owned(),
            references: Vec::new(),
        }
    }

    /// Append a reference. Order is significant.
    pub fn reference(mut self, reference: ReferenceSpec) -> Self {
        self.references.push(reference);
        self
    }

    pub fn references(&self) -> &[ReferenceSpec] {
        &self.references
    }

    /// Check every URI the builder would write.
    pub fn check(&self) -> Result<(C14nMode, SignatureMethod), Error> {
        let mode = C14nMode::require(&self.c14n)?;
        let method = SignatureMethod::from_uri(&self.signature_method)?;
        if self.references.is_empty() {
            return Err(Error::MalformedReference("SignedInfo needs at least one Reference".into()));
        }
        for reference in &self.references {
            reference.check()?;
        }
        Ok((mode, method))
    }

    /// Append `SignedInfo` to `parent`.
    pub fn write(&self, doc: &mut XmlDocument, parent: NodeId, prefix: Option<&str>) -> Result<WrittenSignedInfo, Error> {
        self.check()?;
        let dsig = Some(ns::DSIG);
        let si = doc.append_element(parent, prefix, ns::node::SIGNED_INFO, dsig)?;

        let c14n = doc.append_element(si, prefix, ns::node::CANONICALIZATION_METHOD, dsig)?;
        doc.set_attribute(c14n, ns::attr::ALGORITHM, &self.c14n)?;
        let sm = doc.append_element(si, prefix, ns::node::SIGNATURE_METHOD, dsig)?;
        doc.set_attribute(sm, ns::attr::ALGORITHM, &self.signature_method)?;

        let mut digest_values = Vec::with_capacity(self.references.len());
        for reference in &self.references {
            let r = doc.append_element(si, prefix, ns::node::REFERENCE, dsig)?;
            doc.set_attribute(r, ns::attr::URI, &reference.uri)?;
            if let Some(t) = &reference.ref_type {
                doc.set_attribute(r, ns::attr::TYPE, t)?;
            }
            if !reference.transforms.is_empty() {
                let transforms = doc.append_element(r, prefix, ns::node::TRANSFORMS, dsig)?;
                for uri in &reference.transforms {
                    let t = doc.append_element(transforms, prefix, ns::node::TRANSFORM, dsig)?;
                    doc.set_attribute(t, ns::attr::ALGORITHM, uri)?;
                }
            }
            let dm = doc.append_element(r, prefix, ns::node::DIGEST_METHOD, dsig)?;
            doc.set_attribute(dm, ns::attr::ALGORITHM, &reference.digest_method)?;
            digest_values.push(doc.append_element(r, prefix, ns::node::DIGEST_VALUE, dsig)?);
        }
        Ok(WrittenSignedInfo { node: si, digest_values })
    }
}

/// A `Reference` read back from a signature.
#[derive(Debug, Clone)]
pub struct ParsedReference {
    pub uri: String,
    pub ref_type: Option<String>,
    pub transforms: Vec<String>,
    pub digest_method: DigestMethod,
    pub digest_value: Vec<u8>,
}

/// A `SignedInfo` read back from a signature.
#[derive(Debug, Clone)]
pub struct ParsedSignedInfo {
    pub node: NodeId,
    pub c14n: C14nMode,
    pub signature_method: SignatureMethod,
    pub references: Vec<ParsedReference>,
}

impl ParsedSignedInfo {
    pub fn parse(doc: &XmlDocument, signed_info: NodeId) -> Result<Self, Error> {
        let c14n_node = doc
            .find_child_element(signed_info, ns::DSIG, ns::node::CANONICALIZATION_METHOD)
            .ok_or_else(|| Error::MissingElement("CanonicalizationMethod".into()))?;
        let c14n = C14nMode::require(algorithm_of(doc, c14n_node, "CanonicalizationMethod")?)?;

        let sm_node = doc
            .find_child_element(signed_info, ns::DSIG, ns::node::SIGNATURE_METHOD)
            .ok_or_else(|| Error::MissingElement("SignatureMethod".into()))?;
        let signature_method = SignatureMethod::from_uri(algorithm_of(doc, sm_node, "SignatureMethod")?)?;

        let references = doc
            .find_child_elements(signed_info, ns::DSIG, ns::node::REFERENCE)
            .into_iter()
            .map(|r| parse_reference(doc, r))
            .collect::<Result<Vec<_>, Error>>()?;
        if references.is_empty() {
            return Err(Error::MissingElement("Reference".into()));
        }

        Ok(Self {
            node: signed_info,
            c14n,
            signature_method,
            references,
        })
    }
}

fn parse_reference(doc: &XmlDocument, reference: NodeId) -> Result<ParsedReference, Error> {
    let uri = doc
        .attribute(reference, ns::attr::URI)
        .ok_or_else(|| Error::MissingAttribute("URI on Reference".into()))?
        .to_owned();

    let transforms = match doc.find_child_element(reference, ns::DSIG, ns::node::TRANSFORMS) {
        Some(t) => doc
            .find_child_elements(t, ns::DSIG, ns::node::TRANSFORM)
            .into_iter()
            .map(|n| algorithm_of(doc, n, "Transform").map(str::to_owned))
            .collect::<Result<Vec<_>, Error>>()?,
        None => Vec::new(),
    };

    let dm = doc
        .find_child_element(reference, ns::DSIG, ns::node::DIGEST_METHOD)
        .ok_or_else(|| Error::MissingElement("DigestMethod".into()))?;
    let digest_method = DigestMethod::from_uri(algorithm_of(doc, dm, "DigestMethod")?)?;

    let dv = doc
        .find_child_element(reference, ns::DSIG, ns::node::DIGEST_VALUE)
        .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;
    let digest_value = decode_base64(&doc.text_content(dv))
        .map_err(|e| Error::Base64(format!("DigestValue of {uri:?}: {e}")))?;

    Ok(ParsedReference {
        ref_type: doc.attribute(reference, ns::attr::TYPE).map(str::to_owned),
        uri,
        transforms,
        digest_method,
        digest_value,
    })
}

fn algorithm_of<'d>(doc: &'d XmlDocument, node: NodeId, what: &str) -> Result<&'d str, Error> {
    doc.attribute(node, ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute(format!("Algorithm on {what}")))
}
