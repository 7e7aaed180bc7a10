#![forbid(unsafe_code)]

//! `<ds:KeyInfo>` content.
//!
//! The element is modelled as a list of tagged items. Only the two kinds
//! this library produces and consumes are recognised; any other child
//! (`KeyName`, `RetrievalMethod`, …) is skipped when parsing.

use crate::x509::X509Certificate;
use base64::Engine;
use ljustero_core::{ns, Error};
use ljustero_xml::{NodeId, XmlDocument};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};

/// One recognised child of `KeyInfo`.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyInfoItem {
    /// `<KeyValue><RSAKeyValue>`: a raw public key.
    KeyValue(RsaPublicKey),
    /// `<X509Data>`: certificates in document order.
    X509Data(Vec<X509Certificate>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyInfo {
    items: Vec<KeyInfoItem>,
}

impl KeyInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_value(mut self, key: RsaPublicKey) -> Self {
        self.items.push(KeyInfoItem::KeyValue(key));
        self
    }

    pub fn with_x509_data(mut self, certs: Vec<X509Certificate>) -> Self {
        self.items.push(KeyInfoItem::X509Data(certs));
        self
    }

    pub fn items(&self) -> &[KeyInfoItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Read a `KeyInfo` element.
    pub fn parse(doc: &XmlDocument, key_info: NodeId) -> Result<Self, Error> {
        let mut items = Vec::new();
        for child in doc.children(key_info) {
            if doc.is_named(child, ns::DSIG, ns::node::KEY_VALUE) {
                match doc.find_child_element(child, ns::DSIG, ns::node::RSA_KEY_VALUE) {
                    Some(rsa_kv) => items.push(KeyInfoItem::KeyValue(parse_rsa_key_value(doc, rsa_kv)?)),
                    None => tracing::debug!("skipping non-RSA KeyValue"),
                }
            } else if doc.is_named(child, ns::DSIG, ns::node::X509_DATA) {
                let certs = doc
                    .find_child_elements(child, ns::DSIG, ns::node::X509_CERTIFICATE)
                    .into_iter()
                    .map(|c| X509Certificate::from_der(&decode_base64(&doc.text_content(c))?))
                    .collect::<Result<Vec<_>, Error>>()?;
                items.push(KeyInfoItem::X509Data(certs));
            }
        }
        Ok(Self { items })
    }

    /// Append this `KeyInfo` as a child of `parent`, using `prefix` for the
    /// XML-DSig elements.
    pub fn write(&self, doc: &mut XmlDocument, parent: NodeId, prefix: Option<&str>) -> Result<NodeId, Error> {
        let dsig = Some(ns::DSIG);
        let key_info = doc.append_element(parent, prefix, ns::node::KEY_INFO, dsig)?;
        for item in &self.items {
            match item {
                KeyInfoItem::KeyValue(key) => {
                    let kv = doc.append_element(key_info, prefix, ns::node::KEY_VALUE, dsig)?;
                    let rsa_kv = doc.append_element(kv, prefix, ns::node::RSA_KEY_VALUE, dsig)?;
                    let modulus = doc.append_element(rsa_kv, prefix, ns::node::RSA_MODULUS, dsig)?;
                    doc.set_text(modulus, &encode_base64(&key.n().to_bytes_be()))?;
                    let exponent = doc.append_element(rsa_kv, prefix, ns::node::RSA_EXPONENT, dsig)?;
                    doc.set_text(exponent, &encode_base64(&key.e().to_bytes_be()))?;
                }
                KeyInfoItem::X509Data(certs) => {
                    let data = doc.append_element(key_info, prefix, ns::node::X509_DATA, dsig)?;
                    for cert in certs {
                        let c = doc.append_element(data, prefix, ns::node::X509_CERTIFICATE, dsig)?;
                        doc.set_text(c, &encode_base64(cert.der()))?;
                    }
                }
            }
        }
        Ok(key_info)
    }
}

fn parse_rsa_key_value(doc: &XmlDocument, rsa_kv: NodeId) -> Result<RsaPublicKey, Error> {
    let part = |local: &str| -> Result<BigUint, Error> {
        let node = doc
            .find_child_element(rsa_kv, ns::DSIG, local)
            .ok_or_else(|| Error::MissingElement(local.into()))?;
        let bytes = decode_base64(&doc.text_content(node))
            .map_err(|e| Error::Base64(format!("{local}: {e}")))?;
        Ok(BigUint::from_bytes_be(&bytes))
    };
    RsaPublicKey::new(part(ns::node::RSA_MODULUS)?, part(ns::node::RSA_EXPONENT)?)
        .map_err(|e| Error::Key(format!("invalid RSA public key: {e}")))
}

/// Decode base64 element content, ignoring embedded whitespace.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(e.to_string()))
}

/// Encode bytes as unwrapped base64 element content.
pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}
