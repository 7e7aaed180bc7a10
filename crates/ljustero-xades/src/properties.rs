#![forbid(unsafe_code)]

//! `<xades:QualifyingProperties>` construction and reading.
//!
//! The properties are built as a standalone document and later moved into
//! the signed document's `<ds:Object>`. Both the `xades` and `ds` namespaces
//! are declared on the `QualifyingProperties` element so the subtree is
//! self-contained wherever it ends up.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use ljustero_core::{ns, Error};
use ljustero_crypto::DigestMethod;
use ljustero_keys::keyinfo::{decode_base64, encode_base64};
use ljustero_keys::X509Certificate;
use ljustero_xml::{NodeId, XmlDocument};

/// Content of `<xades:SignaturePolicyIdentifier>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignaturePolicy {
    /// `<xades:SignaturePolicyImplied/>`: the policy follows from context.
    #[default]
    Implied,
    /// `<xades:SignaturePolicyId>` naming a policy document and its digest.
    Explicit {
        /// `SigPolicyId/Identifier`, usually a URI or OID URN.
        id: String,
        digest_method: DigestMethod,
        digest_value: Vec<u8>,
    },
}

impl SignaturePolicy {
    /// An explicit policy whose hash is computed over `document`.
    pub fn explicit(id: &str, digest_method: DigestMethod, document: &[u8]) -> Self {
        Self::Explicit {
            id: id.to_owned(),
            digest_method,
            digest_value: digest_method.digest(document),
        }
    }

    fn write(&self, doc: &mut XmlDocument, spi: NodeId) -> Result<(), Error> {
        let xades = (Some(ns::XADES_PREFIX), Some(ns::XADES));
        let dsig = (Some(ns::DSIG_PREFIX), Some(ns::DSIG));
        match self {
            Self::Implied => {
                doc.append_element(spi, xades.0, ns::node::SIGNATURE_POLICY_IMPLIED, xades.1)?;
            }
            Self::Explicit {
                id,
                digest_method,
                digest_value,
            } => {
                let policy = doc.append_element(spi, xades.0, ns::node::SIGNATURE_POLICY_ID, xades.1)?;
                let sig_policy_id = doc.append_element(policy, xades.0, ns::node::SIG_POLICY_ID, xades.1)?;
                let identifier = doc.append_element(sig_policy_id, xades.0, ns::node::IDENTIFIER, xades.1)?;
                doc.set_text(identifier, id)?;
                let hash = doc.append_element(policy, xades.0, ns::node::SIG_POLICY_HASH, xades.1)?;
                let dm = doc.append_element(hash, dsig.0, ns::node::DIGEST_METHOD, dsig.1)?;
                doc.set_attribute(dm, ns::attr::ALGORITHM, digest_method.uri())?;
                let dv = doc.append_element(hash, dsig.0, ns::node::DIGEST_VALUE, dsig.1)?;
                doc.set_text(dv, &encode_base64(digest_value))?;
            }
        }
        Ok(())
    }

    fn parse(doc: &XmlDocument, spi: NodeId) -> Result<Self, Error> {
        if doc
            .find_child_element(spi, ns::XADES, ns::node::SIGNATURE_POLICY_IMPLIED)
            .is_some()
        {
            return Ok(Self::Implied);
        }
        let policy = child(doc, spi, ns::XADES, ns::node::SIGNATURE_POLICY_ID)?;
        let sig_policy_id = child(doc, policy, ns::XADES, ns::node::SIG_POLICY_ID)?;
        let id = doc.text_content(child(doc, sig_policy_id, ns::XADES, ns::node::IDENTIFIER)?);
        let hash = child(doc, policy, ns::XADES, ns::node::SIG_POLICY_HASH)?;
        let (digest_method, digest_value) = read_digest(doc, hash)?;
        Ok(Self::Explicit {
            id: id.trim().to_owned(),
            digest_method,
            digest_value,
        })
    }
}

/// Builds the qualifying properties of one signature.
#[derive(Debug, Clone)]
pub struct QualifyingPropertiesBuilder {
    signature_id: String,
    signed_properties_id: String,
    certificate: X509Certificate,
    cert_digest_method: DigestMethod,
    signing_time: Option<DateTime<Utc>>,
    policy: SignaturePolicy,
}

impl QualifyingPropertiesBuilder {
    pub fn new(signature_id: &str, signed_properties_id: &str, certificate: &X509Certificate) -> Self {
        Self {
            signature_id: signature_id.to_owned(),
            signed_properties_id: signed_properties_id.to_owned(),
            certificate: certificate.clone(),
            cert_digest_method: DigestMethod::Sha256,
            signing_time: None,
            policy: SignaturePolicy::Implied,
        }
    }

    pub fn signature_policy(mut self, policy: SignaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fix `SigningTime` instead of using the clock at build time.
    pub fn signing_time(mut self, time: DateTime<Utc>) -> Self {
        self.signing_time = Some(time);
        self
    }

    pub fn cert_digest_method(mut self, method: DigestMethod) -> Self {
        self.cert_digest_method = method;
        self
    }

    /// Build a document whose root element is `QualifyingProperties`.
    pub fn build(&self) -> Result<XmlDocument, Error> {
        let mut doc = XmlDocument::new();
        let xades = (Some(ns::XADES_PREFIX), Some(ns::XADES));
        let dsig = (Some(ns::DSIG_PREFIX), Some(ns::DSIG));
        let root = doc.root();

        let qp = doc.append_element(root, xades.0, ns::node::QUALIFYING_PROPERTIES, xades.1)?;
        doc.declare_namespace(qp, Some(ns::XADES_PREFIX), ns::XADES)?;
        doc.declare_namespace(qp, Some(ns::DSIG_PREFIX), ns::DSIG)?;
        doc.set_attribute(qp, ns::attr::TARGET, &format!("#{}", self.signature_id))?;

        let sp = doc.append_element(qp, xades.0, ns::node::SIGNED_PROPERTIES, xades.1)?;
        doc.set_attribute(sp, ns::attr::ID, &self.signed_properties_id)?;
        let ssp = doc.append_element(sp, xades.0, ns::node::SIGNED_SIGNATURE_PROPERTIES, xades.1)?;

        let time = self.signing_time.unwrap_or_else(Utc::now);
        let st = doc.append_element(ssp, xades.0, ns::node::SIGNING_TIME, xades.1)?;
        doc.set_text(st, &time.to_rfc3339_opts(SecondsFormat::Secs, true))?;

        let sc = doc.append_element(ssp, xades.0, ns::node::SIGNING_CERTIFICATE, xades.1)?;
        let cert = doc.append_element(sc, xades.0, ns::node::CERT, xades.1)?;
        let cd = doc.append_element(cert, xades.0, ns::node::CERT_DIGEST, xades.1)?;
        let dm = doc.append_element(cd, dsig.0, ns::node::DIGEST_METHOD, dsig.1)?;
        doc.set_attribute(dm, ns::attr::ALGORITHM, self.cert_digest_method.uri())?;
        let dv = doc.append_element(cd, dsig.0, ns::node::DIGEST_VALUE, dsig.1)?;
        doc.set_text(dv, &encode_base64(&self.certificate.digest(self.cert_digest_method)))?;

        let is = doc.append_element(cert, xades.0, ns::node::ISSUER_SERIAL, xades.1)?;
        let name = doc.append_element(is, dsig.0, ns::node::X509_ISSUER_NAME, dsig.1)?;
        doc.set_text(name, self.certificate.issuer_name())?;
        let serial = doc.append_element(is, dsig.0, ns::node::X509_SERIAL_NUMBER, dsig.1)?;
        doc.set_text(serial, self.certificate.serial_number())?;

        let spi = doc.append_element(ssp, xades.0, ns::node::SIGNATURE_POLICY_IDENTIFIER, xades.1)?;
        self.policy.write(&mut doc, spi)?;

        tracing::debug!(
            target_id = %self.signature_id,
            signed_properties_id = %self.signed_properties_id,
            signing_time = %time,
            "built qualifying properties"
        );
        Ok(doc)
    }
}

/// Qualifying properties read back from a signed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifyingProperties {
    /// `Target` without the leading `#`.
    pub target: String,
    pub signed_properties_id: String,
    pub signing_time: DateTime<FixedOffset>,
    pub cert_digest_method: DigestMethod,
    pub cert_digest: Vec<u8>,
    pub issuer_name: String,
    pub serial_number: String,
    /// `None` when `SignaturePolicyIdentifier` is absent.
    pub policy: Option<SignaturePolicy>,
}

impl QualifyingProperties {
    /// Read the `QualifyingProperties` element `qp`.
    pub fn parse(doc: &XmlDocument, qp: NodeId) -> Result<Self, Error> {
        let target = doc
            .attribute(qp, ns::attr::TARGET)
            .ok_or_else(|| Error::MissingAttribute("Target on QualifyingProperties".into()))?;
        let target = target.strip_prefix('#').unwrap_or(target).to_owned();

        let sp = child(doc, qp, ns::XADES, ns::node::SIGNED_PROPERTIES)?;
        let signed_properties_id = doc
            .attribute(sp, ns::attr::ID)
            .ok_or_else(|| Error::MissingAttribute("Id on SignedProperties".into()))?
            .to_owned();
        let ssp = child(doc, sp, ns::XADES, ns::node::SIGNED_SIGNATURE_PROPERTIES)?;

        let time_text = doc.text_content(child(doc, ssp, ns::XADES, ns::node::SIGNING_TIME)?);
        let signing_time = DateTime::parse_from_rfc3339(time_text.trim())
            .map_err(|e| Error::XmlStructure(format!("SigningTime {time_text:?}: {e}")))?;

        let sc = child(doc, ssp, ns::XADES, ns::node::SIGNING_CERTIFICATE)?;
        let cert = child(doc, sc, ns::XADES, ns::node::CERT)?;
        let cd = child(doc, cert, ns::XADES, ns::node::CERT_DIGEST)?;
        let (cert_digest_method, cert_digest) = read_digest(doc, cd)?;

        let is = child(doc, cert, ns::XADES, ns::node::ISSUER_SERIAL)?;
        let issuer_name = doc.text_content(child(doc, is, ns::DSIG, ns::node::X509_ISSUER_NAME)?);
        let serial_number = doc.text_content(child(doc, is, ns::DSIG, ns::node::X509_SERIAL_NUMBER)?);

        let policy = doc
            .find_child_element(ssp, ns::XADES, ns::node::SIGNATURE_POLICY_IDENTIFIER)
            .map(|spi| SignaturePolicy::parse(doc, spi))
            .transpose()?;

        Ok(Self {
            target,
            signed_properties_id,
            signing_time,
            cert_digest_method,
            cert_digest,
            issuer_name,
            serial_number,
            policy,
        })
    }

    /// Find and read the properties of the document's `Signature`.
    pub fn find(doc: &XmlDocument) -> Result<Self, Error> {
        let qp = doc
            .find_element(ns::XADES, ns::node::QUALIFYING_PROPERTIES)
            .ok_or_else(|| Error::MissingElement("QualifyingProperties".into()))?;
        Self::parse(doc, qp)
    }

    /// Whether `cert` is the certificate these properties name.
    pub fn matches_certificate(&self, cert: &X509Certificate) -> bool {
        cert.digest(self.cert_digest_method) == self.cert_digest
            && cert.issuer_name() == self.issuer_name
            && cert.serial_number() == self.serial_number
    }
}

fn child(doc: &XmlDocument, parent: NodeId, namespace: &str, local: &str) -> Result<NodeId, Error> {
    doc.find_child_element(parent, namespace, local)
        .ok_or_else(|| Error::MissingElement(local.into()))
}

/// `ds:DigestMethod` and `ds:DigestValue` under `parent`.
fn read_digest(doc: &XmlDocument, parent: NodeId) -> Result<(DigestMethod, Vec<u8>), Error> {
    let dm = child(doc, parent, ns::DSIG, ns::node::DIGEST_METHOD)?;
    let method = DigestMethod::from_uri(
        doc.attribute(dm, ns::attr::ALGORITHM)
            .ok_or_else(|| Error::MissingAttribute("Algorithm on DigestMethod".into()))?,
    )?;
    let value = decode_base64(&doc.text_content(child(doc, parent, ns::DSIG, ns::node::DIGEST_VALUE)?))?;
    Ok((method, value))
}
