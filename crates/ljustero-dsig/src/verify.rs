#![forbid(unsafe_code)]

//! XML-DSig signature verification.
//!
//! Processing order:
//! 1. Locate exactly one `<Signature>`
//! 2. Read `<SignedInfo>`: CanonicalizationMethod, SignatureMethod, References
//! 3. Rebuild the id index for the tree being verified
//! 4. Resolve the verification key from `<KeyInfo>`
//! 5. For each `<Reference>`: resolve URI, run transforms, digest, compare
//! 6. Canonicalize `<SignedInfo>` and verify `<SignatureValue>`
//!
//! Steps 4 and 5 never stop early. Every reference is checked and every
//! failure is kept in the returned [`VerifyResult`].

use crate::context::DsigContext;
use crate::signedinfo::ParsedSignedInfo;
use ljustero_c14n::canonicalize_subtree;
use ljustero_core::{ns, Error};
use ljustero_keys::keyinfo::decode_base64;
use ljustero_keys::KeyInfo;
use ljustero_transforms::{ReferenceResolver, TransformPipeline};
use ljustero_xml::{NodeId, XmlDocument};
use std::fmt::Write as _;

/// Outcome for one `Reference`.
#[derive(Debug)]
pub enum ReferenceStatus {
    Valid,
    /// The recomputed digest differs from `DigestValue`.
    DigestMismatch,
    /// The URI could not be resolved or its transforms failed.
    Unresolvable(Error),
}

#[derive(Debug)]
pub struct ReferenceResult {
    pub uri: String,
    pub status: ReferenceStatus,
}

impl ReferenceResult {
    pub fn is_valid(&self) -> bool {
        matches!(self.status, ReferenceStatus::Valid)
    }
}

/// Outcome for `SignatureValue`.
#[derive(Debug)]
pub enum SignatureStatus {
    Valid,
    Invalid,
    /// No verification key could be selected.
    KeyUnavailable(Error),
}

/// Result of signature verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// The verified `Signature` element.
    pub signature_node: NodeId,
    pub references: Vec<ReferenceResult>,
    pub signature: SignatureStatus,
}

impl VerifyResult {
    /// True iff every reference digest matches and the signature value verifies.
    pub fn is_valid(&self) -> bool {
        matches!(self.signature, SignatureStatus::Valid) && self.references.iter().all(ReferenceResult::is_valid)
    }

    pub fn signature_valid(&self) -> bool {
        matches!(self.signature, SignatureStatus::Valid)
    }

    /// One line per component:
    ///
    /// ```text
    /// signature validity: true
    /// reference[uri=] validity: false
    /// reference[uri=#signed-properties-…] validity: true
    /// ```
    pub fn diagnostics(&self) -> String {
        let mut out = format!("signature validity: {}", self.signature_valid());
        for r in &self.references {
            let _ = write!(out, "\nreference[uri={}] validity: {}", r.uri, r.is_valid());
        }
        out
    }

    /// Every failed component as an error, signature value first.
    pub fn into_failures(self) -> Vec<Error> {
        let mut failures = Vec::new();
        match self.signature {
            SignatureStatus::Valid => {}
            SignatureStatus::Invalid => failures.push(Error::SignatureInvalid(
                "SignatureValue does not verify over SignedInfo".into(),
            )),
            SignatureStatus::KeyUnavailable(e) => failures.push(e),
        }
        for r in self.references {
            match r.status {
                ReferenceStatus::Valid => {}
                ReferenceStatus::DigestMismatch => failures.push(Error::DigestMismatch(r.uri)),
                ReferenceStatus::Unresolvable(e) => failures.push(e),
            }
        }
        failures
    }

    /// `Ok(())` when valid, otherwise [`Error::ValidationFailed`] carrying
    /// the diagnostic text.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::ValidationFailed(self.diagnostics()))
        }
    }
}

/// Find the single `Signature` element of `doc`.
pub fn locate_signature(doc: &XmlDocument) -> Result<NodeId, Error> {
    match doc.find_elements(ns::DSIG, ns::node::SIGNATURE).as_slice() {
        [sig] => Ok(*sig),
        [] => Err(Error::MalformedReference("document contains no Signature element".into())),
        many => Err(Error::AmbiguousSignature(format!(
            "document contains {} Signature elements",
            many.len()
        ))),
    }
}

/// Verify a parsed document.
pub fn verify(ctx: &DsigContext, doc: &XmlDocument) -> Result<VerifyResult, Error> {
    let sig = locate_signature(doc)?;
    let si_node = doc
        .find_child_element(sig, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;
    let signed_info = ParsedSignedInfo::parse(doc, si_node)?;
    let pipelines = signed_info
        .references
        .iter()
        .map(|r| TransformPipeline::from_uris(&r.transforms, sig))
        .collect::<Result<Vec<_>, Error>>()?;

    let sv_node = doc
        .find_child_element(sig, ns::DSIG, ns::node::SIGNATURE_VALUE)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
    let signature_value = decode_base64(&doc.text_content(sv_node))
        .map_err(|e| Error::Base64(format!("SignatureValue: {e}")))?;

    let ids = ctx.build_id_index(doc);

    let key = doc
        .find_child_element(sig, ns::DSIG, ns::node::KEY_INFO)
        .map(|ki| KeyInfo::parse(doc, ki))
        .transpose()
        .and_then(|info| ctx.key_selector().select(info.as_ref()));

    let resolver = ReferenceResolver::new(doc, &ids).with_debug(ctx.debug);
    let references = signed_info
        .references
        .iter()
        .zip(&pipelines)
        .map(|(r, pipeline)| {
            let status = match resolver.digest(&r.uri, pipeline, r.digest_method) {
                Ok(d) if d == r.digest_value => ReferenceStatus::Valid,
                Ok(_) => {
                    tracing::warn!(uri = %r.uri, "reference digest mismatch");
                    ReferenceStatus::DigestMismatch
                }
                Err(e) => {
                    tracing::warn!(uri = %r.uri, error = %e, "reference could not be resolved");
                    ReferenceStatus::Unresolvable(e)
                }
            };
            ReferenceResult {
                uri: r.uri.clone(),
                status,
            }
        })
        .collect();

    let signature = match key {
        Ok(key) => {
            let c14n = canonicalize_subtree(doc, si_node, signed_info.c14n)?;
            if ctx.debug {
                tracing::trace!(octets = %String::from_utf8_lossy(&c14n), "canonical SignedInfo");
            }
            match signed_info.signature_method.verify(&key, &c14n, &signature_value) {
                Ok(true) => SignatureStatus::Valid,
                Ok(false) => {
                    tracing::warn!("signature value does not verify");
                    SignatureStatus::Invalid
                }
                Err(e) => {
                    tracing::warn!(error = %e, "signature value is malformed");
                    SignatureStatus::Invalid
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "no verification key");
            SignatureStatus::KeyUnavailable(e)
        }
    };

    let result = VerifyResult {
        signature_node: sig,
        references,
        signature,
    };
    tracing::debug!(valid = result.is_valid(), "verified signature");
    Ok(result)
}

/// Parse `xml` and verify it.
pub fn verify_str(ctx: &DsigContext, xml: &str) -> Result<VerifyResult, Error> {
    verify(ctx, &XmlDocument::parse(xml)?)
}

/// Verify and collapse the outcome into a `Result`.
pub fn validate(ctx: &DsigContext, doc: &XmlDocument) -> Result<(), Error> {
    verify(ctx, doc)?.into_result()
}
