#![forbid(unsafe_code)]

//! Enveloped XAdES signing.

use crate::properties::{QualifyingPropertiesBuilder, SignaturePolicy};
use chrono::{DateTime, Utc};
use ljustero_core::{algorithm, Error};
use ljustero_crypto::DigestMethod;
use ljustero_dsig::{
    fresh_id, sign_enveloped, DsigContext, ReferenceSpec, SignatureTemplate, SignedInfoBuilder, SignerConfig,
};
use ljustero_keys::Key;
use ljustero_xml::{NodeId, XmlDocument};

/// Signs documents with an enveloped XAdES signature.
///
/// `SignedInfo` carries two references, in this order:
/// 1. `URI=""` with enveloped-signature removal and canonicalization
/// 2. `URI="#signed-properties-…"` with canonicalization, typed as XAdES
///    `SignedProperties`
#[derive(Debug)]
pub struct XadesSigner {
    key: Key,
    config: SignerConfig,
    ctx: DsigContext,
    signing_time: Option<DateTime<Utc>>,
    policy: SignaturePolicy,
}

impl XadesSigner {
    /// `key` must carry the signer certificate: it is digested into
    /// `SigningCertificate`.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            config: SignerConfig::default(),
            ctx: DsigContext::new(),
            signing_time: None,
            policy: SignaturePolicy::Implied,
        }
    }

    pub fn with_config(mut self, config: SignerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_context(mut self, ctx: DsigContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Use a fixed `SigningTime` for reproducible output.
    pub fn with_signing_time(mut self, time: DateTime<Utc>) -> Self {
        self.signing_time = Some(time);
        self
    }

    /// Name an explicit signature policy instead of `SignaturePolicyImplied`.
    pub fn with_signature_policy(mut self, policy: SignaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Append a XAdES signature to `doc`, returning the `Signature` element.
    pub fn sign_enveloped(&self, doc: &mut XmlDocument) -> Result<NodeId, Error> {
        let cert = self
            .key
            .certificate()
            .ok_or_else(|| Error::Key("XAdES signing needs the signer certificate".into()))?;
        let digest_method = DigestMethod::from_uri(&self.config.digest_method)?;

        let ids = self.ctx.build_used_ids(doc);
        let signature_id = fresh_id("signature", &ids);
        let signed_properties_id = fresh_id("signed-properties", &ids);

        let mut properties = QualifyingPropertiesBuilder::new(&signature_id, &signed_properties_id, cert)
            .cert_digest_method(digest_method)
            .signature_policy(self.policy.clone());
        if let Some(time) = self.signing_time {
            properties = properties.signing_time(time);
        }

        let template = SignatureTemplate {
            id: signature_id,
            signed_info: SignedInfoBuilder::new(&self.config.c14n, &self.config.signature_method)
                .reference(self.config.document_reference())
                .reference(
                    ReferenceSpec::new(format!("#{signed_properties_id}"))
                        .with_type(algorithm::XADES_SIGNED_PROPERTIES_TYPE)
                        .with_transform(&self.config.c14n)
                        .with_digest_method(&self.config.digest_method),
                ),
            key_info: self.config.key_info_for(&self.key)?,
            objects: vec![properties.build()?],
        };
        sign_enveloped(&self.ctx, doc, &self.key, template)
    }
}

/// Verify the signature of `doc` and collapse the outcome into a `Result`.
///
/// The error of an invalid signature is [`Error::ValidationFailed`] with one
/// `validity` line per component.
pub fn validate(doc: &XmlDocument) -> Result<(), Error> {
    ljustero_dsig::validate(&DsigContext::new(), doc)
}
