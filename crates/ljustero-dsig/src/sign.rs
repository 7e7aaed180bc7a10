#![forbid(unsafe_code)]

//! Enveloped signature creation.
//!
//! Processing order:
//! 1. Check algorithms and key material (document untouched on failure)
//! 2. Append `<Signature>` to the root element and write `SignedInfo`,
//!    an empty `SignatureValue`, `KeyInfo` and any `Object` content
//! 3. Rebuild the id index so adopted `Object` content is resolvable
//! 4. Phase one: digest every `Reference`, then fill all `DigestValue`s
//! 5. Phase two: canonicalize `SignedInfo` and fill `SignatureValue`
//!
//! If any step after 2 fails the `Signature` element is detached again.

use crate::context::DsigContext;
use crate::signedinfo::{ReferenceSpec, SignedInfoBuilder};
use ljustero_c14n::canonicalize_subtree;
use ljustero_core::{algorithm, ns, Error};
use ljustero_crypto::DigestMethod;
use ljustero_keys::keyinfo::encode_base64;
use ljustero_keys::{Key, KeyInfo};
use ljustero_transforms::{ReferenceResolver, TransformPipeline};
use ljustero_xml::{IdIndex, NodeId, XmlDocument};

/// What `KeyInfo` advertises to verifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyInfoMode {
    /// `<X509Data>` with the signer certificate.
    #[default]
    X509Certificate,
    /// `<KeyValue>` with the raw RSA public key.
    KeyValue,
}

/// Algorithm choices for a signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
    pub c14n: String,
    pub digest_method: String,
    pub signature_method: String,
    pub key_info: KeyInfoMode,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            c14n: algorithm::DEFAULT_C14N.to_owned(),
            digest_method: algorithm::DEFAULT_DIGEST.to_owned(),
            signature_method: algorithm::DEFAULT_SIGNATURE.to_owned(),
            key_info: KeyInfoMode::default(),
        }
    }
}

impl SignerConfig {
    /// `KeyInfo` content for `key` in this mode.
    pub fn key_info_for(&self, key: &Key) -> Result<KeyInfo, Error> {
        match self.key_info {
            KeyInfoMode::KeyValue => Ok(KeyInfo::new().with_key_value(key.rsa_public().clone())),
            KeyInfoMode::X509Certificate => {
                if key.x509_chain.is_empty() {
                    return Err(Error::Key("X509Data requested but the key has no certificate".into()));
                }
                Ok(KeyInfo::new().with_x509_data(key.x509_chain.clone()))
            }
        }
    }

    /// The whole-document reference under this configuration.
    pub fn document_reference(&self) -> ReferenceSpec {
        ReferenceSpec::enveloped_document(&self.c14n).with_digest_method(&self.digest_method)
    }
}

/// Everything that goes into one enveloped `Signature`.
#[derive(Debug)]
pub struct SignatureTemplate {
    /// Value of the `Id` attribute on `Signature`.
    pub id: String,
    pub signed_info: SignedInfoBuilder,
    pub key_info: KeyInfo,
    /// Each document's root element becomes the content of one `Object`.
    pub objects: Vec<XmlDocument>,
}

/// Generate an identifier `<prefix>-<uuid>` that `ids` does not know yet.
pub fn fresh_id(prefix: &str, ids: &IdIndex) -> String {
    loop {
        let id = format!("{prefix}-{}", uuid::Uuid::new_v4());
        if !ids.contains(&id) {
            return id;
        }
    }
}

/// Sign `doc` with an enveloped signature built from `template`.
///
/// Returns the attached `Signature` element.
pub fn sign_enveloped(
    ctx: &DsigContext,
    doc: &mut XmlDocument,
    key: &Key,
    template: SignatureTemplate,
) -> Result<NodeId, Error> {
    let (c14n_mode, signature_method) = template.signed_info.check()?;
    let private = key.rsa_private()?;
    let root = doc
        .root_element()
        .ok_or_else(|| Error::XmlStructure("document has no root element".into()))?;
    if ctx.build_used_ids(doc).contains(&template.id) {
        return Err(Error::XmlStructure(format!("id {:?} is already in use", template.id)));
    }

    let prefix = ctx.prefix().map(str::to_owned);
    let sig = doc.create_element(prefix.as_deref(), ns::node::SIGNATURE, Some(ns::DSIG));
    doc.declare_namespace(sig, prefix.as_deref(), ns::DSIG)?;
    doc.set_attribute(sig, ns::attr::ID, &template.id)?;
    doc.append_child(root, sig)?;

    let result = (|| -> Result<(), Error> {
        let prefix = prefix.as_deref();
        let dsig = Some(ns::DSIG);
        let written = template.signed_info.write(doc, sig, prefix)?;
        let sig_value = doc.append_element(sig, prefix, ns::node::SIGNATURE_VALUE, dsig)?;
        if !template.key_info.is_empty() {
            template.key_info.write(doc, sig, prefix)?;
        }
        for content in template.objects {
            let object = doc.append_element(sig, prefix, ns::node::OBJECT, dsig)?;
            let adopted = doc.adopt(content)?;
            doc.append_child(object, adopted)?;
        }

        let ids = ctx.build_id_index(doc);
        let digests = {
            let resolver = ReferenceResolver::new(doc, &ids).with_debug(ctx.debug);
            template
                .signed_info
                .references()
                .iter()
                .map(|r| {
                    let pipeline = TransformPipeline::from_uris(&r.transforms, sig)?;
                    resolver.digest(&r.uri, &pipeline, DigestMethod::from_uri(&r.digest_method)?)
                })
                .collect::<Result<Vec<_>, Error>>()?
        };
        for (node, digest) in written.digest_values.iter().zip(&digests) {
            doc.set_text(*node, &encode_base64(digest))?;
        }

        let c14n = canonicalize_subtree(doc, written.node, c14n_mode)?;
        if ctx.debug {
            tracing::trace!(octets = %String::from_utf8_lossy(&c14n), "canonical SignedInfo");
        }
        let value = signature_method.sign(private, &c14n)?;
        doc.set_text(sig_value, &encode_base64(&value))?;
        tracing::debug!(
            id = %template.id,
            references = digests.len(),
            signature_method = signature_method.uri(),
            "signed document"
        );
        Ok(())
    })();

    match result {
        Ok(()) => Ok(sig),
        Err(e) => {
            doc.detach(sig);
            Err(e)
        }
    }
}

/// Plain XML-DSig enveloped signer: one whole-document reference and no
/// `Object`.
#[derive(Debug)]
pub struct XmlDsigSigner {
    key: Key,
    config: SignerConfig,
    ctx: DsigContext,
}

impl XmlDsigSigner {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            config: SignerConfig::default(),
            ctx: DsigContext::new(),
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

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Append a signature to `doc`, returning the `Signature` element.
    pub fn sign_enveloped(&self, doc: &mut XmlDocument) -> Result<NodeId, Error> {
        let template = SignatureTemplate {
            id: fresh_id("signature", &self.ctx.build_used_ids(doc)),
            signed_info: SignedInfoBuilder::new(&self.config.c14n, &self.config.signature_method)
                .reference(self.config.document_reference()),
            key_info: self.config.key_info_for(&self.key)?,
            objects: Vec::new(),
        };
        sign_enveloped(&self.ctx, doc, &self.key, template)
    }
}
