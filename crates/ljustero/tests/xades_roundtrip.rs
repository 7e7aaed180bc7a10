//! End-to-end XAdES signing and validation.

use chrono::{TimeZone, Utc};
use ljustero::core::{algorithm, ns};
use ljustero::dsig::{verify, ReferenceStatus, SignatureStatus};
use ljustero::keys::loader::{load_rsa_private_pem, load_x509_cert_pem};
use ljustero::keys::{FixedKeySelector, Key};
use ljustero::xades::{validate, QualifyingProperties};
use ljustero::xml::XmlDocument;
use ljustero::{DsigContext, Error, KeyInfoMode, SignerConfig, XadesSigner};

const KEY_PEM: &[u8] = include_bytes!("data/key.pem");
const CERT_PEM: &[u8] = include_bytes!("data/cert.pem");
const OTHER_CERT_PEM: &[u8] = include_bytes!("data/other_cert.pem");

const DOCUMENT: &str = r#"<documentToSign xmlns="urn:example:document">
    <numeric>1</numeric>
    <string>string-value</string>
    <!-- not covered by the whole-document reference -->
    <time>2000-01-01T01:01:01Z</time>
</documentToSign>"#;

fn key() -> Key {
    load_rsa_private_pem(KEY_PEM)
        .unwrap()
        .with_certificate(load_x509_cert_pem(CERT_PEM).unwrap())
        .unwrap()
}

fn sign(xml: &str) -> XmlDocument {
    let mut doc = XmlDocument::parse(xml).unwrap();
    XadesSigner::new(key()).sign_enveloped(&mut doc).unwrap();
    doc
}

fn reparse(doc: &XmlDocument) -> XmlDocument {
    XmlDocument::parse(&doc.to_xml()).unwrap()
}

#[test]
fn round_trip_in_memory() {
    let doc = sign(DOCUMENT);
    validate(&doc).unwrap();
}

#[test]
fn round_trip_through_string() {
    let doc = sign(DOCUMENT);
    validate(&reparse(&doc)).unwrap();
}

#[test]
fn round_trip_through_bytes() {
    let doc = sign(DOCUMENT);
    let bytes = doc.to_xml().into_bytes();
    validate(&XmlDocument::parse_bytes(&bytes).unwrap()).unwrap();
}

#[test]
fn concrete_scenario() {
    let time = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    let sig = XadesSigner::new(key())
        .with_signing_time(time)
        .sign_enveloped(&mut doc)
        .unwrap();

    let si = doc.find_child_element(sig, ns::DSIG, ns::node::SIGNED_INFO).unwrap();
    let refs = doc.find_child_elements(si, ns::DSIG, ns::node::REFERENCE);
    assert_eq!(refs.len(), 2);
    for r in &refs {
        let dv = doc.find_child_element(*r, ns::DSIG, ns::node::DIGEST_VALUE).unwrap();
        assert!(!doc.text_content(dv).is_empty());
    }

    let objects = doc.find_child_elements(sig, ns::DSIG, ns::node::OBJECT);
    assert_eq!(objects.len(), 1);
    let qps = doc.find_child_elements(objects[0], ns::XADES, ns::node::QUALIFYING_PROPERTIES);
    assert_eq!(qps.len(), 1);
    for local in [
        ns::node::SIGNING_TIME,
        ns::node::SIGNING_CERTIFICATE,
        ns::node::SIGNATURE_POLICY_IDENTIFIER,
    ] {
        assert_eq!(doc.find_elements(ns::XADES, local).len(), 1, "{local}");
    }

    let props = QualifyingProperties::parse(&doc, qps[0]).unwrap();
    assert_eq!(props.signing_time, time);
    assert!(props.matches_certificate(key().certificate().unwrap()));

    let xml = doc.to_xml();
    validate(&XmlDocument::parse(&xml).unwrap()).unwrap();

    let changed = xml.replace("string-value", "other-value");
    assert_ne!(changed, xml);
    let err = validate(&XmlDocument::parse(&changed).unwrap()).unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[test]
fn document_tamper_fails_document_reference() {
    let xml = sign(DOCUMENT).to_xml().replace("<numeric>1</numeric>", "<numeric>2</numeric>");
    let result = verify(&DsigContext::new(), &XmlDocument::parse(&xml).unwrap()).unwrap();

    assert!(!result.is_valid());
    assert!(matches!(result.references[0].status, ReferenceStatus::DigestMismatch));
    assert!(result.references[1].is_valid());
    assert!(result.signature_valid());
    assert!(matches!(
        result.into_failures().as_slice(),
        [Error::DigestMismatch(uri)] if uri.is_empty()
    ));
}

#[test]
fn properties_tamper_fails_properties_reference() {
    let time = Utc.with_ymd_and_hms(2000, 1, 1, 1, 1, 1).unwrap();
    let mut doc = XmlDocument::parse("<doc><time>2000-01-01T01:01:01Z</time></doc>").unwrap();
    XadesSigner::new(key())
        .with_signing_time(time)
        .sign_enveloped(&mut doc)
        .unwrap();
    let xml = doc.to_xml().replace(
        "<xades:SigningTime>2000-01-01T01:01:01Z</xades:SigningTime>",
        "<xades:SigningTime>1999-01-01T01:01:01Z</xades:SigningTime>",
    );

    let result = verify(&DsigContext::new(), &XmlDocument::parse(&xml).unwrap()).unwrap();
    assert!(result.references[0].is_valid());
    assert!(matches!(result.references[1].status, ReferenceStatus::DigestMismatch));

    let diagnostics = result.diagnostics();
    let lines: Vec<&str> = diagnostics.lines().collect();
    assert_eq!(lines[0], "signature validity: true");
    assert_eq!(lines[1], "reference[uri=] validity: true");
    assert!(lines[2].starts_with("reference[uri=#signed-properties-"));
    assert!(lines[2].ends_with("] validity: false"));
}

#[test]
fn key_value_and_certificate_both_verify() {
    for mode in [KeyInfoMode::X509Certificate, KeyInfoMode::KeyValue] {
        let config = SignerConfig {
            key_info: mode,
            ..SignerConfig::default()
        };
        let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
        XadesSigner::new(key())
            .with_config(config)
            .sign_enveloped(&mut doc)
            .unwrap();

        let has_key_value = doc.find_element(ns::DSIG, ns::node::KEY_VALUE).is_some();
        let has_x509 = doc.find_element(ns::DSIG, ns::node::X509_DATA).is_some();
        assert_eq!(has_key_value, mode == KeyInfoMode::KeyValue);
        assert_eq!(has_x509, mode == KeyInfoMode::X509Certificate);

        validate(&reparse(&doc)).unwrap();
    }
}

#[test]
fn swapped_certificate_breaks_signature_value() {
    let doc = sign(DOCUMENT);
    let own = load_x509_cert_pem(CERT_PEM).unwrap();
    let other = load_x509_cert_pem(OTHER_CERT_PEM).unwrap();
    let xml = doc.to_xml().replace(
        &ljustero::keys::keyinfo::encode_base64(own.der()),
        &ljustero::keys::keyinfo::encode_base64(other.der()),
    );

    let result = verify(&DsigContext::new(), &XmlDocument::parse(&xml).unwrap()).unwrap();
    assert!(matches!(result.signature, SignatureStatus::Invalid));
    assert!(result.references.iter().all(|r| r.is_valid()));
}

#[test]
fn explicit_verification_key() {
    let doc = reparse(&sign(DOCUMENT));
    let own = load_x509_cert_pem(CERT_PEM).unwrap();
    let other = load_x509_cert_pem(OTHER_CERT_PEM).unwrap();

    let ctx = DsigContext::new().with_key_selector(FixedKeySelector(own.public_key().clone()));
    assert!(verify(&ctx, &doc).unwrap().is_valid());

    let ctx = DsigContext::new().with_key_selector(FixedKeySelector(other.public_key().clone()));
    let failures = verify(&ctx, &doc).unwrap().into_failures();
    assert!(matches!(failures.as_slice(), [Error::SignatureInvalid(_)]));
}

#[test]
fn properties_id_on_other_element_resolves_only_when_all_indexed() {
    let doc = sign(DOCUMENT);
    let props = QualifyingProperties::find(&doc).unwrap();
    let xml = doc.to_xml().replace(
        "<numeric>1</numeric>",
        &format!(r#"<numeric Id="{}">1</numeric>"#, props.signed_properties_id),
    );
    let tampered = XmlDocument::parse(&xml).unwrap();

    let scoped = verify(&DsigContext::new(), &tampered).unwrap();
    assert!(!scoped.is_valid());
    assert!(matches!(scoped.references[1].status, ReferenceStatus::Valid));

    let all = verify(&DsigContext::new().index_all_elements(), &tampered).unwrap();
    assert!(matches!(
        all.references[1].status,
        ReferenceStatus::Unresolvable(Error::IdResolution(_))
    ));
}

#[test]
fn extra_signature_is_ambiguous() {
    let mut doc = sign("<doc/>");
    XadesSigner::new(key()).sign_enveloped(&mut doc).unwrap();
    assert!(matches!(
        verify(&DsigContext::new(), &doc),
        Err(Error::AmbiguousSignature(_))
    ));
}

#[test]
fn unsigned_document_is_malformed() {
    let doc = XmlDocument::parse(DOCUMENT).unwrap();
    assert!(matches!(validate(&doc), Err(Error::MalformedReference(_))));
}

#[test]
fn alternative_algorithms() {
    let config = SignerConfig {
        c14n: algorithm::C14N.to_owned(),
        digest_method: algorithm::SHA512.to_owned(),
        signature_method: algorithm::RSA_SHA512.to_owned(),
        key_info: KeyInfoMode::X509Certificate,
    };
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    XadesSigner::new(key()).with_config(config).sign_enveloped(&mut doc).unwrap();
    let props = QualifyingProperties::find(&doc).unwrap();
    assert_eq!(props.cert_digest.len(), 64);
    validate(&reparse(&doc)).unwrap();
}

#[test]
fn custom_prefix() {
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    XadesSigner::new(key())
        .with_context(DsigContext::new().with_prefix(Some("ns2")))
        .sign_enveloped(&mut doc)
        .unwrap();
    let xml = doc.to_xml();
    assert!(xml.contains(r#"<ns2:Signature xmlns:ns2="http://www.w3.org/2000/09/xmldsig#""#));
    validate(&XmlDocument::parse(&xml).unwrap()).unwrap();
}
