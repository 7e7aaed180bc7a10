//! Plain XML-DSig enveloped signatures, without qualifying properties.

use ljustero::core::{algorithm, ns};
use ljustero::dsig::{validate, verify, ReferenceStatus};
use ljustero::keys::loader::{load_rsa_private_pem, load_x509_cert_pem};
use ljustero::keys::Key;
use ljustero::xml::XmlDocument;
use ljustero::{DsigContext, Error, SignerConfig, XmlDsigSigner};

const KEY_PEM: &[u8] = include_bytes!("data/key.pem");
const KEY_PKCS1_PEM: &[u8] = include_bytes!("data/key_pkcs1.pem");
const CERT_PEM: &[u8] = include_bytes!("data/cert.pem");

const DOCUMENT: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<order id=\"o-1\" xmlns:p=\"urn:example:product\">\r\n  \
<p:item sku=\"a&amp;b\" qty=\"2\"/>\n  \
<note><![CDATA[fragile & heavy]]></note>\n\
</order>";

fn key(pem: &[u8]) -> Key {
    load_rsa_private_pem(pem)
        .unwrap()
        .with_certificate(load_x509_cert_pem(CERT_PEM).unwrap())
        .unwrap()
}

#[test]
fn single_reference_round_trip() {
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    let sig = XmlDsigSigner::new(key(KEY_PEM)).sign_enveloped(&mut doc).unwrap();

    let si = doc.find_child_element(sig, ns::DSIG, ns::node::SIGNED_INFO).unwrap();
    assert_eq!(doc.find_child_elements(si, ns::DSIG, ns::node::REFERENCE).len(), 1);
    assert!(doc.find_element(ns::DSIG, ns::node::OBJECT).is_none());
    assert!(doc.find_element(ns::XADES, ns::node::QUALIFYING_PROPERTIES).is_none());

    validate(&DsigContext::new(), &doc).unwrap();
    let reparsed = XmlDocument::parse(&doc.to_xml()).unwrap();
    validate(&DsigContext::new(), &reparsed).unwrap();
}

#[test]
fn signing_keeps_declaration_and_cdata() {
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    XmlDsigSigner::new(key(KEY_PEM)).sign_enveloped(&mut doc).unwrap();
    let xml = doc.to_xml();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><order id="o-1" xmlns:p="urn:example:product">"#));
    assert!(xml.contains("<note><![CDATA[fragile & heavy]]></note>"));
    assert!(xml.contains(r#"<p:item sku="a&amp;b" qty="2"/>"#));
}

#[test]
fn default_namespace_document_round_trip() {
    let source = r#"<a xmlns:p="urn:u" xmlns="urn:u"><b>x</b><p:c/></a>"#;
    let mut doc = XmlDocument::parse(source).unwrap();
    XmlDsigSigner::new(key(KEY_PEM)).sign_enveloped(&mut doc).unwrap();
    let xml = doc.to_xml();
    assert!(xml.starts_with(r#"<a xmlns:p="urn:u" xmlns="urn:u"><b>x</b><p:c/><ds:Signature"#));
    validate(&DsigContext::new(), &XmlDocument::parse(&xml).unwrap()).unwrap();
}

#[test]
fn pkcs1_key_signs_identically_verifiable() {
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    XmlDsigSigner::new(key(KEY_PKCS1_PEM)).sign_enveloped(&mut doc).unwrap();
    validate(&DsigContext::new(), &XmlDocument::parse(&doc.to_xml()).unwrap()).unwrap();
}

#[test]
fn attribute_tamper_detected() {
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    XmlDsigSigner::new(key(KEY_PEM)).sign_enveloped(&mut doc).unwrap();
    let xml = doc.to_xml().replace(r#"qty="2""#, r#"qty="3""#);

    let result = verify(&DsigContext::new(), &XmlDocument::parse(&xml).unwrap()).unwrap();
    assert!(matches!(result.references[0].status, ReferenceStatus::DigestMismatch));
    assert!(matches!(
        result.into_result(),
        Err(Error::ValidationFailed(text)) if text.ends_with("reference[uri=] validity: false")
    ));
}

#[test]
fn reformatting_between_attributes_is_harmless() {
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    XmlDsigSigner::new(key(KEY_PEM)).sign_enveloped(&mut doc).unwrap();
    let xml = doc
        .to_xml()
        .replace(r#"sku="a&amp;b" qty="2""#, "qty='2'\n     sku='a&#38;b'");
    validate(&DsigContext::new(), &XmlDocument::parse(&xml).unwrap()).unwrap();
}

#[test]
fn signature_value_tamper_detected() {
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    let sig = XmlDsigSigner::new(key(KEY_PEM)).sign_enveloped(&mut doc).unwrap();
    let sv = doc.find_child_element(sig, ns::DSIG, ns::node::SIGNATURE_VALUE).unwrap();
    let value = doc.text_content(sv);
    let flipped = if value.starts_with('A') { "B" } else { "A" };
    doc.set_text(sv, &format!("{flipped}{}", &value[1..])).unwrap();

    let result = verify(&DsigContext::new(), &doc).unwrap();
    assert!(!result.signature_valid());
    assert!(result.references[0].is_valid());
}

#[test]
fn sha512_configuration() {
    let config = SignerConfig {
        signature_method: algorithm::RSA_SHA512.to_owned(),
        ..SignerConfig::default()
    };
    let mut doc = XmlDocument::parse(DOCUMENT).unwrap();
    XmlDsigSigner::new(key(KEY_PEM))
        .with_config(config)
        .sign_enveloped(&mut doc)
        .unwrap();
    let sm = doc.find_element(ns::DSIG, ns::node::SIGNATURE_METHOD).unwrap();
    assert_eq!(doc.attribute(sm, ns::attr::ALGORITHM), Some(algorithm::RSA_SHA512));
    validate(&DsigContext::new(), &XmlDocument::parse(&doc.to_xml()).unwrap()).unwrap();
}
