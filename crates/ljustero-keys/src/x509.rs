#![forbid(unsafe_code)]

//! X.509 certificate handling.
//!
//! Only what signing and key selection need: the exact DER bytes (for the
//! XAdES certificate digest and `X509Certificate` elements), issuer name and
//! serial number (for `IssuerSerial`) and the RSA subject public key. No
//! path building or validity checking is done.

use der::{Decode, Encode};
use ljustero_core::Error;
use ljustero_crypto::DigestMethod;
use rsa::RsaPublicKey;
use spki::DecodePublicKey;
use x509_cert::Certificate;

/// A parsed certificate carrying an RSA public key.
#[derive(Debug, Clone)]
pub struct X509Certificate {
    der: Vec<u8>,
    issuer: String,
    subject: String,
    serial: String,
    public_key: RsaPublicKey,
}

impl PartialEq for X509Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for X509Certificate {}

impl X509Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(data: &[u8]) -> Result<Self, Error> {
        let cert = Certificate::from_der(data)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        let tbs = &cert.tbs_certificate;

        let spki_der = tbs
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;
        let public_key = RsaPublicKey::from_public_key_der(&spki_der)
            .map_err(|e| Error::Certificate(format!("certificate key is not RSA: {e}")))?;

        Ok(Self {
            der: data.to_vec(),
            issuer: tbs.issuer.to_string(),
            subject: tbs.subject.to_string(),
            serial: format_serial_decimal(tbs.serial_number.as_bytes()),
            public_key,
        })
    }

    /// Parse a PEM `CERTIFICATE` block.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, Error> {
        let pem_str = std::str::from_utf8(pem_data)
            .map_err(|e| Error::Certificate(format!("invalid PEM encoding: {e}")))?;
        let (label, der_bytes) = pem_rfc7468::decode_vec(pem_str.trim().as_bytes())
            .map_err(|e| Error::Certificate(format!("failed to decode certificate PEM: {e}")))?;
        if label != "CERTIFICATE" {
            return Err(Error::Certificate(format!(
                "expected CERTIFICATE PEM label, got: {label}"
            )));
        }
        Self::from_der(&der_bytes)
    }

    /// The exact DER encoding the certificate was parsed from.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Issuer distinguished name in RFC 4514 form.
    pub fn issuer_name(&self) -> &str {
        &self.issuer
    }

    /// Subject distinguished name in RFC 4514 form.
    pub fn subject_name(&self) -> &str {
        &self.subject
    }

    /// Serial number as a decimal string.
    pub fn serial_number(&self) -> &str {
        &self.serial
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Digest of the DER encoding.
    pub fn digest(&self, method: DigestMethod) -> Vec<u8> {
        method.digest(&self.der)
    }
}

/// Render an ASN.1 INTEGER's content bytes as unsigned decimal.
fn format_serial_decimal(bytes: &[u8]) -> String {
    rsa::BigUint::from_bytes_be(bytes).to_string()
}
