#![forbid(unsafe_code)]

//! Key and certificate loading from PEM and DER.

use crate::key::Key;
use crate::x509::X509Certificate;
use ljustero_core::Error;
use std::path::Path;

/// Load an RSA private key from PEM data (PKCS#8 or PKCS#1).
pub fn load_rsa_private_pem(pem_data: &[u8]) -> Result<Key, Error> {
    use pkcs1::DecodeRsaPrivateKey;
    use pkcs8::DecodePrivateKey;
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_pem(pem_str) {
        return Ok(Key::from_rsa_private(pk));
    }
    let pk = rsa::RsaPrivateKey::from_pkcs1_pem(pem_str)
        .map_err(|e| Error::Key(format!("failed to parse RSA private key PEM: {e}")))?;
    Ok(Key::from_rsa_private(pk))
}

/// Load an RSA private key from DER data (PKCS#8 or PKCS#1).
pub fn load_rsa_private_der(der: &[u8]) -> Result<Key, Error> {
    use pkcs1::DecodeRsaPrivateKey;
    use pkcs8::DecodePrivateKey;
    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
        return Ok(Key::from_rsa_private(pk));
    }
    let pk = rsa::RsaPrivateKey::from_pkcs1_der(der)
        .map_err(|e| Error::Key(format!("failed to parse RSA private key DER: {e}")))?;
    Ok(Key::from_rsa_private(pk))
}

/// Load an X.509 certificate from PEM data.
pub fn load_x509_cert_pem(pem_data: &[u8]) -> Result<X509Certificate, Error> {
    X509Certificate::from_pem(pem_data)
}

/// Load an X.509 certificate from DER data.
pub fn load_x509_cert_der(der: &[u8]) -> Result<X509Certificate, Error> {
    X509Certificate::from_der(der)
}

/// Load a private key file, PEM or DER.
pub fn load_key_file(path: &Path) -> Result<Key, Error> {
    let data = std::fs::read(path)?;
    let key = if is_pem(&data) {
        load_rsa_private_pem(&data)?
    } else {
        load_rsa_private_der(&data)?
    };
    tracing::debug!(path = %path.display(), "loaded private key");
    Ok(key.with_name(path.display().to_string()))
}

/// Load a certificate file, PEM or DER.
pub fn load_cert_file(path: &Path) -> Result<X509Certificate, Error> {
    let data = std::fs::read(path)?;
    let cert = if is_pem(&data) {
        load_x509_cert_pem(&data)?
    } else {
        load_x509_cert_der(&data)?
    };
    tracing::debug!(path = %path.display(), subject = cert.subject_name(), "loaded certificate");
    Ok(cert)
}

/// Load a signing key together with its certificate.
pub fn load_signing_key(key_path: &Path, cert_path: &Path) -> Result<Key, Error> {
    load_key_file(key_path)?.with_certificate(load_cert_file(cert_path)?)
}

fn is_pem(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    data[start..].starts_with(b"-----BEGIN")
}
