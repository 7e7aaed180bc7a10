#![forbid(unsafe_code)]

//! Verification key selection.

use crate::keyinfo::{KeyInfo, KeyInfoItem};
use ljustero_core::Error;
use rsa::RsaPublicKey;

/// Chooses the public key a signature is checked against.
///
/// `key_info` is `None` when the signature has no `KeyInfo` element.
pub trait KeySelector {
    fn select(&self, key_info: Option<&KeyInfo>) -> Result<RsaPublicKey, Error>;
}

/// Takes the key the signature advertises: a `KeyValue` when present,
/// otherwise the first certificate of the first `X509Data`.
///
/// Trust, validity period and key/algorithm compatibility are not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyInfoKeySelector;

impl KeySelector for KeyInfoKeySelector {
    fn select(&self, key_info: Option<&KeyInfo>) -> Result<RsaPublicKey, Error> {
        let items = key_info.map(KeyInfo::items).unwrap_or_default();

        let mut first_cert = None;
        for item in items {
            match item {
                KeyInfoItem::KeyValue(key) => {
                    tracing::debug!("selected key from KeyValue");
                    return Ok(key.clone());
                }
                KeyInfoItem::X509Data(certs) => {
                    if first_cert.is_none() {
                        first_cert = certs.first();
                    }
                }
            }
        }

        match first_cert {
            Some(cert) => {
                tracing::debug!(subject = cert.subject_name(), "selected key from X509Certificate");
                Ok(cert.public_key().clone())
            }
            None => Err(Error::KeySelector(
                "KeyInfo has neither KeyValue nor X509Certificate".into(),
            )),
        }
    }
}

/// Ignores `KeyInfo` and always answers with a known key.
#[derive(Debug, Clone)]
pub struct FixedKeySelector(pub RsaPublicKey);

impl KeySelector for FixedKeySelector {
    fn select(&self, _key_info: Option<&KeyInfo>) -> Result<RsaPublicKey, Error> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x509::X509Certificate;

    const CERT_PEM: &[u8] = include_bytes!("../../ljustero/tests/data/cert.pem");
    const OTHER_CERT_PEM: &[u8] = include_bytes!("../../ljustero/tests/data/other_cert.pem");

    #[test]
    fn test_prefers_key_value() {
        let cert = X509Certificate::from_pem(CERT_PEM).unwrap();
        let other = X509Certificate::from_pem(OTHER_CERT_PEM).unwrap();
        let info = KeyInfo::new()
            .with_x509_data(vec![other])
            .with_key_value(cert.public_key().clone());
        let key = KeyInfoKeySelector.select(Some(&info)).unwrap();
        assert_eq!(&key, cert.public_key());
    }

    #[test]
    fn test_first_certificate() {
        let cert = X509Certificate::from_pem(CERT_PEM).unwrap();
        let other = X509Certificate::from_pem(OTHER_CERT_PEM).unwrap();
        let info = KeyInfo::new()
            .with_x509_data(vec![])
            .with_x509_data(vec![cert.clone(), other]);
        let key = KeyInfoKeySelector.select(Some(&info)).unwrap();
        assert_eq!(&key, cert.public_key());
    }

    #[test]
    fn test_nothing_usable() {
        assert!(matches!(
            KeyInfoKeySelector.select(None),
            Err(Error::KeySelector(_))
        ));
        assert!(matches!(
            KeyInfoKeySelector.select(Some(&KeyInfo::new())),
            Err(Error::KeySelector(_))
        ));
    }

    #[test]
    fn test_fixed() {
        let cert = X509Certificate::from_pem(CERT_PEM).unwrap();
        let selector = FixedKeySelector(cert.public_key().clone());
        assert_eq!(&selector.select(None).unwrap(), cert.public_key());
    }
}
