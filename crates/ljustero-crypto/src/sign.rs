#![forbid(unsafe_code)]

//! RSA PKCS#1 v1.5 signature methods.

use crate::digest::DigestMethod;
use ljustero_core::{algorithm, Error};
use rsa::{RsaPrivateKey, RsaPublicKey};
use signature::SignatureEncoding;

/// A supported `SignatureMethod`: RSA PKCS#1 v1.5 over the given hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureMethod {
    uri: &'static str,
    hash: DigestMethod,
}

impl SignatureMethod {
    /// Look up a signature method by its algorithm URI.
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        let (uri, hash) = match uri {
            algorithm::RSA_SHA1 => (algorithm::RSA_SHA1, DigestMethod::Sha1),
            algorithm::RSA_SHA224 => (algorithm::RSA_SHA224, DigestMethod::Sha224),
            algorithm::RSA_SHA256 => (algorithm::RSA_SHA256, DigestMethod::Sha256),
            algorithm::RSA_SHA384 => (algorithm::RSA_SHA384, DigestMethod::Sha384),
            algorithm::RSA_SHA512 => (algorithm::RSA_SHA512, DigestMethod::Sha512),
            _ => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "signature algorithm: {uri}"
                )))
            }
        };
        Ok(Self { uri, hash })
    }

    pub fn uri(&self) -> &'static str {
        self.uri
    }

    /// The hash applied before the RSA operation.
    pub fn hash(&self) -> DigestMethod {
        self.hash
    }

    /// Hash `data` and sign it.
    pub fn sign(&self, key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(key.clone());
                sk.try_sign(data)
                    .map(|sig| sig.to_vec())
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))
            }};
        }
        match self.hash {
            DigestMethod::Sha1 => do_sign!(sha1::Sha1),
            DigestMethod::Sha224 => do_sign!(sha2::Sha224),
            DigestMethod::Sha256 => do_sign!(sha2::Sha256),
            DigestMethod::Sha384 => do_sign!(sha2::Sha384),
            DigestMethod::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    /// Check `sig_bytes` over `data`. A well-formed but wrong signature is
    /// `Ok(false)`; only undecodable input is an error.
    pub fn verify(&self, key: &RsaPublicKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            DigestMethod::Sha1 => do_verify!(sha1::Sha1),
            DigestMethod::Sha224 => do_verify!(sha2::Sha224),
            DigestMethod::Sha256 => do_verify!(sha2::Sha256),
            DigestMethod::Sha384 => do_verify!(sha2::Sha384),
            DigestMethod::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> RsaPrivateKey {
        let mut rng = rand::thread_rng();
        RsaPrivateKey::new(&mut rng, 1024).unwrap()
    }

    #[test]
    fn test_sign_verify() {
        let private = key();
        let public = private.to_public_key();
        for uri in [algorithm::RSA_SHA1, algorithm::RSA_SHA256, algorithm::RSA_SHA512] {
            let method = SignatureMethod::from_uri(uri).unwrap();
            let sig = method.sign(&private, b"signed info").unwrap();
            assert_eq!(sig.len(), 128);
            assert!(method.verify(&public, b"signed info", &sig).unwrap());
            assert!(!method.verify(&public, b"signed inf0", &sig).unwrap());
        }
    }

    #[test]
    fn test_hash_mismatch_fails() {
        let private = key();
        let sha256 = SignatureMethod::from_uri(algorithm::RSA_SHA256).unwrap();
        let sha512 = SignatureMethod::from_uri(algorithm::RSA_SHA512).unwrap();
        let sig = sha256.sign(&private, b"data").unwrap();
        assert!(!sha512.verify(&private.to_public_key(), b"data", &sig).unwrap());
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            SignatureMethod::from_uri(algorithm::SHA256),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
