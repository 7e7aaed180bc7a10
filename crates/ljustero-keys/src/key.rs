#![forbid(unsafe_code)]

//! Key types and data structures.

use crate::x509::X509Certificate;
use ljustero_core::Error;
use rsa::{RsaPrivateKey, RsaPublicKey};

/// The underlying key data.
#[derive(Clone)]
pub enum KeyData {
    Rsa {
        private: Option<RsaPrivateKey>,
        public: RsaPublicKey,
    },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { private: Some(_), .. } => write!(f, "RSA private+public key"),
            Self::Rsa { private: None, .. } => write!(f, "RSA public key"),
        }
    }
}

/// A key with its optional certificate chain, leaf first.
#[derive(Debug, Clone)]
pub struct Key {
    /// Optional name, typically the file it was loaded from.
    pub name: Option<String>,
    pub data: KeyData,
    pub x509_chain: Vec<X509Certificate>,
}

impl Key {
    pub fn new(data: KeyData) -> Self {
        Self {
            name: None,
            data,
            x509_chain: Vec::new(),
        }
    }

    /// Wrap an RSA private key.
    pub fn from_rsa_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self::new(KeyData::Rsa {
            private: Some(private),
            public,
        })
    }

    /// Set the key name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach the signer certificate. Fails if it does not carry this
    /// key's public half.
    pub fn with_certificate(mut self, cert: X509Certificate) -> Result<Self, Error> {
        if cert.public_key() != self.rsa_public() {
            return Err(Error::Key(format!(
                "certificate {} does not match the private key",
                cert.subject_name()
            )));
        }
        self.x509_chain.insert(0, cert);
        Ok(self)
    }

    pub fn rsa_public(&self) -> &RsaPublicKey {
        match &self.data {
            KeyData::Rsa { public, .. } => public,
        }
    }

    pub fn rsa_private(&self) -> Result<&RsaPrivateKey, Error> {
        match &self.data {
            KeyData::Rsa { private: Some(pk), .. } => Ok(pk),
            KeyData::Rsa { private: None, .. } => {
                Err(Error::Key("RSA private key required for signing".into()))
            }
        }
    }

    /// The leaf certificate, if any.
    pub fn certificate(&self) -> Option<&X509Certificate> {
        self.x509_chain.first()
    }
}
