#![forbid(unsafe_code)]

//! Key management for the ljustero signing library.
//!
//! Loads RSA keys and X.509 certificates from PEM or DER, models the
//! `KeyInfo` element as a tagged union and selects the verification key
//! from it.

pub mod key;
pub mod keyinfo;
pub mod loader;
pub mod selector;
pub mod x509;

pub use key::{Key, KeyData};
pub use keyinfo::{KeyInfo, KeyInfoItem};
pub use selector::{FixedKeySelector, KeyInfoKeySelector, KeySelector};
pub use x509::X509Certificate;
