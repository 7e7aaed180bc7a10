#![forbid(unsafe_code)]

//! Cryptographic primitives for the ljustero signing library.
//!
//! Digests over canonical bytes and RSA PKCS#1 v1.5 signatures, both
//! selected by their XML-DSig algorithm URI.

pub mod digest;
pub mod sign;

pub use self::digest::DigestMethod;
pub use sign::SignatureMethod;
