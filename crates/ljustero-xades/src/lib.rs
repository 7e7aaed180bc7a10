#![forbid(unsafe_code)]

//! XAdES signatures for the ljustero library.
//!
//! A XAdES enveloped signature is an XML-DSig enveloped signature with a
//! second `Reference` covering `<xades:SignedProperties>`, which lives in a
//! `<ds:Object>` of the signature itself and binds the signing time, the
//! signer certificate and the signature policy into what is signed.

pub mod properties;
pub mod signer;

pub use properties::{QualifyingProperties, QualifyingPropertiesBuilder, SignaturePolicy};
pub use signer::{validate, XadesSigner};
