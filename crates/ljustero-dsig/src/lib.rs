#![forbid(unsafe_code)]

//! Enveloped XML-DSig signatures for the ljustero library.
//!
//! Signing builds a `<ds:Signature>` element, appends it as the last child
//! of the document root and fills it in two phases: first every
//! `Reference` digest, then the `SignatureValue` over the canonical
//! `SignedInfo`. Verification walks the same structure back and reports
//! per-reference and signature-value outcomes.

pub mod context;
pub mod sign;
pub mod signedinfo;
pub mod verify;

pub use context::DsigContext;
pub use sign::{fresh_id, sign_enveloped, KeyInfoMode, SignatureTemplate, SignerConfig, XmlDsigSigner};
pub use signedinfo::{ParsedReference, ParsedSignedInfo, ReferenceSpec, SignedInfoBuilder, WrittenSignedInfo};
pub use verify::{
    locate_signature, validate, verify, verify_str, ReferenceResult, ReferenceStatus, SignatureStatus,
    VerifyResult,
};
