#![forbid(unsafe_code)]

//! Enveloped XML-DSig and XAdES signatures.
//!
//! ```no_run
//! use ljustero::{keys::loader, xml::XmlDocument, XadesSigner};
//! use std::path::Path;
//!
//! let key = loader::load_signing_key(Path::new("key.pem"), Path::new("cert.pem"))?;
//! let mut doc = XmlDocument::parse("<invoice><total>10</total></invoice>")?;
//! XadesSigner::new(key).sign_enveloped(&mut doc)?;
//! ljustero::xades::validate(&XmlDocument::parse(&doc.to_xml())?)?;
//! # Ok::<(), ljustero::Error>(())
//! ```

pub use ljustero_c14n as c14n;
pub use ljustero_core as core;
pub use ljustero_crypto as crypto;
pub use ljustero_dsig as dsig;
pub use ljustero_keys as keys;
pub use ljustero_transforms as transforms;
pub use ljustero_xades as xades;
pub use ljustero_xml as xml;

pub use ljustero_core::{Error, Result};
pub use ljustero_dsig::{DsigContext, KeyInfoMode, SignerConfig, VerifyResult, XmlDsigSigner};
pub use ljustero_xades::XadesSigner;
