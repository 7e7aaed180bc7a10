#![forbid(unsafe_code)]

//! Transform pipeline and reference resolution.
//!
//! Each `Reference` names a URI and a sequence of transforms applied in
//! order; the resulting octets are digested.

pub mod enveloped;
pub mod pipeline;
pub mod resolver;

pub use enveloped::EnvelopedSignatureTransform;
pub use pipeline::{C14nTransform, Transform, TransformData, TransformPipeline};
pub use resolver::ReferenceResolver;
