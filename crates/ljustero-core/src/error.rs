#![forbid(unsafe_code)]

/// Errors produced by the ljustero signing and validation library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed reference: {0}")]
    MalformedReference(String),

    #[error("ambiguous signature: {0}")]
    AmbiguousSignature(String),

    #[error("id resolution failed: {0}")]
    IdResolution(String),

    #[error("no usable key: {0}")]
    KeySelector(String),

    #[error("digest mismatch for reference: {0}")]
    DigestMismatch(String),

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation failed:\n{0}")]
    ValidationFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = Error::DigestMismatch("#signed-properties-1".into());
        assert_eq!(
            err.to_string(),
            "digest mismatch for reference: #signed-properties-1"
        );
    }

    #[test]
    fn test_io_conversion() {
        fn open() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(Error::Io(_))));
    }
}
