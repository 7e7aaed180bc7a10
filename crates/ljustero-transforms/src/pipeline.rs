#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use crate::enveloped::EnvelopedSignatureTransform;
use ljustero_c14n::C14nMode;
use ljustero_core::{algorithm, Error};
use ljustero_xml::{NodeId, NodeSet, XmlDocument};

/// Data flowing through the transform pipeline.
#[derive(Debug, Clone)]
pub enum TransformData {
    /// A node-set of the document being processed.
    Xml(NodeSet),
    /// Octets.
    Binary(Vec<u8>),
}

impl TransformData {
    /// Convert to octets. A node-set left at the end of the chain is
    /// serialized with Canonical XML 1.0 without comments.
    pub fn into_binary(self, doc: &XmlDocument) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data),
            TransformData::Xml(node_set) => {
                ljustero_c14n::canonicalize(doc, C14nMode::Inclusive, Some(&node_set))
            }
        }
    }
}

/// Trait for individual transforms.
pub trait Transform: Send + Sync {
    /// The algorithm URI for this transform.
    fn uri(&self) -> &str;

    /// Execute the transform on the given data.
    fn execute(&self, doc: &XmlDocument, input: TransformData) -> Result<TransformData, Error>;
}

/// A pipeline of transforms executed in sequence.
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from `Transform` algorithm URIs.
    ///
    /// `signature` is the enclosing `Signature` element, removed by the
    /// enveloped-signature transform.
    pub fn from_uris<S: AsRef<str>>(uris: &[S], signature: NodeId) -> Result<Self, Error> {
        let mut pipeline = Self::new();
        for uri in uris {
            let uri = uri.as_ref();
            let transform: Box<dyn Transform> = if uri == algorithm::ENVELOPED_SIGNATURE {
                Box::new(EnvelopedSignatureTransform::new(signature))
            } else if let Some(mode) = C14nMode::from_uri(uri) {
                Box::new(C14nTransform::new(mode))
            } else {
                return Err(Error::UnsupportedAlgorithm(format!("transform: {uri}")));
            };
            pipeline.push(transform);
        }
        Ok(pipeline)
    }

    /// Add a transform to the pipeline.
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Execute all transforms in order.
    pub fn execute(&self, doc: &XmlDocument, input: TransformData) -> Result<TransformData, Error> {
        let mut data = input;
        for transform in &self.transforms {
            data = transform.execute(doc, data)?;
        }
        Ok(data)
    }

    /// Algorithm URIs in order.
    pub fn uris(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.uri()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

// ── C14N Transform ───────────────────────────────────────────────────

/// A canonicalization transform.
pub struct C14nTransform {
    mode: C14nMode,
}

impl C14nTransform {
    pub fn new(mode: C14nMode) -> Self {
        Self { mode }
    }
}

impl Transform for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute(&self, doc: &XmlDocument, input: TransformData) -> Result<TransformData, Error> {
        let bytes = match input {
            TransformData::Xml(node_set) => {
                ljustero_c14n::canonicalize(doc, self.mode, Some(&node_set))?
            }
            TransformData::Binary(data) => {
                let parsed = XmlDocument::parse_bytes(&data)
                    .map_err(|e| Error::Transform(format!("C14N input is not XML: {e}")))?;
                ljustero_c14n::canonicalize(&parsed, self.mode, None)?
            }
        };
        Ok(TransformData::Binary(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uris_order() {
        let doc = XmlDocument::parse("<r/>").unwrap();
        let root = doc.root_element().unwrap();
        let pipeline = TransformPipeline::from_uris(
            &[algorithm::ENVELOPED_SIGNATURE, algorithm::C14N11_WITH_COMMENTS],
            root,
        )
        .unwrap();
        assert_eq!(
            pipeline.uris(),
            [algorithm::ENVELOPED_SIGNATURE, algorithm::C14N11_WITH_COMMENTS]
        );
    }

    #[test]
    fn test_unknown_transform() {
        let doc = XmlDocument::parse("<r/>").unwrap();
        let root = doc.root_element().unwrap();
        assert!(matches!(
            TransformPipeline::from_uris(&["http://www.w3.org/TR/1999/REC-xslt-19991116"], root),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_c14n_on_binary_input() {
        let doc = XmlDocument::new();
        let out = C14nTransform::new(C14nMode::Inclusive11)
            .execute(&doc, TransformData::Binary(b"<a  y='1' x='2'/>".to_vec()))
            .unwrap()
            .into_binary(&doc)
            .unwrap();
        assert_eq!(out, br#"<a x="2" y="1"></a>"#);
    }

    #[test]
    fn test_node_set_defaults_to_c14n10() {
        let doc = XmlDocument::parse("<r><!--c--><a/></r>").unwrap();
        let out = TransformData::Xml(NodeSet::all(&doc)).into_binary(&doc).unwrap();
        assert_eq!(out, b"<r><a></a></r>");
    }
}
