#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the enclosing `<Signature>` element from the node-set so a
//! reference can cover the document that contains its own signature.

use crate::pipeline::{Transform, TransformData};
use ljustero_core::{algorithm, Error};
use ljustero_xml::{NodeId, XmlDocument};

pub struct EnvelopedSignatureTransform {
    signature: NodeId,
}

impl EnvelopedSignatureTransform {
    pub fn new(signature: NodeId) -> Self {
        Self { signature }
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(&self, doc: &XmlDocument, input: TransformData) -> Result<TransformData, Error> {
        match input {
            TransformData::Xml(mut node_set) => {
                node_set.remove_subtree(doc, self.signature);
                Ok(TransformData::Xml(node_set))
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}
