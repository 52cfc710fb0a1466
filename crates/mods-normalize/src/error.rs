//! Error types for XML parsing and serialization.

use thiserror::Error;

/// Errors from turning strings into record trees and back.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The input is not well-formed XML.
    #[error("malformed XML: {message}")]
    Malformed { message: String },

    /// The input parsed but contained no root element.
    #[error("document has no root element")]
    NoRootElement,

    /// More than one top-level element was found.
    #[error("document has more than one root element")]
    MultipleRoots,

    /// An end tag did not match the open element.
    #[error("mismatched end tag </{found}>, expected </{expected}>")]
    MismatchedEndTag { expected: String, found: String },

    /// Serialization failed.
    #[error("failed to serialize XML: {0}")]
    Serialize(#[from] std::io::Error),
}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Malformed {
            message: err.to_string(),
        }
    }
}

/// Result type for XML tree operations.
pub type Result<T> = std::result::Result<T, XmlError>;
