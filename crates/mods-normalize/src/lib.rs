//! XML record normalization.
//!
//! The heart of the transpiler: an explicit XML tree model plus an ordered
//! sequence of in-place canonicalization passes that bring one freshly
//! rendered metadata record into schema-conformant shape.

pub mod error;
pub mod normalizer;
pub mod policy;
pub mod tree;

pub use error::XmlError;
pub use normalizer::{Normalizer, clean_text};
pub use policy::{KeepElementFlag, NormalizerPolicy};
pub use tree::{XmlElement, XmlNode, parse_element};
