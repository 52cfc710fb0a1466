//! Structural validation of normalized records.
//!
//! Violations are data, not errors: the validator always returns a list,
//! and an empty list means the document conforms. Parse failures are
//! reported through the same channel so callers have a single place to
//! look.

use serde::Serialize;
use tracing::debug;

use mods_normalize::{XmlElement, parse_element};

/// MODS namespace published by the Library of Congress.
pub const MODS_NAMESPACE: &str = "http://www.loc.gov/mods/v3";

/// One schema non-conformance in a record document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Slash-separated element path from the root, e.g. `mods/titleInfo`.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The structural rules a record document is checked against.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    /// Expected root element local name.
    pub root: String,
    /// Expected default namespace declaration on the root, if any.
    pub namespace: Option<String>,
    /// Element local names allowed directly under the root.
    pub top_level: Vec<String>,
    /// Elements that may contain only character data.
    pub text_only: Vec<String>,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::mods()
    }
}

impl RecordSchema {
    /// The built-in MODS 3.x structural summary.
    pub fn mods() -> Self {
        Self {
            root: "mods".to_string(),
            namespace: Some(MODS_NAMESPACE.to_string()),
            top_level: [
                "titleInfo",
                "name",
                "typeOfResource",
                "genre",
                "originInfo",
                "language",
                "physicalDescription",
                "abstract",
                "tableOfContents",
                "targetAudience",
                "note",
                "subject",
                "classification",
                "relatedItem",
                "identifier",
                "location",
                "accessCondition",
                "part",
                "extension",
                "recordInfo",
            ]
            .iter()
            .map(|name| (*name).to_string())
            .collect(),
            text_only: ["abstract", "tableOfContents", "note"]
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

/// Checks record documents against a [`RecordSchema`].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    schema: RecordSchema,
}

impl Validator {
    pub fn new(schema: RecordSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Validate an XML string. Parse errors come back as violations.
    pub fn validate_str(&self, xml: &str) -> Vec<Violation> {
        match parse_element(xml) {
            Ok(root) => self.validate_element(&root),
            Err(err) => vec![Violation {
                path: String::new(),
                message: err.to_string(),
            }],
        }
    }

    /// Validate a parsed record tree.
    pub fn validate_element(&self, root: &XmlElement) -> Vec<Violation> {
        let mut violations = Vec::new();

        if root.local_name() != self.schema.root {
            violations.push(Violation {
                path: root.local_name().to_string(),
                message: format!(
                    "unexpected root element '{}', expected '{}'",
                    root.local_name(),
                    self.schema.root
                ),
            });
        } else {
            if let Some(namespace) = &self.schema.namespace {
                let declared = root.attr("xmlns");
                if declared != Some(namespace.as_str()) {
                    violations.push(Violation {
                        path: root.local_name().to_string(),
                        message: format!("missing or wrong namespace, expected {namespace}"),
                    });
                }
            }
            for child in root.child_elements() {
                if !self
                    .schema
                    .top_level
                    .iter()
                    .any(|allowed| allowed == child.local_name())
                {
                    violations.push(Violation {
                        path: format!("{}/{}", root.local_name(), child.local_name()),
                        message: format!("element '{}' not allowed here", child.local_name()),
                    });
                }
            }
        }

        self.check_text_only(root, root.local_name(), &mut violations);
        debug!(count = violations.len(), "validated record");
        violations
    }

    fn check_text_only(&self, element: &XmlElement, path: &str, violations: &mut Vec<Violation>) {
        for child in element.child_elements() {
            let child_path = format!("{path}/{}", child.local_name());
            if self
                .schema
                .text_only
                .iter()
                .any(|name| name == child.local_name())
            {
                if child.child_elements().next().is_some() {
                    violations.push(Violation {
                        path: child_path.clone(),
                        message: format!(
                            "element '{}' may contain only text",
                            child.local_name()
                        ),
                    });
                }
            } else {
                self.check_text_only(child, &child_path, violations);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "<mods xmlns=\"http://www.loc.gov/mods/v3\"><titleInfo><title>Hello</title></titleInfo><note>fine</note></mods>";

    #[test]
    fn test_valid_record_has_no_violations() {
        let validator = Validator::default();
        assert!(validator.validate_str(VALID).is_empty());
    }

    #[test]
    fn test_parse_errors_are_reported_as_violations() {
        let validator = Validator::default();
        let violations = validator.validate_str("<mods><broken</mods>");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("malformed XML"));
    }

    #[test]
    fn test_unknown_top_level_element() {
        let validator = Validator::default();
        let violations = validator.validate_str(
            "<mods xmlns=\"http://www.loc.gov/mods/v3\"><madeUp>x</madeUp></mods>",
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "mods/madeUp");
    }

    #[test]
    fn test_markup_in_narrative_field() {
        let validator = Validator::default();
        let violations = validator.validate_str(
            "<mods xmlns=\"http://www.loc.gov/mods/v3\"><note>a<br/>b</note></mods>",
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("only text"));
    }

    #[test]
    fn test_missing_namespace() {
        let validator = Validator::default();
        let violations = validator.validate_str("<mods><note>x</note></mods>");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("namespace"));
    }

    #[test]
    fn test_wrong_root_element() {
        let validator = Validator::default();
        let violations = validator.validate_str("<record><note>x</note></record>");
        assert!(
            violations
                .iter()
                .any(|violation| violation.message.contains("unexpected root"))
        );
    }
}
