//! Normalization policy: which tags and attributes get special treatment.
//!
//! The traversal algorithms are policy-free; everything cataloging-specific
//! (narrative fields, pruning exemptions, date qualifiers) lives here so the
//! default MODS conventions can evolve without touching the passes.

/// A (tag, attribute, value) triple that exempts an element from
/// empty-node pruning. The value comparison is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepElementFlag {
    pub tag: String,
    pub attr: String,
    pub value: String,
}

impl KeepElementFlag {
    pub fn new(
        tag: impl Into<String>,
        attr: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            attr: attr.into(),
            value: value.into(),
        }
    }
}

/// Configuration for the normalization passes.
#[derive(Debug, Clone)]
pub struct NormalizerPolicy {
    /// Local names of free-text elements whose subtrees are flattened to
    /// text with linefeed markers. The schema forbids markup inside them.
    pub narrative_tags: Vec<String>,
    /// Attributes kept even when their value is empty.
    pub keep_attrs: Vec<String>,
    /// Elements kept even when empty, identified by a tag/attribute/value
    /// combination that is meaningful on its own.
    pub keep_element_flags: Vec<KeepElementFlag>,
    /// Local names of date-bearing elements subject to value cleanup.
    pub date_tags: Vec<String>,
    /// The start/end qualifier removed from lone date elements.
    pub point_attr: String,
}

impl Default for NormalizerPolicy {
    /// The Stanford MODS cataloging conventions.
    fn default() -> Self {
        Self {
            narrative_tags: vec![
                "abstract".to_string(),
                "tableOfContents".to_string(),
                "note".to_string(),
            ],
            keep_attrs: vec!["xlink:href".to_string(), "href".to_string()],
            keep_element_flags: vec![
                KeepElementFlag::new("typeOfResource", "collection", "yes"),
                KeepElementFlag::new("typeOfResource", "manuscript", "yes"),
            ],
            date_tags: vec!["dateCreated".to_string(), "dateIssued".to_string()],
            point_attr: "point".to_string(),
        }
    }
}

impl NormalizerPolicy {
    pub fn is_narrative(&self, local_name: &str) -> bool {
        self.narrative_tags.iter().any(|tag| tag == local_name)
    }

    pub fn is_keep_attr(&self, attr_name: &str) -> bool {
        self.keep_attrs.iter().any(|name| name == attr_name)
    }

    pub fn is_date_tag(&self, local_name: &str) -> bool {
        self.date_tags.iter().any(|tag| tag == local_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_mods_conventions() {
        let policy = NormalizerPolicy::default();
        assert!(policy.is_narrative("abstract"));
        assert!(policy.is_narrative("tableOfContents"));
        assert!(policy.is_narrative("note"));
        assert!(!policy.is_narrative("titleInfo"));
        assert!(policy.is_keep_attr("xlink:href"));
        assert!(!policy.is_keep_attr("type"));
        assert!(policy.is_date_tag("dateCreated"));
        assert!(policy.is_date_tag("dateIssued"));
        assert!(!policy.is_date_tag("dateCaptured"));
    }
}
