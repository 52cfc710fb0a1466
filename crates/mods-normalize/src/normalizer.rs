//! Canonicalization passes for one metadata record tree.
//!
//! The passes run in a fixed order because later passes rely on invariants
//! established by earlier ones: linefeed canonicalization consumes the
//! `<br>`/`<p>` markup that empty-node pruning would otherwise delete, and
//! pruning runs before whitespace trimming so trimming never touches
//! fragments that are about to disappear.

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::policy::NormalizerPolicy;
use crate::tree::{XmlElement, XmlNode, parse_element};

/// Applies the normalization pass sequence to record trees.
#[derive(Debug)]
pub struct Normalizer {
    policy: NormalizerPolicy,
    date_suffix: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerPolicy::default())
    }
}

impl Normalizer {
    pub fn new(policy: NormalizerPolicy) -> Self {
        // Spreadsheet numeric cells sometimes arrive as "1990.500"; the
        // suffix match is anchored so "1990-05" style dates are untouched.
        let date_suffix = Regex::new(r"^(.*)\.\d+$").expect("valid date suffix pattern");
        Self {
            policy,
            date_suffix,
        }
    }

    pub fn policy(&self) -> &NormalizerPolicy {
        &self.policy
    }

    /// Run the full pass sequence on a record tree, in place.
    ///
    /// The root element itself is never deleted: a record whose every field
    /// was pruned survives as a single empty element.
    pub fn normalize(&self, root: &mut XmlElement) {
        self.canonicalize_linefeeds(root);
        self.remove_empty_attributes(root);
        self.remove_empty_nodes(root);
        self.trim_text(root);
        self.clean_dates(root);
        debug!(root = %root.name, "normalized record tree");
    }

    /// Parse, normalize, and re-serialize an XML string.
    pub fn normalize_str(&self, xml: &str) -> Result<String> {
        let mut root = parse_element(xml)?;
        self.normalize(&mut root);
        root.to_xml_string()
    }

    /// Pass 1: flatten narrative fields to text with linefeed markers.
    ///
    /// `<br>` becomes one linefeed, `<p>` two at its opening and nothing at
    /// its close; `\r\n`, `\n`, `\r` and the literal two-character `\n`
    /// escape each become one linefeed. Any other markup inside a narrative
    /// field is descended into and dropped, keeping only its text.
    pub fn canonicalize_linefeeds(&self, element: &mut XmlElement) {
        if self.policy.is_narrative(element.local_name()) {
            let mut flat = String::new();
            for child in &element.children {
                substitute_linefeeds(child, &mut flat);
            }
            element.set_text(flat);
            return;
        }
        for child in &mut element.children {
            if let XmlNode::Element(inner) = child {
                self.canonicalize_linefeeds(inner);
            }
        }
    }

    /// Pass 2: drop attributes whose trimmed value is empty, except those
    /// on the keep list.
    pub fn remove_empty_attributes(&self, element: &mut XmlElement) {
        element
            .attrs
            .retain(|(key, value)| !value.trim().is_empty() || self.policy.is_keep_attr(key));
        for child in &mut element.children {
            if let XmlNode::Element(inner) = child {
                self.remove_empty_attributes(inner);
            }
        }
    }

    /// Pass 3: prune blank text nodes and childless elements, post-order.
    ///
    /// A parent's emptiness is only evaluated after all of its children
    /// have been pruned. Exceptional elements survive empty.
    pub fn remove_empty_nodes(&self, element: &mut XmlElement) {
        for child in &mut element.children {
            if let XmlNode::Element(inner) = child {
                self.remove_empty_nodes(inner);
            }
        }
        element.children.retain(|child| match child {
            XmlNode::Text(text) => !text.trim().is_empty(),
            XmlNode::Element(inner) => self.is_exceptional(inner) || !inner.children.is_empty(),
        });
    }

    /// Whether an element is exempt from empty-node pruning.
    ///
    /// Decided from the node's own tag and attributes alone: either it
    /// carries a keep-list attribute, or it matches a configured
    /// tag/attribute/value flag (e.g. `typeOfResource collection="yes"`).
    pub fn is_exceptional(&self, element: &XmlElement) -> bool {
        if element.attrs.is_empty() {
            return false;
        }
        for (key, value) in &element.attrs {
            if self.policy.is_keep_attr(key) {
                return true;
            }
            for flag in &self.policy.keep_element_flags {
                if flag.tag == element.local_name()
                    && flag.attr == *key
                    && flag.value.eq_ignore_ascii_case(value)
                {
                    return true;
                }
            }
        }
        false
    }

    /// Pass 4: strip leading and trailing whitespace from every text node.
    ///
    /// Internal whitespace runs are left alone; collapsing is a separate
    /// operation ([`clean_text`]) that is never applied tree-wide.
    pub fn trim_text(&self, element: &mut XmlElement) {
        for child in &mut element.children {
            match child {
                XmlNode::Text(text) => {
                    let trimmed = text.trim();
                    if trimmed.len() != text.len() {
                        *text = trimmed.to_string();
                    }
                }
                XmlNode::Element(inner) => self.trim_text(inner),
            }
        }
    }

    /// Pass 5: date value cleanup.
    ///
    /// Every date-bearing element loses a trailing `.<digits>` suffix.
    /// A date element that is the first of its name under its parent and is
    /// not immediately followed by a same-named element sibling also loses
    /// its point qualifier, since a free-floating date is neither a start
    /// nor an end.
    pub fn clean_dates(&self, element: &mut XmlElement) {
        let names: Vec<Option<String>> = element
            .children
            .iter()
            .map(|child| match child {
                XmlNode::Element(inner) => Some(inner.local_name().to_string()),
                XmlNode::Text(_) => None,
            })
            .collect();

        for (index, name) in names.iter().enumerate() {
            let Some(name) = name else { continue };
            if !self.policy.is_date_tag(name) {
                continue;
            }
            let XmlNode::Element(inner) = &mut element.children[index] else {
                continue;
            };

            let content = inner.text();
            if let Some(captures) = self.date_suffix.captures(&content) {
                inner.set_text(captures[1].to_string());
            }

            let first_of_name = names[..index]
                .iter()
                .flatten()
                .all(|earlier| earlier != name);
            let next_sibling_same = names[index + 1..]
                .iter()
                .flatten()
                .next()
                .is_some_and(|next| next == name);
            if first_of_name && !next_sibling_same {
                let XmlNode::Element(inner) = &mut element.children[index] else {
                    continue;
                };
                inner.remove_attr(&self.policy.point_attr);
            }
        }

        for child in &mut element.children {
            if let XmlNode::Element(inner) = child {
                self.clean_dates(inner);
            }
        }
    }
}

fn substitute_linefeeds(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Text(text) => {
            let substituted = text
                .replace("\r\n", "\n")
                .replace('\r', "\n")
                .replace("\\n", "\n");
            out.push_str(&substituted);
        }
        XmlNode::Element(element) => {
            match element.local_name() {
                "br" => out.push('\n'),
                "p" => out.push_str("\n\n"),
                _ => {}
            }
            for child in &element.children {
                substitute_linefeeds(child, out);
            }
        }
    }
}

/// Collapse internal whitespace runs to single spaces and trim the ends.
///
/// Returns `None` for empty input; whitespace-only input collapses to an
/// empty string. Offered as a standalone cleanup, not a tree pass.
pub fn clean_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    Some(
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    )
}
