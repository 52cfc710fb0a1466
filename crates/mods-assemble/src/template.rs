//! Template rendering: engine syntax plus raw placeholder tokens.
//!
//! Templates mix `minijinja` control syntax (evaluated with the row bound
//! as context) with literal `[[fieldName]]` tokens that catalogers write
//! directly in the XML skeleton. Field values are XML-escaped before either
//! substitution so cell content can never break well-formedness.

use std::collections::BTreeMap;
use std::path::Path;

use minijinja::{Environment, Value};

use mods_ingest::Row;

use crate::error::{AssembleError, Result};

/// An immutable conversion template, loaded once and reused for every row.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source =
            std::fs::read_to_string(path).map_err(|source| AssembleError::TemplateRead {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_source(source))
    }

    /// The default MODS template shipped with the transpiler.
    pub fn bundled() -> Self {
        Self::from_source(include_str!("../templates/mods_template.xml"))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render this template against one row.
    ///
    /// The engine pass runs first with the escaped row as context, then
    /// every `[[field]]` token with a matching row key is replaced by the
    /// trimmed escaped value. Unmatched tokens pass through for the caller
    /// to strip.
    pub fn render(&self, row: &Row) -> std::result::Result<String, minijinja::Error> {
        let escaped: BTreeMap<&str, String> = row
            .fields()
            .map(|(key, value)| (key, xml_escape(value)))
            .collect();
        let env = Environment::new();
        let mut rendered = env.render_str(&self.source, Value::from_serialize(&escaped))?;
        for (key, value) in &escaped {
            let token = format!("[[{key}]]");
            if rendered.contains(&token) {
                rendered = rendered.replace(&token, value.trim());
            }
        }
        Ok(rendered)
    }
}

/// Escape a field value for insertion into XML text or attribute content.
fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, &str)]) -> Row {
        Row::new(
            fields
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_placeholder_substitution() {
        let template = Template::from_source("<record><title>[[title]]</title></record>");
        let rendered = template
            .render(&row(&[("title", "  Hello  ")]))
            .expect("render");
        assert_eq!(rendered, "<record><title>Hello</title></record>");
    }

    #[test]
    fn test_values_are_xml_escaped() {
        let template = Template::from_source("<x>[[v]]</x>");
        let rendered = template
            .render(&row(&[("v", "a < b & c")]))
            .expect("render");
        assert_eq!(rendered, "<x>a &lt; b &amp; c</x>");
    }

    #[test]
    fn test_engine_syntax_sees_the_row() {
        let template =
            Template::from_source("<r>{% if note %}<note>{{ note }}</note>{% endif %}</r>");
        let with_note = template.render(&row(&[("note", "hi")])).expect("render");
        assert_eq!(with_note, "<r><note>hi</note></r>");
        let without = template.render(&row(&[("note", "")])).expect("render");
        assert_eq!(without, "<r></r>");
    }

    #[test]
    fn test_unmatched_placeholders_pass_through() {
        let template = Template::from_source("<x>[[missingField]]</x>");
        let rendered = template.render(&row(&[("title", "t")])).expect("render");
        assert_eq!(rendered, "<x>[[missingField]]</x>");
    }

    #[test]
    fn test_bundled_template_references_sentinels() {
        let template = Template::bundled();
        assert!(template.source().contains("[[sourceId]]"));
    }
}
