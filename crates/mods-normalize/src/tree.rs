//! Explicit XML tree model for metadata records.
//!
//! Records are small (one per spreadsheet row), so the whole document is
//! held in memory as an ordered tree. Attribute order and child order are
//! both preserved; the normalization passes depend on sibling order.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, XmlError};

/// One child of an element: markup or character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with ordered attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Qualified tag name as written in the source (prefix included).
    pub name: String,
    /// Attributes in document order, values unescaped.
    pub attrs: Vec<(String, String)>,
    /// Children in document order.
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Tag name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Remove an attribute by name, returning its value if present.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    /// Concatenated text content of this element's direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let XmlNode::Text(text) = child {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }

    /// Iterate over element children only.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Serialize this element and its subtree to a compact XML string.
    ///
    /// Childless elements are written self-closed. Literal linefeeds in
    /// text content are written as `&#10;` so canonicalized narrative
    /// fields keep their markers across round-trips.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        let bytes = writer.into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Serialize as a standalone document with an XML declaration.
    pub fn to_document_string(&self) -> Result<String> {
        let body = self.to_xml_string()?;
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"))
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(inner) => write_element(writer, inner)?,
            XmlNode::Text(text) => {
                let escaped = escape_text(text);
                writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

/// Escape character data, mapping linefeeds to character references.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            other => out.push(other),
        }
    }
    out
}

/// Parse a string into the root element of its XML tree.
///
/// Comments, processing instructions and the doctype are dropped; CDATA is
/// folded into plain text. Exactly one root element is required.
pub fn parse_element(input: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|err| XmlError::Malformed {
            message: err.to_string(),
        })?;
        match event {
            Event::Start(start) => {
                let element = element_from_start(&start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, XmlNode::Element(element))?;
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| XmlError::Malformed {
                    message: format!(
                        "unexpected end tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    ),
                })?;
                let found = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                if element.name != found {
                    return Err(XmlError::MismatchedEndTag {
                        expected: element.name,
                        found,
                    });
                }
                attach(&mut stack, &mut root, XmlNode::Element(element))?;
            }
            Event::Text(text) => {
                // Entity references arrive as separate GeneralRef events;
                // text only needs decoding.
                let content = text
                    .decode()
                    .map_err(|err| XmlError::Malformed {
                        message: err.to_string(),
                    })?
                    .into_owned();
                append_text(&mut stack, &content);
            }
            Event::CData(cdata) => {
                let content = String::from_utf8_lossy(cdata.as_ref()).into_owned();
                append_text(&mut stack, &content);
            }
            Event::GeneralRef(general_ref) => {
                let resolved =
                    general_ref
                        .resolve_char_ref()
                        .map_err(|err| XmlError::Malformed {
                            message: err.to_string(),
                        })?;
                let content = match resolved {
                    Some(ch) => ch.to_string(),
                    None => resolve_named_entity(&general_ref)?,
                };
                append_text(&mut stack, &content);
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed {
            message: format!("unclosed element <{}>", stack[stack.len() - 1].name),
        });
    }
    root.ok_or(XmlError::NoRootElement)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|err| XmlError::Malformed {
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::Malformed {
                message: err.to_string(),
            })?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn resolve_named_entity(name: &[u8]) -> Result<String> {
    let text = match name {
        b"amp" => "&",
        b"lt" => "<",
        b"gt" => ">",
        b"apos" => "'",
        b"quot" => "\"",
        other => {
            return Err(XmlError::Malformed {
                message: format!("undefined entity &{};", String::from_utf8_lossy(other)),
            });
        }
    };
    Ok(text.to_string())
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    node: XmlNode,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        XmlNode::Element(element) => {
            if root.is_some() {
                return Err(XmlError::MultipleRoots);
            }
            *root = Some(element);
            Ok(())
        }
        // Stray text outside the root is insignificant whitespace or junk.
        XmlNode::Text(_) => Ok(()),
    }
}

fn append_text(stack: &mut [XmlElement], content: &str) {
    if let Some(parent) = stack.last_mut() {
        // Merge with a preceding text node so entity boundaries disappear.
        if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
            existing.push_str(content);
        } else {
            parent.children.push(XmlNode::Text(content.to_string()));
        }
    }
}
