use std::fmt;

use indexmap::IndexMap;
use quick_xml::errors::IllFormedError;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A parsed XML element.
///
/// Element lookups match on the local name, so `diffgr:diffgram` is found as `diffgram`.
/// Namespace declarations are kept as plain attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    attributes: IndexMap<String, String>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parses a document or a fragment, returning its top level elements.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`quick_xml::Error`] on malformed input.
    pub fn parse_fragment(xml: &str) -> Result<Vec<Self>, quick_xml::Error> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut roots = Vec::new();
        let mut stack: Vec<Self> = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let node = Self::from_start(&start)?;
                    attach(&mut stack, &mut roots, node);
                }
                Event::End(_) => {
                    if let Some(node) = stack.pop() {
                        attach(&mut stack, &mut roots, node);
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = stack.pop() {
            return Err(IllFormedError::MissingEndTag(unclosed.name).into());
        }

        Ok(roots)
    }

    /// Parses a document, returning its root element.
    ///
    /// Returns `Ok(None)` when the input holds no element.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`quick_xml::Error`] on malformed input.
    pub fn parse(xml: &str) -> Result<Option<Self>, quick_xml::Error> {
        Ok(Self::parse_fragment(xml)?.into_iter().next())
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, quick_xml::Error> {
        let mut attributes = IndexMap::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.insert(key, value);
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    /// The qualified element name, e.g. `soap:Envelope`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// The value of the attribute `name` (qualified).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterates over the attributes, in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// The concatenated text content, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The child elements.
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// The first child with the local name `name`.
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.local_name() == name)
    }

    /// Every child with the local name `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children
            .iter()
            .filter(move |child| child.local_name() == name)
    }

    /// The text of the first child with the local name `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Self::text)
    }

    /// Follows a path of local names from this element.
    pub fn find(&self, path: &[&str]) -> Option<&Self> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }

        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        out.push_str(&escape(self.text.as_str()));
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl fmt::Display for XmlNode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        formatter.write_str(&out)
    }
}

pub(in crate::gateway) fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Serializes a sequence of elements back to XML text.
pub(in crate::gateway) fn write_fragment<'a>(
    nodes: impl IntoIterator<Item = &'a XmlNode>,
) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_to(&mut out);
    }
    out
}

fn attach(stack: &mut [XmlNode], roots: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}
