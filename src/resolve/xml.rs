//! A small element tree for the XML fragments strategies inspect.
//!
//! Conflict texts are cut out of a larger document, so a fragment may hold
//! several root elements. Anything that does not form well-balanced
//! elements is rejected.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

const FRAGMENT_ROOT: &str = "fragment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Option<Self> {
        let name = String::from_utf8(start.name().as_ref().to_vec()).ok()?;
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.ok()?;
            let key = String::from_utf8(attribute.key.as_ref().to_vec()).ok()?;
            let value = attribute.unescape_value().ok()?.into_owned();
            attributes.push((key, value));
        }
        Some(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element called `name`
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(content) => text.push_str(content),
                XmlNode::Element(element) => text.push_str(&element.text_content()),
            }
        }
        text
    }
}

/// Parse `text` as a sequence of XML nodes, `None` for anything malformed.
///
/// Whitespace between elements is dropped, comments and processing
/// instructions are skipped.
pub fn parse_fragment(text: &str) -> Option<Vec<XmlNode>> {
    let wrapped = format!("<{FRAGMENT_ROOT}>{text}</{FRAGMENT_ROOT}>");
    let mut reader = Reader::from_str(&wrapped);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().ok()? {
            Event::Start(start) => stack.push(XmlElement::from_start(&start)?),
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start)?;
                stack.last_mut()?.children.push(XmlNode::Element(element));
            }
            Event::End(_) => {
                let element = stack.pop()?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => root = Some(element),
                }
            }
            Event::Text(content) => {
                let content = content.unescape().ok()?.into_owned();
                stack.last_mut()?.children.push(XmlNode::Text(content));
            }
            Event::CData(content) => {
                let content = String::from_utf8(content.into_inner().into_owned()).ok()?;
                stack.last_mut()?.children.push(XmlNode::Text(content));
            }
            // a declaration can only start a document, never a fragment
            Event::Decl(_) | Event::DocType(_) => return None,
            Event::Comment(_) | Event::PI(_) => {}
            Event::Eof => break,
        }
        if root.is_some() {
            break;
        }
    }

    // only whitespace may follow the wrapper
    if !matches!(reader.read_event().ok()?, Event::Eof) {
        return None;
    }
    root.map(|element| element.children)
}

/// The root elements of a fragment; `None` if it is malformed or holds text
/// outside of elements
pub fn parse_elements(text: &str) -> Option<Vec<XmlElement>> {
    parse_fragment(text)?
        .into_iter()
        .map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
        .collect()
}
