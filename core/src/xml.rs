//! Owned XML element tree used by the wire codec.
//!
//! # Design
//! The codec needs to see a field as "element absent", "element present but
//! empty" or "element present with text", and it needs the attributes to
//! spot the null marker. A small owned tree keeps those three cases explicit,
//! so documents are parsed in one pass with `quick-xml`'s pull reader and
//! every decoder works on `Element` values instead of raw events.

use std::borrow::Cow;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::CodecError;

/// A single XML element with its attributes, text and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the element carries text other than whitespace.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Serialize as a standalone document with an XML declaration.
    pub fn to_document(&self) -> Result<String, CodecError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| CodecError::malformed(&self.name, e))?;
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner()).map_err(|e| CodecError::malformed(&self.name, e))
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), CodecError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.text.is_empty() && element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| CodecError::malformed(&element.name, e));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| CodecError::malformed(&element.name, e))?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(|e| CodecError::malformed(&element.name, e))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| CodecError::malformed(&element.name, e))
}

/// Parse a document into its root element.
pub fn parse_document(input: &str) -> Result<Element, CodecError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            CodecError::malformed(
                snippet(input),
                format!("{e} at byte {}", reader.buffer_position()),
            )
        })?;
        match event {
            Event::Start(start) => {
                stack.push(open_element(&start, input)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start, input)?;
                attach(&mut stack, &mut root, element, input)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CodecError::malformed(snippet(input), "unbalanced end tag"))?;
                attach(&mut stack, &mut root, element, input)?;
            }
            Event::Text(text) => {
                let raw = utf8(&text, input)?;
                if let Some(top) = stack.last_mut() {
                    let unescaped = unescape(raw).map_err(|e| CodecError::malformed(snippet(input), e))?;
                    top.text.push_str(&unescaped);
                } else if !raw.trim().is_empty() {
                    return Err(CodecError::malformed(snippet(input), "text outside root element"));
                }
            }
            Event::CData(data) => {
                let raw = utf8(&data, input)?;
                match stack.last_mut() {
                    Some(top) => top.text.push_str(raw),
                    None => {
                        return Err(CodecError::malformed(snippet(input), "CDATA outside root element"))
                    }
                }
            }
            Event::GeneralRef(reference) => {
                let name = utf8(&reference, input)?;
                let resolved = resolve_reference(name)
                    .ok_or_else(|| CodecError::malformed(snippet(input), format!("unknown entity &{name};")))?;
                match stack.last_mut() {
                    Some(top) => top.text.push_str(&resolved),
                    None => {
                        return Err(CodecError::malformed(snippet(input), "reference outside root element"))
                    }
                }
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions and doctype
            // carry nothing the codec reads.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(CodecError::malformed(snippet(input), "unclosed element"));
    }
    root.ok_or_else(|| CodecError::malformed(snippet(input), "missing root element"))
}

fn open_element(start: &BytesStart<'_>, input: &str) -> Result<Element, CodecError> {
    let mut element = Element::new(utf8(start.name().as_ref(), input)?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| CodecError::malformed(snippet(input), e))?;
        let key = utf8(attribute.key.as_ref(), input)?;
        let value = unescape(utf8(&attribute.value, input)?)
            .map_err(|e| CodecError::malformed(snippet(input), e))?;
        element.attributes.push((key.to_string(), value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    input: &str,
) -> Result<(), CodecError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(CodecError::malformed(snippet(input), "multiple root elements"));
    }
    *root = Some(element);
    Ok(())
}

fn resolve_reference(name: &str) -> Option<Cow<'static, str>> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    resolve_predefined_entity(name).map(Cow::Borrowed)
}

fn utf8<'a>(bytes: &'a [u8], input: &str) -> Result<&'a str, CodecError> {
    std::str::from_utf8(bytes).map_err(|e| CodecError::malformed(snippet(input), e))
}

/// Leading slice of a document, used as the raw content of document errors.
fn snippet(input: &str) -> String {
    const MAX: usize = 120;
    match input.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &input[..idx]),
        None => input.to_string(),
    }
}
