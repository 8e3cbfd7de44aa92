//! Owned XML Element Tree
//!
//! A small element tree used in two directions:
//! - the typed packet model is lowered into an [`Element`] tree before it is
//!   written out as text;
//! - text parsed by libxml2 is lifted into an [`Element`] tree before it is
//!   mapped onto the typed model.
//!
//! It is also the escape hatch for schema-free extension content: any
//! [`Element`] can be appended to `What`, at the cost of schema validity.
//!
//! The tree only models what VOEvent packets use: elements, attributes and a
//! single text value per element, written ahead of any children. Comments and
//! processing instructions are dropped when a document is lifted from libxml2,
//! as are whitespace-only text runs beside child elements.
//!
//! Text output goes through `quick_xml::Writer`, which streams events
//! straight into any `io::Write` sink.

use std::borrow::Cow;
use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;

const INDENT: usize = 2;

/// An XML element with ordered attributes, an optional text value and
/// ordered child elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// Create an element. `name` is the qualified name as it should be written
    /// (e.g. `voe:VOEvent` or `Param`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder form of [`Element::set_attribute`]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder form of [`Element::set_text`]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Builder form of [`Element::push_child`]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a text-only child when `text` is present
    pub(crate) fn with_optional_text_child(self, tag: &str, text: Option<&str>) -> Self {
        match text {
            Some(text) => self.with_child(Element::new(tag).with_text(text)),
            None => self,
        }
    }

    /// Append one text-only child per entry, in order
    pub(crate) fn with_text_children<S: AsRef<str>>(mut self, tag: &str, texts: &[S]) -> Self {
        for text in texts {
            self.children.push(Element::new(tag).with_text(text.as_ref()));
        }
        self
    }

    pub(crate) fn with_optional_attribute(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_attribute(key, value),
            None => self,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without any namespace prefix
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    /// Namespace URI recorded when the element was parsed
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub(crate) fn set_namespace(&mut self, namespace: Option<String>) {
        self.namespace = namespace;
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, replacing the value in place if the key exists
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child with the given local name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.local_name() == name)
    }

    /// All children with the given local name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.local_name() == name)
    }

    pub fn child_at(&self, index: usize) -> Option<&Element> {
        self.children.get(index)
    }

    /// Append a child and return a handle to it
    pub fn push_child(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Insert a child at `index`, clamped to the current number of children
    pub fn insert_child(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    pub fn remove_child_at(&mut self, index: usize) -> Option<Element> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    /// Remove every child with the given local name and return them in order
    pub fn remove_children_named(&mut self, name: &str) -> Vec<Element> {
        let (removed, kept) = std::mem::take(&mut self.children)
            .into_iter()
            .partition(|c| c.local_name() == name);
        self.children = kept;
        removed
    }

    /// Assign text to the first child named `tag`, creating the child when
    /// none exists. Later same-named siblings are left untouched.
    pub fn set_text_child(&mut self, tag: &str, text: impl Into<String>) -> &mut Element {
        match self.children.iter().position(|c| c.local_name() == tag) {
            Some(index) => {
                let child = &mut self.children[index];
                child.set_text(text);
                child
            }
            None => self.push_child(Element::new(tag).with_text(text)),
        }
    }

    /// True when the element has no text and no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.as_deref().is_none_or(str::is_empty)
    }

    /// Serialize this element (without an XML declaration)
    pub fn to_xml_string(&self, pretty: bool) -> String {
        let mut buf = Vec::with_capacity(1024);
        // Writes into a Vec<u8> cannot fail.
        let _ = self.write_xml(&mut buf, pretty, false);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serialize this element as a complete UTF-8 document
    pub fn to_document_string(&self, pretty: bool) -> String {
        let mut buf = Vec::with_capacity(2048);
        let _ = self.write_xml(&mut buf, pretty, true);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Stream this element to `sink`, optionally preceded by the XML
    /// declaration. Pretty output indents by two spaces and ends with a
    /// newline, as does every document.
    pub fn write_xml<W: Write>(&self, sink: W, pretty: bool, declaration: bool) -> io::Result<()> {
        let mut writer = if pretty {
            Writer::new_with_indent(sink, b' ', INDENT)
        } else {
            Writer::new(sink)
        };

        if declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            if !pretty {
                writer.get_mut().write_all(b"\n")?;
            }
        }
        self.write_events(&mut writer)?;
        if pretty || declaration {
            writer.get_mut().write_all(b"\n")?;
        }
        Ok(())
    }

    fn write_events<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute(Attribute {
                key: QName(key.as_bytes()),
                value: Cow::Owned(escape_attribute(value).into_bytes()),
            });
        }

        if self.is_empty() {
            return writer.write_event(Event::Empty(start));
        }

        writer.write_event(Event::Start(start))?;
        // Text goes first; the indenting writer keeps it on the start tag's line.
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            writer.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
        }
        for child in &self.children {
            child.write_events(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }
}

fn escape_text(s: &str) -> String {
    escape(s).replace('\r', "&#13;")
}

// Whitespace is encoded so attribute-value normalization cannot alter it.
fn escape_attribute(s: &str) -> String {
    escape(s)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("What")
            .with_child(Element::new("foo").with_text("foo0"))
            .with_child(Element::new("Param").with_attribute("name", "mag"))
            .with_child(Element::new("foo").with_text("foo1"))
    }

    #[test]
    fn test_child_access_by_name_and_position() {
        let what = sample();
        assert_eq!(what.child("foo").and_then(Element::text), Some("foo0"));
        assert_eq!(what.children_named("foo").count(), 2);
        assert_eq!(what.child_at(1).map(Element::name), Some("Param"));
        assert!(what.child_at(3).is_none());
    }

    #[test]
    fn test_set_text_child_replaces_first_match_only() {
        let mut what = sample();
        what.set_text_child("foo", "replaced");

        let texts: Vec<_> = what.children_named("foo").filter_map(Element::text).collect();
        assert_eq!(texts, vec!["replaced", "foo1"]);
        assert_eq!(what.children().len(), 3);
    }

    #[test]
    fn test_set_text_child_appends_when_missing() {
        let mut what = sample();
        what.set_text_child("shortcut", "quick and dirty");

        assert_eq!(what.children().len(), 4);
        assert_eq!(
            what.children().last().and_then(Element::text),
            Some("quick and dirty")
        );
    }

    #[test]
    fn test_remove_children_named() {
        let mut what = sample();
        let removed = what.remove_children_named("foo");

        assert_eq!(removed.len(), 2);
        assert_eq!(what.children().len(), 1);
        assert_eq!(what.children()[0].name(), "Param");
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut el = Element::new("Param")
            .with_attribute("name", "mag")
            .with_attribute("value", "1");
        el.set_attribute("name", "flux");

        let attrs: Vec<_> = el.attributes().collect();
        assert_eq!(attrs, vec![("name", "flux"), ("value", "1")]);
        assert_eq!(el.remove_attribute("value").as_deref(), Some("1"));
        assert!(el.attribute("value").is_none());
    }

    #[test]
    fn test_local_name_strips_prefix() {
        assert_eq!(Element::new("voe:VOEvent").local_name(), "VOEvent");
        assert_eq!(Element::new("Who").local_name(), "Who");
    }

    #[test]
    fn test_compact_serialization_escapes() {
        let el = Element::new("Description")
            .with_attribute("note", "a \"quoted\" <value>")
            .with_text("Fish & chips < 5");

        assert_eq!(
            el.to_xml_string(false),
            r#"<Description note="a &quot;quoted&quot; &lt;value&gt;">Fish &amp; chips &lt; 5</Description>"#
        );
    }

    #[test]
    fn test_pretty_serialization_layout() {
        let el = Element::new("Who")
            .with_child(Element::new("Date").with_text("2014-11-07T01:05:09"))
            .with_child(Element::new("Author"));

        let expected = "<Who>\n  <Date>2014-11-07T01:05:09</Date>\n  <Author/>\n</Who>\n";
        assert_eq!(el.to_xml_string(true), expected);
    }

    #[test]
    fn test_pretty_mixed_content_keeps_text_on_start_line() {
        let el = Element::new("note")
            .with_text("hello")
            .with_child(Element::new("b").with_text("x"));

        let xml = el.to_xml_string(true);
        assert!(xml.starts_with("<note>hello<b>x</b>"), "xml was: {}", xml);
    }

    #[test]
    fn test_attribute_whitespace_is_encoded() {
        let el = Element::new("Param").with_attribute("value", "a\tb\nc");
        assert_eq!(el.to_xml_string(false), r#"<Param value="a&#9;b&#10;c"/>"#);
    }

    #[test]
    fn test_write_xml_streams_document() {
        let mut sink = Vec::new();
        sample().write_xml(&mut sink, false, true).unwrap();

        let text = String::from_utf8(sink).unwrap();
        assert_eq!(text, sample().to_document_string(false));
        assert!(text.ends_with("</What>\n"));
    }

    #[test]
    fn test_document_string_has_declaration() {
        let doc = Element::new("root").to_document_string(false);
        assert!(doc.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(doc.contains("<root/>"));
    }
}
