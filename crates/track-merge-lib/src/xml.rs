//! Minimal owned XML element tree
//!
//! Documents are tokenized with `quick-xml` and folded into a small tree of
//! [`Element`]s. Building the tree is where well-formedness is decided: any
//! tokenizer error, mismatched or unclosed tag, stray top-level text, a missing
//! or repeated root element makes the whole document [`ParseError::Malformed`].
//!
//! Names are stored by local name, so `gpx:trkpt` and `trkpt` look the same to
//! the format parsers.

use crate::ParseError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

fn malformed(position: u64, reason: impl Display) -> ParseError {
    ParseError::Malformed {
        position,
        reason: reason.to_string(),
    }
}

fn utf8_name(bytes: &[u8], position: u64) -> Result<String, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| malformed(position, e))
}

/// Parse a whole document and return its root element
pub(crate) fn parse_document(text: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(text);
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| malformed(reader.error_position() as u64, e))?;

        match event {
            Event::Start(start) => {
                if open.is_empty() && root.is_some() {
                    return Err(malformed(position, "multiple root elements"));
                }
                open.push(Element::from_start(&start, position)?);
            }
            Event::Empty(start) => {
                let element = Element::from_start(&start, position)?;
                attach(&mut open, &mut root, element, position)?;
            }
            Event::End(_) => {
                // quick-xml already checked that the end tag matches the open one
                let element = open
                    .pop()
                    .ok_or_else(|| malformed(position, "unexpected closing tag"))?;
                attach(&mut open, &mut root, element, position)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(position, e))?;
                push_text(&mut open, text.into_owned(), position)?;
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data).map_err(|e| malformed(position, e))?;
                push_text(&mut open, text.to_owned(), position)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(malformed(
            reader.buffer_position() as u64,
            format_args!("unclosed element <{}>", unclosed.name),
        ));
    }

    root.ok_or_else(|| malformed(reader.buffer_position() as u64, "no root element"))
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<(), ParseError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => return Err(malformed(position, "multiple root elements")),
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(open: &mut [Element], text: String, position: u64) -> Result<(), ParseError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(Node::Text(text)),
        None if text.trim().is_empty() => {}
        None => return Err(malformed(position, "text outside of the root element")),
    }
    Ok(())
}

impl Element {
    fn from_start(start: &BytesStart<'_>, position: u64) -> Result<Self, ParseError> {
        let name = utf8_name(start.local_name().as_ref(), position)?;
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| malformed(position, e))?;
            let key = utf8_name(attribute.key.local_name().as_ref(), position)?;
            let value = attribute
                .unescape_value()
                .map_err(|e| malformed(position, e))?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    #[inline]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute with the given local name
    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All descendant elements named `name`, in document order
    ///
    /// The element itself is not included, but matches nested inside other
    /// matches are.
    pub(crate) fn descendants<'a, 'n>(&'a self, name: &'n str) -> Descendants<'a, 'n> {
        Descendants {
            stack: vec![self.children.iter()],
            name,
        }
    }

    /// First descendant element named `name`, in document order
    #[inline]
    pub(crate) fn first_descendant(&self, name: &str) -> Option<&Element> {
        self.descendants(name).next()
    }

    /// Concatenated text of this element and all of its descendants
    pub(crate) fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.children.iter()];
        while let Some(children) = stack.last_mut() {
            match children.next() {
                Some(Node::Text(text)) => out.push_str(text),
                Some(Node::Element(element)) => stack.push(element.children.iter()),
                None => {
                    stack.pop();
                }
            }
        }
        out
    }
}

// Deeply nested documents would overflow the stack with the derived recursive drop
impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

/// Pre-order iterator over descendants with a given name
pub(crate) struct Descendants<'a, 'n> {
    stack: Vec<std::slice::Iter<'a, Node>>,
    name: &'n str,
}

impl<'a> Iterator for Descendants<'a, '_> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(children) = self.stack.last_mut() {
            match children.next() {
                Some(Node::Element(element)) => {
                    self.stack.push(element.children.iter());
                    if element.name == self.name {
                        return Some(element);
                    }
                }
                Some(Node::Text(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(iter: impl Iterator<Item = &'a Element>) -> Vec<String> {
        iter.map(|e| e.attribute("id").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_parse_simple_document() {
        let root = parse_document(r#"<?xml version="1.0"?><a x="1"><b>hi</b></a>"#).unwrap();
        assert_eq!(root.name(), "a");
        assert_eq!(root.attribute("x"), Some("1"));
        assert_eq!(root.attribute("y"), None);
        assert_eq!(root.first_descendant("b").unwrap().text_content(), "hi");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = parse_document(
            r#"<r><p id="1"><p id="2"/></p><q><p id="3"/></q><p id="4"/></r>"#,
        )
        .unwrap();
        assert_eq!(names(root.descendants("p")), vec!["1", "2", "3", "4"]);
        assert_eq!(names(root.descendants("missing")), Vec::<String>::new());
    }

    #[test]
    fn test_local_names_ignore_prefixes() {
        let root = parse_document(
            r#"<g:gpx xmlns:g="urn:x"><g:trkpt g:lat="4"/></g:gpx>"#,
        )
        .unwrap();
        assert_eq!(root.name(), "gpx");
        let point = root.first_descendant("trkpt").unwrap();
        assert_eq!(point.attribute("lat"), Some("4"));
    }

    #[test]
    fn test_text_content_unescapes_and_joins() {
        let root =
            parse_document("<t>a &amp; <i>b</i><![CDATA[ <c> ]]></t>").unwrap();
        assert_eq!(root.text_content(), "a & b <c> ");
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let root = parse_document("<t>  2024-01-01T00:00:00Z\n</t>").unwrap();
        assert_eq!(root.text_content(), "  2024-01-01T00:00:00Z\n");
    }

    #[test]
    fn test_malformed_documents() {
        let cases = [
            "<not-xml",
            "",
            "   ",
            "<?xml version=\"1.0\"?>",
            "<a><b></a>",
            "<a>",
            "<a></a><b></b>",
            "<a/><b/>",
            "text<a/>",
            "<a>&bogus;</a>",
            r#"<a x="1" x="2"/>"#,
            "</a>",
        ];
        for case in cases {
            assert!(
                matches!(parse_document(case), Err(ParseError::Malformed { .. })),
                "expected malformed: {case:?}"
            );
        }
    }

    #[test]
    fn test_first_descendant_outlives_name() {
        let root = parse_document("<a><b>x</b></a>").unwrap();
        let found = {
            let name = String::from("b");
            root.first_descendant(&name)
        };
        assert_eq!(found.map(Element::text_content).as_deref(), Some("x"));
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        const DEPTH: usize = 200_000;
        let doc = format!("<r>{}deep{}</r>", "<x>".repeat(DEPTH), "</x>".repeat(DEPTH));
        let root = parse_document(&doc).unwrap();
        assert_eq!(root.text_content(), "deep");
        assert_eq!(root.descendants("x").count(), DEPTH);
        drop(root);
    }

    #[test]
    fn test_trailing_whitespace_and_comments_are_fine() {
        assert!(parse_document("<!-- c --><a/>\n\n<!-- end -->\n").is_ok());
    }
}
