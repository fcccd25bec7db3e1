//! XML parser that builds node trees.
//!
//! The parser uses quick-xml's streaming API. Text runs are
//! whitespace-normalized and whitespace-only runs are dropped, so that
//! formatting differences between two documents never show up as
//! differences in content. Comments, processing instructions, and DOCTYPE
//! declarations are not part of the comparable tree and are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::node::{new_node, NodeInner, NodeRef, XmlContent, XmlElement, XmlText, DOCUMENT_TAG};

/// Parses XML from a string.
pub fn parse_str(xml: &str) -> Result<NodeRef> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;
    parse_reader(&mut reader)
}

/// Parses XML from a file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<NodeRef> {
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;
    parse_reader(&mut reader)
}

/// Parses XML from a quick-xml Reader into a node tree rooted at a
/// synthetic document wrapper.
fn parse_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<NodeRef> {
    let root = new_node(XmlContent::Element(XmlElement::new(DOCUMENT_TAG)));

    let mut node_stack: Vec<NodeRef> = vec![root.clone()];
    let mut current_text: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                flush_text(&mut current_text, &node_stack);

                let element = parse_element(e, reader)?;
                let node = new_node(XmlContent::Element(element));

                if let Some(parent) = node_stack.last() {
                    NodeInner::add_child_to_ref(parent, node.clone());
                }
                node_stack.push(node);
            }
            Event::End(_) => {
                flush_text(&mut current_text, &node_stack);
                node_stack.pop();
            }
            Event::Empty(ref e) => {
                // Self-closing tag - handle like Start + End
                flush_text(&mut current_text, &node_stack);

                let element = parse_element(e, reader)?;
                let node = new_node(XmlContent::Element(element));

                if let Some(parent) = node_stack.last() {
                    NodeInner::add_child_to_ref(parent, node);
                }
            }
            Event::Text(e) => {
                let raw =
                    std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                accumulate_text(&mut current_text, &text);
            }
            Event::CData(ref e) => {
                // Treat CDATA like text
                let text = String::from_utf8_lossy(e.as_ref());
                accumulate_text(&mut current_text, &text);
            }
            Event::Eof => break,
            Event::Comment(_)
            | Event::Decl(_)
            | Event::PI(_)
            | Event::DocType(_)
            | Event::GeneralRef(_) => {
                // Not part of the comparable tree
            }
        }
        buf.clear();
    }

    Ok(root)
}

/// Parses an element's name and attributes.
fn parse_element<R: BufRead>(e: &BytesStart, reader: &Reader<R>) -> Result<XmlElement> {
    let name = reader
        .decoder()
        .decode(e.name().as_ref())
        .map_err(|e| Error::Parse(e.to_string()))?
        .to_string();

    let mut attributes = FxHashMap::default();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        attributes.insert(key, value);
    }

    Ok(XmlElement::with_attributes(name, attributes))
}

/// Appends a text run to the accumulator with whitespace normalization.
fn accumulate_text(current_text: &mut Option<String>, text: &str) {
    if let Some(normalized) = normalize_whitespace(text, current_text.as_deref()) {
        match current_text {
            Some(existing) => existing.push_str(&normalized),
            None => *current_text = Some(normalized),
        }
    }
}

/// Flushes accumulated text into a text node under the current parent.
fn flush_text(current_text: &mut Option<String>, node_stack: &[NodeRef]) {
    if let Some(text) = current_text.take() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            let text_node = new_node(XmlContent::Text(XmlText::new(trimmed)));
            if let Some(parent) = node_stack.last() {
                NodeInner::add_child_to_ref(parent, text_node);
            }
        }
    }
}

/// Normalizes whitespace in text content.
///
/// Consecutive whitespace collapses to a single space, tracking whether the
/// previously accumulated text already ended with one. Returns None when the
/// run contains no non-whitespace content and would not extend an existing
/// run.
fn normalize_whitespace(text: &str, previous: Option<&str>) -> Option<String> {
    let mut last_was_ws = previous.is_none_or(|p| p.ends_with(' '));
    let mut has_non_ws = false;
    let mut result = String::new();

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_ws {
                result.push(' ');
                last_was_ws = true;
            }
        } else {
            result.push(c);
            last_was_ws = false;
            has_non_ws = true;
        }
    }

    if has_non_ws {
        Some(result)
    } else {
        None
    }
}
