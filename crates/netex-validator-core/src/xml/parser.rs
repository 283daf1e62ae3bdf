//! Streaming parse of a byte buffer into an [`XmlTree`], tracking line
//! numbers by counting newlines up to each event's buffer offset.
//!
//! `quick_xml::Reader` never resolves DTDs or external entities on its own,
//! so external entity references are inert by construction — no additional
//! hardening is required beyond not wiring up a resolver.

use std::fmt;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::model::{Attribute, NodeRef, XmlElement, XmlTree};

/// A document failed to parse, or exceeded the configured byte ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    TooLarge { limit: u64, actual: u64 },
    MalformedXml { detail: String, line: u32 },
    NoRootElement,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { limit, actual } => {
                write!(f, "document of {actual} bytes exceeds the {limit} byte ceiling")
            }
            Self::MalformedXml { detail, line } => {
                write!(f, "XML not well-formed at line {line}: {detail}")
            }
            Self::NoRootElement => write!(f, "document has no root element"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses `bytes` into an [`XmlTree`], rejecting inputs over `max_bytes`.
pub fn parse(bytes: &[u8], max_bytes: u64) -> Result<XmlTree, ParseError> {
    if bytes.len() as u64 > max_bytes {
        return Err(ParseError::TooLarge {
            limit: max_bytes,
            actual: bytes.len() as u64,
        });
    }

    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text = true;

    let mut tree = XmlTree::empty();
    let mut stack: Vec<NodeRef> = Vec::new();
    let mut root_seen = false;

    loop {
        let pos = reader.buffer_position();
        let line = line_number_at(bytes, pos);
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let element = build_element(&e, line)?;
                let attrs = element.attributes.clone();
                let node = tree.push(element);
                push_attr_nodes(&mut tree, node, &attrs);
                if let Some(&parent) = stack.last() {
                    attach_child(&mut tree, parent, node);
                } else {
                    tree.set_root(node);
                    root_seen = true;
                }
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                let element = build_element(&e, line)?;
                let attrs = element.attributes.clone();
                let node = tree.push(element);
                push_attr_nodes(&mut tree, node, &attrs);
                if let Some(&parent) = stack.last() {
                    attach_child(&mut tree, parent, node);
                } else {
                    tree.set_root(node);
                    root_seen = true;
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                if let Some(&current) = stack.last() {
                    let text = t.unescape().map(|s| s.into_owned()).unwrap_or_default();
                    append_text(&mut tree, current, &text);
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(&current) = stack.last() {
                    let text = String::from_utf8_lossy(t.as_ref()).into_owned();
                    append_text(&mut tree, current, &text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(ParseError::MalformedXml {
                    detail: err.to_string(),
                    line,
                });
            }
        }
    }

    if !root_seen {
        return Err(ParseError::NoRootElement);
    }

    Ok(tree)
}

fn build_element(e: &quick_xml::events::BytesStart<'_>, line: u32) -> Result<XmlElement, ParseError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let local_name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::MalformedXml {
            detail: err.to_string(),
            line,
        })?;
        let raw_name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let local_attr_name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|s| s.into_owned())
            .unwrap_or_default();
        attributes.push(Attribute {
            name: raw_name,
            local_name: local_attr_name,
            value,
        });
    }
    Ok(XmlElement {
        name,
        local_name,
        attributes,
        text: String::new(),
        line_number: line,
        parent: None,
        children: Vec::new(),
        attr_nodes: Vec::new(),
    })
}

fn push_attr_nodes(tree: &mut XmlTree, owner: NodeRef, attrs: &[Attribute]) {
    for attr in attrs {
        tree.push_attr_node(owner, attr.local_name.clone(), attr.value.clone());
    }
}

fn line_number_at(bytes: &[u8], offset: usize) -> u32 {
    let offset = offset.min(bytes.len());
    1 + bytes[..offset].iter().filter(|&&b| b == b'\n').count() as u32
}

fn attach_child(tree: &mut XmlTree, parent: NodeRef, child: NodeRef) {
    tree.attach(parent, child);
}

fn append_text(tree: &mut XmlTree, node: NodeRef, text: &str) {
    tree.append_text(node, text);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn parses_simple_document_with_root() {
        let xml = b"<Root attr=\"v\"><Child>hi</Child></Root>";
        let tree = parse(xml, 1_000_000).expect("parses");
        let root = tree.root().expect("has root");
        let root_el = tree.get(root).expect("root element");
        assert_eq!(root_el.local_name, "Root");
        assert_eq!(root_el.attr("attr"), Some("v"));
        assert_eq!(tree.children(root).len(), 1);
        let child = tree.children(root)[0];
        assert_eq!(tree.get(child).expect("child element").text, "hi");
    }

    #[test]
    fn tracks_line_numbers() {
        let xml = b"<Root>\n  <Child>\n    <Grand/>\n  </Child>\n</Root>";
        let tree = parse(xml, 1_000_000).expect("parses");
        let root = tree.root().expect("has root");
        let child = tree.children(root)[0];
        let grand = tree.children(child)[0];
        assert_eq!(tree.get(root).expect("root element").line_number, 1);
        assert_eq!(tree.get(child).expect("child element").line_number, 2);
        assert_eq!(tree.get(grand).expect("grandchild element").line_number, 3);
    }

    #[test]
    fn rejects_oversized_input() {
        let xml = b"<Root/>";
        let err = parse(xml, 2).expect_err("too large");
        assert!(matches!(err, ParseError::TooLarge { .. }));
    }

    #[test]
    fn rejects_malformed_xml() {
        let xml = b"<Root><Unclosed></Root>";
        let err = parse(xml, 1_000_000).expect_err("malformed");
        assert!(matches!(err, ParseError::MalformedXml { .. }));
    }

    #[test]
    fn empty_input_has_no_root() {
        let err = parse(b"", 1_000_000).expect_err("no root");
        assert_eq!(err, ParseError::NoRootElement);
    }

    #[test]
    fn computed_xpath_indexes_same_name_siblings() {
        let xml = b"<Root><Line id=\"a\"/><Line id=\"b\"/></Root>";
        let tree = parse(xml, 1_000_000).expect("parses");
        let root = tree.root().expect("has root");
        let second_line = tree.children(root)[1];
        assert_eq!(tree.computed_xpath(second_line), "/Root[1]/Line[2]");
    }

    #[test]
    fn external_entity_is_not_resolved() {
        let xml = b"<!DOCTYPE Root [<!ENTITY xxe SYSTEM \"file:///etc/passwd\">]><Root>&xxe;</Root>";
        // Either it parses with the literal entity text left unresolved, or
        // quick-xml reports it as an error; either is acceptable, but the
        // parser must never attempt filesystem access to resolve it.
        let _ = parse(xml, 1_000_000);
    }
}
