//! XML printer that outputs node trees.
//!
//! The printer writes indented output with attributes in sorted name order,
//! so repeated runs over the same tree produce identical bytes.

use std::io::Write;

use crate::node::{NodeRef, XmlContent};

/// XML printer that outputs node trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer.
    pub fn new(writer: W) -> Self {
        XmlPrinter { writer }
    }

    /// Prints a node tree to the output, preceded by an XML declaration.
    ///
    /// The synthetic document wrapper, if present, is skipped and its
    /// children printed in its place.
    pub fn print(&mut self, root: &NodeRef) -> std::io::Result<()> {
        writeln!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        self.print_fragment(root)
    }

    /// Prints a node tree without an XML declaration.
    pub fn print_fragment(&mut self, root: &NodeRef) -> std::io::Result<()> {
        if root.borrow().is_document() {
            let children: Vec<NodeRef> = root.borrow().children().to_vec();
            for child in &children {
                self.print_node(child, 0)?;
            }
            Ok(())
        } else {
            self.print_node(root, 0)
        }
    }

    fn print_node(&mut self, node: &NodeRef, indent: usize) -> std::io::Result<()> {
        let borrowed = node.borrow();
        let indent_str = "  ".repeat(indent);

        match borrowed.content() {
            XmlContent::Text(text) => {
                writeln!(self.writer, "{}{}", indent_str, escape_text(text.text()))?;
            }
            XmlContent::Element(elem) => {
                write!(self.writer, "{}<{}", indent_str, elem.qname())?;
                for (name, value) in elem.sorted_attributes() {
                    write!(self.writer, " {}=\"{}\"", name, escape_attr(value))?;
                }

                let children = borrowed.children();
                if children.is_empty() {
                    writeln!(self.writer, "/>")?;
                } else if children.len() == 1 && children[0].borrow().content().is_text() {
                    // Single text child prints inline so a re-parse sees the
                    // same text content
                    let child = children[0].borrow();
                    let text = child.content().as_text().map(|t| t.text()).unwrap_or("");
                    writeln!(
                        self.writer,
                        ">{}</{}>",
                        escape_text(text),
                        elem.qname()
                    )?;
                } else {
                    writeln!(self.writer, ">")?;
                    for child in children {
                        self.print_node(child, indent + 1)?;
                    }
                    writeln!(self.writer, "{}</{}>", indent_str, elem.qname())?;
                }
            }
        }

        Ok(())
    }
}

/// Writes a subtree as a compact single-line fragment.
///
/// Used for patch operation payloads, where surrounding indentation would
/// otherwise leak into text content on re-parse.
pub(crate) fn write_fragment<W: Write>(writer: &mut W, node: &NodeRef) -> std::io::Result<()> {
    let borrowed = node.borrow();

    match borrowed.content() {
        XmlContent::Text(text) => {
            write!(writer, "{}", escape_text(text.text()))?;
        }
        XmlContent::Element(elem) => {
            write!(writer, "<{}", elem.qname())?;
            for (name, value) in elem.sorted_attributes() {
                write!(writer, " {}=\"{}\"", name, escape_attr(value))?;
            }

            let children = borrowed.children();
            if children.is_empty() {
                write!(writer, "/>")?;
            } else {
                write!(writer, ">")?;
                for child in children {
                    write_fragment(writer, child)?;
                }
                write!(writer, "</{}>", elem.qname())?;
            }
        }
    }

    Ok(())
}

/// Prints a node tree to a string.
pub fn print_to_string(root: &NodeRef) -> String {
    let mut output = Vec::new();
    let mut printer = XmlPrinter::new(&mut output);
    // Writing to a Vec cannot fail
    let _ = printer.print(root);
    String::from_utf8_lossy(&output).into_owned()
}

/// Escapes special XML characters in text content.
pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes special XML characters in attribute values.
pub(crate) fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{new_element_node, new_text_node, NodeInner};
    use crate::xml::parse_str;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("hello"), "hello");
        assert_eq!(escape_text("<test>"), "&lt;test&gt;");
        assert_eq!(escape_text("a & b"), "a &amp; b");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("hello"), "hello");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_print_simple_tree() {
        let root = new_element_node("root");
        let child = new_element_node("child");
        NodeInner::add_child_to_ref(&child, new_text_node("hello"));
        NodeInner::add_child_to_ref(&root, child);
        NodeInner::add_child_to_ref(&root, new_element_node("empty"));

        let output = print_to_string(&root);
        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(output.contains("<child>hello</child>"));
        assert!(output.contains("<empty/>"));
    }

    #[test]
    fn test_print_reparse_round_trip() {
        let doc = parse_str(
            r#"<catalog><book id="1"><title>Rust &amp; XML</title></book><book id="2"/></catalog>"#,
        )
        .unwrap();

        let reparsed = parse_str(&print_to_string(&doc)).unwrap();
        assert!(crate::node::structural_eq(&doc, &reparsed));
    }

    #[test]
    fn test_write_fragment_compact() {
        let elem = new_element_node("item");
        elem.borrow_mut()
            .content_mut()
            .as_element_mut()
            .unwrap()
            .set_attribute("id", "7");
        NodeInner::add_child_to_ref(&elem, new_text_node("a<b"));

        let mut output = Vec::new();
        write_fragment(&mut output, &elem).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            r#"<item id="7">a&lt;b</item>"#
        );
    }
}
