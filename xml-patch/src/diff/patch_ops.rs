//! Patch document serialization.
//!
//! Writes a patch event stream as a patch document: a root `diff` element
//! whose children are `add`, `replace`, and `remove` operations in emission
//! order. Attribute payloads are marked with a `type="@name"` attribute and
//! carried as text; element payloads are serialized subtrees.

use std::io::Write;

use crate::error::Result;
use crate::xml::{escape_attr, escape_text, write_fragment};

use super::event::{DiffEvent, DiffSink, DiffValue, Pos};
use super::{DIFF_ADD_TAG, DIFF_POS_ATTR, DIFF_REMOVE_TAG, DIFF_REPLACE_TAG, DIFF_ROOT_TAG,
            DIFF_SEL_ATTR, DIFF_TYPE_ATTR};

/// Sink that serializes patch events as a patch document.
///
/// The document header is written lazily and the root element is closed by
/// [`DiffSink::close`], which the differencer invokes after the last event.
pub struct PatchOpsWriter<W: Write> {
    writer: W,
    started: bool,
    closed: bool,
}

impl<W: Write> PatchOpsWriter<W> {
    /// Creates a writer over the given output.
    pub fn new(writer: W) -> Self {
        PatchOpsWriter {
            writer,
            started: false,
            closed: false,
        }
    }

    fn ensure_started(&mut self) -> std::io::Result<()> {
        if !self.started {
            self.started = true;
            writeln!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
            writeln!(self.writer, "<{}>", DIFF_ROOT_TAG)?;
        }
        Ok(())
    }

    fn write_add(&mut self, sel: &str, value: &DiffValue, pos: Pos) -> std::io::Result<()> {
        write!(
            self.writer,
            "  <{} {}=\"{}\"",
            DIFF_ADD_TAG,
            DIFF_SEL_ATTR,
            escape_attr(sel)
        )?;
        match value {
            DiffValue::Attribute { name, value } => {
                // Position is meaningless for attributes and omitted
                writeln!(
                    self.writer,
                    " {}=\"@{}\">{}</{}>",
                    DIFF_TYPE_ATTR,
                    escape_attr(name),
                    escape_text(value),
                    DIFF_ADD_TAG
                )?;
            }
            DiffValue::Element(node) => {
                self.write_pos(pos)?;
                write!(self.writer, ">")?;
                write_fragment(&mut self.writer, node)?;
                writeln!(self.writer, "</{}>", DIFF_ADD_TAG)?;
            }
            DiffValue::Text(text) => {
                self.write_pos(pos)?;
                writeln!(self.writer, ">{}</{}>", escape_text(text), DIFF_ADD_TAG)?;
            }
        }
        Ok(())
    }

    fn write_pos(&mut self, pos: Pos) -> std::io::Result<()> {
        if pos != Pos::Append {
            write!(self.writer, " {}=\"{}\"", DIFF_POS_ATTR, pos)?;
        }
        Ok(())
    }

    fn write_replace(&mut self, sel: &str, value: &DiffValue) -> std::io::Result<()> {
        write!(
            self.writer,
            "  <{} {}=\"{}\">",
            DIFF_REPLACE_TAG,
            DIFF_SEL_ATTR,
            escape_attr(sel)
        )?;
        match value {
            DiffValue::Attribute { value, .. } => {
                write!(self.writer, "{}", escape_text(value))?;
            }
            DiffValue::Text(text) => {
                write!(self.writer, "{}", escape_text(text))?;
            }
            DiffValue::Element(node) => {
                write_fragment(&mut self.writer, node)?;
            }
        }
        writeln!(self.writer, "</{}>", DIFF_REPLACE_TAG)?;
        Ok(())
    }

    fn write_remove(&mut self, sel: &str) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "  <{} {}=\"{}\"/>",
            DIFF_REMOVE_TAG,
            DIFF_SEL_ATTR,
            escape_attr(sel)
        )?;
        Ok(())
    }
}

impl<W: Write> DiffSink for PatchOpsWriter<W> {
    fn accept(&mut self, event: DiffEvent) -> Result<()> {
        self.ensure_started()?;
        match &event {
            DiffEvent::Add { sel, value, pos } => self.write_add(sel, value, *pos)?,
            DiffEvent::Replace { sel, value, .. } => self.write_replace(sel, value)?,
            DiffEvent::Remove { sel } => self.write_remove(sel)?,
        }
        Ok(())
    }

    /// Closes the root element. Idempotent.
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.ensure_started()?;
            writeln!(self.writer, "</{}>", DIFF_ROOT_TAG)?;
            self.writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{new_element_node, new_text_node, NodeInner, NodeRef};

    fn collect_output(events: Vec<DiffEvent>) -> String {
        let mut output = Vec::new();
        let mut writer = PatchOpsWriter::new(&mut output);
        for event in events {
            writer.accept(event).unwrap();
        }
        writer.close().unwrap();
        String::from_utf8(output).unwrap()
    }

    fn payload_element() -> NodeRef {
        let elem = new_element_node("item");
        elem.borrow_mut()
            .content_mut()
            .as_element_mut()
            .unwrap()
            .set_attribute("id", "7");
        NodeInner::add_child_to_ref(&elem, new_text_node("seven"));
        elem
    }

    #[test]
    fn test_empty_stream_writes_empty_diff() {
        let output = collect_output(vec![]);
        assert!(output.contains("<diff>"));
        assert!(output.contains("</diff>"));
    }

    #[test]
    fn test_add_attribute_uses_type_marker() {
        let output = collect_output(vec![DiffEvent::Add {
            sel: "/r".to_string(),
            value: DiffValue::Attribute {
                name: "version".to_string(),
                value: "2".to_string(),
            },
            pos: Pos::Append,
        }]);
        assert!(output.contains(r#"<add sel="/r" type="@version">2</add>"#));
        assert!(!output.contains("pos="));
    }

    #[test]
    fn test_add_element_with_position() {
        let output = collect_output(vec![DiffEvent::Add {
            sel: "/r/c[1]".to_string(),
            value: DiffValue::Element(payload_element()),
            pos: Pos::Before,
        }]);
        assert!(output
            .contains(r#"<add sel="/r/c[1]" pos="before"><item id="7">seven</item></add>"#));
    }

    #[test]
    fn test_add_element_append_omits_pos() {
        let output = collect_output(vec![DiffEvent::Add {
            sel: "/r".to_string(),
            value: DiffValue::Element(payload_element()),
            pos: Pos::Append,
        }]);
        assert!(output.contains(r#"<add sel="/r"><item id="7">seven</item></add>"#));
    }

    #[test]
    fn test_replace_and_remove() {
        let output = collect_output(vec![
            DiffEvent::Replace {
                sel: "/r/@v".to_string(),
                value: DiffValue::Attribute {
                    name: "v".to_string(),
                    value: "b&w".to_string(),
                },
                old: DiffValue::Attribute {
                    name: "v".to_string(),
                    value: "a".to_string(),
                },
            },
            DiffEvent::Remove {
                sel: "/r/d[1]".to_string(),
            },
        ]);
        assert!(output.contains(r#"<replace sel="/r/@v">b&amp;w</replace>"#));
        assert!(output.contains(r#"<remove sel="/r/d[1]"/>"#));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut output = Vec::new();
        let mut writer = PatchOpsWriter::new(&mut output);
        writer.close().unwrap();
        writer.close().unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("</diff>").count(), 1);
    }
}
