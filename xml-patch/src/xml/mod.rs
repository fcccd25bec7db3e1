//! XML parsing and output.
//!
//! Parsed documents are rooted at a synthetic wrapper element so that the
//! document element is an ordinary child node; [`document_element`] unwraps
//! it again.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str};
pub use printer::{print_to_string, XmlPrinter};

pub(crate) use printer::{escape_attr, escape_text, write_fragment};

use crate::error::{Error, Result};
use crate::node::{NodeRef, XmlContent};

/// Returns the document element of a parsed tree.
///
/// Accepts either the synthetic document wrapper produced by the parser
/// (returning its first element child) or a bare element (returned as-is).
pub fn document_element(tree: &NodeRef) -> Result<NodeRef> {
    let borrowed = tree.borrow();
    match borrowed.content() {
        XmlContent::Element(_) if !borrowed.is_document() => Ok(tree.clone()),
        XmlContent::Element(_) => borrowed
            .children()
            .iter()
            .find(|child| child.borrow().content().is_element())
            .cloned()
            .ok_or_else(|| Error::Parse("document has no root element".to_string())),
        XmlContent::Text(_) => Err(Error::Parse("document root is not an element".to_string())),
    }
}
