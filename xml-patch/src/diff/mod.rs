//! Structural differencing of XML trees.
//!
//! The differencer walks two trees in lock-step and emits a patch event
//! stream describing how to turn the first tree into the second. Matching
//! is schema-agnostic; the only assumption is the common convention that
//! the key-identifying attribute of an element is named `id` or `name`.
//!
//! For each pair of corresponding elements, three comparisons run in order:
//! the direct text child, the attribute sets (as a sorted merge-join), and
//! the child element sequences (a merge-join over the comparison key
//! `(element name, id value, name value)`). Matched children recurse;
//! unmatched children become additions or removals. In ordered mode the
//! child sequences are taken in document order and assumed to be already
//! aligned by key, so a plain sibling reorder degrades into an add/remove
//! burst; unordered mode sorts both sequences by key first and tolerates
//! reordering at the cost of never recording positions.

mod event;
mod patch_ops;

pub use event::{DiffEvent, DiffSink, DiffValue, EventCollector, Pos};
pub use patch_ops::PatchOpsWriter;

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::node::{deep_clone, NodeRef, XmlContent};
use crate::path::{attribute_xpath, xpath_of};
use crate::xml::document_element;

/// Root tag of a patch document.
pub const DIFF_ROOT_TAG: &str = "diff";

/// Tag names for patch operations.
pub const DIFF_ADD_TAG: &str = "add";
pub const DIFF_REMOVE_TAG: &str = "remove";
pub const DIFF_REPLACE_TAG: &str = "replace";

/// Attribute names on patch operations.
pub const DIFF_SEL_ATTR: &str = "sel";
pub const DIFF_POS_ATTR: &str = "pos";
pub const DIFF_TYPE_ATTR: &str = "type";

/// Outcome of one comparison step during matching.
///
/// `Equal` only ever drives cursor advancement; it is never emitted as an
/// event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Difference {
    Add,
    Equal,
    Remove,
    Replace,
}

/// Structural differencer for XML trees.
pub struct XmlDiff {
    ordered: bool,
}

impl Default for XmlDiff {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDiff {
    /// Creates a differencer with order-sensitive child comparison.
    pub fn new() -> Self {
        XmlDiff { ordered: true }
    }

    /// Returns whether child element order is significant for comparison.
    pub fn ordered(&self) -> bool {
        self.ordered
    }

    /// Selects ordered or unordered child element comparison.
    ///
    /// When ordered, sibling position is significant and additions carry an
    /// insertion position. When unordered, children are matched by key
    /// regardless of document order and additions always append.
    pub fn set_ordered(&mut self, ordered: bool) {
        self.ordered = ordered;
    }

    /// Compares two trees and emits the differences to `sink`.
    ///
    /// The inputs may be parsed documents (with the synthetic wrapper) or
    /// bare root elements. Neither input is mutated; subtrees are cloned
    /// into the events that carry them. The sink is closed after the last
    /// event.
    ///
    /// Fails with [`Error::StructureMismatch`] if the root element names
    /// differ; root comparison is name-only.
    pub fn diff<S: DiffSink>(&self, tree1: &NodeRef, tree2: &NodeRef, sink: &mut S) -> Result<()> {
        let root1 = document_element(tree1)?;
        let root2 = document_element(tree2)?;

        if !self.diff_elements(&root1, &root2, sink)? {
            return Err(Error::StructureMismatch {
                left: element_name(&root1),
                right: element_name(&root2),
            });
        }
        sink.close()?;
        tracing::info!("diff complete");
        Ok(())
    }

    /// Compares a pair of corresponding elements.
    ///
    /// Returns false when the element names differ, which only the root
    /// comparison treats as fatal; recursive calls are made on key-matched
    /// pairs whose names already agree.
    fn diff_elements<S: DiffSink>(
        &self,
        element1: &NodeRef,
        element2: &NodeRef,
        sink: &mut S,
    ) -> Result<bool> {
        if element_name(element1) != element_name(element2) {
            return Ok(false);
        }
        self.diff_text(element1, element2, sink)?;
        self.diff_attributes(element1, element2, sink)?;
        self.diff_child_elements(element1, element2, sink)?;
        Ok(true)
    }

    /// Compares the direct text child of two elements.
    fn diff_text<S: DiffSink>(
        &self,
        element1: &NodeRef,
        element2: &NodeRef,
        sink: &mut S,
    ) -> Result<()> {
        let text1 = direct_text(element1);
        let text2 = direct_text(element2);

        match (text1, text2) {
            (Some(old), Some(new)) => {
                if old.trim() != new.trim() {
                    sink.accept(DiffEvent::Replace {
                        sel: xpath_of(element1),
                        value: DiffValue::Text(new),
                        old: DiffValue::Text(old),
                    })?;
                }
            }
            (Some(_), None) => {
                // Text is addressed through its owning element
                sink.accept(DiffEvent::Remove {
                    sel: xpath_of(element1),
                })?;
            }
            (None, Some(new)) => {
                sink.accept(DiffEvent::Add {
                    sel: xpath_of(element2),
                    value: DiffValue::Text(new),
                    pos: Pos::Append,
                })?;
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// Compares attribute sets with a sorted merge-join.
    fn diff_attributes<S: DiffSink>(
        &self,
        element1: &NodeRef,
        element2: &NodeRef,
        sink: &mut S,
    ) -> Result<()> {
        let attrs1 = sorted_attributes(element1);
        let attrs2 = sorted_attributes(element2);

        let mut index1 = 0;
        let mut index2 = 0;

        while index1 < attrs1.len() || index2 < attrs2.len() {
            let mut difference = Difference::Equal;
            if index1 == attrs1.len() {
                difference = Difference::Add;
            } else if index2 == attrs2.len() {
                difference = Difference::Remove;
            } else {
                let (name1, value1) = &attrs1[index1];
                let (name2, value2) = &attrs2[index2];
                match name1.cmp(name2) {
                    Ordering::Equal => {
                        if value1 != value2 {
                            difference = Difference::Replace;
                        }
                    }
                    // The side holding the lexicographically smaller name is
                    // ahead; the other side is missing that attribute
                    Ordering::Greater => difference = Difference::Add,
                    Ordering::Less => difference = Difference::Remove,
                }
            }

            match difference {
                Difference::Add => {
                    let (name, value) = &attrs2[index2];
                    sink.accept(DiffEvent::Add {
                        sel: xpath_of(element2),
                        value: DiffValue::Attribute {
                            name: name.clone(),
                            value: value.clone(),
                        },
                        pos: Pos::Append,
                    })?;
                    index2 += 1;
                }
                Difference::Replace => {
                    let (name, old_value) = &attrs1[index1];
                    let (_, new_value) = &attrs2[index2];
                    sink.accept(DiffEvent::Replace {
                        sel: attribute_xpath(element1, name),
                        value: DiffValue::Attribute {
                            name: name.clone(),
                            value: new_value.clone(),
                        },
                        old: DiffValue::Attribute {
                            name: name.clone(),
                            value: old_value.clone(),
                        },
                    })?;
                    index1 += 1;
                    index2 += 1;
                }
                Difference::Equal => {
                    index1 += 1;
                    index2 += 1;
                }
                Difference::Remove => {
                    let (name, _) = &attrs1[index1];
                    sink.accept(DiffEvent::Remove {
                        sel: attribute_xpath(element1, name),
                    })?;
                    index1 += 1;
                }
            }
        }
        Ok(())
    }

    /// Compares child element sequences with a merge-join over the
    /// comparison key.
    fn diff_child_elements<S: DiffSink>(
        &self,
        element1: &NodeRef,
        element2: &NodeRef,
        sink: &mut S,
    ) -> Result<()> {
        let mut elements1 = select_elements(element1);
        let mut elements2 = select_elements(element2);
        if !self.ordered {
            // Stable sorts keep ties in document order, so repeated runs on
            // identical input produce identical output
            elements1.sort_by(compare_elements);
            elements2.sort_by(compare_elements);
        }

        let mut index1 = 0;
        let mut index2 = 0;

        while index1 < elements1.len() || index2 < elements2.len() {
            let mut difference = Difference::Equal;
            if index1 == elements1.len() {
                difference = Difference::Add;
            } else if index2 == elements2.len() {
                difference = Difference::Remove;
            } else {
                let child1 = &elements1[index1];
                let child2 = &elements2[index2];
                match compare_elements(child1, child2) {
                    Ordering::Equal => {
                        self.diff_elements(child1, child2, sink)?;
                    }
                    Ordering::Greater => difference = Difference::Add,
                    Ordering::Less => difference = Difference::Remove,
                }
            }

            match difference {
                Difference::Add => {
                    let to_add = &elements2[index2];
                    if self.ordered && index1 < elements1.len() {
                        // Insert as a preceding sibling of the next
                        // not-yet-consumed element on the first side
                        sink.accept(DiffEvent::Add {
                            sel: xpath_of(&elements1[index1]),
                            value: DiffValue::Element(deep_clone(to_add)),
                            pos: Pos::Before,
                        })?;
                    } else {
                        sink.accept(DiffEvent::Add {
                            sel: xpath_of(element2),
                            value: DiffValue::Element(deep_clone(to_add)),
                            pos: Pos::Append,
                        })?;
                    }
                    index2 += 1;
                }
                Difference::Remove => {
                    sink.accept(DiffEvent::Remove {
                        sel: xpath_of(&elements1[index1]),
                    })?;
                    index1 += 1;
                }
                Difference::Equal => {
                    index1 += 1;
                    index2 += 1;
                }
                // Matched children recurse instead of being replaced
                Difference::Replace => unreachable!(),
            }
        }
        Ok(())
    }
}

/// Orders elements by the comparison key
/// `(element name, id value, name value)`.
///
/// Key fields compare field-by-field; an empty field on either side is no
/// constraint and defers to the next field, so two same-named elements with
/// neither `id` nor `name` compare equal regardless of content.
fn compare_elements(node1: &NodeRef, node2: &NodeRef) -> Ordering {
    let borrowed1 = node1.borrow();
    let borrowed2 = node2.borrow();
    let (elem1, elem2) = match (borrowed1.content(), borrowed2.content()) {
        (XmlContent::Element(e1), XmlContent::Element(e2)) => (e1, e2),
        _ => return Ordering::Equal,
    };

    let mut ordering = elem1.qname().cmp(elem2.qname());
    if ordering == Ordering::Equal {
        let id1 = elem1.attribute_ignore_case("id").unwrap_or("");
        let id2 = elem2.attribute_ignore_case("id").unwrap_or("");
        if !id1.is_empty() && !id2.is_empty() {
            ordering = id1.cmp(id2);
        }
        if ordering == Ordering::Equal {
            let name1 = elem1.attribute_ignore_case("name").unwrap_or("");
            let name2 = elem2.attribute_ignore_case("name").unwrap_or("");
            if !name1.is_empty() && !name2.is_empty() {
                ordering = name1.cmp(name2);
            }
        }
    }
    ordering
}

/// Collects an element's attributes sorted by name ascending.
fn sorted_attributes(element: &NodeRef) -> Vec<(String, String)> {
    let borrowed = element.borrow();
    match borrowed.content() {
        XmlContent::Element(e) => e
            .sorted_attributes()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        XmlContent::Text(_) => Vec::new(),
    }
}

/// Collects the direct element children of a node.
fn select_elements(parent: &NodeRef) -> Vec<NodeRef> {
    parent
        .borrow()
        .children()
        .iter()
        .filter(|child| child.borrow().content().is_element())
        .cloned()
        .collect()
}

/// Returns the first child's text, if the first child is a text node.
fn direct_text(element: &NodeRef) -> Option<String> {
    let borrowed = element.borrow();
    let first = borrowed.children().first()?;
    let first_borrowed = first.borrow();
    match first_borrowed.content() {
        XmlContent::Text(t) => Some(t.text().to_string()),
        XmlContent::Element(_) => None,
    }
}

/// Returns the element name, or an empty string for text nodes.
fn element_name(node: &NodeRef) -> String {
    node.borrow().element_name().unwrap_or_default().to_string()
}
