//! Patch application.
//!
//! The merger parses a patch document, resolves each operation's address
//! against a baseline tree, and mutates the tree in place. Operations apply
//! strictly in document order against the current, possibly already-mutated
//! baseline.
//!
//! Per-operation failures do not abort the run: an `add` or `replace` whose
//! selector does not parse or resolve is counted, reported through the
//! notification log, and skipped, and the remaining operations still apply.
//! A `remove` whose target is gone is silently ignored. Only an unknown
//! operation tag is fatal. Callers must treat a non-zero error count as
//! "output may be incomplete", not as a failure to produce output.

use std::fmt;

use crate::diff::{DIFF_ADD_TAG, DIFF_POS_ATTR, DIFF_REMOVE_TAG, DIFF_REPLACE_TAG, DIFF_ROOT_TAG,
                  DIFF_SEL_ATTR, DIFF_TYPE_ATTR};
use crate::error::{Error, Result};
use crate::node::{deep_clone, detach, new_text_node, NodeInner, NodeRef, XmlContent};
use crate::selector::{self, Target};
use crate::xml::document_element;

/// Receiver for merge notifications.
///
/// A narrow capability so that a test harness can substitute an in-memory
/// recorder for the default `tracing`-backed log.
pub trait MergeLog {
    /// Reports a recoverable per-operation error.
    fn error(&mut self, message: fmt::Arguments<'_>);

    /// Reports run-level information.
    fn info(&mut self, message: fmt::Arguments<'_>);
}

/// Forwards merge notifications to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceLog;

impl MergeLog for TraceLog {
    fn error(&mut self, message: fmt::Arguments<'_>) {
        tracing::error!("{}", message);
    }

    fn info(&mut self, message: fmt::Arguments<'_>) {
        tracing::info!("{}", message);
    }
}

/// Applies patch documents to baseline trees.
pub struct XmlMerge {
    errors: u32,
    log: Box<dyn MergeLog>,
}

impl Default for XmlMerge {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlMerge {
    /// Creates a merger that reports notifications through `tracing`.
    pub fn new() -> Self {
        Self::with_log(Box::new(TraceLog))
    }

    /// Creates a merger with a custom notification log.
    pub fn with_log(log: Box<dyn MergeLog>) -> Self {
        XmlMerge { errors: 0, log }
    }

    /// Returns the number of recoverable errors recorded so far.
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Applies a patch document to a baseline tree, mutating it in place.
    ///
    /// Returns the recoverable error count; the baseline reflects every
    /// operation that applied, whatever the count. Fails only on a
    /// malformed patch document or an unknown operation tag.
    pub fn merge(&mut self, baseline: &NodeRef, patch: &NodeRef) -> Result<u32> {
        let diff_root = document_element(patch)?;
        {
            let borrowed = diff_root.borrow();
            let name = borrowed.element_name().unwrap_or_default();
            if name != DIFF_ROOT_TAG {
                return Err(Error::Parse(format!(
                    "expected <{}> root in patch document, found <{}>",
                    DIFF_ROOT_TAG, name
                )));
            }
        }

        let operations: Vec<NodeRef> = diff_root.borrow().children().to_vec();
        for operation in &operations {
            let Some(tag) = operation.borrow().element_name().map(str::to_string) else {
                continue;
            };
            match tag.as_str() {
                DIFF_ADD_TAG => self.apply_add(baseline, operation),
                DIFF_REMOVE_TAG => self.apply_remove(baseline, operation),
                DIFF_REPLACE_TAG => self.apply_replace(baseline, operation),
                other => {
                    self.errors += 1;
                    return Err(Error::UnknownOperation(other.to_string()));
                }
            }
        }

        self.log
            .info(format_args!("merge completed with {} errors", self.errors));
        Ok(self.errors)
    }

    /// Applies one `add` operation.
    fn apply_add(&mut self, baseline: &NodeRef, operation: &NodeRef) {
        let Some(sel) = operation_attribute(operation, DIFF_SEL_ATTR) else {
            self.record_error(format_args!("missing sel attribute for add"));
            return;
        };
        let Some(site) = self.resolve_target(baseline, &sel, DIFF_ADD_TAG) else {
            return;
        };

        if let Some(type_marker) = operation_attribute(operation, DIFF_TYPE_ATTR) {
            // Attribute addition: payload is the attribute's text value
            let name = type_marker
                .strip_prefix('@')
                .unwrap_or(&type_marker)
                .to_string();
            let value = text_content(operation);
            let Target::Element(element) = site else {
                self.record_error(format_args!("add type target is not an element; {}", sel));
                return;
            };
            if let XmlContent::Element(elem) = element.borrow_mut().content_mut() {
                elem.set_attribute(name, value);
            }
            return;
        }

        let Target::Element(site) = site else {
            self.record_error(format_args!("add target is not an element; {}", sel));
            return;
        };

        // Deep-clone the payload into the baseline's ownership
        let payload = match first_element_child(operation) {
            Some(element) => deep_clone(&element),
            None => {
                let text = text_content(operation);
                if text.is_empty() {
                    self.record_error(format_args!("empty payload for add; {}", sel));
                    return;
                }
                new_text_node(text)
            }
        };

        match operation_attribute(operation, DIFF_POS_ATTR).as_deref() {
            Some("prepend") => {
                // Site is the parent; payload becomes the first child
                NodeInner::add_child_at_to_ref(&site, 0, payload);
            }
            Some("before") => {
                let Some((parent, index)) = parent_and_index(&site) else {
                    self.record_error(format_args!("no parent to insert before; {}", sel));
                    return;
                };
                NodeInner::add_child_at_to_ref(&parent, index, payload);
            }
            Some("after") => {
                let Some((parent, index)) = parent_and_index(&site) else {
                    self.record_error(format_args!("no parent to insert after; {}", sel));
                    return;
                };
                // An index one past the end appends, covering the
                // no-following-sibling case
                NodeInner::add_child_at_to_ref(&parent, index + 1, payload);
            }
            _ => {
                // Site is the parent; payload becomes the last child
                NodeInner::add_child_to_ref(&site, payload);
            }
        }
    }

    /// Applies one `remove` operation.
    ///
    /// A missing target is deliberately not an error, unlike add and
    /// replace.
    fn apply_remove(&mut self, baseline: &NodeRef, operation: &NodeRef) {
        let Some(sel) = operation_attribute(operation, DIFF_SEL_ATTR) else {
            self.record_error(format_args!("missing sel attribute for remove"));
            return;
        };
        match selector::resolve(baseline, &sel) {
            Ok(Some(Target::Element(node))) => {
                detach(&node);
            }
            Ok(Some(Target::Attribute { element, name })) => {
                if let XmlContent::Element(elem) = element.borrow_mut().content_mut() {
                    elem.remove_attribute(&name);
                }
            }
            Ok(None) => {}
            Err(_) => {
                self.record_error(format_args!("invalid selector for remove; {}", sel));
            }
        }
    }

    /// Applies one `replace` operation.
    fn apply_replace(&mut self, baseline: &NodeRef, operation: &NodeRef) {
        let Some(sel) = operation_attribute(operation, DIFF_SEL_ATTR) else {
            self.record_error(format_args!("missing sel attribute for replace"));
            return;
        };
        let Some(target) = self.resolve_target(baseline, &sel, DIFF_REPLACE_TAG) else {
            return;
        };

        let value = text_content(operation);
        match target {
            Target::Element(element) => set_direct_text(&element, &value),
            Target::Attribute { element, name } => {
                if let XmlContent::Element(elem) = element.borrow_mut().content_mut() {
                    elem.set_attribute(name, value);
                }
            }
        }
    }

    /// Resolves a selector, recording a recoverable error on failure.
    fn resolve_target(&mut self, baseline: &NodeRef, sel: &str, op: &str) -> Option<Target> {
        match selector::resolve(baseline, sel) {
            Ok(Some(target)) => Some(target),
            Ok(None) => {
                self.record_error(format_args!("target not found for {}; {}", op, sel));
                None
            }
            Err(_) => {
                self.record_error(format_args!("invalid selector for {}; {}", op, sel));
                None
            }
        }
    }

    fn record_error(&mut self, message: fmt::Arguments<'_>) {
        self.errors += 1;
        self.log.error(message);
    }
}

/// Reads an attribute of a patch operation element.
fn operation_attribute(operation: &NodeRef, name: &str) -> Option<String> {
    operation
        .borrow()
        .content()
        .as_element()
        .and_then(|e| e.attribute(name))
        .map(str::to_string)
}

/// Returns the first element child of a patch operation, if any.
fn first_element_child(operation: &NodeRef) -> Option<NodeRef> {
    operation
        .borrow()
        .children()
        .iter()
        .find(|child| child.borrow().content().is_element())
        .cloned()
}

/// Concatenates the direct text children of a patch operation.
fn text_content(operation: &NodeRef) -> String {
    let mut text = String::new();
    for child in operation.borrow().children() {
        if let XmlContent::Text(t) = child.borrow().content() {
            text.push_str(t.text());
        }
    }
    text
}

/// Returns a node's parent and its index in the parent's child list.
fn parent_and_index(node: &NodeRef) -> Option<(NodeRef, usize)> {
    let borrowed = node.borrow();
    let parent = borrowed.parent().upgrade()?;
    let index = borrowed.child_pos();
    (index >= 0).then_some((parent, index as usize))
}

/// Updates an element's direct text child, creating one if absent.
fn set_direct_text(element: &NodeRef, value: &str) {
    {
        let borrowed = element.borrow();
        for child in borrowed.children() {
            let mut child_borrowed = child.borrow_mut();
            if let XmlContent::Text(text) = child_borrowed.content_mut() {
                text.set_text(value);
                return;
            }
        }
    }
    NodeInner::add_child_to_ref(element, new_text_node(value));
}
