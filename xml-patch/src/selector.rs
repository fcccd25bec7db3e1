//! Selector parsing and evaluation.
//!
//! The merger treats patch addresses as opaque strings and delegates
//! resolution to this module. The grammar is exactly what the addressing
//! scheme emits: an absolute path of `/`-separated steps, each an element
//! name with an optional `[@attr='value']` or 1-based `[index]` predicate,
//! optionally ending in an `@attrName` step.
//!
//! Resolution distinguishes two failure modes: a selector that does not
//! parse ([`SelectorError`]) and a well-formed selector that matches no node
//! (`Ok(None)`). The merger counts both as recoverable errors for add and
//! replace operations.

use thiserror::Error;

use crate::node::{NodeRef, XmlContent};

/// A selector that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed selector: {0}")]
pub struct SelectorError(pub String);

/// A resolved selector target.
#[derive(Debug, Clone)]
pub enum Target {
    /// An element node.
    Element(NodeRef),
    /// An attribute of an element, identified by name.
    Attribute {
        /// The element carrying the attribute.
        element: NodeRef,
        /// The attribute name.
        name: String,
    },
}

/// One step of a parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// Descend into a child element.
    Child { name: String, predicate: Predicate },
    /// Select an attribute of the current element. Always the final step.
    Attribute(String),
}

/// Predicate attached to a child step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    /// No predicate; the first same-named child matches.
    None,
    /// 1-based index among same-named children.
    Index(usize),
    /// Attribute equality, e.g. `[@id='x']`.
    Attr { name: String, value: String },
}

/// Resolves a selector against a tree.
///
/// `root` may be the synthetic document wrapper produced by the parser or a
/// bare root element. Returns `Ok(None)` when the selector is well-formed
/// but matches nothing.
pub fn resolve(root: &NodeRef, selector: &str) -> Result<Option<Target>, SelectorError> {
    let steps = parse(selector)?;

    let mut current: Option<NodeRef> = None;
    for step in &steps {
        match step {
            Step::Attribute(name) => {
                // Parse guarantees this is the final step and not the first
                let Some(element) = current else {
                    return Ok(None);
                };
                let has_attr = element
                    .borrow()
                    .content()
                    .as_element()
                    .is_some_and(|e| e.attribute(name).is_some());
                return Ok(has_attr.then(|| Target::Attribute {
                    element,
                    name: name.clone(),
                }));
            }
            Step::Child { name, predicate } => {
                let next = match &current {
                    Some(node) => matching_child(node, name, predicate),
                    // Document level: either search the wrapper's children
                    // or match the bare root element itself
                    None if root.borrow().is_document() => {
                        matching_child(root, name, predicate)
                    }
                    None => matches_root(root, name, predicate).then(|| root.clone()),
                };
                match next {
                    Some(node) => current = Some(node),
                    None => return Ok(None),
                }
            }
        }
    }

    Ok(current.map(Target::Element))
}

/// Parses a selector into steps.
fn parse(selector: &str) -> Result<Vec<Step>, SelectorError> {
    let malformed = || SelectorError(selector.to_string());

    let rest = selector.strip_prefix('/').ok_or_else(malformed)?;
    if rest.is_empty() {
        return Err(malformed());
    }

    let mut steps = Vec::new();
    for segment in split_steps(rest).ok_or_else(malformed)? {
        if steps.iter().any(|s| matches!(s, Step::Attribute(_))) {
            // Nothing may follow an attribute step
            return Err(malformed());
        }
        if let Some(attr) = segment.strip_prefix('@') {
            if attr.is_empty() || steps.is_empty() {
                return Err(malformed());
            }
            steps.push(Step::Attribute(attr.to_string()));
        } else {
            steps.push(parse_child_step(segment).ok_or_else(malformed)?);
        }
    }

    if steps.is_empty() {
        return Err(malformed());
    }
    Ok(steps)
}

/// Splits a selector body on `/` outside bracketed predicates.
///
/// Predicate values may themselves contain `/`, so a plain split would break
/// selectors like `/r/item[@id='a/b']`.
fn split_steps(body: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    let mut in_quotes = false;

    for (i, c) in body.char_indices() {
        match c {
            '\'' if in_brackets => in_quotes = !in_quotes,
            '[' if !in_quotes => {
                if in_brackets {
                    return None;
                }
                in_brackets = true;
            }
            ']' if !in_quotes => {
                if !in_brackets {
                    return None;
                }
                in_brackets = false;
            }
            '/' if !in_brackets => {
                segments.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_brackets || in_quotes {
        return None;
    }
    segments.push(&body[start..]);

    segments.iter().all(|s| !s.is_empty()).then_some(segments)
}

/// Parses one `name`, `name[index]`, or `name[@attr='value']` step.
fn parse_child_step(segment: &str) -> Option<Step> {
    let Some(open) = segment.find('[') else {
        if segment.is_empty() || segment.contains(']') {
            return None;
        }
        return Some(Step::Child {
            name: segment.to_string(),
            predicate: Predicate::None,
        });
    };

    let name = &segment[..open];
    let rest = &segment[open + 1..];
    let inner = rest.strip_suffix(']')?;
    if name.is_empty() || inner.is_empty() {
        return None;
    }

    let predicate = if let Some(attr_expr) = inner.strip_prefix('@') {
        let (attr_name, quoted) = attr_expr.split_once('=')?;
        let value = quoted.strip_prefix('\'')?.strip_suffix('\'')?;
        if attr_name.is_empty() {
            return None;
        }
        Predicate::Attr {
            name: attr_name.to_string(),
            value: value.to_string(),
        }
    } else {
        let index: usize = inner.parse().ok()?;
        if index == 0 {
            return None;
        }
        Predicate::Index(index)
    };

    Some(Step::Child {
        name: name.to_string(),
        predicate,
    })
}

/// Finds the first child element of `parent` matching a step.
fn matching_child(parent: &NodeRef, name: &str, predicate: &Predicate) -> Option<NodeRef> {
    let borrowed = parent.borrow();
    let mut position = 0usize;

    for child in borrowed.children() {
        let child_borrowed = child.borrow();
        let XmlContent::Element(elem) = child_borrowed.content() else {
            continue;
        };
        if elem.qname() != name {
            continue;
        }
        position += 1;

        let matched = match predicate {
            Predicate::None => true,
            Predicate::Index(index) => position == *index,
            Predicate::Attr { name, value } => elem
                .attribute_ignore_case(name)
                .is_some_and(|v| v == value),
        };
        if matched {
            return Some(child.clone());
        }
    }
    None
}

/// Tests whether a bare root element matches the first step.
fn matches_root(root: &NodeRef, name: &str, predicate: &Predicate) -> bool {
    let borrowed = root.borrow();
    let XmlContent::Element(elem) = borrowed.content() else {
        return false;
    };
    if elem.qname() != name {
        return false;
    }
    match predicate {
        Predicate::None => true,
        Predicate::Index(index) => *index == 1,
        Predicate::Attr { name, value } => elem
            .attribute_ignore_case(name)
            .is_some_and(|v| v == value),
    }
}
