//! Node structures for XML tree representation.
//!
//! This module provides the core node type used to represent XML documents
//! as trees. Nodes are reference-counted with weak parent back-links and an
//! explicitly maintained sibling position, so that detaching, inserting, and
//! cloning subtrees are index updates on the parent's child list rather than
//! pointer surgery.

mod content;

pub use content::{XmlContent, XmlElement, XmlText};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Name of the synthetic element that wraps a parsed document.
///
/// The parser inserts this wrapper so that the document element itself is an
/// ordinary child node; printers and selectors skip it.
pub const DOCUMENT_TAG: &str = "$ROOT$";

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// The inner data of a node in a document tree.
///
/// Each node has:
/// - XML content (element or text)
/// - 0 or more children
/// - A weak reference to its parent (empty for the root)
/// - A position among siblings
#[derive(Debug)]
pub struct NodeInner {
    /// Child nodes.
    children: Vec<NodeRef>,
    /// XML content of this node.
    content: XmlContent,
    /// Weak reference to the parent node.
    parent: Weak<RefCell<NodeInner>>,
    /// Zero-based position among siblings (-1 for a detached or root node).
    child_pos: i32,
}

impl NodeInner {
    /// Creates a new detached node with the given content.
    pub fn new(content: XmlContent) -> Self {
        NodeInner {
            children: Vec::new(),
            content,
            parent: Weak::new(),
            child_pos: -1,
        }
    }

    /// Returns the content of this node.
    pub fn content(&self) -> &XmlContent {
        &self.content
    }

    /// Returns a mutable reference to the content.
    pub fn content_mut(&mut self) -> &mut XmlContent {
        &mut self.content
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a reference to the child at the given index.
    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns a weak reference to the parent.
    pub fn parent(&self) -> &Weak<RefCell<NodeInner>> {
        &self.parent
    }

    /// Returns the child position (0-based index among siblings, -1 for a
    /// detached or root node).
    pub fn child_pos(&self) -> i32 {
        self.child_pos
    }

    /// Returns the element name, if this node is an element.
    pub fn element_name(&self) -> Option<&str> {
        self.content.as_element().map(XmlElement::qname)
    }

    /// Returns true if this node is the synthetic document wrapper.
    pub fn is_document(&self) -> bool {
        self.element_name() == Some(DOCUMENT_TAG)
    }
}

/// Helper functions that work with NodeRef.
impl NodeInner {
    /// Adds a child node as the last child. Must be called on the NodeRef
    /// wrapper.
    pub fn add_child_to_ref(parent_ref: &NodeRef, child_ref: NodeRef) {
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = parent_ref.borrow().children.len() as i32;
        }
        parent_ref.borrow_mut().children.push(child_ref);
    }

    /// Inserts a child at the given index. An index equal to the child count
    /// appends.
    pub fn add_child_at_to_ref(parent_ref: &NodeRef, index: usize, child_ref: NodeRef) {
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = index as i32;
        }
        {
            let mut parent = parent_ref.borrow_mut();
            parent.children.insert(index, child_ref);
            // Update child positions for siblings after the insertion point
            for i in (index + 1)..parent.children.len() {
                parent.children[i].borrow_mut().child_pos = i as i32;
            }
        }
    }

    /// Removes the child at the given index.
    pub fn remove_child_to_ref(parent_ref: &NodeRef, index: usize) {
        let mut parent = parent_ref.borrow_mut();
        if index < parent.children.len() {
            let removed = parent.children.remove(index);
            {
                let mut removed = removed.borrow_mut();
                removed.parent = Weak::new();
                removed.child_pos = -1;
            }
            // Update child positions for siblings after the removal point
            for i in index..parent.children.len() {
                parent.children[i].borrow_mut().child_pos = i as i32;
            }
        }
    }
}

/// Creates a new detached node with the given content.
pub fn new_node(content: XmlContent) -> NodeRef {
    Rc::new(RefCell::new(NodeInner::new(content)))
}

/// Creates a new element node with no attributes.
pub fn new_element_node(name: impl Into<String>) -> NodeRef {
    new_node(XmlContent::Element(XmlElement::new(name)))
}

/// Creates a new text node.
pub fn new_text_node(text: impl Into<String>) -> NodeRef {
    new_node(XmlContent::Text(XmlText::new(text)))
}

/// Detaches a node from its parent's child list.
///
/// Returns true if the node had a parent and was detached. A node without a
/// parent is left untouched.
pub fn detach(node: &NodeRef) -> bool {
    let (parent, pos) = {
        let borrowed = node.borrow();
        (borrowed.parent.upgrade(), borrowed.child_pos)
    };
    match parent {
        Some(parent) if pos >= 0 => {
            NodeInner::remove_child_to_ref(&parent, pos as usize);
            true
        }
        _ => false,
    }
}

/// Creates an independent deep copy of a subtree.
///
/// The copy has no ownership link back to the source tree; its root is
/// detached and can be inserted into any tree.
pub fn deep_clone(node: &NodeRef) -> NodeRef {
    let (content, children) = {
        let borrowed = node.borrow();
        (borrowed.content.clone(), borrowed.children.clone())
    };
    let copy = new_node(content);
    for child in &children {
        NodeInner::add_child_to_ref(&copy, deep_clone(child));
    }
    copy
}

/// Tests two subtrees for structural equality.
///
/// Elements are equal when their names and attribute sets match; text nodes
/// when their content matches. Children are compared pairwise in order.
pub fn structural_eq(a: &NodeRef, b: &NodeRef) -> bool {
    let a = a.borrow();
    let b = b.borrow();
    let content_equal = match (a.content(), b.content()) {
        (XmlContent::Element(ea), XmlContent::Element(eb)) => {
            ea.qname() == eb.qname() && ea.attributes() == eb.attributes()
        }
        (XmlContent::Text(ta), XmlContent::Text(tb)) => ta.text() == tb.text(),
        _ => false,
    };
    content_equal
        && a.child_count() == b.child_count()
        && a.children()
            .iter()
            .zip(b.children().iter())
            .all(|(ca, cb)| structural_eq(ca, cb))
}
