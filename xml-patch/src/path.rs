//! Node addressing.
//!
//! Computes a stable, human-readable path string identifying a node's
//! position in its tree. Paths double as selectors: a path computed against
//! one tree resolves to the structurally corresponding node in an
//! independently parsed copy, which is what lets the merger apply patch
//! operations recorded during differencing.
//!
//! An element is addressed by its tag name plus a disambiguating predicate:
//! the value of a same-named `id` or `name` attribute when one is present
//! (attribute-name lookup is case-insensitive), otherwise a 1-based
//! positional index among same-named siblings. The root element carries no
//! predicate. An attribute is addressed as its owner element's path plus
//! `/@attrName`. A text node is addressed by its owning element's path:
//! text is treated as a singleton child, since an element is assumed to
//! carry at most one direct text child for diff purposes.

use crate::node::{NodeRef, XmlContent, XmlElement};

/// Returns the path of a node.
///
/// For an element, the path of the element itself; for a text node, the
/// path of the owning element.
pub fn xpath_of(node: &NodeRef) -> String {
    let start = match node.borrow().content() {
        XmlContent::Element(_) => Some(node.clone()),
        XmlContent::Text(_) => node.borrow().parent().upgrade(),
    };

    let Some(start) = start else {
        return "/".to_string();
    };

    // Collect the ancestor chain, stopping below the document wrapper
    let mut chain = vec![start.clone()];
    let mut current = start;
    loop {
        let parent = current.borrow().parent().upgrade();
        match parent {
            Some(parent) if !parent.borrow().is_document() => {
                chain.push(parent.clone());
                current = parent;
            }
            _ => break,
        }
    }

    let mut buffer = String::new();
    for (depth, node) in chain.iter().rev().enumerate() {
        let borrowed = node.borrow();
        let XmlContent::Element(elem) = borrowed.content() else {
            continue;
        };
        buffer.push('/');
        buffer.push_str(elem.qname());
        // The root element is addressed by name alone
        if depth > 0 {
            buffer.push_str(&predicate_for(elem, node));
        }
    }
    buffer
}

/// Returns the path of an attribute: the owner element's path plus
/// `/@attrName`.
pub fn attribute_xpath(element: &NodeRef, attr_name: &str) -> String {
    format!("{}/@{}", xpath_of(element), attr_name)
}

/// Builds the disambiguating predicate for a non-root element.
fn predicate_for(elem: &XmlElement, node: &NodeRef) -> String {
    if let Some(id) = elem.attribute_ignore_case("id").filter(|v| !v.is_empty()) {
        format!("[@id='{}']", id)
    } else if let Some(name) = elem
        .attribute_ignore_case("name")
        .filter(|v| !v.is_empty())
    {
        format!("[@name='{}']", name)
    } else {
        format!("[{}]", sibling_position(node, elem.qname()))
    }
}

/// Returns the 1-based position of an element among same-named element
/// siblings.
fn sibling_position(node: &NodeRef, name: &str) -> usize {
    let borrowed = node.borrow();
    let Some(parent) = borrowed.parent().upgrade() else {
        return 1;
    };
    let pos = borrowed.child_pos().max(0) as usize;
    let parent_borrowed = parent.borrow();

    let mut position = 1;
    for sibling in &parent_borrowed.children()[..pos.min(parent_borrowed.child_count())] {
        if sibling.borrow().element_name() == Some(name) {
            position += 1;
        }
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{document_element, parse_str};

    fn nth_child(node: &NodeRef, index: usize) -> NodeRef {
        node.borrow().children()[index].clone()
    }

    #[test]
    fn test_root_has_no_predicate() {
        let doc = parse_str(r#"<catalog id="c1"/>"#).unwrap();
        let root = document_element(&doc).unwrap();
        assert_eq!(xpath_of(&root), "/catalog");
    }

    #[test]
    fn test_id_predicate_preferred() {
        let doc = parse_str(r#"<r><item id="a" name="x"/></r>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let item = nth_child(&root, 0);
        assert_eq!(xpath_of(&item), "/r/item[@id='a']");
    }

    #[test]
    fn test_name_predicate_fallback() {
        let doc = parse_str(r#"<r><item name="x"/></r>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let item = nth_child(&root, 0);
        assert_eq!(xpath_of(&item), "/r/item[@name='x']");
    }

    #[test]
    fn test_id_lookup_is_case_insensitive() {
        let doc = parse_str(r#"<r><item Id="a"/></r>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let item = nth_child(&root, 0);
        assert_eq!(xpath_of(&item), "/r/item[@id='a']");
    }

    #[test]
    fn test_positional_predicate() {
        let doc = parse_str(r#"<r><item/><other/><item/></r>"#).unwrap();
        let root = document_element(&doc).unwrap();
        assert_eq!(xpath_of(&nth_child(&root, 0)), "/r/item[1]");
        assert_eq!(xpath_of(&nth_child(&root, 1)), "/r/other[1]");
        assert_eq!(xpath_of(&nth_child(&root, 2)), "/r/item[2]");
    }

    #[test]
    fn test_nested_path() {
        let doc = parse_str(r#"<r><group id="g"><item/></group></r>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let group = nth_child(&root, 0);
        let item = nth_child(&group, 0);
        assert_eq!(xpath_of(&item), "/r/group[@id='g']/item[1]");
    }

    #[test]
    fn test_text_node_addressed_by_owner() {
        let doc = parse_str(r#"<r><c>hello</c></r>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let c = nth_child(&root, 0);
        let text = nth_child(&c, 0);
        assert_eq!(xpath_of(&text), "/r/c[1]");
        assert_eq!(xpath_of(&text), xpath_of(&c));
    }

    #[test]
    fn test_attribute_path() {
        let doc = parse_str(r#"<r><c v="1"/></r>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let c = nth_child(&root, 0);
        assert_eq!(attribute_xpath(&c, "v"), "/r/c[1]/@v");
        assert_eq!(attribute_xpath(&root, "version"), "/r/@version");
    }

    #[test]
    fn test_corresponding_nodes_share_paths() {
        let xml = r#"<r><a id="1"><b/></a><a id="2"/></r>"#;
        let doc1 = parse_str(xml).unwrap();
        let doc2 = parse_str(xml).unwrap();

        let root1 = document_element(&doc1).unwrap();
        let root2 = document_element(&doc2).unwrap();
        let b1 = nth_child(&nth_child(&root1, 0), 0);
        let b2 = nth_child(&nth_child(&root2, 0), 0);
        assert_eq!(xpath_of(&b1), xpath_of(&b2));
        assert_eq!(xpath_of(&b1), "/r/a[@id='1']/b[1]");
    }
}
