//! XML content types for tree nodes.
//!
//! This module provides `XmlContent`, which represents the content of an XML
//! node, either an element (tag with attributes) or text content.

use rustc_hash::FxHashMap;

/// Represents the content of an XML node.
#[derive(Debug, Clone)]
pub enum XmlContent {
    /// An XML element with a name and attributes.
    Element(XmlElement),
    /// XML text content.
    Text(XmlText),
}

impl XmlContent {
    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlContent::Element(_))
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, XmlContent::Text(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            XmlContent::Text(_) => None,
        }
    }

    /// Returns a mutable reference to the element, if this is an element node.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            XmlContent::Text(_) => None,
        }
    }

    /// Returns a reference to the text, if this is a text node.
    pub fn as_text(&self) -> Option<&XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            XmlContent::Element(_) => None,
        }
    }

    /// Returns a mutable reference to the text, if this is a text node.
    pub fn as_text_mut(&mut self) -> Option<&mut XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            XmlContent::Element(_) => None,
        }
    }
}

/// An XML element with a name and attributes.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// The qualified name of the element (e.g., "field", "ns:field").
    name: String,
    /// Attributes as key-value pairs keyed by the qualified attribute name.
    attributes: FxHashMap<String, String>,
}

impl XmlElement {
    /// Creates a new element with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: FxHashMap::default(),
        }
    }

    /// Creates a new element with the given attributes.
    pub fn with_attributes(name: impl Into<String>, attributes: FxHashMap<String, String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes,
        }
    }

    /// Returns the qualified name of the element.
    pub fn qname(&self) -> &str {
        &self.name
    }

    /// Returns the attributes.
    pub fn attributes(&self) -> &FxHashMap<String, String> {
        &self.attributes
    }

    /// Returns the value of the attribute with the given name, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the value of an attribute, matching the attribute name
    /// case-insensitively.
    ///
    /// Key-identifying attributes are conventionally named `id` or `name`
    /// but appear with varying capitalization in the wild, so lookups for
    /// them ignore case.
    pub fn attribute_ignore_case(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, overwriting any prior value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Removes an attribute, returning its prior value if it was present.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// Returns the attributes sorted by name ascending.
    ///
    /// Sorted iteration keeps output and comparisons deterministic
    /// regardless of hash-map ordering.
    pub fn sorted_attributes(&self) -> Vec<(&str, &str)> {
        let mut attrs: Vec<(&str, &str)> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        attrs.sort_by(|a, b| a.0.cmp(b.0));
        attrs
    }
}

impl std::fmt::Display for XmlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {{", self.name)?;
        for (i, (name, value)) in self.sorted_attributes().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, " {}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// XML text content.
#[derive(Debug, Clone)]
pub struct XmlText {
    text: String,
}

impl XmlText {
    /// Creates a new text node.
    pub fn new(text: impl Into<String>) -> Self {
        XmlText { text: text.into() }
    }

    /// Returns the text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Sets the text content.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl std::fmt::Display for XmlText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let mut elem = XmlElement::new("field");
        elem.set_attribute("Id", "42");
        elem.set_attribute("name", "price");

        assert_eq!(elem.attribute("Id"), Some("42"));
        assert_eq!(elem.attribute("id"), None);
        assert_eq!(elem.attribute_ignore_case("id"), Some("42"));
        assert_eq!(elem.attribute_ignore_case("NAME"), Some("price"));
        assert_eq!(elem.attribute_ignore_case("missing"), None);
    }

    #[test]
    fn test_set_and_remove_attribute() {
        let mut elem = XmlElement::new("field");
        elem.set_attribute("a", "1");
        elem.set_attribute("a", "2");
        assert_eq!(elem.attribute("a"), Some("2"));

        assert_eq!(elem.remove_attribute("a"), Some("2".to_string()));
        assert_eq!(elem.remove_attribute("a"), None);
    }

    #[test]
    fn test_sorted_attributes() {
        let mut elem = XmlElement::new("field");
        elem.set_attribute("z", "3");
        elem.set_attribute("a", "1");
        elem.set_attribute("m", "2");

        let sorted = elem.sorted_attributes();
        assert_eq!(sorted, vec![("a", "1"), ("m", "2"), ("z", "3")]);
    }

    #[test]
    fn test_content_accessors() {
        let elem = XmlContent::Element(XmlElement::new("div"));
        let text = XmlContent::Text(XmlText::new("hello"));

        assert!(elem.is_element());
        assert!(!elem.is_text());
        assert!(text.is_text());

        assert!(elem.as_element().is_some());
        assert!(elem.as_text().is_none());
        assert!(text.as_text().is_some());
        assert!(text.as_element().is_none());
    }
}
