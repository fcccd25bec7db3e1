//! Schema-agnostic XML structural diff and patch.
//!
//! This library computes structural differences between two XML documents
//! and encodes them as a sequence of addressable patch operations (add,
//! replace, remove), then re-applies such a patch to a baseline document to
//! reconstruct the modified one.
//!
//! It does not require XML schemas. Only one assumption is made: the key
//! identifying attribute of an XML element is named either `id` or `name`,
//! which holds for the majority of XML files since that is common practice.
//!
//! # Overview
//!
//! - [`XmlDiff`] walks two trees in lock-step and emits a [`DiffEvent`]
//!   stream to a caller-supplied [`DiffSink`]. Child elements are matched
//!   either in document order or, in unordered mode, by a comparison key
//!   built from the element name and its `id`/`name` attributes.
//! - [`PatchOpsWriter`] serializes the event stream as a patch document: a
//!   `diff` root holding `add`, `replace`, and `remove` operations whose
//!   `sel` attributes address nodes by path.
//! - [`XmlMerge`] parses a patch document and applies it to a baseline
//!   tree, resolving each operation's address and mutating the tree in
//!   place. Per-operation failures are counted and reported, not raised.
//!
//! # Example
//!
//! ```
//! use xml_patch::{parse_str, PatchOpsWriter, XmlDiff, XmlMerge};
//!
//! let baseline = parse_str(r#"<r version="1"><c>old</c></r>"#)?;
//! let target = parse_str(r#"<r version="2"><c>new</c></r>"#)?;
//!
//! // Serialize the differences as a patch document
//! let mut patch_bytes = Vec::new();
//! XmlDiff::new().diff(&baseline, &target, &mut PatchOpsWriter::new(&mut patch_bytes))?;
//!
//! // Apply the patch to an independently parsed baseline
//! let restored = parse_str(r#"<r version="1"><c>old</c></r>"#)?;
//! let patch = parse_str(std::str::from_utf8(&patch_bytes).unwrap())?;
//! let errors = XmlMerge::new().merge(&restored, &patch)?;
//! assert_eq!(errors, 0);
//! assert!(xml_patch::structural_eq(&restored, &target));
//! # Ok::<(), xml_patch::Error>(())
//! ```

pub mod diff;
pub mod error;
pub mod merge;
pub mod node;
pub mod path;
pub mod selector;
pub mod xml;

// Re-export commonly used types
pub use diff::{DiffEvent, DiffSink, DiffValue, EventCollector, PatchOpsWriter, Pos, XmlDiff};
pub use error::{Error, Result};
pub use merge::{MergeLog, TraceLog, XmlMerge};
pub use node::{
    deep_clone, detach, new_element_node, new_node, new_text_node, structural_eq, NodeInner,
    NodeRef, XmlContent, XmlElement, XmlText,
};
pub use path::{attribute_xpath, xpath_of};
pub use selector::{SelectorError, Target};
pub use xml::{document_element, parse_file, parse_str, print_to_string, XmlPrinter};
