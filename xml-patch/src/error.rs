//! Error types for xml-patch.

use thiserror::Error;

/// Result type alias for xml-patch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during diff and merge operations.
///
/// Only fatal conditions are represented here. Recoverable merge-time
/// failures (unresolvable or malformed selectors) are counted by the
/// merger and reported through its notification log instead.
#[derive(Error, Debug)]
pub enum Error {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// The two trees being compared do not share a root element name.
    #[error("root elements do not match: {left} vs {right}")]
    StructureMismatch {
        /// Root element name of the first tree.
        left: String,
        /// Root element name of the second tree.
        right: String,
    },

    /// A patch document contained a top-level operation other than
    /// add, remove, or replace.
    #[error("invalid merge operation {0}")]
    UnknownOperation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}
