//! Patch event model.
//!
//! The tagged-union vocabulary exchanged between the differencer and its
//! sinks. Events address nodes by path and carry independent copies of the
//! values involved, so a consumer can outlive the trees that produced them.

use crate::error::Result;
use crate::node::NodeRef;

/// Position of an added node relative to the node its address resolves to.
///
/// Only meaningful when an element or text node is inserted among siblings;
/// attribute additions ignore it, and `Append` (the default) is omitted on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pos {
    /// Insert as the following sibling of the addressed node.
    After,
    /// Insert as the last child of the addressed node.
    Append,
    /// Insert as the preceding sibling of the addressed node.
    Before,
    /// Insert as the first child of the addressed node.
    Prepend,
}

impl Pos {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pos::After => "after",
            Pos::Append => "append",
            Pos::Before => "before",
            Pos::Prepend => "prepend",
        }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value carried by a patch event.
///
/// Each variant carries exactly the fields it needs: an element is a cloned
/// subtree with no ownership link back to its source tree, an attribute is a
/// name/value pair, and text is the character data alone.
#[derive(Debug, Clone)]
pub enum DiffValue {
    /// A deep-cloned element subtree.
    Element(NodeRef),
    /// An attribute name and value.
    Attribute {
        /// Attribute name.
        name: String,
        /// Attribute value.
        value: String,
    },
    /// Text content.
    Text(String),
}

/// A single patch operation produced by the differencer.
#[derive(Debug, Clone)]
pub enum DiffEvent {
    /// Add a node next to (or on, for attributes) the addressed node.
    Add {
        /// Address the addition is relative to.
        sel: String,
        /// The node being added.
        value: DiffValue,
        /// Where the addition lands relative to the addressed node.
        pos: Pos,
    },
    /// Replace the addressed node's value.
    Replace {
        /// Address of the node being replaced.
        sel: String,
        /// The new value.
        value: DiffValue,
        /// The prior value, kept for traceability; the merger ignores it.
        old: DiffValue,
    },
    /// Remove the addressed node.
    Remove {
        /// Address of the node being removed.
        sel: String,
    },
}

impl DiffEvent {
    /// Returns the event's address.
    pub fn sel(&self) -> &str {
        match self {
            DiffEvent::Add { sel, .. }
            | DiffEvent::Replace { sel, .. }
            | DiffEvent::Remove { sel } => sel,
        }
    }
}

/// Consumer of a patch event stream.
///
/// The differencer owns no knowledge of what happens to the events it
/// emits; a sink may serialize them, render a report, or collect them in
/// memory for a test harness.
pub trait DiffSink {
    /// Accepts one event.
    fn accept(&mut self, event: DiffEvent) -> Result<()>;

    /// Called once after the last event of a run.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink that records events for inspection.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<DiffEvent>,
}

impl EventCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        EventCollector::default()
    }

    /// Returns the recorded events.
    pub fn events(&self) -> &[DiffEvent] {
        &self.events
    }

    /// Consumes the collector, returning the recorded events.
    pub fn into_events(self) -> Vec<DiffEvent> {
        self.events
    }

    /// Returns true if no events were recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl DiffSink for EventCollector {
    fn accept(&mut self, event: DiffEvent) -> Result<()> {
        self.events.push(event);
        Ok(())
    }
}
