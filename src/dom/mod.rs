//! Parsed HTML documents.
//!
//! [`Document::parse`] runs html5ever over the input and keeps the resulting
//! tree in an arena. [`NodeRef`] is the borrowed handle the rest of the crate
//! works with.
//!
//! ```
//! use htmltables::Document;
//!
//! let doc = Document::parse("<p>intro</p><table><tr><td>1</td></tr></table>");
//! let table = doc.first_table().expect("document has a table");
//! assert_eq!(table.name(), Some("table"));
//! assert_eq!(table.text_content(), "1");
//! ```

mod arena;
mod tree_sink;

pub use arena::{Attribute, Node, NodeArena, NodeData, NodeId};

use std::fmt;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use tracing::debug;

use crate::query::{Query, Selection};
use tree_sink::DocumentSink;

/// An immutable parsed HTML document.
pub struct Document {
    arena: NodeArena,
    /// Pre-order position of each node, indexed by `NodeId`.
    /// Detached nodes keep `u32::MAX`.
    positions: Vec<u32>,
}

impl Document {
    /// Parse HTML text.
    ///
    /// Never fails: malformed markup is recovered the way browsers do it.
    /// Fragments are wrapped in the implied `html`/`body` elements.
    pub fn parse(html: &str) -> Self {
        let arena = parse_document(DocumentSink::new(), ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
            .into_arena();

        let mut positions = vec![u32::MAX; arena.len()];
        for (position, id) in arena.descendants(arena.document()).enumerate() {
            positions[id.index()] = position as u32;
        }

        debug!(input_len = html.len(), nodes = arena.len(), "parsed html document");
        Self { arena, positions }
    }

    /// The document node.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.arena.document())
    }

    /// Every `table` element, in document order.
    pub fn tables(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.arena
            .descendants(self.arena.document())
            .filter(|&id| {
                self.arena
                    .element_name(id)
                    .is_some_and(|name| &**name == "table")
            })
            .map(|id| NodeRef::new(self, id))
    }

    /// The first `table` element in document order, if any.
    pub fn first_table(&self) -> Option<NodeRef<'_>> {
        self.tables().next()
    }

    /// Evaluate `query` with the document node as context.
    pub fn select(&self, query: &Query) -> Selection<'_> {
        self.root().select(query)
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Number of nodes, the document node included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order position of `id`, used to sort query results.
    pub(crate) fn position(&self, id: NodeId) -> u32 {
        self.positions.get(id.index()).copied().unwrap_or(u32::MAX)
    }

    pub(crate) fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, id)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.len())
            .finish()
    }
}

/// Borrowed handle to a node in a [`Document`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Local name for elements, `None` for every other node kind.
    pub fn name(&self) -> Option<&'a str> {
        self.doc.arena.element_name(self.id).map(|n| &**n)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.doc.arena.get_attr(self.id, name)
    }

    pub fn is_element(&self) -> bool {
        self.doc.arena.is_element(self.id)
    }

    pub fn is_text(&self) -> bool {
        self.doc
            .arena
            .get(self.id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// String value: the node's own text for text and comment nodes,
    /// all descendant text concatenated otherwise.
    pub fn text_content(&self) -> String {
        self.doc.arena.text_content(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let parent = self.doc.arena.get(self.id)?.parent;
        parent.is_some().then(|| NodeRef::new(self.doc, parent))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        doc.arena
            .children(self.id)
            .map(move |id| NodeRef::new(doc, id))
    }

    /// Evaluate `query` with this node as context.
    pub fn select(&self, query: &Query) -> Selection<'a> {
        query.select(self.doc, self.id)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}
