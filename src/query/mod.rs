//! Compiled queries and the node capability they run against.
//!
//! A [`Query`] is compiled once and evaluated fresh against every context
//! node. Two languages are understood:
//!
//! - XPath (the default): `tbody/tr`, `td | th`, `text()`, `@href`, ...
//! - CSS selectors, written with a `css:` prefix: `css:tr.data > td`.
//!
//! ```
//! use htmltables::{Document, Item, Query};
//!
//! let doc = Document::parse("<table><tr><td>a</td><td>b</td></tr></table>");
//! let cells = Query::parse("//td/text()")?;
//! let values: Vec<_> = doc.select(&cells).filter_map(Item::into_value).collect();
//! assert_eq!(values, ["a", "b"]);
//! # Ok::<(), htmltables::Error>(())
//! ```

mod css;
pub(crate) mod xpath;

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::dom::{Document, NodeData, NodeId, NodeRef};
use crate::error::Result;
use css::SelectorSet;

/// Prefix selecting the CSS query language in [`Query::parse`].
pub const CSS_PREFIX: &str = "css:";

/// A node or a scalar produced by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item<N, V> {
    /// Element or document node.
    Node(N),
    /// Text node content, comment content or attribute value.
    Value(V),
}

impl<N, V> Item<N, V> {
    pub fn into_node(self) -> Option<N> {
        match self {
            Item::Node(node) => Some(node),
            Item::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Item::Node(_) => None,
            Item::Value(value) => Some(value),
        }
    }

    pub fn as_node(&self) -> Option<&N> {
        match self {
            Item::Node(node) => Some(node),
            Item::Value(_) => None,
        }
    }

}

impl<N: TreeNode> Item<N, N::Value> {
    /// String value of the item: the value itself, or the node's text content.
    pub fn text(&self) -> String {
        match self {
            Item::Node(node) => node.text_content(),
            Item::Value(value) => value.as_ref().to_string(),
        }
    }
}

/// The query capability the table extractor needs from a parsed tree.
///
/// Implemented by [`NodeRef`]; other tree implementations can plug into
/// [`crate::parse_table`] by implementing it.
pub trait TreeNode: Clone {
    /// Scalar results (text, attribute values).
    type Value: AsRef<str>;
    /// Compiled query expression.
    type Query;
    /// Lazy sequence of query results, in document order.
    type Selection: Iterator<Item = Item<Self, Self::Value>>;

    /// Evaluate `query` relative to this node.
    fn select(&self, query: &Self::Query) -> Self::Selection;

    /// Concatenated descendant text.
    fn text_content(&self) -> String;
}

impl<'a> TreeNode for NodeRef<'a> {
    type Value = &'a str;
    type Query = Query;
    type Selection = Selection<'a>;

    fn select(&self, query: &Query) -> Selection<'a> {
        NodeRef::select(self, query)
    }

    fn text_content(&self) -> String {
        NodeRef::text_content(self)
    }
}

/// A compiled query expression.
#[derive(Debug, Clone)]
pub struct Query {
    source: String,
    kind: QueryKind,
}

#[derive(Debug, Clone)]
enum QueryKind {
    XPath(xpath::Expr),
    Css(SelectorSet),
}

impl Query {
    /// Compile `expr`: CSS when it starts with `css:`, XPath otherwise.
    pub fn parse(expr: &str) -> Result<Self> {
        match expr.strip_prefix(CSS_PREFIX) {
            Some(selector) => Self::css(selector),
            None => Self::xpath(expr),
        }
    }

    pub fn xpath(expr: &str) -> Result<Self> {
        let parsed = xpath::parse(expr)?;
        trace!(expr, "compiled xpath query");
        Ok(Self::from_xpath(expr, parsed))
    }

    pub fn css(selector: &str) -> Result<Self> {
        let parsed = SelectorSet::parse(selector)?;
        trace!(selector, "compiled css query");
        Ok(Self {
            source: format!("{CSS_PREFIX}{selector}"),
            kind: QueryKind::Css(parsed),
        })
    }

    pub(crate) fn from_xpath(source: &str, expr: xpath::Expr) -> Self {
        Self {
            source: source.to_string(),
            kind: QueryKind::XPath(expr),
        }
    }

    /// Source text, with the `css:` prefix for CSS queries.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_css(&self) -> bool {
        matches!(self.kind, QueryKind::Css(_))
    }

    /// True when the query can only produce scalars, never nodes.
    pub fn selects_values(&self) -> bool {
        match &self.kind {
            QueryKind::XPath(expr) => expr.selects_values(),
            QueryKind::Css(_) => false,
        }
    }

    pub(crate) fn select<'a>(&self, doc: &'a Document, context: NodeId) -> Selection<'a> {
        let hits = match &self.kind {
            QueryKind::XPath(expr) => xpath::evaluate(doc, Hit::Node(context), expr),
            QueryKind::Css(selectors) => selectors.select(doc, context),
        };
        Selection {
            doc,
            hits: hits.into_iter(),
        }
    }
}

impl FromStr for Query {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A raw query result: a node, or an attribute by owner and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hit {
    Node(NodeId),
    Attr(NodeId, u32),
}

impl Hit {
    fn order_key(self, doc: &Document) -> (u32, u32, u32) {
        match self {
            Hit::Node(id) => (doc.position(id), 0, id.0),
            Hit::Attr(owner, index) => (doc.position(owner), index + 1, owner.0),
        }
    }
}

/// Sort into document order and drop duplicates.
pub(crate) fn sort_document_order(doc: &Document, hits: &mut Vec<Hit>) {
    hits.sort_by_key(|hit| hit.order_key(doc));
    hits.dedup();
}

/// Lazy view of a query result.
///
/// Element and document nodes come out as [`Item::Node`]; text, comments and
/// attributes as [`Item::Value`] borrowing from the document.
#[derive(Debug)]
pub struct Selection<'a> {
    doc: &'a Document,
    hits: std::vec::IntoIter<Hit>,
}

impl<'a> Selection<'a> {
    fn resolve(&self, hit: Hit) -> Option<Item<NodeRef<'a>, &'a str>> {
        let arena = self.doc.arena();
        match hit {
            Hit::Node(id) => match &arena.get(id)?.data {
                NodeData::Document | NodeData::Element { .. } => Some(Item::Node(self.doc.node(id))),
                NodeData::Text(_) | NodeData::Comment(_) => arena.character_data(id).map(Item::Value),
                NodeData::Doctype(_) => None,
            },
            Hit::Attr(owner, index) => arena
                .attrs(owner)
                .get(index as usize)
                .map(|attr| Item::Value(attr.value.as_str())),
        }
    }
}

impl<'a> Iterator for Selection<'a> {
    type Item = Item<NodeRef<'a>, &'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let hit = self.hits.next()?;
            if let Some(item) = self.resolve(hit) {
                return Some(item);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.hits.size_hint().1)
    }
}
