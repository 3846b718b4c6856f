//! CSS selector queries on top of the `selectors` crate.
//!
//! A CSS query selects the element descendants of the context node that
//! match any selector in the list. Combinators may reach ancestors outside
//! the context node, as `Element.querySelectorAll` does in browsers.

use std::fmt;

use cssparser::{Parser, ParserInput, ToCss};
use html5ever::{LocalName, Namespace};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::ElementSelectorFlags;
use selectors::parser::{ParseRelative, Selector, SelectorList, SelectorParseErrorKind};
use selectors::{Element as _, OpaqueElement, SelectorImpl};

use super::Hit;
use crate::dom::{Document, NodeArena, NodeData, NodeId};
use crate::error::{Error, Result};

/// Selector implementation marker for the `selectors` crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSelectors;

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct IdentStr(pub String);

impl precomputed_hash::PrecomputedHash for IdentStr {
    fn precomputed_hash(&self) -> u32 {
        self.0
            .bytes()
            .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32))
    }
}

impl ToCss for IdentStr {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

impl From<String> for IdentStr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IdentStr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for IdentStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssLocalName(pub LocalName);

impl precomputed_hash::PrecomputedHash for CssLocalName {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl ToCss for CssLocalName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

impl From<String> for CssLocalName {
    fn from(s: String) -> Self {
        Self(LocalName::from(s))
    }
}

impl From<&str> for CssLocalName {
    fn from(s: &str) -> Self {
        Self(LocalName::from(s))
    }
}

impl AsRef<str> for CssLocalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssNamespace(pub Namespace);

impl precomputed_hash::PrecomputedHash for CssNamespace {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl ToCss for CssNamespace {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

impl From<String> for CssNamespace {
    fn from(s: String) -> Self {
        Self(Namespace::from(s))
    }
}

impl From<&str> for CssNamespace {
    fn from(s: &str) -> Self {
        Self(Namespace::from(s))
    }
}

/// No pseudo-elements are supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = TableSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        match *self {}
    }

    fn valid_after_slotted(&self) -> bool {
        match *self {}
    }
}

/// Dynamic pseudo-classes never match a static document, so none are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = TableSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl<'i> selectors::parser::Parser<'i> for TableSelectors {
    type Impl = TableSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

impl SelectorImpl for TableSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = IdentStr;
    type Identifier = IdentStr;
    type LocalName = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type NamespacePrefix = IdentStr;
    type BorrowedLocalName = CssLocalName;
    type BorrowedNamespaceUrl = CssNamespace;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// A compiled selector list.
#[derive(Debug, Clone)]
pub(crate) struct SelectorSet {
    selectors: Vec<Selector<TableSelectors>>,
}

impl SelectorSet {
    pub(crate) fn parse(expr: &str) -> Result<Self> {
        let mut input = ParserInput::new(expr);
        let mut parser = Parser::new(&mut input);
        let list = SelectorList::parse(&TableSelectors, &mut parser, ParseRelative::No).map_err(
            |e| Error::Selector {
                expr: expr.to_string(),
                reason: format!("{:?} at column {}", e.kind, e.location.column),
            },
        )?;

        Ok(Self {
            selectors: list.slice().to_vec(),
        })
    }

    /// Matching element descendants of `context`, in document order.
    pub(crate) fn select(&self, doc: &Document, context: NodeId) -> Vec<Hit> {
        let arena = doc.arena();
        let mut caches = SelectorCaches::default();
        let mut matching = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );
        // `:scope` is the context element; for the document it falls back to `:root`.
        if arena.is_element(context) {
            matching.scope_element = Some(CssElement::new(arena, context).opaque());
        }

        arena
            .descendants(context)
            .skip(1)
            .filter(|&id| {
                arena.is_element(id) && {
                    let element = CssElement::new(arena, id);
                    self.selectors.iter().any(|selector| {
                        selectors::matching::matches_selector(
                            selector,
                            0,
                            None,
                            &element,
                            &mut matching,
                        )
                    })
                }
            })
            .map(Hit::Node)
            .collect()
    }
}

/// Element view of an arena node for selector matching.
#[derive(Clone, Copy)]
pub struct CssElement<'a> {
    arena: &'a NodeArena,
    id: NodeId,
}

impl<'a> CssElement<'a> {
    fn new(arena: &'a NodeArena, id: NodeId) -> Self {
        Self { arena, id }
    }

    fn element(&self, id: NodeId) -> Option<Self> {
        self.arena.is_element(id).then(|| Self::new(self.arena, id))
    }

    fn sibling_element(&self, step: fn(&crate::dom::Node) -> NodeId) -> Option<Self> {
        let mut current = step(self.arena.get(self.id)?);
        while current.is_some() {
            if let Some(element) = self.element(current) {
                return Some(element);
            }
            current = step(self.arena.get(current)?);
        }
        None
    }
}

impl fmt::Debug for CssElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CssElement")
            .field("id", &self.id)
            .field("name", &self.arena.element_name(self.id))
            .finish()
    }
}

impl selectors::Element for CssElement<'_> {
    type Impl = TableSelectors;

    fn opaque(&self) -> OpaqueElement {
        // Identity must come from the arena slot, not from this short-lived
        // wrapper: selectors keys its nth-index cache by it.
        self.arena
            .get(self.id)
            .map_or_else(|| OpaqueElement::new(self.arena), OpaqueElement::new)
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.arena.get(self.id)?.parent;
        self.element(parent)
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_element(|n| n.prev_sibling)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_element(|n| n.next_sibling)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.arena
            .children(self.id)
            .find_map(|child| self.element(child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.arena.element_name(self.id) == Some(&name.0)
    }

    fn has_namespace(&self, ns: &CssNamespace) -> bool {
        matches!(
            self.arena.get(self.id).map(|n| &n.data),
            Some(NodeData::Element { name, .. }) if name.ns == ns.0
        )
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.arena.element_name(self.id) == other.arena.element_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssNamespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&IdentStr>,
    ) -> bool {
        self.arena.attrs(self.id).iter().any(|attr| {
            let ns_match = match ns {
                NamespaceConstraint::Any => true,
                NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
            };
            ns_match && attr.name.local == local_name.0 && operation.eval_str(&attr.value)
        })
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn is_link(&self) -> bool {
        self.arena
            .element_name(self.id)
            .is_some_and(|n| &**n == "a")
            && self.arena.get_attr(self.id, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.arena
            .element_id(self.id)
            .is_some_and(|own| case_sensitivity.eq(own.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.arena
            .element_classes(self.id)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &IdentStr) -> Option<IdentStr> {
        None
    }

    fn is_part(&self, _name: &IdentStr) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.arena
            .children(self.id)
            .all(|child| match self.arena.get(child).map(|n| &n.data) {
                Some(NodeData::Element { .. }) => false,
                Some(NodeData::Text(t)) => t.is_empty(),
                _ => true,
            })
    }

    fn is_root(&self) -> bool {
        self.arena
            .get(self.id)
            .and_then(|n| self.arena.get(n.parent))
            .is_some_and(|parent| matches!(parent.data, NodeData::Document))
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &IdentStr) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        <table id="t">
          <tr class="head"><th>Name</th><th>Qty</th></tr>
          <tr><td>Pens</td><td class="num">3</td></tr>
          <tr><td>Ink</td><td class="num"></td></tr>
        </table>"#;

    fn names(doc: &Document, hits: &[Hit]) -> Vec<String> {
        hits.iter()
            .map(|&hit| match hit {
                Hit::Node(id) => doc.arena().element_name(id).unwrap().to_string(),
                Hit::Attr(..) => panic!("css never selects attributes"),
            })
            .collect()
    }

    fn run(doc: &Document, context: NodeId, selector: &str) -> Vec<Hit> {
        SelectorSet::parse(selector).unwrap().select(doc, context)
    }

    #[test]
    fn test_type_and_list_selectors() {
        let doc = Document::parse(TABLE);
        let table = doc.first_table().unwrap().id();

        assert_eq!(run(&doc, table, "tr").len(), 3);
        // Selector lists keep document order, not list order.
        assert_eq!(
            names(&doc, &run(&doc, table, "td, th")),
            ["th", "th", "td", "td", "td", "td"]
        );
    }

    #[test]
    fn test_context_excluded() {
        let doc = Document::parse(TABLE);
        let table = doc.first_table().unwrap().id();
        assert!(run(&doc, table, "table").is_empty());
        assert_eq!(run(&doc, doc.root().id(), "table"), vec![Hit::Node(table)]);
    }

    #[test]
    fn test_class_attribute_and_structural() {
        let doc = Document::parse(TABLE);
        let table = doc.first_table().unwrap().id();

        assert_eq!(run(&doc, table, "td.num").len(), 2);
        assert_eq!(run(&doc, table, "tr:not(.head)").len(), 2);
        assert_eq!(run(&doc, table, "[class=num]:empty").len(), 1);
        assert_eq!(run(&doc, table, "tr > td:first-child").len(), 2);
    }

    #[test]
    fn test_combinator_reaches_outside_context() {
        let doc = Document::parse(TABLE);
        let table = doc.first_table().unwrap();
        let row = table.select(&crate::Query::parse("tbody/tr[2]").unwrap()).next();
        let Some(crate::Item::Node(row)) = row else {
            panic!("second row exists")
        };
        assert_eq!(run(&doc, row.id(), "#t td").len(), 2);
    }

    const GRID: &str = "<table>\
        <tr><td>0.0</td><td>0.1</td><td>0.2</td></tr>\
        <tr><td>1.0</td><td>1.1</td><td>1.2</td></tr>\
        <tr><td>2.0</td><td>2.1</td><td>2.2</td></tr>\
        <tr><td>3.0</td><td>3.1</td><td>3.2</td></tr>\
        </table>";

    fn texts(doc: &Document, hits: &[Hit]) -> Vec<String> {
        hits.iter()
            .map(|&hit| match hit {
                Hit::Node(id) => doc.arena().text_content(id),
                Hit::Attr(..) => panic!("css never selects attributes"),
            })
            .collect()
    }

    #[test]
    fn test_nth_child_across_rows() {
        let doc = Document::parse(GRID);
        let table = doc.first_table().unwrap().id();

        assert_eq!(
            texts(&doc, &run(&doc, table, "td:nth-child(2)")),
            ["0.1", "1.1", "2.1", "3.1"]
        );
        assert_eq!(
            texts(&doc, &run(&doc, table, "tr:nth-child(3) > td")),
            ["2.0", "2.1", "2.2"]
        );
        assert_eq!(
            texts(&doc, &run(&doc, table, "tr:nth-child(odd) > td:nth-child(1)")),
            ["0.0", "2.0"]
        );
    }

    #[test]
    fn test_nth_of_type_and_from_end() {
        let doc = Document::parse(GRID);
        let table = doc.first_table().unwrap().id();

        assert_eq!(
            texts(&doc, &run(&doc, table, "td:nth-of-type(3)")),
            ["0.2", "1.2", "2.2", "3.2"]
        );
        assert_eq!(
            texts(&doc, &run(&doc, table, "tr:nth-last-child(1) > td:nth-last-child(2)")),
            ["3.1"]
        );
        assert_eq!(
            texts(&doc, &run(&doc, table, "tr:last-child > td")),
            ["3.0", "3.1", "3.2"]
        );
        assert_eq!(run(&doc, table, "td:last-child").len(), 4);
    }

    #[test]
    fn test_scope_is_context_element() {
        let doc = Document::parse(
            "<table id=o><tr><td>outer<table id=i><tr><td>inner</td></tr></table></td></tr></table>",
        );
        let outer = doc.first_table().unwrap().id();

        assert_eq!(run(&doc, outer, "tr").len(), 2);
        let rows = run(&doc, outer, ":scope > tbody > tr");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            texts(&doc, &run(&doc, outer, ":scope > tbody > tr > td")),
            ["outerinner"]
        );

        let Hit::Node(row) = rows[0] else {
            panic!("row is a node")
        };
        assert_eq!(run(&doc, row, ":scope > td").len(), 1);
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            SelectorSet::parse("td >"),
            Err(Error::Selector { .. })
        ));
        assert!(matches!(SelectorSet::parse(""), Err(Error::Selector { .. })));
        assert!(matches!(
            SelectorSet::parse("td:hover"),
            Err(Error::Selector { .. })
        ));
    }
}
