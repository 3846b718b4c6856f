//! html5ever `TreeSink` that builds a [`NodeArena`].

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName};
use tracing::trace;

use super::arena::{Attribute, NodeArena, NodeData, NodeId};

/// Node handle handed to the tree builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle(pub NodeId);

/// Tree builder target.
///
/// html5ever drives the sink through `&self`, so the arena sits behind a
/// `RefCell`.
pub struct DocumentSink {
    arena: RefCell<NodeArena>,
}

impl Default for DocumentSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSink {
    pub fn new() -> Self {
        Self {
            arena: RefCell::new(NodeArena::new()),
        }
    }

    pub fn into_arena(self) -> NodeArena {
        self.arena.into_inner()
    }

    fn insert(&self, parent: NodeId, child: NodeOrText<Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => arena.append(parent, node.0),
            NodeOrText::AppendText(text) => arena.append_text(parent, &text),
        }
    }
}

impl TreeSink for DocumentSink {
    type Handle = Handle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        // Recovery is html5ever's job; the message is only of diagnostic interest.
        trace!(%msg, "html parse error");
    }

    fn get_document(&self) -> Self::Handle {
        Handle(self.arena.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let arena = self.arena.borrow();
        match arena.get(target.0).map(|n| &n.data) {
            Some(NodeData::Element { name, .. }) => {
                // SAFETY: element names are never mutated or removed while the
                // sink is alive, but a push into the node vector may move them.
                // html5ever uses or clones the returned name before it calls
                // back into the sink, so the reference is never read after a
                // push.
                unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
            }
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| Attribute {
                name: a.name,
                value: a.value.to_string(),
            })
            .collect();

        Handle(self.arena.borrow_mut().create_element(name, attrs))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Handle(self.arena.borrow_mut().create_comment(text.to_string()))
    }

    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> Self::Handle {
        Handle(self.arena.borrow_mut().create_comment(data.to_string()))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.insert(parent.0, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self
            .arena
            .borrow()
            .get(element.0)
            .map(|n| n.parent)
            .unwrap_or(NodeId::NONE);

        if parent.is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.insert(prev_element.0, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut arena = self.arena.borrow_mut();
        let doc = arena.document();
        let doctype = arena.create_doctype(name.to_string());
        arena.append(doc, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents stay inline under the template element.
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.0 == y.0
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        trace!(?mode, "quirks mode");
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => arena.insert_before(sibling.0, node.0),
            NodeOrText::AppendText(text) => {
                let prev = arena
                    .get(sibling.0)
                    .map(|n| n.prev_sibling)
                    .unwrap_or(NodeId::NONE);
                if let Some(node) = arena.get_mut(prev)
                    && let NodeData::Text(existing) = &mut node.data
                {
                    existing.push_str(&text);
                    return;
                }
                let text_node = arena.create_text(text.to_string());
                arena.insert_before(sibling.0, text_node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let Some(node) = arena.get_mut(target.0)
            && let NodeData::Element {
                attrs: existing, ..
            } = &mut node.data
        {
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(Attribute {
                        name: attr.name,
                        value: attr.value.to_string(),
                    });
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.arena.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<_> = arena.children(node.0).collect();
        for child in children {
            arena.detach(child);
            arena.append(new_parent.0, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use html5ever::driver::ParseOpts;
    use html5ever::parse_document;
    use html5ever::tendril::TendrilSink;

    use super::*;

    fn parse_html(html: &str) -> NodeArena {
        parse_document(DocumentSink::new(), ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
            .into_arena()
    }

    fn find_tag(arena: &NodeArena, tag: &str) -> Option<NodeId> {
        arena
            .descendants(arena.document())
            .find(|&id| arena.element_name(id).is_some_and(|n| &**n == tag))
    }

    #[test]
    fn test_implied_tbody() {
        let arena = parse_html("<table><tr><td>A</td></tr></table>");

        let tbody = find_tag(&arena, "tbody").expect("tbody is implied");
        let tr = arena.children(tbody).next().expect("tbody has a row");
        assert_eq!(&**arena.element_name(tr).unwrap(), "tr");
    }

    #[test]
    fn test_cell_text() {
        let arena = parse_html("<table><tr><td>Hello</td></tr></table>");

        let td = find_tag(&arena, "td").expect("should find td");
        let text = arena.children(td).next().expect("td has text");
        assert_eq!(arena.character_data(text), Some("Hello"));
    }

    #[test]
    fn test_foster_parented_text_precedes_table() {
        let arena = parse_html("<body><table>stray<tr><td>x</td></tr></table></body>");

        let body = find_tag(&arena, "body").unwrap();
        let table = find_tag(&arena, "table").unwrap();
        let first = arena.children(body).next().unwrap();

        assert_eq!(arena.character_data(first), Some("stray"));
        assert_eq!(arena.get(first).unwrap().next_sibling, table);
    }

    #[test]
    fn test_attributes_kept() {
        let arena = parse_html(r#"<table id="scores" class="wide striped"></table>"#);

        let table = find_tag(&arena, "table").unwrap();
        assert_eq!(arena.element_id(table), Some("scores"));
        assert_eq!(arena.element_classes(table), ["wide", "striped"]);
    }
}
