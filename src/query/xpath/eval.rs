//! Evaluation of parsed XPath expressions against a [`Document`].

use super::ast::{Axis, Expr, LocationPath, NodeTest, Predicate, Step};
use crate::dom::{Document, NodeData, NodeId};
use crate::query::{Hit, sort_document_order};

/// Evaluate `expr` with `context` as the context node.
///
/// The result is in document order without duplicates.
pub(crate) fn evaluate(doc: &Document, context: Hit, expr: &Expr) -> Vec<Hit> {
    let mut hits = Vec::new();
    for path in &expr.paths {
        hits.extend(evaluate_path(doc, context, path));
    }
    if expr.paths.len() > 1 {
        sort_document_order(doc, &mut hits);
    }
    hits
}

fn evaluate_path(doc: &Document, context: Hit, path: &LocationPath) -> Vec<Hit> {
    let start = if path.absolute {
        Hit::Node(doc.arena().document())
    } else {
        context
    };

    let mut current = vec![start];
    for step in &path.steps {
        let mut next = Vec::new();
        for &hit in &current {
            next.extend(evaluate_step(doc, hit, step));
        }
        if current.len() > 1 || step.axis.is_reverse() {
            sort_document_order(doc, &mut next);
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current
}

fn evaluate_step(doc: &Document, context: Hit, step: &Step) -> Vec<Hit> {
    let mut candidates: Vec<Hit> = axis(doc, context, step.axis)
        .into_iter()
        .filter(|&hit| matches_test(doc, hit, step.axis, &step.test))
        .collect();

    for predicate in &step.predicates {
        let size = candidates.len();
        candidates = candidates
            .into_iter()
            .enumerate()
            .filter(|&(i, hit)| matches_predicate(doc, hit, i + 1, size, predicate))
            .map(|(_, hit)| hit)
            .collect();
    }

    candidates
}

/// Nodes on `axis` from `context`, nearest first.
fn axis(doc: &Document, context: Hit, axis: Axis) -> Vec<Hit> {
    let arena = doc.arena();

    let id = match (context, axis) {
        (Hit::Node(id), _) => id,
        (Hit::Attr(..), Axis::SelfAxis | Axis::DescendantOrSelf) => return vec![context],
        (Hit::Attr(owner, _), Axis::Parent) => return vec![Hit::Node(owner)],
        (Hit::Attr(owner, _), Axis::Ancestor) => {
            return std::iter::once(owner)
                .chain(ancestors(doc, owner))
                .map(Hit::Node)
                .collect();
        }
        (Hit::Attr(owner, _), Axis::AncestorOrSelf) => {
            return std::iter::once(context)
                .chain(std::iter::once(owner).chain(ancestors(doc, owner)).map(Hit::Node))
                .collect();
        }
        (Hit::Attr(..), _) => return Vec::new(),
    };

    match axis {
        Axis::Child => arena.children(id).map(Hit::Node).collect(),
        Axis::Descendant => arena.descendants(id).skip(1).map(Hit::Node).collect(),
        Axis::DescendantOrSelf => arena.descendants(id).map(Hit::Node).collect(),
        Axis::SelfAxis => vec![context],
        Axis::Parent => ancestors(doc, id).take(1).map(Hit::Node).collect(),
        Axis::Ancestor => ancestors(doc, id).map(Hit::Node).collect(),
        Axis::AncestorOrSelf => std::iter::once(id)
            .chain(ancestors(doc, id))
            .map(Hit::Node)
            .collect(),
        Axis::FollowingSibling => siblings(doc, id, |n| n.next_sibling),
        Axis::PrecedingSibling => siblings(doc, id, |n| n.prev_sibling),
        Axis::Attribute => (0..arena.attrs(id).len() as u32)
            .map(|i| Hit::Attr(id, i))
            .collect(),
    }
}

fn ancestors(doc: &Document, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    let arena = doc.arena();
    std::iter::successors(arena.get(id).map(|n| n.parent), move |&p| {
        arena.get(p).map(|n| n.parent)
    })
    .take_while(NodeId::is_some)
}

fn siblings(doc: &Document, id: NodeId, link: fn(&crate::dom::Node) -> NodeId) -> Vec<Hit> {
    let arena = doc.arena();
    std::iter::successors(arena.get(id).map(link), |&s| arena.get(s).map(link))
        .take_while(NodeId::is_some)
        .map(Hit::Node)
        .collect()
}

fn matches_test(doc: &Document, hit: Hit, axis: Axis, test: &NodeTest) -> bool {
    let on_attribute_axis = axis == Axis::Attribute;

    match hit {
        Hit::Attr(owner, index) => match test {
            NodeTest::Node => true,
            NodeTest::Any => on_attribute_axis,
            NodeTest::Name(name) => {
                on_attribute_axis
                    && doc
                        .arena()
                        .attrs(owner)
                        .get(index as usize)
                        .is_some_and(|a| &*a.name.local == name.as_str())
            }
            NodeTest::Text | NodeTest::Comment => false,
        },
        Hit::Node(id) => {
            let Some(node) = doc.arena().get(id) else {
                return false;
            };
            match (&node.data, test) {
                (NodeData::Element { .. }, NodeTest::Any) => !on_attribute_axis,
                (NodeData::Element { name: qname, .. }, NodeTest::Name(name)) => {
                    !on_attribute_axis && &*qname.local == name.as_str()
                }
                (NodeData::Doctype(_), _) => false,
                (_, NodeTest::Node) => true,
                (NodeData::Text(_), NodeTest::Text) => true,
                (NodeData::Comment(_), NodeTest::Comment) => true,
                _ => false,
            }
        }
    }
}

fn matches_predicate(
    doc: &Document,
    hit: Hit,
    position: usize,
    size: usize,
    predicate: &Predicate,
) -> bool {
    match predicate {
        Predicate::Position(n) => position == *n,
        Predicate::Last => position == size,
        Predicate::Exists(expr) => !evaluate(doc, hit, expr).is_empty(),
        Predicate::Compare {
            expr,
            literal,
            equal,
        } => evaluate(doc, hit, expr)
            .into_iter()
            .any(|found| (string_value(doc, found) == *literal) == *equal),
        Predicate::Not(inner) => !matches_predicate(doc, hit, position, size, inner),
    }
}

fn string_value(doc: &Document, hit: Hit) -> String {
    match hit {
        Hit::Node(id) => doc.arena().text_content(id),
        Hit::Attr(owner, index) => doc
            .arena()
            .attrs(owner)
            .get(index as usize)
            .map(|a| a.value.clone())
            .unwrap_or_default(),
    }
}
