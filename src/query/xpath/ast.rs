//! Syntax tree for the supported XPath subset.

/// Union of one or more location paths (`a | b`).
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub paths: Vec<LocationPath>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// Starts at the document node instead of the context node.
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Attribute,
}

impl Axis {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "self" => Self::SelfAxis,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "attribute" => Self::Attribute,
            _ => return None,
        })
    }

    /// Reverse axes number their nodes nearest-first.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Self::Parent | Self::Ancestor | Self::AncestorOrSelf | Self::PrecedingSibling
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Local name of an element, or of an attribute on the attribute axis.
    Name(String),
    /// `*`
    Any,
    /// `text()`
    Text,
    /// `node()`
    Node,
    /// `comment()`
    Comment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `[n]`, 1-based.
    Position(usize),
    /// `[last()]`
    Last,
    /// `[path]`: the path selects something.
    Exists(Expr),
    /// `[path = 'lit']` or `[path != 'lit']`.
    Compare {
        expr: Expr,
        literal: String,
        equal: bool,
    },
    /// `[not(...)]`
    Not(Box<Predicate>),
}

impl Expr {
    pub fn union(paths: Vec<LocationPath>) -> Self {
        Self { paths }
    }

    /// True when no branch can produce an element or document node.
    pub fn selects_values(&self) -> bool {
        self.paths.iter().all(LocationPath::selects_values)
    }
}

impl From<LocationPath> for Expr {
    fn from(path: LocationPath) -> Self {
        Self { paths: vec![path] }
    }
}

impl LocationPath {
    pub fn relative(steps: Vec<Step>) -> Self {
        Self {
            absolute: false,
            steps,
        }
    }

    fn selects_values(&self) -> bool {
        self.steps.last().is_some_and(|step| {
            step.axis == Axis::Attribute || matches!(step.test, NodeTest::Text | NodeTest::Comment)
        })
    }
}

impl Step {
    pub fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    pub fn child(name: &str) -> Self {
        Self::new(Axis::Child, NodeTest::Name(name.to_string()))
    }

    pub fn text() -> Self {
        Self::new(Axis::Child, NodeTest::Text)
    }

    /// The step `//` abbreviates.
    pub(crate) fn descendant_or_self() -> Self {
        Self::new(Axis::DescendantOrSelf, NodeTest::Node)
    }
}
