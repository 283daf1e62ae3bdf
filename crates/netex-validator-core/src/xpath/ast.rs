//! Abstract syntax for the supported XPath 1.0 subset.

/// A traversal axis, per `spec.md` §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    SelfAxis,
    Attribute,
    FollowingSibling,
    PrecedingSibling,
    Parent,
    Ancestor,
}

/// What a step matches against a candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Matches elements/attributes by local name.
    Name(String),
    /// `*` — matches anything of the appropriate kind for the axis.
    Wildcard,
    /// `text()` — matches the text content of the context node.
    Text,
}

/// One step of a location path: an axis, a node test, and zero or more
/// predicates that filter the axis's result.
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

/// A relational/equality comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// An XPath expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A location path: `steps` applied in sequence starting from either
    /// the document root (`absolute`) or the evaluation context node.
    Path { absolute: bool, steps: Vec<Step> },
    Union(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    /// Named function call, e.g. `contains(a, b)`, `count(//Line)`.
    Call(String, Vec<Expr>),
    StringLiteral(String),
    NumberLiteral(f64),
    /// The context node itself (`.`).
    ContextItem,
}
