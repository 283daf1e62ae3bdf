//! Tree-walking evaluator: applies a compiled [`Expr`] to an [`XmlTree`].

use crate::xml::{NodeRef, XmlTree};

use super::ast::{Axis, CompareOp, Expr, NodeTest, Step};
use super::value::XPathValue;

/// A matched node plus the location data the rule runner needs to report.
#[derive(Debug, Clone)]
pub struct Hit {
    pub node: NodeRef,
    pub line_number: u32,
    pub computed_xpath: String,
    pub element_id: Option<String>,
}

/// `position()`/`last()` context for the candidate currently being tested by
/// a predicate. Outside any predicate (the implicit context of the overall
/// expression) both are `1`, matching XPath 1.0's rule that the initial
/// context node-set is a singleton.
#[derive(Debug, Clone, Copy)]
struct PosCtx {
    position: usize,
    size: usize,
}

impl PosCtx {
    const ROOT: PosCtx = PosCtx { position: 1, size: 1 };
}

/// Evaluates `expr` against `tree`, returning the matched nodes in document
/// order when the expression is a node-set, or a synthetic single hit rooted
/// at the document when the expression is a plain boolean/number/string
/// assertion (so `count(//Line) > 0` can still be reported against the root).
pub fn evaluate(tree: &XmlTree, expr: &Expr) -> Vec<Hit> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };
    let value = eval_expr(tree, expr, root, PosCtx::ROOT);
    match value {
        XPathValue::NodeSet(nodes) => nodes.into_iter().map(|n| make_hit(tree, n)).collect(),
        other => {
            if other.to_bool() {
                vec![make_hit(tree, root)]
            } else {
                Vec::new()
            }
        }
    }
}

fn make_hit(tree: &XmlTree, node: NodeRef) -> Hit {
    let element = tree.get(node);
    Hit {
        node,
        line_number: element.map(|e| e.line_number).unwrap_or(0),
        computed_xpath: tree.computed_xpath(node),
        element_id: element.and_then(|e| e.attr("id")).map(str::to_owned),
    }
}

fn eval_expr(tree: &XmlTree, expr: &Expr, context: NodeRef, pos: PosCtx) -> XPathValue {
    match expr {
        Expr::Path { absolute, steps } => {
            let start: Vec<NodeRef> = if *absolute {
                tree.root().into_iter().collect()
            } else {
                vec![context]
            };
            let result = steps
                .iter()
                .fold(start, |nodes, step| apply_step(tree, step, &nodes));
            XPathValue::NodeSet(dedup_preserve_order(result))
        }
        Expr::Union(a, b) => {
            let av = eval_expr(tree, a, context, pos);
            let bv = eval_expr(tree, b, context, pos);
            match (av, bv) {
                (XPathValue::NodeSet(mut x), XPathValue::NodeSet(y)) => {
                    x.extend(y);
                    XPathValue::NodeSet(dedup_preserve_order(x))
                }
                (x, _) => x,
            }
        }
        Expr::And(a, b) => XPathValue::Boolean(
            eval_expr(tree, a, context, pos).to_bool() && eval_expr(tree, b, context, pos).to_bool(),
        ),
        Expr::Or(a, b) => XPathValue::Boolean(
            eval_expr(tree, a, context, pos).to_bool() || eval_expr(tree, b, context, pos).to_bool(),
        ),
        Expr::Not(inner) => XPathValue::Boolean(!eval_expr(tree, inner, context, pos).to_bool()),
        Expr::Compare(a, op, b) => eval_compare(tree, a, *op, b, context, pos),
        Expr::Call(name, args) => eval_call(tree, name, args, context, pos),
        Expr::StringLiteral(s) => XPathValue::String(s.clone()),
        Expr::NumberLiteral(n) => XPathValue::Number(*n),
        Expr::ContextItem => XPathValue::NodeSet(vec![context]),
    }
}

fn eval_compare(tree: &XmlTree, a: &Expr, op: CompareOp, b: &Expr, context: NodeRef, pos: PosCtx) -> XPathValue {
    let av = eval_expr(tree, a, context, pos);
    let bv = eval_expr(tree, b, context, pos);
    let result = match op {
        CompareOp::Eq => values_equal(tree, &av, &bv),
        CompareOp::Ne => !values_equal(tree, &av, &bv),
        CompareOp::Lt => value_to_number(tree, &av) < value_to_number(tree, &bv),
        CompareOp::Le => value_to_number(tree, &av) <= value_to_number(tree, &bv),
        CompareOp::Gt => value_to_number(tree, &av) > value_to_number(tree, &bv),
        CompareOp::Ge => value_to_number(tree, &av) >= value_to_number(tree, &bv),
    };
    XPathValue::Boolean(result)
}

/// XPath 1.0 string coercion, tree-aware: a node-set's string-value is the
/// string-value of its first node in document order, not an empty string —
/// [`XPathValue::to_string_value`] cannot do this itself since it has no
/// access to the tree.
fn value_to_string(tree: &XmlTree, value: &XPathValue) -> String {
    match value {
        XPathValue::NodeSet(nodes) => nodes
            .first()
            .map(|&n| string_value_of(tree, n))
            .unwrap_or_default(),
        other => other.to_string_value(),
    }
}

/// XPath 1.0 number coercion, tree-aware (see [`value_to_string`]).
fn value_to_number(tree: &XmlTree, value: &XPathValue) -> f64 {
    match value {
        XPathValue::NodeSet(_) => value_to_string(tree, value)
            .trim()
            .parse::<f64>()
            .unwrap_or(f64::NAN),
        other => other.to_number(),
    }
}

/// XPath 1.0 equality: when either side is a node-set, compare the
/// string-values of each member against the other side; otherwise coerce to
/// a common type (number if either side is numeric, else string/boolean).
fn values_equal(tree: &XmlTree, a: &XPathValue, b: &XPathValue) -> bool {
    match (a, b) {
        (XPathValue::NodeSet(nodes), other) | (other, XPathValue::NodeSet(nodes)) => nodes
            .iter()
            .any(|n| string_value_of(tree, *n) == other.to_string_value()),
        (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => a.to_bool() == b.to_bool(),
        (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => a.to_number() == b.to_number(),
        _ => a.to_string_value() == b.to_string_value(),
    }
}

fn string_value_of(tree: &XmlTree, node: NodeRef) -> String {
    let Some(element) = tree.get(node) else {
        return String::new();
    };
    if !element.text.is_empty() {
        return element.text.clone();
    }
    // Attribute-shaped nodes are represented by value in the attribute name
    // lookup path (see apply_step Attribute axis), so plain element nodes
    // concatenate descendant text when they have no direct text.
    let descendants = tree.descendants(node);
    let mut combined = String::new();
    for d in descendants {
        if let Some(e) = tree.get(d) {
            if !e.text.is_empty() {
                if !combined.is_empty() {
                    combined.push(' ');
                }
                combined.push_str(&e.text);
            }
        }
    }
    combined
}

fn eval_call(tree: &XmlTree, name: &str, args: &[Expr], context: NodeRef, pos: PosCtx) -> XPathValue {
    match name {
        "not" => XPathValue::Boolean(!arg_bool(tree, args, 0, context, pos)),
        "boolean" => XPathValue::Boolean(arg_bool(tree, args, 0, context, pos)),
        "string" => XPathValue::String(value_to_string(tree, &arg_value(tree, args, 0, context, pos))),
        "number" => XPathValue::Number(value_to_number(tree, &arg_value(tree, args, 0, context, pos))),
        "normalize-space" => {
            let s = if args.is_empty() {
                string_value_of(tree, context)
            } else {
                value_to_string(tree, &arg_value(tree, args, 0, context, pos))
            };
            XPathValue::String(s.split_whitespace().collect::<Vec<_>>().join(" "))
        }
        "contains" => {
            let haystack = value_to_string(tree, &arg_value(tree, args, 0, context, pos));
            let needle = value_to_string(tree, &arg_value(tree, args, 1, context, pos));
            XPathValue::Boolean(haystack.contains(&needle))
        }
        "starts-with" => {
            let s = value_to_string(tree, &arg_value(tree, args, 0, context, pos));
            let prefix = value_to_string(tree, &arg_value(tree, args, 1, context, pos));
            XPathValue::Boolean(s.starts_with(&prefix))
        }
        "string-length" => {
            let s = if args.is_empty() {
                string_value_of(tree, context)
            } else {
                value_to_string(tree, &arg_value(tree, args, 0, context, pos))
            };
            XPathValue::Number(s.chars().count() as f64)
        }
        "count" => match arg_value(tree, args, 0, context, pos) {
            XPathValue::NodeSet(nodes) => XPathValue::Number(nodes.len() as f64),
            _ => XPathValue::Number(0.0),
        },
        "position" => XPathValue::Number(pos.position as f64),
        "last" => XPathValue::Number(pos.size as f64),
        "local-name" | "name" => {
            let node = if args.is_empty() {
                Some(context)
            } else if let XPathValue::NodeSet(nodes) = arg_value(tree, args, 0, context, pos) {
                nodes.first().copied()
            } else {
                None
            };
            let name = node
                .and_then(|n| tree.get(n))
                .map(|e| e.local_name.clone())
                .unwrap_or_default();
            XPathValue::String(name)
        }
        "concat" => {
            let mut out = String::new();
            for i in 0..args.len() {
                out.push_str(&value_to_string(tree, &arg_value(tree, args, i, context, pos)));
            }
            XPathValue::String(out)
        }
        "substring-before" => {
            let s = value_to_string(tree, &arg_value(tree, args, 0, context, pos));
            let sep = value_to_string(tree, &arg_value(tree, args, 1, context, pos));
            XPathValue::String(s.split(&sep).next().unwrap_or("").to_owned())
        }
        "substring-after" => {
            let s = value_to_string(tree, &arg_value(tree, args, 0, context, pos));
            let sep = value_to_string(tree, &arg_value(tree, args, 1, context, pos));
            XPathValue::String(
                s.split_once(&sep)
                    .map(|(_, after)| after.to_owned())
                    .unwrap_or_default(),
            )
        }
        "substring" => {
            let s = value_to_string(tree, &arg_value(tree, args, 0, context, pos));
            let start = value_to_number(tree, &arg_value(tree, args, 1, context, pos));
            let chars: Vec<char> = s.chars().collect();
            let start_idx = (start.max(1.0) as usize).saturating_sub(1);
            let len = args
                .get(2)
                .map(|_| value_to_number(tree, &arg_value(tree, args, 2, context, pos)) as usize)
                .unwrap_or(chars.len());
            let end_idx = (start_idx + len).min(chars.len());
            XPathValue::String(chars.get(start_idx..end_idx).map(|s| s.iter().collect()).unwrap_or_default())
        }
        _ => XPathValue::Boolean(false),
    }
}

fn arg_value(tree: &XmlTree, args: &[Expr], idx: usize, context: NodeRef, pos: PosCtx) -> XPathValue {
    args.get(idx)
        .map(|e| eval_expr(tree, e, context, pos))
        .unwrap_or(XPathValue::Boolean(false))
}

fn arg_bool(tree: &XmlTree, args: &[Expr], idx: usize, context: NodeRef, pos: PosCtx) -> bool {
    if args.is_empty() {
        return true;
    }
    arg_value(tree, args, idx, context, pos).to_bool()
}

/// Applies one location-path step: axis traversal, node test, then each
/// predicate in turn. Each predicate sees `position()`/`last()` relative to
/// the candidate set it is filtering, per XPath 1.0, and a predicate whose
/// value is a bare number is a positional shorthand (`[1]` means
/// `[position()=1]`), not a truthiness test.
fn apply_step(tree: &XmlTree, step: &Step, input: &[NodeRef]) -> Vec<NodeRef> {
    let mut candidates = Vec::new();
    for &node in input {
        candidates.extend(axis_candidates(tree, step.axis, node));
    }
    candidates = candidates
        .into_iter()
        .filter(|&n| node_test_matches(tree, step.axis, &step.test, n))
        .collect();
    for predicate in &step.predicates {
        let size = candidates.len();
        candidates = candidates
            .into_iter()
            .enumerate()
            .filter(|&(idx, n)| {
                let pos = PosCtx { position: idx + 1, size };
                match eval_expr(tree, predicate, n, pos) {
                    XPathValue::Number(value) => value == pos.position as f64,
                    other => other.to_bool(),
                }
            })
            .map(|(_, n)| n)
            .collect();
    }
    candidates
}

fn axis_candidates(tree: &XmlTree, axis: Axis, node: NodeRef) -> Vec<NodeRef> {
    match axis {
        Axis::Child => tree.children(node).to_vec(),
        Axis::Descendant => tree.descendants(node),
        Axis::SelfAxis => vec![node],
        Axis::Attribute => tree.attr_nodes(node).to_vec(),
        Axis::FollowingSibling => following_siblings(tree, node),
        Axis::PrecedingSibling => preceding_siblings(tree, node),
        Axis::Parent => tree.parent(node).into_iter().collect(),
        Axis::Ancestor => tree.ancestors(node),
    }
}

fn following_siblings(tree: &XmlTree, node: NodeRef) -> Vec<NodeRef> {
    let siblings = tree.siblings(node);
    match siblings.iter().position(|&n| n == node) {
        Some(idx) => siblings[idx + 1..].to_vec(),
        None => Vec::new(),
    }
}

fn preceding_siblings(tree: &XmlTree, node: NodeRef) -> Vec<NodeRef> {
    let siblings = tree.siblings(node);
    match siblings.iter().position(|&n| n == node) {
        Some(idx) => siblings[..idx].to_vec(),
        None => Vec::new(),
    }
}

fn node_test_matches(tree: &XmlTree, axis: Axis, test: &NodeTest, node: NodeRef) -> bool {
    if axis == Axis::Attribute {
        // `node` is already an attribute pseudo-node (see `XmlTree::attr_nodes`),
        // whose `local_name` is the attribute's name — matched the same way
        // an element node test matches an element's local name.
        return match test {
            NodeTest::Wildcard => true,
            NodeTest::Name(attr_name) => tree.get(node).is_some_and(|e| &e.local_name == attr_name),
            NodeTest::Text => false,
        };
    }
    match test {
        NodeTest::Wildcard => true,
        NodeTest::Text => tree.get(node).is_some_and(|e| !e.text.is_empty()),
        NodeTest::Name(name) => tree.get(node).is_some_and(|e| &e.local_name == name),
    }
}

fn dedup_preserve_order(nodes: Vec<NodeRef>) -> Vec<NodeRef> {
    let mut seen = std::collections::HashSet::new();
    nodes.into_iter().filter(|n| seen.insert(*n)).collect()
}
