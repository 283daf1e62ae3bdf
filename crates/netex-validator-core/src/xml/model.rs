//! Owned arena representation of a parsed XML document.
//!
//! Elements are addressed by index (`NodeRef`) rather than by pointer, which
//! keeps the tree free of self-referential borrows and makes parent/child/
//! sibling traversal (the axes the XPath evaluator needs) a simple index
//! lookup instead of a `Rc<RefCell<_>>` graph.

/// Index into [`XmlTree::elements`]. `0` is always the synthetic document
/// root; real elements start at `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub usize);

/// A single attribute, namespace-qualified name kept alongside the raw local
/// name because the evaluator matches by local name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub local_name: String,
    pub value: String,
}

/// One element (or the synthetic root) in the arena.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// Fully qualified tag as written (may carry a namespace prefix).
    pub name: String,
    /// Tag with any namespace prefix stripped.
    pub local_name: String,
    pub attributes: Vec<Attribute>,
    /// Concatenated text content of direct text children, not descendants.
    pub text: String,
    /// 1-based line number of the element's start tag.
    pub line_number: u32,
    pub parent: Option<NodeRef>,
    pub children: Vec<NodeRef>,
    /// Synthetic pseudo-nodes, one per attribute, reachable only via the
    /// `attribute` axis — never through `children`. Each carries the
    /// attribute's local name as its `local_name` and its value as `text`,
    /// so the evaluator's ordinary string-value logic applies to attributes
    /// without a separate code path.
    pub attr_nodes: Vec<NodeRef>,
}

impl XmlElement {
    fn root() -> Self {
        Self {
            name: String::new(),
            local_name: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            line_number: 0,
            parent: None,
            children: Vec::new(),
            attr_nodes: Vec::new(),
        }
    }

    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name)
            .map(|a| a.value.as_str())
    }
}

/// A parsed document: a flat arena of elements plus the index of the single
/// top-level element (the document's root, distinct from the arena's
/// synthetic slot 0).
#[derive(Debug, Clone)]
pub struct XmlTree {
    elements: Vec<XmlElement>,
    root: Option<NodeRef>,
}

impl XmlTree {
    pub(super) fn empty() -> Self {
        Self {
            elements: vec![XmlElement::root()],
            root: None,
        }
    }

    pub(super) fn push(&mut self, element: XmlElement) -> NodeRef {
        let idx = NodeRef(self.elements.len());
        self.elements.push(element);
        idx
    }

    pub(super) fn set_root(&mut self, root: NodeRef) {
        self.root = Some(root);
    }

    pub(super) fn attach(&mut self, parent: NodeRef, child: NodeRef) {
        if let Some(p) = self.elements.get_mut(parent.0) {
            p.children.push(child);
        }
        if let Some(c) = self.elements.get_mut(child.0) {
            c.parent = Some(parent);
        }
    }

    /// Creates a synthetic attribute pseudo-node owned by `owner` and links
    /// it into `owner.attr_nodes`. Not reachable via `children`/`descendants`.
    pub(super) fn push_attr_node(
        &mut self,
        owner: NodeRef,
        local_name: String,
        value: String,
    ) -> NodeRef {
        let line_number = self.get(owner).map(|e| e.line_number).unwrap_or(0);
        let node = XmlElement {
            name: local_name.clone(),
            local_name,
            attributes: Vec::new(),
            text: value,
            line_number,
            parent: Some(owner),
            children: Vec::new(),
            attr_nodes: Vec::new(),
        };
        let idx = self.push(node);
        if let Some(o) = self.elements.get_mut(owner.0) {
            o.attr_nodes.push(idx);
        }
        idx
    }

    pub(super) fn append_text(&mut self, node: NodeRef, text: &str) {
        if let Some(e) = self.elements.get_mut(node.0) {
            if !e.text.is_empty() {
                e.text.push(' ');
            }
            e.text.push_str(text);
        }
    }

    pub fn root(&self) -> Option<NodeRef> {
        self.root
    }

    pub fn get(&self, node: NodeRef) -> Option<&XmlElement> {
        self.elements.get(node.0)
    }

    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        self.get(node).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.get(node).and_then(|e| e.parent)
    }

    /// Attribute pseudo-nodes of `node`, for the `attribute` axis.
    pub fn attr_nodes(&self, node: NodeRef) -> &[NodeRef] {
        self.get(node).map(|e| e.attr_nodes.as_slice()).unwrap_or(&[])
    }

    pub fn siblings(&self, node: NodeRef) -> &[NodeRef] {
        match self.parent(node) {
            Some(p) => self.children(p),
            None => &[],
        }
    }

    /// Descendants in document order, not including `node` itself.
    pub fn descendants(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeRef> = self.children(node).to_vec();
        stack.reverse();
        while let Some(n) = stack.pop() {
            out.push(n);
            let mut kids = self.children(n).to_vec();
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Ancestors from nearest to farthest, not including `node` itself.
    pub fn ancestors(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut cur = self.parent(node);
        while let Some(n) = cur {
            out.push(n);
            cur = self.parent(n);
        }
        out
    }

    /// All real elements in the document, including the root, in arena
    /// order (which is document order because elements are pushed on open).
    /// Attribute pseudo-nodes are excluded; reach them via `attr_nodes`.
    pub fn all_nodes(&self) -> Vec<NodeRef> {
        (1..self.elements.len())
            .map(NodeRef)
            .filter(|&n| !self.is_attr_node(n))
            .collect()
    }

    fn is_attr_node(&self, node: NodeRef) -> bool {
        self.parent(node)
            .is_some_and(|p| self.attr_nodes(p).contains(&node))
    }

    /// Computes a best-effort absolute XPath-like string for diagnostics,
    /// e.g. `/PublicationDelivery/dataObjects/Line[2]` or, for an attribute
    /// pseudo-node, `/PublicationDelivery/Line[1]/@id`.
    pub fn computed_xpath(&self, node: NodeRef) -> String {
        let mut segments = Vec::new();
        let mut cur = Some(node);
        if self.is_attr_node(node) {
            if let Some(element) = self.get(node) {
                segments.push(format!("@{}", element.local_name));
            }
            cur = self.parent(node);
        }
        while let Some(n) = cur {
            let Some(element) = self.get(n) else { break };
            let index = self.position_among_same_name_siblings(n);
            segments.push(format!("{}[{}]", element.local_name, index));
            cur = self.parent(n);
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    fn position_among_same_name_siblings(&self, node: NodeRef) -> usize {
        let Some(element) = self.get(node) else { return 1 };
        let siblings: &[NodeRef] = match self.parent(node) {
            Some(p) => self.children(p),
            None => return 1,
        };
        let mut position = 0;
        for &sib in siblings {
            if let Some(sib_el) = self.get(sib) {
                if sib_el.local_name == element.local_name {
                    position += 1;
                    if sib == node {
                        return position;
                    }
                }
            }
        }
        1
    }
}
