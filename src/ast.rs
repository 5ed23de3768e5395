/// AST types for the pattern generator.
///
/// Nodes live in an arena ([`Ast`]) and refer to each other by [`NodeId`].
/// The tree is owned top-down; `parent` is a plain index used only to walk
/// from a node back up to the root.

use crate::charset::CharSet;

/// Index of a node inside an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single node kind in the pattern AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Fixed literal text (empty for anchors such as `^` and `\A`).
    Text(String),
    /// One character drawn from a set like `[a-z]`, `.` or `\d`.
    Set(CharSet),
    /// Concatenation of nodes (implicit in `ab[0-9]`).
    Concat(Vec<NodeId>),
    /// Alternation (`a|b`).
    Alternation(Vec<NodeId>),
    /// Quantifier applied to a sub-expression. `max == None` is unbounded.
    Repeat {
        child: NodeId,
        min: usize,
        max: Option<usize>,
        /// Every iteration repeats one generated string (`{=n,m}`).
        same_value: bool,
    },
    /// Parenthesised sub-expression. `capture` is its backreference number.
    Group {
        child: NodeId,
        name: Option<String>,
        capture: Option<usize>,
    },
    /// Backreference `\1` or `\k<name>`: a second reference to a `Group` node.
    Backref { target: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
}

/// Arena holding every node of one compiled pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, parent: None });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub(crate) fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child.0].parent = Some(parent);
    }

    /// Nodes owned by `id`. A backreference owns nothing.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Concat(children) | NodeKind::Alternation(children) => children.clone(),
            NodeKind::Repeat { child, .. } | NodeKind::Group { child, .. } => vec![*child],
            NodeKind::Text(_) | NodeKind::Set(_) | NodeKind::Backref { .. } => Vec::new(),
        }
    }

    /// Whether this node can produce a fragment its own syntax rejects.
    pub fn is_invalidatable(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Text(text) => !text.is_empty(),
            NodeKind::Set(set) => set.is_invalidatable(),
            NodeKind::Repeat { min, max, .. } => *min > 0 || max.is_some(),
            NodeKind::Concat(_)
            | NodeKind::Alternation(_)
            | NodeKind::Group { .. }
            | NodeKind::Backref { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_sequential_ids() {
        let mut ast = Ast::new();
        let a = ast.push(NodeKind::Text("a".to_string()));
        let b = ast.push(NodeKind::Text("b".to_string()));
        let cat = ast.push(NodeKind::Concat(vec![a, b]));
        ast.set_parent(a, cat);
        ast.set_parent(b, cat);

        assert_eq!(cat.index(), 2);
        assert_eq!(ast.parent(a), Some(cat));
        assert_eq!(ast.parent(cat), None);
        assert_eq!(ast.children(cat), vec![a, b]);
    }

    #[test]
    fn invalidatable_rules() {
        let mut ast = Ast::new();
        let empty = ast.push(NodeKind::Text(String::new()));
        let text = ast.push(NodeKind::Text("x".to_string()));
        let star = ast.push(NodeKind::Repeat {
            child: text,
            min: 0,
            max: None,
            same_value: false,
        });
        let plus = ast.push(NodeKind::Repeat {
            child: text,
            min: 1,
            max: None,
            same_value: false,
        });
        let optional = ast.push(NodeKind::Repeat {
            child: text,
            min: 0,
            max: Some(1),
            same_value: false,
        });
        let alt = ast.push(NodeKind::Alternation(vec![empty, text]));

        assert!(!ast.is_invalidatable(empty));
        assert!(ast.is_invalidatable(text));
        assert!(!ast.is_invalidatable(star));
        assert!(ast.is_invalidatable(plus));
        assert!(ast.is_invalidatable(optional));
        assert!(!ast.is_invalidatable(alt));
    }
}
