//! Arena-backed concrete syntax tree
//!
//! Nodes live in a flat `Vec` owned by the tree; every connection is a
//! `NodeId` index into that arena, so the structure is plain data with no
//! reference counting and no interior mutability. A [`Node`] is a copyable
//! `(tree, id)` handle used for navigation.
//!
//! Children are reachable two ways, reflecting the two assembly variants:
//! by grammar symbol (a named single [`Node::field`] or a named ordered
//! [`Node::list`]) when the grammar emitted labeled edges, or as one plain
//! source-ordered [`Node::children`] sequence when structure was derived
//! from span nesting. Byte spans are `[start, end)` into the original
//! source text.

use std::collections::BTreeMap;
use std::ops::Range;

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> NodeId {
        NodeId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) byte_start: usize,
    pub(crate) byte_end: usize,
    pub(crate) token_start: u32,
    pub(crate) token_end: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) fields: BTreeMap<String, NodeId>,
    pub(crate) lists: BTreeMap<String, Vec<NodeId>>,
    pub(crate) children: Vec<NodeId>,
}

/// One assembled tree for one source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        Node { tree: self, id: self.root }
    }

    pub fn get(&self, id: NodeId) -> Option<Node<'_>> {
        if id.index() < self.nodes.len() {
            Some(Node { tree: self, id })
        } else {
            None
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Copyable handle to one node of a [`SyntaxTree`]
#[derive(Debug, Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub fn id(self) -> NodeId {
        self.id
    }

    /// Grammar symbol naming this node
    pub fn name(self) -> &'t str {
        &self.data().name
    }

    /// Byte span `[start, end)` into the original source
    pub fn byte_range(self) -> Range<usize> {
        let data = self.data();
        data.byte_start..data.byte_end
    }

    /// Token index span `[start, end)` this node covers
    pub fn token_range(self) -> Range<u32> {
        let data = self.data();
        data.token_start..data.token_end
    }

    pub fn parent(self) -> Option<Node<'t>> {
        let tree = self.tree;
        self.data().parent.map(|id| Node { tree, id })
    }

    /// Single-valued child under the given grammar symbol
    pub fn field(self, name: &str) -> Option<Node<'t>> {
        let tree = self.tree;
        self.data().fields.get(name).map(|&id| Node { tree, id })
    }

    /// Ordered children under the given grammar symbol
    pub fn list(self, name: &str) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        self.data()
            .lists
            .get(name)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&id| Node { tree, id })
    }

    /// All single-valued children with their symbols, symbol-ordered
    pub fn fields(self) -> impl Iterator<Item = (&'t str, Node<'t>)> + 't {
        let tree = self.tree;
        self.data()
            .fields
            .iter()
            .map(move |(name, &id)| (name.as_str(), Node { tree, id }))
    }

    /// Symbols under which this node has ordered children
    pub fn list_names(self) -> impl Iterator<Item = &'t str> + 't {
        self.data().lists.keys().map(|name| name.as_str())
    }

    /// All children in source order, without symbol labels
    pub fn children(self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| Node { tree, id })
    }

    pub fn child_count(self) -> usize {
        self.data().children.len()
    }

    fn data(self) -> &'t NodeData {
        self.tree.data(self.id)
    }
}

/// Accumulates nodes and edges during assembly
pub(crate) struct TreeBuilder {
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub(crate) fn new() -> TreeBuilder {
        TreeBuilder { nodes: Vec::new() }
    }

    pub(crate) fn push(
        &mut self,
        name: String,
        bytes: Range<usize>,
        tokens: Range<u32>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            name,
            byte_start: bytes.start,
            byte_end: bytes.end,
            token_start: tokens.start,
            token_end: tokens.end,
            parent: None,
            fields: BTreeMap::new(),
            lists: BTreeMap::new(),
            children: Vec::new(),
        });
        id
    }

    pub(crate) fn attach_field(&mut self, parent: NodeId, name: String, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].fields.insert(name, child);
    }

    pub(crate) fn attach_list(&mut self, parent: NodeId, name: String, children: Vec<NodeId>) {
        for &child in &children {
            self.nodes[child.index()].parent = Some(parent);
        }
        self.nodes[parent.index()].lists.insert(name, children);
    }

    pub(crate) fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Derive each node's plain `children` sequence from its labeled edges,
    /// ordered by source position (outer before inner on shared starts)
    pub(crate) fn order_children(&mut self) {
        for index in 0..self.nodes.len() {
            let mut kids: Vec<NodeId> = self.nodes[index]
                .fields
                .values()
                .copied()
                .chain(self.nodes[index].lists.values().flatten().copied())
                .collect();
            kids.sort_by_key(|id| {
                let data = &self.nodes[id.index()];
                (data.byte_start, std::cmp::Reverse(data.byte_end))
            });
            self.nodes[index].children = kids;
        }
    }

    pub(crate) fn name_of(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].name
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree { nodes: self.nodes, root }
    }
}
