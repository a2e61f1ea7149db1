//! Subtree visibility for collapsed nodes.
//!
//! A node's children are the targets of connections whose source is that
//! node. Collapsing a node hides its transitive descendants while the node
//! itself stays visible with a hidden-children indicator.
//!
//! The child index is rebuilt from the *full* node and connection lists on
//! every call, never from a previously rendered visible set, so expanding a
//! node restores exactly the subtree that was hidden. Nothing here mutates
//! the nodes; visibility is a derived view.

use crate::id::{ConnectionId, NodeId};
use crate::model::{Connection, Node};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Arena of node ids with an id → index map, edges following connections.
#[derive(Debug, Clone, Default)]
pub struct ChildIndex {
    graph: DiGraph<NodeId, ConnectionId>,
    index: HashMap<NodeId, NodeIndex>,
}

impl ChildIndex {
    /// Build from the full node/connection lists. Connections whose source
    /// or target does not resolve are left out.
    pub fn build(nodes: &[Node], connections: &[Connection]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), connections.len());
        let mut index = HashMap::with_capacity(nodes.len());
        for node in nodes {
            index
                .entry(node.id)
                .or_insert_with(|| graph.add_node(node.id));
        }
        for conn in connections {
            match (index.get(&conn.source_node_id), index.get(&conn.target_node_id)) {
                (Some(&src), Some(&dst)) => {
                    graph.add_edge(src, dst, conn.id);
                }
                _ => log::trace!("skipping dangling connection {}", conn.id),
            }
        }
        Self { graph, index }
    }

    /// Direct children, in connection order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        // petgraph yields most-recent edges first
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect();
        out.reverse();
        out
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.index.get(&id).is_some_and(|&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_some()
        })
    }

    /// Transitive descendants of `id`, excluding `id` itself even when a
    /// cycle leads back to it. Cycle-safe.
    pub fn descendants(&self, id: NodeId) -> HashSet<NodeId> {
        let mut found = HashSet::new();
        let Some(&start) = self.index.get(&id) else {
            return found;
        };
        let mut stack = vec![start];
        let mut seen = HashSet::from([start]);
        while let Some(idx) = stack.pop() {
            for child in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if seen.insert(child) {
                    found.insert(self.graph[child]);
                    stack.push(child);
                }
            }
        }
        found
    }
}

/// The visible subset of a map given each node's collapsed flag.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    hidden: HashSet<NodeId>,
    /// Collapsed node → number of descendants it hides.
    hidden_children: HashMap<NodeId, usize>,
}

impl Visibility {
    pub fn is_visible(&self, id: NodeId) -> bool {
        !self.hidden.contains(&id)
    }

    pub fn hidden(&self) -> &HashSet<NodeId> {
        &self.hidden
    }

    /// Non-zero only on collapsed nodes that actually have descendants.
    /// Drives the "has hidden children" indicator.
    pub fn hidden_child_count(&self, id: NodeId) -> usize {
        self.hidden_children.get(&id).copied().unwrap_or(0)
    }

    /// A connection renders only if both endpoints are visible. Dangling
    /// endpoints are the renderer's concern (they fail to resolve).
    pub fn connection_visible(&self, conn: &Connection) -> bool {
        self.is_visible(conn.source_node_id) && self.is_visible(conn.target_node_id)
    }
}

/// Compute visibility from source data.
pub fn resolve(nodes: &[Node], connections: &[Connection]) -> Visibility {
    let index = ChildIndex::build(nodes, connections);
    resolve_with(&index, nodes)
}

/// Same as [`resolve`] with a prebuilt index.
pub fn resolve_with(index: &ChildIndex, nodes: &[Node]) -> Visibility {
    let mut vis = Visibility::default();
    for node in nodes.iter().filter(|n| n.is_collapsed) {
        let below = index.descendants(node.id);
        if !below.is_empty() {
            vis.hidden_children.insert(node.id, below.len());
        }
        vis.hidden.extend(below);
    }
    log::debug!("visibility: {} of {} nodes hidden", vis.hidden.len(), nodes.len());
    vis
}
