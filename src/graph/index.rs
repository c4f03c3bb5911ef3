//! Derived lookup structures over a raw node/edge list.
//!
//! The index never mutates the graph. Edges that point at missing nodes or at merge ports that
//! no longer exist are kept aside as dangling and excluded from every traversal.

use crate::compile::diagnostics::DiagnosticCode;
use crate::foundation::error::NodeflowResult;
use crate::foundation::ids::{EdgeId, NodeId, PortId};
use crate::graph::fingerprint::{Fingerprint, fingerprint_graph};
use crate::graph::model::{EdgeDef, GraphDef};
use crate::graph::node::{InsertMode, Node, NodeKind};
use crate::graph::ports::{accepts_input, valid_merge_ports};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Failures of index queries.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The queried node does not exist.
    #[error("unknown node '{0}'")]
    UnknownNode(NodeId),
    /// The queried edge does not exist, is dangling, or does not leave the given node.
    #[error("unknown or dangling edge '{0}'")]
    UnknownEdge(EdgeId),
    /// A cycle is reachable from the queried node.
    #[error("circular dependency: {}", format_cycle(.0))]
    CircularDependency(Vec<NodeId>),
}

impl IndexError {
    /// Stable diagnostic code for this failure.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::CircularDependency(_) => DiagnosticCode::CircularDependency,
            Self::UnknownNode(_) | Self::UnknownEdge(_) => DiagnosticCode::InvalidConnection,
        }
    }
}

fn format_cycle(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Why an edge was excluded from traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DanglingReason {
    /// Source node is missing.
    UnknownSource,
    /// Target node is missing.
    UnknownTarget,
    /// Target is a merge node that no longer has this input port.
    InvalidPort {
        /// The stale port id.
        port: PortId,
    },
}

/// Edge excluded from traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingEdge {
    /// Edge id.
    pub edge: EdgeId,
    /// Source node id as written.
    pub source: NodeId,
    /// Target node id as written.
    pub target: NodeId,
    /// Exclusion reason.
    #[serde(flatten)]
    pub reason: DanglingReason,
}

/// Objects that may flow down one outgoing edge of a fan-out node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchAvailability {
    /// Upstream objects still free for this edge.
    pub available: IndexSet<NodeId>,
    /// Upstream objects already claimed by sibling edges ordered before this one.
    pub taken: IndexSet<NodeId>,
}

/// A result-sink node visible from some downstream node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableRef {
    /// Result node id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
}

/// Read-only derived view of a graph. Build with [`index`].
#[derive(Debug)]
pub struct GraphIndex {
    fingerprint: Fingerprint,
    nodes: Vec<Node>,
    by_id: HashMap<NodeId, usize>,
    /// Live edges sorted by id.
    edges: Vec<LiveEdge>,
    dangling: Vec<DanglingEdge>,
    /// Per node, indices into `edges` (ascending edge id).
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
}

#[derive(Debug, Clone)]
pub(crate) struct LiveEdge {
    pub(crate) def: EdgeDef,
    pub(crate) source: usize,
    pub(crate) target: usize,
    /// Value edges leave value nodes and never carry objects.
    pub(crate) carries_objects: bool,
}

/// Build the derived index for `graph`.
///
/// Fails only when a node payload cannot be interpreted for its declared type.
#[tracing::instrument(skip_all, fields(nodes = graph.nodes.len(), edges = graph.edges.len()))]
pub fn index(graph: &GraphDef) -> NodeflowResult<GraphIndex> {
    GraphIndex::build(graph)
}

impl GraphIndex {
    fn build(graph: &GraphDef) -> NodeflowResult<Self> {
        let nodes = graph
            .nodes
            .iter()
            .map(Node::parse)
            .collect::<NodeflowResult<Vec<_>>>()?;

        // First occurrence wins for duplicate node ids; compile reports the duplicate.
        let mut by_id = HashMap::with_capacity(nodes.len());
        for (i, n) in nodes.iter().enumerate() {
            by_id.entry(n.id.clone()).or_insert(i);
        }

        let mut sorted: Vec<&EdgeDef> = graph.edges.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges = Vec::with_capacity(sorted.len());
        let mut dangling = Vec::new();
        for e in sorted {
            let dangle = |reason| DanglingEdge {
                edge: e.id.clone(),
                source: e.source.clone(),
                target: e.target.clone(),
                reason,
            };
            let Some(&source) = by_id.get(&e.source) else {
                dangling.push(dangle(DanglingReason::UnknownSource));
                continue;
            };
            let Some(&target) = by_id.get(&e.target) else {
                dangling.push(dangle(DanglingReason::UnknownTarget));
                continue;
            };
            if !accepts_input(&nodes[target], &e.target_port) {
                dangling.push(dangle(DanglingReason::InvalidPort {
                    port: e.target_port.clone(),
                }));
                continue;
            }
            edges.push(LiveEdge {
                def: e.clone(),
                source,
                target,
                carries_objects: !nodes[source].is_value_node(),
            });
        }

        let mut incoming = vec![Vec::new(); nodes.len()];
        let mut outgoing = vec![Vec::new(); nodes.len()];
        for (i, e) in edges.iter().enumerate() {
            outgoing[e.source].push(i);
            incoming[e.target].push(i);
        }

        if !dangling.is_empty() {
            tracing::debug!(count = dangling.len(), "dangling edges excluded from index");
        }

        Ok(Self {
            fingerprint: fingerprint_graph(graph),
            nodes,
            by_id,
            edges,
            dangling,
            incoming,
            outgoing,
        })
    }

    /// Structural fingerprint of the indexed graph.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges excluded from traversal.
    pub fn dangling_edges(&self) -> &[DanglingEdge] {
        &self.dangling
    }

    /// Ids of nodes with a live edge into `node`, by ascending edge id.
    pub fn upstream_nodes(&self, node: &NodeId) -> Result<Vec<NodeId>, IndexError> {
        let i = self.require(node)?;
        Ok(self.incoming[i]
            .iter()
            .map(|&e| self.nodes[self.edges[e].source].id.clone())
            .collect())
    }

    /// Ids of nodes with a live edge out of `node`, by ascending edge id.
    pub fn downstream_nodes(&self, node: &NodeId) -> Result<Vec<NodeId>, IndexError> {
        let i = self.require(node)?;
        Ok(self.outgoing[i]
            .iter()
            .map(|&e| self.nodes[self.edges[e].target].id.clone())
            .collect())
    }

    /// Drawable objects reachable backwards from `node` over object-carrying edges.
    ///
    /// Traversal stops at drawable nodes; a drawable node's own set is just itself.
    pub fn upstream_objects(&self, node: &NodeId) -> Result<IndexSet<NodeId>, IndexError> {
        let start = self.require(node)?;
        self.upstream_objects_of(start)
    }

    pub(crate) fn upstream_objects_of(&self, start: usize) -> Result<IndexSet<NodeId>, IndexError> {
        let mut out = IndexSet::new();
        self.walk_upstream(
            start,
            |e| e.carries_objects,
            |n| n.is_drawable(),
            |n| {
                if n.is_drawable() {
                    out.insert(n.id.clone());
                }
            },
        )?;
        Ok(out)
    }

    /// Partition of `source`'s upstream objects for one of its outgoing edges.
    ///
    /// Sibling edges claim objects in ascending edge-id order. A filter or a `never` insert on a
    /// sibling only claims what it lets through. Edges into a merge node may reclaim objects
    /// already taken by siblings.
    pub fn branch_availability(
        &self,
        source: &NodeId,
        edge: &EdgeId,
    ) -> Result<BranchAvailability, IndexError> {
        let src = self.require(source)?;
        let all = self.upstream_objects_of(src)?;

        let mut taken = IndexSet::new();
        for &ei in &self.outgoing[src] {
            let e = &self.edges[ei];
            if !e.carries_objects {
                continue;
            }
            let target = &self.nodes[e.target];
            let available: IndexSet<NodeId> = if target.is_merge() {
                all.clone()
            } else {
                all.difference(&taken).cloned().collect()
            };
            if &e.def.id == edge {
                return Ok(BranchAvailability { available, taken });
            }
            for id in available {
                if gate_admits(target, &id) {
                    taken.insert(id);
                }
            }
        }
        Err(IndexError::UnknownEdge(edge.clone()))
    }

    /// Result-sink nodes reachable backwards from `node`, excluding `node` itself.
    ///
    /// Ordered by discovery (depth-first over incoming edges by ascending edge id).
    pub fn visible_variables(&self, node: &NodeId) -> Result<Vec<VariableRef>, IndexError> {
        let start = self.require(node)?;
        let mut out = Vec::new();
        self.walk_upstream(
            start,
            |_| true,
            |_| false,
            |n| {
                if n.is_result() && n.id != *node {
                    out.push(VariableRef {
                        id: n.id.clone(),
                        name: n.name.clone(),
                    });
                }
            },
        )?;
        Ok(out)
    }

    /// Input ports currently valid on a merge node; `None` when `node` is not a merge node.
    pub fn valid_merge_ports(&self, node: &NodeId) -> Option<BTreeSet<PortId>> {
        match &self.nodes[*self.by_id.get(node)?].kind {
            NodeKind::Merge(m) => Some(valid_merge_ports(m)),
            _ => None,
        }
    }

    /// First cycle found over live edges, as a closed node path (`a -> b -> a`).
    pub fn find_cycle(&self) -> Option<Vec<NodeId>> {
        let mut done = vec![false; self.nodes.len()];
        for start in 0..self.nodes.len() {
            if done[start] {
                continue;
            }
            if let Err(IndexError::CircularDependency(path)) =
                self.walk_from(start, &mut done, |_| true, |_| false, |_| {}, Direction::Down)
            {
                return Some(path);
            }
        }
        None
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn node(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    pub(crate) fn position(&self, id: &NodeId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn live_edges(&self) -> &[LiveEdge] {
        &self.edges
    }

    pub(crate) fn outgoing(&self, i: usize) -> impl Iterator<Item = &LiveEdge> {
        self.outgoing[i].iter().map(|&e| &self.edges[e])
    }

    pub(crate) fn incoming(&self, i: usize) -> impl Iterator<Item = &LiveEdge> {
        self.incoming[i].iter().map(|&e| &self.edges[e])
    }

    fn require(&self, id: &NodeId) -> Result<usize, IndexError> {
        self.position(id)
            .ok_or_else(|| IndexError::UnknownNode(id.clone()))
    }

    fn walk_upstream(
        &self,
        start: usize,
        follow: impl Fn(&LiveEdge) -> bool,
        stop_at: impl Fn(&Node) -> bool,
        visit: impl FnMut(&Node),
    ) -> Result<(), IndexError> {
        let mut done = vec![false; self.nodes.len()];
        self.walk_from(start, &mut done, follow, stop_at, visit, Direction::Up)
    }

    /// Iterative depth-first walk with an explicit recursion stack.
    ///
    /// `visit` sees each node once, in preorder. Nodes matching `stop_at` are visited but not
    /// expanded. Meeting a node that is still on the stack is a cycle.
    fn walk_from(
        &self,
        start: usize,
        done: &mut [bool],
        follow: impl Fn(&LiveEdge) -> bool,
        stop_at: impl Fn(&Node) -> bool,
        mut visit: impl FnMut(&Node),
        dir: Direction,
    ) -> Result<(), IndexError> {
        let adjacency = match dir {
            Direction::Up => &self.incoming,
            Direction::Down => &self.outgoing,
        };
        let mut on_stack = vec![false; self.nodes.len()];
        // (node, next adjacency slot)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        on_stack[start] = true;
        visit(&self.nodes[start]);
        let expand_start = !stop_at(&self.nodes[start]);

        while let Some(&(node, slot)) = stack.last() {
            let next = if node != start || expand_start {
                adjacency[node].get(slot).copied()
            } else {
                None
            };
            let Some(ei) = next else {
                stack.pop();
                on_stack[node] = false;
                done[node] = true;
                continue;
            };
            let depth = stack.len() - 1;
            stack[depth].1 += 1;

            let e = &self.edges[ei];
            if !follow(e) {
                continue;
            }
            let other = match dir {
                Direction::Up => e.source,
                Direction::Down => e.target,
            };
            if on_stack[other] {
                let from = stack.iter().position(|(n, _)| *n == other).unwrap_or(0);
                let mut path: Vec<NodeId> = stack[from..]
                    .iter()
                    .map(|(n, _)| self.nodes[*n].id.clone())
                    .collect();
                path.push(self.nodes[other].id.clone());
                if dir == Direction::Up {
                    path.reverse();
                }
                return Err(IndexError::CircularDependency(path));
            }
            if done[other] {
                continue;
            }
            visit(&self.nodes[other]);
            if stop_at(&self.nodes[other]) {
                done[other] = true;
                continue;
            }
            on_stack[other] = true;
            stack.push((other, 0));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Whether an object entering `target` continues past it.
pub(crate) fn gate_admits(target: &Node, object: &NodeId) -> bool {
    match &target.kind {
        NodeKind::Filter(f) => f.admits(object),
        NodeKind::Insert(i) => i.mode != InsertMode::Never,
        _ => true,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/index.rs"]
mod tests;
