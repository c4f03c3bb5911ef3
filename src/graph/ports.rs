use crate::foundation::ids::PortId;
use crate::graph::node::{MergeData, Node, NodeKind};
use std::collections::BTreeSet;

/// Input port id for merge slot `i`.
pub(crate) fn merge_port(i: u32) -> PortId {
    PortId(format!("input-{i}"))
}

/// Ports a merge node currently accepts, derived from its configuration.
pub(crate) fn valid_merge_ports(data: &MergeData) -> BTreeSet<PortId> {
    (0..data.input_count).map(merge_port).collect()
}

/// `false` only when the target is a merge node and `port` is outside its current port set.
///
/// Other node types have fixed ports and accept whatever the editor connected.
pub(crate) fn accepts_input(target: &Node, port: &PortId) -> bool {
    match &target.kind {
        NodeKind::Merge(m) => valid_merge_ports(m).contains(port),
        _ => true,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/ports.rs"]
mod tests;
