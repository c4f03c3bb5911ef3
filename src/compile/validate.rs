//! Whole-graph checks run before any execution path is walked.

use crate::compile::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::compile::engine::CompileOptions;
use crate::foundation::color::parse_hex;
use crate::foundation::ids::NodeId;
use crate::graph::index::{DanglingReason, GraphIndex};
use crate::graph::node::NodeKind;
use std::collections::{BTreeMap, HashMap};

/// Run structural validation. Returns the terminal node position when no error was found.
pub(crate) fn validate_graph(
    index: &GraphIndex,
    options: &CompileOptions,
    diags: &mut Diagnostics,
) -> Option<usize> {
    if index.node_count() > options.max_nodes {
        diags.push(Diagnostic::error(
            DiagnosticCode::SceneValidationFailed,
            format!(
                "graph has {} nodes, more than the allowed {}",
                index.node_count(),
                options.max_nodes
            ),
        ));
        return None;
    }

    let terminal = check_terminals(index, diags);
    check_nodes(index, options, diags);
    check_display_names(index, diags);
    check_edges(index, diags);

    if let Some(cycle) = index.find_cycle() {
        let path = cycle
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ");
        diags.push(
            Diagnostic::error(
                DiagnosticCode::CircularDependency,
                format!("circular dependency: {path}"),
            )
            .with_nodes(cycle)
            .suggest("remove one of the connections in the loop"),
        );
    }

    if diags.has_errors() { None } else { terminal }
}

fn check_terminals(index: &GraphIndex, diags: &mut Diagnostics) -> Option<usize> {
    let terminals: Vec<usize> = (0..index.node_count())
        .filter(|&i| index.node(i).is_terminal())
        .collect();
    match terminals.as_slice() {
        [] => {
            diags.push(
                Diagnostic::error(DiagnosticCode::SceneRequired, "graph has no scene or frame node")
                    .suggest("add a scene node and connect your objects to it"),
            );
            None
        }
        [only] => Some(*only),
        many => {
            diags.push(
                Diagnostic::error(
                    DiagnosticCode::TooManyScenes,
                    format!("graph has {} scene/frame nodes, expected exactly one", many.len()),
                )
                .with_nodes(many.iter().map(|&i| index.node(i).id.clone()))
                .suggest("delete the extra scene or frame nodes"),
            );
            None
        }
    }
}

fn check_nodes(index: &GraphIndex, options: &CompileOptions, diags: &mut Diagnostics) {
    let mut seen: HashMap<&NodeId, usize> = HashMap::new();
    for n in index.nodes() {
        *seen.entry(&n.id).or_default() += 1;
    }
    let mut dup: Vec<&NodeId> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    dup.sort();
    for id in dup {
        diags.push(
            Diagnostic::error(
                DiagnosticCode::NodeValidationFailed,
                format!("node id '{id}' is used by more than one node"),
            )
            .with_nodes([id.clone()]),
        );
    }

    for n in index.nodes() {
        for problem in n.problems() {
            diags.push(
                Diagnostic::error(
                    DiagnosticCode::NodeValidationFailed,
                    format!("{} node '{}': {problem}", n.type_name(), n.id),
                )
                .with_nodes([n.id.clone()]),
            );
        }
        if let NodeKind::Duplicate(d) = &n.kind
            && usize::try_from(d.count).map_or(true, |c| c > options.max_instances)
        {
            diags.push(
                Diagnostic::error(
                    DiagnosticCode::NodeValidationFailed,
                    format!(
                        "{} node '{}': count {} exceeds the instance limit {}",
                        n.type_name(),
                        n.id,
                        d.count,
                        options.max_instances
                    ),
                )
                .with_nodes([n.id.clone()]),
            );
        }
        if let NodeKind::Scene(s) | NodeKind::Frame(s) = &n.kind
            && let Err(e) = parse_hex(&s.background)
        {
            diags.push(
                Diagnostic::error(
                    DiagnosticCode::NodeValidationFailed,
                    format!("{} node '{}': background: {e}", n.type_name(), n.id),
                )
                .with_nodes([n.id.clone()]),
            );
        }
    }
}

fn check_display_names(index: &GraphIndex, diags: &mut Diagnostics) {
    let mut by_name: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for n in index.nodes().iter().filter(|n| n.is_renamable()) {
        by_name.entry(n.name.as_str()).or_default().push(n.id.clone());
    }
    for (name, ids) in by_name {
        if ids.len() < 2 {
            continue;
        }
        diags.push(
            Diagnostic::error(
                DiagnosticCode::NodeValidationFailed,
                format!("display name '{name}' is shared by {} nodes", ids.len()),
            )
            .with_nodes(ids)
            .suggest("rename the variables so each name is unique"),
        );
    }
}

fn check_edges(index: &GraphIndex, diags: &mut Diagnostics) {
    for d in index.dangling_edges() {
        let why = match &d.reason {
            DanglingReason::UnknownSource => format!("source node '{}' does not exist", d.source),
            DanglingReason::UnknownTarget => format!("target node '{}' does not exist", d.target),
            DanglingReason::InvalidPort { port } => {
                format!("merge node '{}' has no input port '{port}'", d.target)
            }
        };
        diags.push(
            Diagnostic::warning(
                DiagnosticCode::InvalidConnection,
                format!("dangling connection '{}': {why}", d.edge),
            )
            .suggest("reconnect or delete the connection"),
        );
    }

    for e in index.live_edges().iter().filter(|e| e.carries_objects) {
        let target = index.node(e.target);
        let refused = if target.is_value_node() {
            "value nodes do not accept objects"
        } else if target.is_drawable() {
            "geometry nodes do not accept objects"
        } else {
            continue;
        };
        diags.push(
            Diagnostic::error(
                DiagnosticCode::InvalidConnection,
                format!(
                    "connection '{}' from '{}' into '{}': {refused}",
                    e.def.id,
                    index.node(e.source).id,
                    target.id
                ),
            )
            .with_nodes([index.node(e.source).id.clone(), target.id.clone()]),
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/validate.rs"]
mod tests;
