//! Execution engine: walks every drawable object through the graph and assembles the scene.
//!
//! Objects travel as tokens along object-carrying edges in topological order. Each token owns
//! its local time cursor, so no path observes another path's timing. Merge nodes join tokens of
//! the same object; everything else either transforms a token, drops it, or passes it on.

use crate::animation::render::render_track;
use crate::compile::assemble::{assemble_scene, materialize};
use crate::compile::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
use crate::compile::validate::validate_graph;
use crate::eval::values::{VariableValues, evaluate_variables};
use crate::foundation::ids::{EdgeId, NodeId};
use crate::graph::index::GraphIndex;
use crate::graph::node::{AnimationData, InsertMode, Node, NodeKind};
use crate::resolve::overrides::{ObjectScope, Overrides, TIMELINE};
use crate::resolve::resolver::ViewResolver;
use crate::scene::model::{ConcreteTrack, Scene};
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use kurbo::Vec2;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};

/// Compilation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Graphs with more nodes are rejected before traversal.
    pub max_nodes: usize,
    /// Upper bound on drawable instances, duplicate copies included. Also bounds the object
    /// paths arriving at any single node.
    pub max_instances: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_nodes: 10_000,
            max_instances: 10_000,
        }
    }
}

/// A successfully compiled scene plus the warnings collected on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// The scene document.
    pub scene: Scene,
    /// Warning-severity diagnostics.
    pub warnings: Vec<Diagnostic>,
}

/// Compile `index` with `overrides` into a scene.
///
/// Any error-severity diagnostic aborts compilation; the returned [`Diagnostics`] then holds
/// every error and warning found.
#[tracing::instrument(skip_all, fields(graph = %index.fingerprint()))]
pub fn compile(
    index: &GraphIndex,
    overrides: &Overrides,
    options: &CompileOptions,
) -> Result<Compilation, Diagnostics> {
    let prepared = prepare(index, options)?;
    run(index, &prepared, overrides, None)
}

/// Graph-level state shared by every variant of one compile: validation outcome and live
/// variable values. Neither depends on overrides.
#[derive(Debug)]
pub(crate) struct Prepared {
    terminal: usize,
    max_instances: usize,
    variables: VariableValues,
    warnings: Vec<Diagnostic>,
}

pub(crate) fn prepare(index: &GraphIndex, options: &CompileOptions) -> Result<Prepared, Diagnostics> {
    let mut diags = Diagnostics::default();
    let Some(terminal) = validate_graph(index, options, &mut diags) else {
        return Err(diags);
    };
    let variables = match evaluate_variables(index) {
        Ok(v) => v,
        Err(e) => {
            diags.push(Diagnostic::error(e.code(), e.to_string()));
            return Err(diags);
        }
    };
    Ok(Prepared {
        terminal,
        max_instances: options.max_instances,
        variables,
        warnings: diags.entries,
    })
}

/// Walk all paths and assemble the scene with `key` active as the batch variant.
pub(crate) fn run(
    index: &GraphIndex,
    prepared: &Prepared,
    overrides: &Overrides,
    key: Option<&str>,
) -> Result<Compilation, Diagnostics> {
    let resolver = ViewResolver {
        overrides,
        variables: &prepared.variables,
        active_key: key,
    };
    let mut flow = Flow::new(index, prepared, resolver);
    flow.notes.extend(prepared.warnings.iter().cloned());
    flow.walk();

    let delivered = std::mem::take(&mut flow.delivered);
    flow.check_deliveries(&delivered);

    let mut objects = Vec::with_capacity(delivered.len());
    let mut tracks = Vec::new();
    if !flow.has_errors() {
        for t in delivered {
            if let Some(obj) = materialize(index, &t, &resolver, &mut flow.notes) {
                objects.push(obj);
                tracks.extend(t.tracks.into_iter().map(|(_, track)| track));
            }
        }
    }

    let terminal = index.node(prepared.terminal);
    let scene = assemble_scene(terminal, objects, tracks, &mut flow.notes);

    let notes: IndexSet<Diagnostic> = flow.notes.into_iter().collect();
    let (errors, warnings): (Vec<_>, Vec<_>) = notes.into_iter().partition(Diagnostic::is_error);
    match scene {
        Some(scene) if errors.is_empty() => {
            if !warnings.is_empty() {
                tracing::warn!(count = warnings.len(), "scene compiled with warnings");
            }
            Ok(Compilation { scene, warnings })
        }
        _ => {
            let mut entries = errors;
            entries.extend(warnings);
            Err(Diagnostics { entries })
        }
    }
}

/// Identifies one emitted track so joins do not double tracks shared before a fan-out.
type TrackOrigin = (usize, usize);

/// One drawable instance travelling down one execution path.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) instance: NodeId,
    /// Position of the originating geometry node.
    pub(crate) origin: usize,
    /// Accumulated duplicate offset.
    pub(crate) offset: Vec2,
    pub(crate) cursor: f64,
    pub(crate) inserted: bool,
    pub(crate) insert_time: Option<f64>,
    /// Text-style keys layered over the node's own properties.
    pub(crate) style: Map<String, Value>,
    pub(crate) tracks: Vec<(TrackOrigin, ConcreteTrack)>,
}

impl Token {
    fn seed(node: &Node, origin: usize) -> Self {
        Self {
            instance: node.id.clone(),
            origin,
            offset: Vec2::ZERO,
            cursor: 0.0,
            inserted: false,
            insert_time: None,
            style: Map::new(),
            tracks: Vec::new(),
        }
    }

    /// Join a token of the same instance arriving on another merge input.
    fn absorb(&mut self, other: Token) {
        self.cursor = self.cursor.max(other.cursor);
        self.inserted |= other.inserted;
        self.insert_time = match (self.insert_time, other.insert_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        for (k, v) in other.style {
            self.style.entry(k).or_insert(v);
        }
        for (origin, track) in other.tracks {
            if !self.tracks.iter().any(|(o, _)| *o == origin) {
                self.tracks.push((origin, track));
            }
        }
    }

    /// The `n`th copy made by duplicate node `by`. Naming the node keeps chained duplicates
    /// from colliding.
    fn copy_as(&self, by: &NodeId, n: u32, step: Vec2) -> Self {
        let instance = NodeId(format!("{}#{by}.{n}", self.instance));
        let mut copy = self.clone();
        copy.offset += step * f64::from(n);
        for (_, t) in &mut copy.tracks {
            t.object_id = instance.clone();
        }
        copy.instance = instance;
        copy
    }
}

struct Flow<'a> {
    index: &'a GraphIndex,
    terminal: usize,
    resolver: ViewResolver<'a>,
    inbox: Vec<Vec<Token>>,
    delivered: Vec<Token>,
    notes: Vec<Diagnostic>,
    require_insert: bool,
    max_instances: usize,
    instances: usize,
}

impl<'a> Flow<'a> {
    fn new(index: &'a GraphIndex, prepared: &Prepared, resolver: ViewResolver<'a>) -> Self {
        let terminal = prepared.terminal;
        let require_insert = match &index.node(terminal).kind {
            NodeKind::Scene(s) | NodeKind::Frame(s) => s.require_insert,
            _ => false,
        };
        Self {
            index,
            terminal,
            resolver,
            inbox: vec![Vec::new(); index.node_count()],
            delivered: Vec::new(),
            notes: Vec::new(),
            require_insert,
            max_instances: prepared.max_instances,
            instances: 0,
        }
    }

    fn has_errors(&self) -> bool {
        self.notes.iter().any(Diagnostic::is_error)
    }

    fn coverage_severity(&self) -> Severity {
        if self.require_insert {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    fn walk(&mut self) {
        let index = self.index;
        for i in object_order(index) {
            let tokens = std::mem::take(&mut self.inbox[i]);
            let node = index.node(i);
            if !node.is_merge() && tokens.len() > self.max_instances {
                self.notes.push(
                    Diagnostic::error(
                        DiagnosticCode::SceneValidationFailed,
                        format!(
                            "node '{}' receives {} object paths, more than the allowed {}",
                            node.id,
                            tokens.len(),
                            self.max_instances
                        ),
                    )
                    .with_nodes([node.id.clone()]),
                );
                continue;
            }
            let out = self.step(i, node, tokens);

            let mut outgoing = index
                .outgoing(i)
                .filter(|e| e.carries_objects)
                .peekable();
            if outgoing.peek().is_none() {
                if !out.is_empty() {
                    self.report_dead_end(node, &out);
                }
                continue;
            }
            for e in outgoing {
                self.inbox[e.target].extend(out.iter().cloned());
            }
        }
    }

    fn step(&mut self, i: usize, node: &Node, tokens: Vec<Token>) -> Vec<Token> {
        match &node.kind {
            NodeKind::Geometry(_) => {
                self.instances += 1;
                vec![Token::seed(node, i)]
            }
            NodeKind::Merge(_) => join(tokens),
            NodeKind::Filter(f) => tokens
                .into_iter()
                .filter(|t| f.admits(&self.index.node(t.origin).id))
                .collect(),
            NodeKind::Insert(ins) => match ins.mode {
                InsertMode::Never => Vec::new(),
                InsertMode::Always => tokens
                    .into_iter()
                    .map(|mut t| {
                        t.cursor += ins.delay;
                        t.inserted = true;
                        if t.insert_time.is_none() {
                            t.insert_time = Some(t.cursor);
                        }
                        t
                    })
                    .collect(),
            },
            NodeKind::Animation(a) => tokens
                .into_iter()
                .filter_map(|t| self.animate(i, node, a, t))
                .collect(),
            NodeKind::TextStyle(s) => tokens
                .into_iter()
                .map(|mut t| {
                    t.style.extend(s.style.clone());
                    t
                })
                .collect(),
            NodeKind::Duplicate(d) => {
                let spawned = usize::try_from(d.count)
                    .unwrap_or(usize::MAX)
                    .saturating_mul(tokens.len());
                if self.instances.saturating_add(spawned) > self.max_instances {
                    self.notes.push(
                        Diagnostic::error(
                            DiagnosticCode::SceneValidationFailed,
                            format!(
                                "duplicate node '{}' would raise the instance count above the allowed {}",
                                node.id, self.max_instances
                            ),
                        )
                        .with_nodes([node.id.clone()])
                        .suggest("lower the duplicate count"),
                    );
                    return Vec::new();
                }
                self.instances += spawned;
                tokens
                    .into_iter()
                    .flat_map(|t| {
                        let copies: Vec<Token> = (1..=d.count)
                            .map(|n| t.copy_as(&node.id, n, d.offset))
                            .collect();
                        std::iter::once(t).chain(copies)
                    })
                    .collect()
            }
            NodeKind::Scene(_) | NodeKind::Frame(_) => {
                if i == self.terminal {
                    for t in &tokens {
                        tracing::debug!(object = %t.instance, cursor = t.cursor, "path delivered");
                    }
                    self.delivered.extend(tokens);
                }
                Vec::new()
            }
            NodeKind::Unknown(type_name) => {
                let objects: IndexSet<&NodeId> = tokens.iter().map(|t| &t.instance).collect();
                if !objects.is_empty() {
                    let list = objects
                        .iter()
                        .map(|id| id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.notes.push(
                        Diagnostic::error(
                            DiagnosticCode::NodeValidationFailed,
                            format!(
                                "node '{}' has unknown type '{type_name}' on the path of {list}",
                                node.id
                            ),
                        )
                        .with_nodes([node.id.clone()]),
                    );
                }
                Vec::new()
            }
            // Object flow into value nodes is rejected during validation.
            NodeKind::Constant(_)
            | NodeKind::Result(_)
            | NodeKind::Comparison(_)
            | NodeKind::Boolean(_)
            | NodeKind::Math(_) => Vec::new(),
        }
    }

    /// Emit one concrete track per configured track, then advance the cursor.
    fn animate(&mut self, i: usize, node: &Node, a: &AnimationData, mut t: Token) -> Option<Token> {
        let scope = ObjectScope::Object(t.instance.clone());
        let mut latest_end = 0.0f64;
        for (slot, def) in a.tracks.iter().enumerate() {
            let namespace = format!("{TIMELINE}.{}", def.key());
            let view = self
                .resolver
                .view(&namespace, &def.view(), &scope, &mut self.notes);
            let rendered = def
                .from_view(view)
                .and_then(|resolved| {
                    latest_end = latest_end.max(resolved.end());
                    render_track(&resolved, &t.instance, t.cursor)
                });
            match rendered {
                Ok(track) => t.tracks.push(((i, slot), track)),
                Err(msg) => {
                    self.notes.push(
                        Diagnostic::error(
                            DiagnosticCode::NodeValidationFailed,
                            format!("animation node '{}', object '{}': {msg}", node.id, t.instance),
                        )
                        .with_nodes([node.id.clone()]),
                    );
                    return None;
                }
            }
        }
        t.cursor += a.duration.unwrap_or(latest_end);
        Some(t)
    }

    fn report_dead_end(&mut self, node: &Node, out: &[Token]) {
        if node.is_drawable() {
            let severity = self.coverage_severity();
            self.notes.push(Diagnostic {
                code: DiagnosticCode::MissingInsertConnection,
                message: format!("object '{}' is not connected to anything", node.id),
                severity,
                suggestions: vec!["connect the object to an insert node".to_owned()],
                nodes: vec![node.id.clone()],
            });
            return;
        }
        for t in out {
            self.notes.push(
                Diagnostic::warning(
                    DiagnosticCode::InvalidConnection,
                    format!(
                        "path of object '{}' ends at node '{}' without reaching the scene",
                        t.instance, node.id
                    ),
                )
                .with_nodes([node.id.clone()]),
            );
        }
    }

    /// Duplicate delivery and insert coverage at the terminal.
    fn check_deliveries(&mut self, delivered: &[Token]) {
        let mut counts: BTreeMap<&NodeId, (usize, usize)> = BTreeMap::new();
        for t in delivered {
            counts.entry(&t.instance).or_insert((0, t.origin)).0 += 1;
        }
        for (instance, (count, origin)) in counts {
            if count < 2 {
                continue;
            }
            let origin_id = &self.index.node(origin).id;
            let mut d = Diagnostic::error(
                DiagnosticCode::DuplicateObjectIds,
                format!("object '{instance}' reaches the scene through {count} separate paths"),
            )
            .with_nodes([origin_id.clone()]);
            for s in duplicate_suggestions(self.index, origin_id) {
                d = d.suggest(s);
            }
            self.notes.push(d);
        }

        let severity = self.coverage_severity();
        for t in delivered.iter().filter(|t| !t.inserted) {
            self.notes.push(Diagnostic {
                code: DiagnosticCode::MissingInsertConnection,
                message: format!("object '{}' reaches the scene without an insert node", t.instance),
                severity,
                suggestions: vec!["route the object through an insert node".to_owned()],
                nodes: vec![self.index.node(t.origin).id.clone()],
            });
        }
    }
}

/// Join tokens of the same instance; first arrival keeps its position in the output.
fn join(tokens: Vec<Token>) -> Vec<Token> {
    let mut joined: IndexMap<NodeId, Token> = IndexMap::with_capacity(tokens.len());
    for t in tokens {
        match joined.entry(t.instance.clone()) {
            Entry::Vacant(v) => {
                v.insert(t);
            }
            Entry::Occupied(mut o) => o.get_mut().absorb(t),
        }
    }
    joined.into_values().collect()
}

/// Topological order over object-carrying edges. Nodes on a cycle are left out; validation
/// rejects cyclic graphs before this runs.
fn object_order(index: &GraphIndex) -> Vec<usize> {
    let n = index.node_count();
    let mut indegree = vec![0usize; n];
    for e in index.live_edges().iter().filter(|e| e.carries_objects) {
        indegree[e.target] += 1;
    }
    let mut ready: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = ready.pop_front() {
        order.push(i);
        for e in index.outgoing(i).filter(|e| e.carries_objects) {
            indegree[e.target] -= 1;
            if indegree[e.target] == 0 {
                ready.push_back(e.target);
            }
        }
    }
    order
}

/// Point at each fan-out edge that re-delivers `object` after a sibling edge claimed it.
fn duplicate_suggestions(index: &GraphIndex, object: &NodeId) -> Vec<String> {
    let mut out = Vec::new();
    for i in 0..index.node_count() {
        let fan_out: Vec<&EdgeId> = index
            .outgoing(i)
            .filter(|e| e.carries_objects && !index.node(e.target).is_merge())
            .map(|e| &e.def.id)
            .collect();
        if fan_out.len() < 2 {
            continue;
        }
        let source = &index.node(i).id;
        for edge in fan_out {
            let Ok(branch) = index.branch_availability(source, edge) else {
                continue;
            };
            if branch.taken.contains(object) {
                out.push(format!(
                    "connection '{edge}' from '{source}' re-delivers '{object}' already claimed by \
                     a sibling branch; join the branches with a merge node or add a filter"
                ));
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compile/engine.rs"]
mod tests;
