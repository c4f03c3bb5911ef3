//! nodeflow compiles an editable node graph into a validated, time-ordered scene document.
//!
//! The pipeline is pure and synchronous:
//!
//! - Parse a [`GraphDef`] and build its [`GraphIndex`] with [`index`] (or through an
//!   [`IndexCache`])
//! - Load [`Overrides`] (manual assignments, variable bindings, batch table)
//! - [`compile`] into a [`Scene`] plus warnings, or a [`Diagnostics`] list on failure
//! - Optionally [`expand_batch`] into one scene variant per batch key
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod batch;
pub(crate) mod compile;
pub(crate) mod eval;
pub(crate) mod graph;
pub(crate) mod resolve;
pub(crate) mod scene;

pub use crate::foundation::error::{NodeflowError, NodeflowResult};
pub use crate::foundation::ids::{EdgeId, NodeId, PortId};

pub use crate::animation::ease::Ease;
pub use crate::animation::track::TrackKind;
pub use crate::batch::expand::{BatchError, BatchExpansion, BatchOptions, SceneVariant, expand_batch};
pub use crate::compile::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use crate::compile::engine::{Compilation, CompileOptions, compile};
pub use crate::eval::values::{VariableValues, evaluate_variables};
pub use crate::graph::cache::IndexCache;
pub use crate::graph::fingerprint::{Fingerprint, fingerprint_graph, fingerprint_scene};
pub use crate::graph::index::{
    BranchAvailability, DanglingEdge, DanglingReason, GraphIndex, IndexError, VariableRef, index,
};
pub use crate::graph::model::{EdgeDef, GraphDef, NodeDef};
pub use crate::graph::node::{ShapeKind, ValueType};
pub use crate::resolve::overrides::{
    BatchTable, CANVAS, DEFAULT_KEY, FieldPath, ObjectScope, Overrides, TIMELINE,
};
pub use crate::resolve::resolver::{Layer, ResolveContext, Resolved, resolve};
pub use crate::scene::model::{
    ConcreteTrack, DrawableObject, ObjectTransform, OutputKind, Scene, TrackProperties,
};
