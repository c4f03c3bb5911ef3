//! Layered property resolution.
//!
//! Layers are a fixed, ordered table of functions; the first one producing a value wins.

use crate::compile::diagnostics::{Diagnostic, DiagnosticCode};
use crate::eval::values::VariableValues;
use crate::resolve::overrides::{DEFAULT_KEY, FieldPath, ObjectScope, Overrides};
use crate::resolve::view::{flatten, unflatten};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Override layer that produced a resolved value, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Live value of a bound result node.
    Binding,
    /// Batch override for the active variant key.
    BatchKey,
    /// Batch `"default"` slot.
    BatchDefault,
    /// Per-object manual assignment.
    Manual,
    /// The node's own configured value.
    Default,
}

impl Layer {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binding => "binding",
            Self::BatchKey => "batch_key",
            Self::BatchDefault => "batch_default",
            Self::Manual => "manual",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete value and the layer it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    /// Resolved value.
    pub value: Value,
    /// Winning layer.
    pub layer: Layer,
}

/// Inputs a resolution reads besides the field path and scope.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    overrides: &'a Overrides,
    variables: &'a VariableValues,
    defaults: &'a BTreeMap<FieldPath, Value>,
    active_key: Option<&'a str>,
}

impl<'a> ResolveContext<'a> {
    /// Context with no batch key active; `defaults` holds the node-level leaf values.
    pub fn new(
        overrides: &'a Overrides,
        variables: &'a VariableValues,
        defaults: &'a BTreeMap<FieldPath, Value>,
    ) -> Self {
        Self {
            overrides,
            variables,
            defaults,
            active_key: None,
        }
    }

    /// Activate a batch variant key.
    pub fn with_key(mut self, key: Option<&'a str>) -> Self {
        self.active_key = key.filter(|k| *k != DEFAULT_KEY);
        self
    }
}

type LayerFn =
    fn(&FieldPath, &ObjectScope, &ResolveContext<'_>, &mut Vec<Diagnostic>) -> Option<Value>;

const LAYERS: [(Layer, LayerFn); 5] = [
    (Layer::Binding, binding_layer),
    (Layer::BatchKey, batch_key_layer),
    (Layer::BatchDefault, batch_default_layer),
    (Layer::Manual, manual_layer),
    (Layer::Default, default_layer),
];

/// Resolve one leaf field for `scope`.
///
/// Returns `None` only when no layer, including the node default, knows the field. Stale
/// bindings push a warning onto `notes` and fall through.
pub fn resolve(
    field: &FieldPath,
    scope: &ObjectScope,
    ctx: &ResolveContext<'_>,
    notes: &mut Vec<Diagnostic>,
) -> Option<Resolved> {
    LAYERS.iter().find_map(|(layer, f)| {
        f(field, scope, ctx, notes).map(|value| Resolved {
            value,
            layer: *layer,
        })
    })
}

fn binding_layer(
    field: &FieldPath,
    scope: &ObjectScope,
    ctx: &ResolveContext<'_>,
    notes: &mut Vec<Diagnostic>,
) -> Option<Value> {
    let (bound_scope, source) = scope
        .lookup_chain()
        .find_map(|s| ctx.overrides.binding(field, s).map(|src| (s, src)))?;
    match ctx.variables.get(source) {
        Some(v) => Some(v.clone()),
        None => {
            let target = match bound_scope {
                ObjectScope::AllObjects => "all objects".to_owned(),
                ObjectScope::Object(id) => format!("object '{id}'"),
            };
            notes.push(
                Diagnostic::warning(
                    DiagnosticCode::InvalidConnection,
                    format!(
                        "binding of '{field}' for {target} points at '{source}', which has no live value"
                    ),
                )
                .with_nodes([source.clone()])
                .suggest("connect a defined value to the result node or remove the binding"),
            );
            None
        }
    }
}

fn batch_key_layer(
    field: &FieldPath,
    scope: &ObjectScope,
    ctx: &ResolveContext<'_>,
    _: &mut Vec<Diagnostic>,
) -> Option<Value> {
    let key = ctx.active_key?;
    scope
        .lookup_chain()
        .find_map(|s| ctx.overrides.batch.slot(field, s, key))
        .cloned()
}

fn batch_default_layer(
    field: &FieldPath,
    scope: &ObjectScope,
    ctx: &ResolveContext<'_>,
    _: &mut Vec<Diagnostic>,
) -> Option<Value> {
    scope
        .lookup_chain()
        .find_map(|s| ctx.overrides.batch.slot(field, s, DEFAULT_KEY))
        .cloned()
}

fn manual_layer(
    field: &FieldPath,
    scope: &ObjectScope,
    ctx: &ResolveContext<'_>,
    _: &mut Vec<Diagnostic>,
) -> Option<Value> {
    ctx.overrides.manual(field, scope).cloned()
}

fn default_layer(
    field: &FieldPath,
    _: &ObjectScope,
    ctx: &ResolveContext<'_>,
    _: &mut Vec<Diagnostic>,
) -> Option<Value> {
    ctx.defaults.get(field).cloned()
}

/// Resolves whole property views for the execution engine.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ViewResolver<'a> {
    pub(crate) overrides: &'a Overrides,
    pub(crate) variables: &'a VariableValues,
    pub(crate) active_key: Option<&'a str>,
}

impl ViewResolver<'_> {
    /// Resolve every leaf of `view` under `namespace`, plus leaves only overrides know about.
    pub(crate) fn view(
        &self,
        namespace: &str,
        view: &Map<String, Value>,
        scope: &ObjectScope,
        notes: &mut Vec<Diagnostic>,
    ) -> Map<String, Value> {
        let defaults = flatten(namespace, view);
        let ctx = ResolveContext::new(self.overrides, self.variables, &defaults)
            .with_key(self.active_key);

        let mut fields: Vec<FieldPath> = defaults.keys().cloned().collect();
        fields.extend(
            self.overrides
                .fields_for(scope)
                .into_iter()
                .filter(|f| f.strip_namespace(namespace).is_some() && !defaults.contains_key(f)),
        );

        let resolved = fields
            .into_iter()
            .filter_map(|f| {
                let r = resolve(&f, scope, &ctx, notes)?;
                Some((f, r.value))
            })
            .collect();
        unflatten(namespace, resolved)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/resolver.rs"]
mod tests;
