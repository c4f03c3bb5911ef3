use crate::foundation::error::{NodeflowError, NodeflowResult};
use crate::foundation::ids::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Scope key meaning "every object"; also the batch default slot key.
pub const DEFAULT_KEY: &str = "default";

/// Field namespace of drawable-object properties.
pub const CANVAS: &str = "Canvas";
/// Field namespace of animation-track properties.
pub const TIMELINE: &str = "Timeline";

/// Dot-notation field path such as `Canvas.position.x` or `Timeline.move.from.x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(pub String);

impl FieldPath {
    /// Join a namespace and a relative path.
    pub fn new(namespace: &str, rest: &str) -> Self {
        Self(format!("{namespace}.{rest}"))
    }

    /// Path relative to `namespace`, if the path lives under it.
    pub fn strip_namespace(&self, namespace: &str) -> Option<&str> {
        self.0.strip_prefix(namespace)?.strip_prefix('.')
    }

    /// Borrow the raw path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which objects an override applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectScope {
    /// Every object (serialized as `"default"`); also the node-level scope.
    AllObjects,
    /// One specific object.
    Object(NodeId),
}

static ALL_OBJECTS: ObjectScope = ObjectScope::AllObjects;

impl ObjectScope {
    /// Scopes consulted for this scope, most specific first.
    pub fn lookup_chain(&self) -> impl Iterator<Item = &ObjectScope> {
        let specific = match self {
            Self::Object(_) => Some(self),
            Self::AllObjects => None,
        };
        specific.into_iter().chain(std::iter::once(&ALL_OBJECTS))
    }

    /// The object id when the scope is object-specific.
    pub fn object(&self) -> Option<&NodeId> {
        match self {
            Self::Object(id) => Some(id),
            Self::AllObjects => None,
        }
    }
}

impl From<String> for ObjectScope {
    fn from(s: String) -> Self {
        if s == DEFAULT_KEY {
            Self::AllObjects
        } else {
            Self::Object(NodeId(s))
        }
    }
}

impl From<ObjectScope> for String {
    fn from(s: ObjectScope) -> Self {
        match s {
            ObjectScope::AllObjects => DEFAULT_KEY.to_owned(),
            ObjectScope::Object(id) => id.0,
        }
    }
}

/// Keyed batch override table: field path -> scope -> slot key -> value.
///
/// The slot key `"default"` is the batch default slot; every other slot key names a variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchTable(pub BTreeMap<FieldPath, BTreeMap<ObjectScope, BTreeMap<String, Value>>>);

impl BatchTable {
    /// Every variant key present in any per-key entry, sorted.
    pub fn keys(&self) -> BTreeSet<String> {
        self.0
            .values()
            .flat_map(|scopes| scopes.values())
            .flat_map(|slots| slots.keys())
            .filter(|k| k.as_str() != DEFAULT_KEY)
            .cloned()
            .collect()
    }

    pub(crate) fn slot(&self, field: &FieldPath, scope: &ObjectScope, key: &str) -> Option<&Value> {
        self.0.get(field)?.get(scope)?.get(key)
    }

    pub(crate) fn fields_for<'a>(
        &'a self,
        scope: &'a ObjectScope,
    ) -> impl Iterator<Item = &'a FieldPath> + 'a {
        self.0
            .iter()
            .filter(move |(_, scopes)| scope.lookup_chain().any(|s| scopes.contains_key(s)))
            .map(|(f, _)| f)
    }
}

/// All caller-supplied override tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    /// Per-object manual assignments from the canvas/timeline editors.
    #[serde(default)]
    pub manual: BTreeMap<NodeId, BTreeMap<FieldPath, Value>>,
    /// Variable bindings: scope -> field path -> result node id.
    #[serde(default)]
    pub bindings: BTreeMap<ObjectScope, BTreeMap<FieldPath, NodeId>>,
    /// Batch override table.
    #[serde(default)]
    pub batch: BatchTable,
}

impl Overrides {
    /// Parse override tables from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> NodeflowResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            NodeflowError::validation(format!("open overrides JSON '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| NodeflowError::serde(format!("parse overrides JSON: {e}")))
    }

    pub(crate) fn binding(&self, field: &FieldPath, scope: &ObjectScope) -> Option<&NodeId> {
        self.bindings.get(scope)?.get(field)
    }

    pub(crate) fn manual(&self, field: &FieldPath, scope: &ObjectScope) -> Option<&Value> {
        self.manual.get(scope.object()?)?.get(field)
    }

    /// Every overridden field applicable to `scope`, any layer.
    pub(crate) fn fields_for(&self, scope: &ObjectScope) -> BTreeSet<FieldPath> {
        let mut out: BTreeSet<FieldPath> = self.batch.fields_for(scope).cloned().collect();
        for s in scope.lookup_chain() {
            if let Some(b) = self.bindings.get(s) {
                out.extend(b.keys().cloned());
            }
        }
        if let Some(m) = scope.object().and_then(|id| self.manual.get(id)) {
            out.extend(m.keys().cloned());
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/overrides.rs"]
mod tests;
