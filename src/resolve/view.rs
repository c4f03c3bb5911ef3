//! Leaf-level field views over JSON property maps.
//!
//! Every override addresses a leaf (`Canvas.position.x`), never a whole sub-object, so sibling
//! leaves resolve independently.

use crate::resolve::overrides::FieldPath;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flatten `view` into leaf paths under `namespace`. Arrays and empty objects are leaves.
pub(crate) fn flatten(namespace: &str, view: &Map<String, Value>) -> BTreeMap<FieldPath, Value> {
    let mut out = BTreeMap::new();
    for (k, v) in view {
        flatten_into(&format!("{namespace}.{k}"), v, &mut out);
    }
    out
}

fn flatten_into(prefix: &str, v: &Value, out: &mut BTreeMap<FieldPath, Value>) {
    match v {
        Value::Object(m) if !m.is_empty() => {
            for (k, child) in m {
                flatten_into(&format!("{prefix}.{k}"), child, out);
            }
        }
        _ => {
            out.insert(FieldPath(prefix.to_owned()), v.clone());
        }
    }
}

/// Rebuild a nested map from leaf paths under `namespace`; paths outside it are ignored.
///
/// Paths are applied in sorted order, so a deeper path replaces a scalar at its parent.
pub(crate) fn unflatten(namespace: &str, flat: BTreeMap<FieldPath, Value>) -> Map<String, Value> {
    let mut root = Map::new();
    for (path, v) in flat {
        let Some(rest) = path.strip_namespace(namespace) else {
            continue;
        };
        let mut segments = rest.split('.').peekable();
        let mut cur = &mut root;
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_owned(), v);
                break;
            }
            let slot = cur
                .entry(seg.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(next) = slot else {
                break;
            };
            cur = next;
        }
    }
    root
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/view.rs"]
mod tests;
