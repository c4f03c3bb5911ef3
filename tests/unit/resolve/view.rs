use super::*;
use serde_json::json;

fn map(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => panic!("not an object"),
    }
}

#[test]
fn flatten_produces_leaf_paths() {
    let flat = flatten(
        "Canvas",
        &map(json!({ "position": { "x": 1, "y": 2 }, "radius": 10, "dash": [1, 2], "meta": {} })),
    );
    let keys: Vec<_> = flat.keys().map(|k| k.0.as_str()).collect();
    assert_eq!(
        keys,
        vec!["Canvas.dash", "Canvas.meta", "Canvas.position.x", "Canvas.position.y", "Canvas.radius"]
    );
    assert_eq!(flat[&FieldPath::from("Canvas.dash")], json!([1, 2]));
}

#[test]
fn unflatten_inverts_flatten() {
    let view = map(json!({ "from": { "x": 0, "y": 0 }, "to": { "x": 100, "y": 100 }, "duration": 1 }));
    let flat = flatten("Timeline.move", &view);
    assert_eq!(unflatten("Timeline.move", flat), view);
}

#[test]
fn unflatten_skips_foreign_paths_and_prefers_deeper_leaves() {
    let mut flat = BTreeMap::new();
    flat.insert(FieldPath::from("Canvas.position"), json!(3));
    flat.insert(FieldPath::from("Canvas.position.x"), json!(7));
    flat.insert(FieldPath::from("Timeline.move.duration"), json!(2));
    assert_eq!(unflatten("Canvas", flat), map(json!({ "position": { "x": 7 } })));
}
