use super::*;
use crate::graph::index::index;
use crate::graph::model::GraphDef;
use serde_json::json;

fn build(nodes: Value, edges: Value) -> GraphIndex {
    let g: GraphDef = serde_json::from_value(json!({ "nodes": nodes, "edges": edges })).unwrap();
    index(&g).unwrap()
}

fn e(id: &str, s: &str, t: &str, port: &str) -> Value {
    json!({ "id": id, "source": s, "source_port": "out", "target": t, "target_port": port })
}

#[test]
fn math_feeds_result_through_ports() {
    let idx = build(
        json!([
            { "id": "k", "type": "constant", "data": { "value": 4 } },
            { "id": "m", "type": "math", "data": { "op": "mul", "b": 2.5 } },
            { "id": "r", "type": "result", "name": "size", "data": { "value_type": "number" } }
        ]),
        json!([e("e1", "k", "m", "a"), e("e2", "m", "r", "value")]),
    );
    let vals = evaluate_variables(&idx).unwrap();
    assert_eq!(vals.get(&"r".into()), Some(&json!(10.0)));
}

#[test]
fn comparison_and_boolean_chain() {
    let idx = build(
        json!([
            { "id": "a", "type": "constant", "data": { "value": 3 } },
            { "id": "cmp", "type": "comparison", "data": { "op": "gt", "b": 1 } },
            { "id": "not", "type": "boolean", "data": { "op": "not" } },
            { "id": "r", "type": "result", "data": { "value_type": "bool" } }
        ]),
        json!([
            e("e1", "a", "cmp", "a"),
            e("e2", "cmp", "not", "a"),
            e("e3", "not", "r", "value")
        ]),
    );
    let vals = evaluate_variables(&idx).unwrap();
    assert_eq!(vals.get(&"r".into()), Some(&json!(false)));
}

#[test]
fn undefined_values_propagate() {
    let idx = build(
        json!([
            { "id": "zero", "type": "constant", "data": { "value": 0 } },
            { "id": "div", "type": "math", "data": { "op": "div", "a": 1 } },
            { "id": "r", "type": "result", "data": {} },
            { "id": "lonely", "type": "result", "data": {} },
            { "id": "typed", "type": "result", "data": { "value_type": "color" } },
            { "id": "txt", "type": "constant", "data": { "value": "not a colour" } }
        ]),
        json!([
            e("e1", "zero", "div", "b"),
            e("e2", "div", "r", "value"),
            e("e3", "txt", "typed", "value")
        ]),
    );
    let vals = evaluate_variables(&idx).unwrap();
    assert_eq!(vals.get(&"r".into()), None);
    assert_eq!(vals.get(&"lonely".into()), None);
    assert_eq!(vals.get(&"typed".into()), None);
    assert_eq!(vals.get(&"txt".into()), Some(&json!("not a colour")));
}

#[test]
fn value_cycles_are_reported() {
    let idx = build(
        json!([
            { "id": "m1", "type": "math", "data": { "op": "add", "b": 1 } },
            { "id": "m2", "type": "math", "data": { "op": "add", "b": 1 } }
        ]),
        json!([e("e1", "m1", "m2", "a"), e("e2", "m2", "m1", "a")]),
    );
    let err = evaluate_variables(&idx).unwrap_err();
    assert_eq!(
        err,
        IndexError::CircularDependency(vec!["m1".into(), "m2".into()])
    );
}

#[test]
fn string_equality_is_supported() {
    let idx = build(
        json!([
            { "id": "cmp", "type": "comparison", "data": { "op": "eq", "a": "promo", "b": "promo" } },
            { "id": "lt", "type": "comparison", "data": { "op": "lt", "a": "a", "b": "b" } }
        ]),
        json!([]),
    );
    let vals = evaluate_variables(&idx).unwrap();
    assert_eq!(vals.get(&"cmp".into()), Some(&json!(true)));
    assert_eq!(vals.get(&"lt".into()), None);
}
