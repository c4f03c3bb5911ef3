use super::*;
use crate::graph::index::index;
use crate::graph::model::GraphDef;
use serde_json::{Value, json};

fn node(id: &str, kind: &str, data: Value) -> Value {
    json!({ "id": id, "name": id, "type": kind, "data": data })
}

fn edge(id: &str, source: &str, target: &str, port: &str) -> Value {
    json!({ "id": id, "source": source, "target": target, "target_port": port })
}

fn scene(id: &str) -> Value {
    node(id, "scene", json!({ "width": 640, "height": 360, "duration": 2 }))
}

fn run(nodes: Vec<Value>, edges: Vec<Value>) -> (Option<usize>, Diagnostics) {
    let g: GraphDef = serde_json::from_value(json!({ "nodes": nodes, "edges": edges })).unwrap();
    let idx = index(&g).unwrap();
    let mut diags = Diagnostics::default();
    let t = validate_graph(&idx, &CompileOptions::default(), &mut diags);
    (t, diags)
}

#[test]
fn single_scene_is_the_terminal() {
    let (t, diags) = run(vec![node("c", "geometry", json!({ "shape": "circle" })), scene("s")], vec![]);
    assert_eq!(t, Some(1));
    assert!(diags.entries.is_empty());
}

#[test]
fn scene_count_is_enforced() {
    let (t, diags) = run(vec![], vec![]);
    assert_eq!(t, None);
    assert!(diags.has(DiagnosticCode::SceneRequired));

    let (t, diags) = run(vec![scene("s1"), node("f1", "frame", json!({ "width": 1, "height": 1 }))], vec![]);
    assert_eq!(t, None);
    let d = diags.errors().next().unwrap();
    assert_eq!(d.code, DiagnosticCode::TooManyScenes);
    assert_eq!(d.nodes, vec![NodeId::from("s1"), NodeId::from("f1")]);
}

#[test]
fn node_limit_short_circuits() {
    let g: GraphDef = serde_json::from_value(json!({
        "nodes": [scene("s"), scene("t"), scene("u")]
    }))
    .unwrap();
    let idx = index(&g).unwrap();
    let mut diags = Diagnostics::default();
    let options = CompileOptions {
        max_nodes: 2,
        ..CompileOptions::default()
    };
    let t = validate_graph(&idx, &options, &mut diags);
    assert_eq!(t, None);
    assert_eq!(diags.entries.len(), 1);
    assert_eq!(diags.entries[0].code, DiagnosticCode::SceneValidationFailed);
}

#[test]
fn payload_problems_and_duplicate_names_fail() {
    let (t, diags) = run(
        vec![
            scene("s"),
            node("m", "merge", json!({ "input_count": 0 })),
            json!({ "id": "r1", "name": "Score", "type": "result" }),
            json!({ "id": "r2", "name": "Score", "type": "result" }),
            json!({ "id": "r3", "name": "Other", "type": "result" }),
        ],
        vec![],
    );
    assert_eq!(t, None);
    let codes: Vec<_> = diags.errors().map(|d| d.code).collect();
    assert_eq!(codes, vec![DiagnosticCode::NodeValidationFailed; 2]);
    let names = diags.errors().find(|d| d.message.contains("Score")).unwrap();
    assert_eq!(names.nodes, vec![NodeId::from("r1"), NodeId::from("r2")]);
}

#[test]
fn dangling_edges_warn_but_object_flow_into_values_fails() {
    let (t, diags) = run(
        vec![
            scene("s"),
            node("c", "geometry", json!({ "shape": "circle" })),
            node("k", "constant", json!({ "value": 1 })),
            node("m", "merge", json!({ "input_count": 1 })),
        ],
        vec![
            edge("e1", "c", "m", "input-3"),
            edge("e2", "ghost", "s", "in"),
        ],
    );
    assert_eq!(t, Some(0));
    assert_eq!(diags.entries.len(), 2);
    assert!(diags.entries.iter().all(|d| d.severity == crate::compile::diagnostics::Severity::Warning));
    assert!(diags.entries[0].message.contains("e1"));
    assert!(diags.entries[0].message.contains("input-3"));

    let (t, diags) = run(
        vec![
            scene("s"),
            node("c", "geometry", json!({ "shape": "circle" })),
            node("k", "result", json!({})),
        ],
        vec![edge("e1", "c", "k", "value")],
    );
    assert_eq!(t, None);
    assert!(diags.has(DiagnosticCode::InvalidConnection));
}

#[test]
fn cycles_are_errors() {
    let (t, diags) = run(
        vec![
            scene("s"),
            node("a", "insert", json!({})),
            node("b", "insert", json!({})),
        ],
        vec![edge("e1", "a", "b", "in"), edge("e2", "b", "a", "in")],
    );
    assert_eq!(t, None);
    let d = diags.errors().next().unwrap();
    assert_eq!(d.code, DiagnosticCode::CircularDependency);
    assert_eq!(d.message, "circular dependency: a -> b -> a");
}

#[test]
fn bad_background_is_rejected() {
    let (t, diags) = run(
        vec![node("s", "scene", json!({ "width": 1, "height": 1, "background": "blue" }))],
        vec![],
    );
    assert_eq!(t, None);
    assert!(diags.has(DiagnosticCode::NodeValidationFailed));
}

#[test]
fn duplicate_count_above_instance_limit_fails() {
    let (t, diags) = run(
        vec![
            scene("s"),
            node("d", "duplicate", json!({ "count": 4_294_967_295u64 })),
        ],
        vec![],
    );
    assert_eq!(t, None);
    let d = diags.errors().next().unwrap();
    assert_eq!(d.code, DiagnosticCode::NodeValidationFailed);
    assert_eq!(d.nodes, vec![NodeId::from("d")]);
    assert!(d.message.contains("instance limit"), "{}", d.message);
}
