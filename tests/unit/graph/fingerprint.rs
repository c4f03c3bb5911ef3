use super::*;
use serde_json::json;

fn graph(data: serde_json::Value) -> GraphDef {
    serde_json::from_value(json!({
        "nodes": [
            { "id": "c1", "name": "Circle", "type": "geometry", "data": data },
            { "id": "s", "type": "scene", "data": { "width": 64, "height": 64 } }
        ],
        "edges": [
            { "id": "e1", "source": "c1", "source_port": "object", "target": "s", "target_port": "in" }
        ]
    }))
    .unwrap()
}

#[test]
fn payload_key_order_does_not_matter() {
    let a = graph(json!({ "shape": "circle", "properties": { "radius": 10, "color": "#ff0000" } }));
    let b = graph(json!({ "properties": { "color": "#ff0000", "radius": 10 }, "shape": "circle" }));
    assert_eq!(fingerprint_graph(&a), fingerprint_graph(&b));
}

#[test]
fn payload_changes_change_the_fingerprint() {
    let a = graph(json!({ "shape": "circle" }));
    let b = graph(json!({ "shape": "triangle" }));
    assert_ne!(fingerprint_graph(&a), fingerprint_graph(&b));
}

#[test]
fn edge_rewiring_changes_the_fingerprint() {
    let a = graph(json!({ "shape": "circle" }));
    let mut b = a.clone();
    b.edges[0].target_port = "other".into();
    assert_ne!(fingerprint_graph(&a), fingerprint_graph(&b));
}

#[test]
fn display_is_32_hex_digits() {
    let s = fingerprint_graph(&GraphDef::default()).to_string();
    assert_eq!(s.len(), 32);
    assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn length_prefixes_keep_field_boundaries_apart() {
    let a = graph(json!({ "shape": "circle" }));
    let mut b = a.clone();
    b.nodes[0].id = "c1C".into();
    b.nodes[0].name = "ircle".into();
    assert_ne!(fingerprint_graph(&a), fingerprint_graph(&b));
}

#[test]
fn lengths_are_hashed_as_u64() {
    let mut wide = StableHasher::new();
    wide.write_len(3);
    let mut manual = StableHasher::new();
    manual.write_bytes(&3u64.to_le_bytes());
    assert_eq!(wide.finish(), manual.finish());
}
