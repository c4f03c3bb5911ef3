use super::*;
use crate::graph::index::index;
use crate::graph::model::GraphDef;
use serde_json::{Value, json};

fn graph() -> GraphIndex {
    let g: GraphDef = serde_json::from_value(json!({
        "nodes": [
            { "id": "X", "type": "geometry", "data": {
                "shape": "rectangle", "properties": { "fillColor": "#000000", "width": 20 }
            } },
            { "id": "Y", "type": "geometry", "data": { "shape": "circle" } },
            { "id": "i", "type": "insert" },
            { "id": "s", "type": "scene", "data": { "width": 320, "height": 240, "duration": 1 } }
        ],
        "edges": [
            { "id": "e1", "source": "X", "target": "i" },
            { "id": "e2", "source": "Y", "target": "i" },
            { "id": "e3", "source": "i", "target": "s" }
        ]
    }))
    .unwrap();
    index(&g).unwrap()
}

fn overrides(v: Value) -> Overrides {
    serde_json::from_value(v).unwrap()
}

fn fill(c: &Compilation, id: &str) -> Value {
    c.scene.object(id).unwrap().properties["fillColor"].clone()
}

#[test]
fn one_variant_per_key_with_sparse_fallback() {
    let o = overrides(json!({ "batch": {
        "Canvas.fillColor": { "X": { "default": "#00ff00", "promoA": "#ff00ff" } },
        "Canvas.width": { "default": { "promoB": 99 } }
    } }));
    let out = expand_batch(&graph(), &o, &CompileOptions::default(), &BatchOptions { threads: Some(2) })
        .unwrap();

    assert_eq!(fill(&out.base, "X"), json!("#00ff00"));
    let keys: Vec<_> = out.variants.iter().map(|v| v.key.as_str()).collect();
    assert_eq!(keys, vec!["promoA", "promoB"]);

    let a = out.variants[0].outcome.as_ref().unwrap();
    let b = out.variants[1].outcome.as_ref().unwrap();
    assert_eq!(fill(a, "X"), json!("#ff00ff"));
    assert_eq!(fill(b, "X"), json!("#00ff00"));
    assert_eq!(a.scene.object("X").unwrap().properties["width"], json!(20));
    assert_eq!(b.scene.object("X").unwrap().properties["width"], json!(99));
    assert_eq!(b.scene.object("Y").unwrap().properties["width"], json!(99));

    let ids = |c: &Compilation| c.scene.objects.iter().map(|o| o.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(a), ids(&out.base));
    assert_eq!(ids(b), ids(&out.base));
}

#[test]
fn no_keys_means_no_variants() {
    let out = expand_batch(&graph(), &Overrides::default(), &CompileOptions::default(), &BatchOptions::default())
        .unwrap();
    assert!(out.variants.is_empty());
    assert_eq!(out.base.scene.objects.len(), 2);
}

#[test]
fn zero_threads_is_rejected() {
    let o = overrides(json!({ "batch": { "Canvas.width": { "X": { "k": 1 } } } }));
    let err = expand_batch(&graph(), &o, &CompileOptions::default(), &BatchOptions { threads: Some(0) })
        .unwrap_err();
    assert!(matches!(err, BatchError::Setup(_)));
}

#[test]
fn invalid_base_graph_fails_fast() {
    let g: GraphDef = serde_json::from_value(json!({ "nodes": [] })).unwrap();
    let err = expand_batch(&index(&g).unwrap(), &Overrides::default(), &CompileOptions::default(), &BatchOptions::default())
        .unwrap_err();
    let BatchError::Compile(diags) = err else {
        panic!("expected diagnostics");
    };
    assert!(diags.has(crate::compile::diagnostics::DiagnosticCode::SceneRequired));
}
