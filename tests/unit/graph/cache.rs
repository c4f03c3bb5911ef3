use super::*;
use serde_json::json;

fn graph(shape: &str) -> GraphDef {
    serde_json::from_value(json!({
        "nodes": [{ "id": "c", "type": "geometry", "data": { "shape": shape } }],
        "edges": []
    }))
    .unwrap()
}

#[test]
fn unchanged_graphs_reuse_the_same_index() {
    let cache = IndexCache::default();
    let a = cache.get_or_build(&graph("circle")).unwrap();
    let b = cache.get_or_build(&graph("circle")).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);

    let c = cache.get_or_build(&graph("triangle")).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(cache.len(), 2);
}

#[test]
fn full_snapshot_is_replaced() {
    let cache = IndexCache::with_capacity(1);
    cache.get_or_build(&graph("circle")).unwrap();
    cache.get_or_build(&graph("triangle")).unwrap();
    assert_eq!(cache.len(), 1);
}

#[test]
fn concurrent_lookups_share_results() {
    let cache = Arc::new(IndexCache::default());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || cache.get_or_build(&graph("circle")).unwrap().fingerprint())
        })
        .collect();
    let prints: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(prints.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(cache.len(), 1);
}

#[test]
fn payload_errors_are_not_cached() {
    let cache = IndexCache::default();
    let bad: GraphDef = serde_json::from_value(json!({
        "nodes": [{ "id": "c", "type": "geometry", "data": {} }]
    }))
    .unwrap();
    assert!(cache.get_or_build(&bad).is_err());
    assert!(cache.is_empty());
}
