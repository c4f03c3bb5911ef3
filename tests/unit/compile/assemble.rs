use super::*;
use crate::animation::ease::Ease;
use crate::animation::track::TrackKind;
use crate::graph::model::NodeDef;
use crate::scene::model::TrackProperties;

fn geometry() -> GeometryData {
    serde_json::from_value(json!({
        "shape": "rectangle",
        "position": { "x": 1, "y": 2 },
        "properties": { "width": 40, "opacity": "ignored" }
    }))
    .unwrap()
}

fn terminal(kind: &str, duration: f64) -> Node {
    let def: NodeDef = serde_json::from_value(json!({
        "id": "out",
        "type": kind,
        "data": { "width": 64, "height": 64, "duration": duration, "background": "#FFAA00" }
    }))
    .unwrap();
    Node::parse(&def).unwrap()
}

fn fade(object: &str, start: f64, duration: f64) -> ConcreteTrack {
    ConcreteTrack {
        object_id: object.into(),
        kind: TrackKind::Fade,
        start_time: start,
        duration,
        easing: Ease::Linear,
        properties: TrackProperties::Scalar { from: 0.0, to: 1.0 },
    }
}

#[test]
fn canvas_view_puts_transform_over_properties() {
    let mut style = Map::new();
    style.insert("width".to_owned(), json!(80));
    let view = canvas_view(&geometry(), &style, Vec2::new(5.0, 0.0));
    assert_eq!(view["width"], json!(80));
    assert_eq!(view["position"], json!({ "x": 6.0, "y": 2.0 }));
    assert_eq!(view["opacity"], json!(1.0));
}

#[test]
fn take_transform_splits_view() {
    let mut view = canvas_view(&geometry(), &Map::new(), Vec2::ZERO);
    let t = take_transform(&mut view).unwrap();
    assert_eq!(t.position, Vec2::new(1.0, 2.0));
    assert_eq!(t.scale, Vec2::new(1.0, 1.0));
    assert_eq!((t.rotation, t.opacity), (0.0, 1.0));
    assert_eq!(Value::Object(view), json!({ "width": 40 }));

    let mut bad = Map::new();
    bad.insert("rotation".to_owned(), json!("fast"));
    let err = take_transform(&mut bad).unwrap_err();
    assert!(err.contains("rotation"));
}

#[test]
fn video_duration_stretches_to_latest_track() {
    let mut notes = Vec::new();
    let tracks = vec![fade("b", 1.0, 4.0), fade("a", 2.0, 1.0), fade("a", 0.0, 1.0)];
    let scene = assemble_scene(&terminal("scene", 3.0), Vec::new(), tracks, &mut notes).unwrap();
    assert_eq!(scene.duration, 5.0);
    assert_eq!(scene.background, "#ffaa00");
    assert!(notes.is_empty());
}

#[test]
fn image_duration_is_locked() {
    let mut notes = Vec::new();
    let tracks = vec![fade("a", -1.0, 1.5), fade("a", 0.5, 1.0)];
    let scene = assemble_scene(&terminal("frame", 1.0), Vec::new(), tracks, &mut notes).unwrap();
    assert_eq!(scene.duration, 1.0);
    assert_eq!(scene.animations.len(), 2);
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|d| d.code == DiagnosticCode::SceneValidationFailed));
}
