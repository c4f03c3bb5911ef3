use super::*;
use crate::animation::ease::Ease;
use serde_json::json;

fn track(kind: &str, properties: Value) -> TrackDef {
    serde_json::from_value(json!({
        "type": kind,
        "start_offset": 0.25,
        "duration": 1.0,
        "easing": "in_quad",
        "properties": properties,
    }))
    .unwrap()
}

#[test]
fn every_kind_has_a_renderer() {
    for kind in TrackKind::ALL {
        assert!(RENDERERS.iter().any(|(k, _)| *k == kind), "{kind}");
    }
}

#[test]
fn move_is_baselined_and_preserves_easing() {
    let t = track(
        "move",
        json!({ "from": { "x": 0, "y": 0 }, "to": { "x": 100, "y": 100 } }),
    );
    let c = render_track(&t, &NodeId::from("c1"), 2.0).unwrap();
    assert_eq!(c.start_time, 2.25);
    assert_eq!(c.duration, 1.0);
    assert_eq!(c.easing, Ease::InQuad);
    assert_eq!(
        c.properties,
        TrackProperties::Vector {
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(100.0, 100.0),
        }
    );
}

#[test]
fn renderer_copies_rather_than_aliases_inputs() {
    let mut t = track("fade", json!({ "from": 1.0, "to": 0.0 }));
    let c = render_track(&t, &NodeId::from("c1"), 0.0).unwrap();
    t.properties.insert("to".to_owned(), json!(0.5));
    assert_eq!(c.properties, TrackProperties::Scalar { from: 1.0, to: 0.0 });
}

#[test]
fn partial_vectors_keep_the_missing_axis_default() {
    let t = track("scale", json!({ "to": { "x": 2.0 } }));
    let c = render_track(&t, &NodeId::from("c1"), 0.0).unwrap();
    assert_eq!(
        c.properties,
        TrackProperties::Vector {
            from: Vec2::new(1.0, 1.0),
            to: Vec2::new(2.0, 1.0),
        }
    );
}

#[test]
fn rotate_keeps_configured_angles() {
    let t = track("rotate", json!({ "from": 90.0, "to": 450.0 }));
    let c = render_track(&t, &NodeId::from("c1"), 0.0).unwrap();
    assert_eq!(
        c.properties,
        TrackProperties::Angle {
            from: 90.0,
            to: 450.0,
            rotations: 1.0,
        }
    );
}

#[test]
fn color_endpoints_are_normalised_and_validated() {
    let t = track("color", json!({ "from": "#FF0000", "to": "#00ff00" }));
    let c = render_track(&t, &NodeId::from("c1"), 0.0).unwrap();
    assert_eq!(
        c.properties,
        TrackProperties::Color {
            property: "fillColor".to_owned(),
            from: "#ff0000".to_owned(),
            to: "#00ff00".to_owned(),
        }
    );

    let bad = track("color", json!({ "from": "red", "to": "#00ff00" }));
    let err = render_track(&bad, &NodeId::from("c1"), 0.0).unwrap_err();
    assert!(err.contains("color track 'color'"), "{err}");
}
