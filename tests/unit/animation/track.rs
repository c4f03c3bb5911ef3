use super::*;
use serde_json::json;

fn move_track() -> TrackDef {
    serde_json::from_value(json!({
        "type": "move",
        "start_offset": 0.5,
        "duration": 1.0,
        "easing": "out_cubic",
        "properties": { "from": { "x": 0, "y": 0 }, "to": { "x": 100, "y": 100 } }
    }))
    .unwrap()
}

#[test]
fn key_defaults_to_kind_name() {
    let t = move_track();
    assert_eq!(t.key(), "move");
    let named = TrackDef {
        id: Some("slide_in".to_owned()),
        ..t
    };
    assert_eq!(named.key(), "slide_in");
}

#[test]
fn view_round_trips_through_from_view() {
    let t = move_track();
    let back = t.from_view(t.view()).unwrap();
    assert_eq!(back, t);
}

#[test]
fn from_view_applies_overridden_timing() {
    let t = move_track();
    let mut v = t.view();
    v.insert("duration".to_owned(), json!(2.5));
    v.insert("easing".to_owned(), json!("linear"));
    let back = t.from_view(v).unwrap();
    assert_eq!(back.duration, 2.5);
    assert_eq!(back.easing, Ease::Linear);
    assert_eq!(back.end(), 3.0);
}

#[test]
fn from_view_rejects_non_numeric_timing() {
    let t = move_track();
    let mut v = t.view();
    v.insert("start_offset".to_owned(), json!("soon"));
    assert!(t.from_view(v).is_err());
}
