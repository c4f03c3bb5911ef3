use super::*;

#[test]
fn codes_serialize_to_stable_names() {
    let s = serde_json::to_string(&DiagnosticCode::DuplicateObjectIds).unwrap();
    assert_eq!(s, "\"ErrDuplicateObjectIds\"");
    for code in [
        DiagnosticCode::SceneRequired,
        DiagnosticCode::TooManyScenes,
        DiagnosticCode::CircularDependency,
        DiagnosticCode::MissingInsertConnection,
        DiagnosticCode::InvalidConnection,
        DiagnosticCode::NodeValidationFailed,
        DiagnosticCode::SceneValidationFailed,
    ] {
        let json = serde_json::to_value(code).unwrap();
        assert_eq!(json.as_str(), Some(code.as_str()));
    }
}

#[test]
fn diagnostic_wire_shape_omits_empty_lists() {
    let d = Diagnostic::warning(DiagnosticCode::InvalidConnection, "dangling edge 'e9'");
    let v = serde_json::to_value(&d).unwrap();
    assert_eq!(
        v,
        serde_json::json!({
            "code": "ErrInvalidConnection",
            "message": "dangling edge 'e9'",
            "severity": "warning"
        })
    );

    let d = Diagnostic::error(DiagnosticCode::DuplicateObjectIds, "dup")
        .with_nodes([NodeId::from("c1")])
        .suggest("add a merge node");
    let v = serde_json::to_value(&d).unwrap();
    assert_eq!(v["nodes"], serde_json::json!(["c1"]));
    assert_eq!(v["suggestions"], serde_json::json!(["add a merge node"]));
}

#[test]
fn diagnostics_display_one_line_each() {
    let ds = Diagnostics {
        entries: vec![
            Diagnostic::error(DiagnosticCode::SceneRequired, "no scene"),
            Diagnostic::warning(DiagnosticCode::InvalidConnection, "dangling"),
        ],
    };
    assert_eq!(
        ds.to_string(),
        "error[ErrSceneRequired]: no scene\nwarning[ErrInvalidConnection]: dangling"
    );
    assert!(ds.has(DiagnosticCode::SceneRequired));
    assert!(!ds.has(DiagnosticCode::TooManyScenes));
    assert_eq!(ds.errors().count(), 1);
    assert!(ds.has_errors());
}
