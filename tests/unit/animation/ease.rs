use super::*;

#[test]
fn endpoints_are_fixed_for_every_curve() {
    for e in [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
    ] {
        assert_eq!(e.apply(0.0), 0.0, "{e:?}");
        assert_eq!(e.apply(1.0), 1.0, "{e:?}");
    }
}

#[test]
fn progress_is_clamped() {
    assert_eq!(Ease::Linear.apply(-1.0), 0.0);
    assert_eq!(Ease::InQuad.apply(2.0), 1.0);
}

#[test]
fn serde_names_are_snake_case() {
    let e: Ease = serde_json::from_str("\"in_out_cubic\"").unwrap();
    assert_eq!(e, Ease::InOutCubic);
    assert_eq!(serde_json::to_string(&Ease::OutQuad).unwrap(), "\"out_quad\"");
}
