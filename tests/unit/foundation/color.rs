use super::*;

#[test]
fn parses_hex_rgb_and_rgba() {
    let c = parse_hex("#ff0000").unwrap();
    assert_eq!(
        c,
        Rgba8 {
            r: 255,
            g: 0,
            b: 0,
            a: 255
        }
    );

    let c = parse_hex("0000FF80").unwrap();
    assert_eq!(c.b, 255);
    assert_eq!(c.a, 128);
}

#[test]
fn canonical_hex_is_lowercase_and_drops_opaque_alpha() {
    assert_eq!(parse_hex("#FF00Ff").unwrap().to_hex(), "#ff00ff");
    assert_eq!(parse_hex("#00ff0080").unwrap().to_hex(), "#00ff0080");
}

#[test]
fn rejects_bad_lengths_and_digits() {
    assert!(parse_hex("#fff").is_err());
    assert!(parse_hex("#gg0000").is_err());
    assert!(parse_hex("#ééé").is_err());
}
