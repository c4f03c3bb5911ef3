use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        NodeflowError::payload("n1", "missing field `shape`")
            .to_string()
            .contains("payload error on node 'n1':")
    );
    assert!(
        NodeflowError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        NodeflowError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = NodeflowError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
