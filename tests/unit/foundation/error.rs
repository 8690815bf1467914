use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        EneftyError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        EneftyError::precondition("x")
            .to_string()
            .contains("precondition failed:")
    );
    assert!(
        EneftyError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        EneftyError::persist("x")
            .to_string()
            .contains("persist error:")
    );
    assert!(
        EneftyError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = EneftyError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
