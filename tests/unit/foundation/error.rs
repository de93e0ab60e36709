use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(LufsError::input("x").to_string().contains("input error:"));
    assert!(LufsError::render("x").to_string().contains("render error:"));
    assert!(LufsError::encode("x").to_string().contains("encode error:"));
    assert!(
        LufsError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn filesystem_error_names_the_path() {
    let err = LufsError::filesystem(
        "out/artwork/track.png",
        std::io::Error::other("disk full"),
    );
    let msg = err.to_string();
    assert!(msg.contains("out/artwork/track.png"));
    assert!(msg.contains("disk full"));
}

#[test]
fn only_encode_errors_are_recoverable() {
    assert!(!LufsError::encode("ffmpeg missing").is_fatal());
    assert!(LufsError::input("x").is_fatal());
    assert!(LufsError::render("x").is_fatal());
    assert!(LufsError::Cancelled { stage: "canvas" }.is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LufsError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
