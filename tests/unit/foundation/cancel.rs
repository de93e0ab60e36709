use super::*;

#[test]
fn unbounded_guard_passes() {
    let guard = RunGuard::unbounded();
    assert!(guard.check("decode").is_ok());
    assert!(!guard.expired());
}

#[test]
fn cancel_is_seen_by_clones() {
    let token = CancelToken::new();
    let guard = RunGuard::new(token.clone(), None);
    token.cancel();
    assert!(matches!(
        guard.check("canvas"),
        Err(LufsError::Cancelled { stage: "canvas" })
    ));
    assert!(!guard.expired());
}

#[test]
fn zero_timeout_expires_immediately() {
    let guard = RunGuard::new(CancelToken::new(), Some(Duration::ZERO));
    assert!(guard.expired());
    assert!(matches!(
        guard.check("artwork"),
        Err(LufsError::TimedOut { stage: "artwork" })
    ));
}

#[test]
fn generous_timeout_does_not_fire() {
    let guard = RunGuard::new(CancelToken::new(), Some(Duration::from_secs(3600)));
    assert!(guard.check("spectrogram").is_ok());
}
