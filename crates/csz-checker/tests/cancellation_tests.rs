use super::*;

#[test]
fn test_new_token_is_not_cancelled() {
    assert!(!CancellationToken::new().is_cancelled());
}

#[test]
fn test_clones_share_cancellation() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
    assert!(clone.is_cancelled());
}

#[test]
fn test_cancel_is_visible_across_threads() {
    let token = CancellationToken::new();
    let remote = token.clone();
    std::thread::spawn(move || remote.cancel())
        .join()
        .expect("cancel thread");
    assert!(token.is_cancelled());
}
