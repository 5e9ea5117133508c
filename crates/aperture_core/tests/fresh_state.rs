use aperture_core::AppState;

#[test]
fn view_of_fresh_state_is_clean() {
    let mut state = AppState::new();
    let view = state.view();

    assert!(!view.dirty);
    assert!(view.ingest.enabled);
    assert_eq!(view.jobs.columns.len(), 4);
    assert!(!state.consume_dirty());
}
