use pf_store::*;

#[test]
fn save_and_load_snapshot() {
    let temp_dir = std::env::temp_dir().join("pf_store_test");
    let _ = std::fs::remove_dir_all(&temp_dir);
    let path = temp_dir.join("state.json");

    let mut state = PlantState::default();
    state.valves.insert("V-R01-W1".into(), ValveState::Open);
    state.valves.insert("V-W1-FZ1".into(), ValveState::Closed);
    state.segments.insert(
        "SEG-R01-W1".into(),
        SegmentRow {
            valve: "V-R01-W1".into(),
            from: "R01_OUT".into(),
            to: "W1".into(),
        },
    );
    state.operations.insert(
        "op-1".into(),
        Operation {
            op_id: "op-1".into(),
            op_type: "transfer".into(),
            status: OpStatus::Active,
            source: "R01".into(),
            dest: "FZ1".into(),
            via: None,
            route: vec!["SEG-R01-W1".into()],
            started_at: "2026-08-28T12:00:00Z".into(),
            ended_at: None,
        },
    );
    state.reservations.push(ReservationEntry {
        op_id: "op-1".into(),
        segment: "SEG-R01-W1".into(),
    });

    let store = PlantStore::new(state.clone());
    store.save(&path).unwrap();

    let loaded = PlantStore::load(&path).unwrap();
    let loaded_state = loaded.read(|s| s.clone()).unwrap();
    assert_eq!(loaded_state, state);

    let active = loaded.list_active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].op_id, "op-1");
    assert_eq!(active[0].route, vec!["SEG-R01-W1".to_string()]);

    let _ = std::fs::remove_dir_all(&temp_dir);
}

#[test]
fn missing_snapshot_is_reported() {
    let path = std::env::temp_dir().join("pf_store_test_missing/state.json");
    let err = PlantStore::load(&path).unwrap_err();
    assert!(matches!(err, StoreError::SnapshotNotFound { .. }));
}
