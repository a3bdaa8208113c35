#![allow(clippy::unwrap_used, clippy::expect_used)]

use inventory_core::errors::ExErrorKind;
use inventory_core::{CancelToken, ReconcileOutcome, SnapshotPhase};
use inventory_engine::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineCommandResult, EngineQuery,
    EngineQueryResult,
};
use inventory_store::SqliteStore;
use serde_json::json;
use tempfile::TempDir;

fn setup_store() -> (TempDir, SqliteStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::open(temp_dir.path().join("inventory.db")).unwrap();
    (temp_dir, store)
}

fn submit(store: &SqliteStore, name: &str, raw_data: serde_json::Value) -> String {
    match apply_engine_command(
        EngineCommand::SubmitSnapshot {
            name: name.to_string(),
            raw_data,
        },
        store,
        &CancelToken::new(),
    )
    .unwrap()
    {
        EngineCommandResult::Submitted { uid } => uid,
        other => panic!("unexpected result: {:?}", other),
    }
}

fn reconcile(store: &SqliteStore, uid: &str) -> ReconcileOutcome {
    match apply_engine_command(
        EngineCommand::ReconcileSnapshot {
            uid: uid.to_string(),
        },
        store,
        &CancelToken::new(),
    )
    .unwrap()
    {
        EngineCommandResult::Reconciled(outcome) => outcome,
        other => panic!("unexpected result: {:?}", other),
    }
}

fn snapshot_phase(store: &SqliteStore, uid: &str) -> Option<SnapshotPhase> {
    match apply_engine_query(
        EngineQuery::GetSnapshot {
            uid: uid.to_string(),
        },
        store,
    )
    .unwrap()
    {
        EngineQueryResult::Snapshot(s) => s.status.phase,
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_submit_then_reconcile() {
    let (_dir, store) = setup_store();
    let uid = submit(
        &store,
        "rack-12",
        json!([
            {"serialNumber": "R12-PSU", "parentSerialNumber": "R12"},
            {"serialNumber": "R12"}
        ]),
    );
    assert!(uid.starts_with("snap-"));
    assert_eq!(snapshot_phase(&store, &uid), None);

    let outcome = reconcile(&store, &uid);

    let ReconcileOutcome::Completed(summary) = outcome else {
        panic!("snapshot should be processed");
    };
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.links_updated, 1);
    assert_eq!(snapshot_phase(&store, &uid), Some(SnapshotPhase::Completed));

    // a second request for the same snapshot is a no-op
    assert_eq!(reconcile(&store, &uid), ReconcileOutcome::AlreadyCompleted);
}

#[test]
fn test_reconcile_unknown_uid_is_not_found() {
    let (_dir, store) = setup_store();
    let err = apply_engine_command(
        EngineCommand::ReconcileSnapshot {
            uid: "snap-ffffffff".to_string(),
        },
        &store,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_reconcile_pending_continues_past_failures() {
    // GIVEN one completed, one malformed and two fresh snapshots
    let (_dir, store) = setup_store();
    let done = submit(&store, "done", json!([{"serialNumber": "D"}]));
    reconcile(&store, &done);
    let bad = submit(&store, "bad", json!({"oops": true}));
    let first = submit(&store, "first", json!([{"serialNumber": "A"}]));
    let second = submit(&store, "second", json!([{"serialNumber": "B", "parentSerialNumber": "A"}]));

    // WHEN the pending sweep runs
    let result = apply_engine_command(EngineCommand::ReconcilePending, &store, &CancelToken::new())
        .unwrap();
    let EngineCommandResult::ReconciledPending(entries) = result else {
        panic!("unexpected result");
    };

    // THEN the completed snapshot is not picked up and the bad one does not stop the rest
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.uid != done));
    let entry = |uid: &str| entries.iter().find(|e| e.uid == uid).unwrap();
    assert_eq!(
        entry(&bad).result.as_ref().unwrap_err().kind(),
        ExErrorKind::PayloadDecode
    );
    assert!(entry(&first).is_ok());
    assert!(entry(&second).is_ok());

    assert_eq!(snapshot_phase(&store, &bad), Some(SnapshotPhase::Error));
    assert_eq!(snapshot_phase(&store, &first), Some(SnapshotPhase::Completed));
    assert_eq!(snapshot_phase(&store, &second), Some(SnapshotPhase::Completed));
}

#[test]
fn test_reconcile_pending_stops_on_cancel() {
    let (_dir, store) = setup_store();
    submit(&store, "never-run", json!([{"serialNumber": "A"}]));
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = apply_engine_command(EngineCommand::ReconcilePending, &store, &cancel).unwrap_err();

    assert!(err.is_cancelled());
}

#[test]
fn test_list_queries() {
    let (_dir, store) = setup_store();
    let uid = submit(
        &store,
        "listing",
        json!([{"serialNumber": "L1"}, {"serialNumber": "L2"}]),
    );
    reconcile(&store, &uid);

    let EngineQueryResult::Devices(devices) =
        apply_engine_query(EngineQuery::ListDevices, &store).unwrap()
    else {
        panic!("expected devices");
    };
    let mut serials: Vec<&str> = devices.iter().map(|d| d.serial_number()).collect();
    serials.sort();
    assert_eq!(serials, vec!["L1", "L2"]);

    let EngineQueryResult::Snapshots(snapshots) =
        apply_engine_query(EngineQuery::ListSnapshots, &store).unwrap()
    else {
        panic!("expected snapshots");
    };
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].uid(), uid);
}
