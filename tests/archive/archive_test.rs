//! Integration tests for the trail archive.
//!
//! These tests round-trip sealed trails through the SQLite archive and
//! verify queries behave identically on restored trails.

use trailgraph::archive::TrailArchive;
use trailgraph::model::{ColumnSpec, Payload, TableSpec};
use trailgraph::{LineageFilter, TrailId, TrailStore};

fn populated_store() -> (TrailStore, TrailId) {
    let store = TrailStore::new();
    let id = store.create_trail("run-1", Some(serde_json::json!({"period": "2026-Q2"})));
    let tracker = store.tracker(&id).unwrap();
    let usage = store.usage(&id).unwrap();

    let t1 = tracker.register_table("trades", TableSpec::Database);
    let r1 = tracker
        .record_row(t1, "r1", vec![("amount".into(), Payload::Number(5.0))], &[])
        .unwrap();
    let t2 = tracker.register_table(
        "agg",
        TableSpec::Derived {
            source_text: None,
            source_tables: vec!["trades".into()],
        },
    );
    let total = tracker
        .register_column(
            t2,
            "total",
            ColumnSpec::Function {
                source_text: "sum(amount)".into(),
                references: vec!["trades.amount".into()],
            },
        )
        .unwrap()
        .column;
    let d1 = tracker.record_row(t2, "d1", Vec::new(), &[r1]).unwrap();
    tracker
        .record_computed_value(d1, total, Payload::Number(5.0), &[])
        .unwrap();
    usage.mark_row_used("C1", d1).unwrap();
    usage.mark_field_used("C1", total).unwrap();

    (store, id)
}

#[test]
fn test_archive_round_trip_preserves_queries() {
    let archive = TrailArchive::open_in_memory().unwrap();
    let (store, id) = populated_store();

    let sealed = store.export_trail(&id).unwrap();
    archive.save(&sealed).unwrap();
    store.delete_trail(&id);

    let restored = archive.load(&id).unwrap().unwrap();
    let fresh = TrailStore::new();
    let restored_id = fresh.insert_trail(restored);
    assert_eq!(restored_id, id);

    // Queries behave identically against the restored trail.
    let summary = fresh.calculation_summary(&id).unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].used_row_count, 1);
    assert_eq!(summary[0].used_field_count, 1);

    let graph = fresh
        .filtered_lineage(&id, &LineageFilter::for_calculation("C1"))
        .unwrap();
    assert!(!graph.nodes.is_empty());
}

#[test]
fn test_restored_trail_accepts_further_tracking() {
    let archive = TrailArchive::open_in_memory().unwrap();
    let (store, id) = populated_store();
    archive.save(&store.export_trail(&id).unwrap()).unwrap();

    let fresh = TrailStore::new();
    fresh.insert_trail(archive.load(&id).unwrap().unwrap());
    let tracker = fresh.tracker(&id).unwrap();

    // Rebuilt indexes mean registration stays idempotent.
    let t1 = tracker.register_table("trades", TableSpec::Database);
    fresh
        .with_trail(&id, |trail| {
            assert_eq!(trail.schema.tables().len(), 2);
            assert_eq!(trail.schema.table_by_name("trades").unwrap().id, t1);
        })
        .unwrap();
}

#[test]
fn test_save_replaces_previous_copy() {
    let archive = TrailArchive::open_in_memory().unwrap();
    let (store, id) = populated_store();
    let sealed = store.export_trail(&id).unwrap();

    archive.save(&sealed).unwrap();
    archive.save(&sealed).unwrap();

    let listed = archive.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].name, "run-1");
}

#[test]
fn test_delete_removes_whole_graph() {
    let archive = TrailArchive::open_in_memory().unwrap();
    let (store, id) = populated_store();
    archive.save(&store.export_trail(&id).unwrap()).unwrap();

    assert!(archive.delete(&id).unwrap());
    assert!(archive.load(&id).unwrap().is_none());
    assert_eq!(archive.stats().unwrap().trail_count, 0);
}

#[test]
fn test_stats_track_archived_size() {
    let archive = TrailArchive::open_in_memory().unwrap();
    let (store, id) = populated_store();
    archive.save(&store.export_trail(&id).unwrap()).unwrap();

    let stats = archive.stats().unwrap();
    assert_eq!(stats.trail_count, 1);
    assert!(stats.total_size_bytes > 0);
}
