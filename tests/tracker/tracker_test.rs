//! Integration tests for the tracker hooks.
//!
//! These tests drive the tracker through the store's public API,
//! covering reference resolution and the non-fatal observation contract.

use trailgraph::model::{ColumnSpec, Payload, TableId, TableSpec};
use trailgraph::{TrailError, TrailStore};

#[test]
fn test_register_table_twice_returns_same_node() {
    let store = TrailStore::new();
    let id = store.create_trail("run", None);
    let tracker = store.tracker(&id).unwrap();

    let a = tracker.register_table("trades", TableSpec::Database);
    let b = tracker.register_table("trades", TableSpec::Database);
    assert_eq!(a, b);
}

#[test]
fn test_function_column_resolves_qualified_references() {
    let store = TrailStore::new();
    let id = store.create_trail("run", None);
    let tracker = store.tracker(&id).unwrap();

    let t1 = tracker.register_table("trades", TableSpec::Database);
    let amount = tracker
        .register_column(t1, "amount", ColumnSpec::Field)
        .unwrap()
        .column;
    let t2 = tracker.register_table(
        "agg",
        TableSpec::Derived {
            source_text: None,
            source_tables: vec!["trades".into()],
        },
    );
    let reg = tracker
        .register_column(
            t2,
            "total",
            ColumnSpec::Function {
                source_text: "sum(trades.amount)".into(),
                references: vec!["trades.amount".into()],
            },
        )
        .unwrap();

    assert!(reg.dropped.is_empty());
    store
        .with_trail(&id, |trail| {
            let column = trail.schema.column(reg.column).unwrap();
            assert_eq!(column.references(), &[amount]);
        })
        .unwrap();
}

#[test]
fn test_bare_reference_prefers_current_table() {
    let store = TrailStore::new();
    let id = store.create_trail("run", None);
    let tracker = store.tracker(&id).unwrap();

    let t1 = tracker.register_table("trades", TableSpec::Database);
    tracker.register_column(t1, "amount", ColumnSpec::Field).unwrap();
    let t2 = tracker.register_table("positions", TableSpec::Database);
    let local_amount = tracker
        .register_column(t2, "amount", ColumnSpec::Field)
        .unwrap()
        .column;
    let reg = tracker
        .register_column(
            t2,
            "weighted",
            ColumnSpec::Function {
                source_text: "amount * weight".into(),
                references: vec!["amount".into()],
            },
        )
        .unwrap();

    assert!(reg.dropped.is_empty());
    store
        .with_trail(&id, |trail| {
            let column = trail.schema.column(reg.column).unwrap();
            assert_eq!(column.references(), &[local_amount]);
        })
        .unwrap();
}

#[test]
fn test_ambiguous_reference_fails_that_edge_only() {
    let store = TrailStore::new();
    let id = store.create_trail("run", None);
    let tracker = store.tracker(&id).unwrap();

    let t1 = tracker.register_table("trades", TableSpec::Database);
    tracker.register_column(t1, "amount", ColumnSpec::Field).unwrap();
    let t2 = tracker.register_table("positions", TableSpec::Database);
    tracker.register_column(t2, "amount", ColumnSpec::Field).unwrap();
    let t3 = tracker.register_table(
        "report",
        TableSpec::Derived {
            source_text: None,
            source_tables: vec!["trades".into(), "positions".into()],
        },
    );
    let quantity = tracker
        .register_column(t1, "quantity", ColumnSpec::Field)
        .unwrap()
        .column;

    let reg = tracker
        .register_column(
            t3,
            "exposure",
            ColumnSpec::Function {
                source_text: "amount * quantity".into(),
                references: vec!["amount".into(), "quantity".into()],
            },
        )
        .unwrap();

    // 'amount' is ambiguous across trades/positions; 'quantity' is not.
    assert_eq!(reg.dropped.len(), 1);
    assert!(matches!(
        reg.dropped[0],
        TrailError::AmbiguousReference { .. }
    ));
    store
        .with_trail(&id, |trail| {
            let column = trail.schema.column(reg.column).unwrap();
            assert_eq!(column.references(), &[quantity]);
        })
        .unwrap();
}

#[test]
fn test_record_row_auto_registers_fields() {
    let store = TrailStore::new();
    let id = store.create_trail("run", None);
    let tracker = store.tracker(&id).unwrap();

    let t1 = tracker.register_table("trades", TableSpec::Database);
    tracker
        .record_row(
            t1,
            "r1",
            vec![
                ("amount".into(), Payload::Number(5.0)),
                ("desk".into(), Payload::Text("emea".into())),
            ],
            &[],
        )
        .unwrap();

    store
        .with_trail(&id, |trail| {
            assert!(trail.schema.column_by_name(t1, "amount").is_some());
            assert!(trail.schema.column_by_name(t1, "desk").is_some());
        })
        .unwrap();
}

#[test]
fn test_dangling_row_source_is_dropped_not_fatal() {
    let store = TrailStore::new();
    let id = store.create_trail("run", None);
    let tracker = store.tracker(&id).unwrap();

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
    let d1 = tracker
        .record_row(t2, "d1", Vec::new(), &[r1, trailgraph::model::RowId(999)])
        .unwrap();

    store
        .with_trail(&id, |trail| {
            assert_eq!(trail.row(d1).unwrap().sources, vec![r1]);
        })
        .unwrap();
}

#[test]
fn test_computed_value_sources_recorded() {
    let store = TrailStore::new();
    let id = store.create_trail("run", None);
    let tracker = store.tracker(&id).unwrap();

    let t1 = tracker.register_table("trades", TableSpec::Database);
    let r1 = tracker
        .record_row(t1, "r1", vec![("amount".into(), Payload::Number(5.0))], &[])
        .unwrap();
    let reg = tracker
        .register_column(
            t1,
            "double",
            ColumnSpec::Function {
                source_text: "amount * 2".into(),
                references: vec!["amount".into()],
            },
        )
        .unwrap();

    let amount_value = store
        .with_trail(&id, |trail| trail.row(r1).unwrap().values[0])
        .unwrap();
    let v = tracker
        .record_computed_value(r1, reg.column, Payload::Number(10.0), &[amount_value])
        .unwrap();

    store
        .with_trail(&id, |trail| {
            let value = trail.value(v).unwrap();
            assert_eq!(value.sources, vec![amount_value]);
            assert_eq!(value.payload, Payload::Number(10.0));
        })
        .unwrap();
}

#[test]
fn test_tracking_failures_do_not_panic_the_computation() {
    let store = TrailStore::new();
    let id = store.create_trail("run", None);
    let tracker = store.tracker(&id).unwrap();

    // A business computation keeps its result even when every
    // tracking hook fails against a bogus table.
    let bogus = TableId(77);
    let business_result = 42.0;
    assert!(tracker.observe_row(bogus, "r1", Vec::new(), &[]).is_none());
    assert!(tracker
        .observe_column(bogus, "x", ColumnSpec::Field)
        .is_none());
    assert_eq!(business_result, 42.0);
}
