//! Integration tests for the trail model.
//!
//! These tests exercise registration and recording directly on a
//! `Trail`, covering idempotence, lineage edges, and serialization.

use trailgraph::model::{ColumnSpec, Payload, RowKind, TableKind, TableSpec, Trail};
use trailgraph::query::validate_acyclic;

#[test]
fn test_trail_has_identity_and_context() {
    let trail = Trail::new("quarterly-run", Some(serde_json::json!({"period": "2026-Q2"})));
    assert_eq!(trail.name, "quarterly-run");
    assert!(trail.created_at > 0);
    assert_eq!(
        trail.context.as_ref().unwrap()["period"],
        serde_json::json!("2026-Q2")
    );
}

#[test]
fn test_table_registration_is_idempotent() {
    let mut trail = Trail::new("run", None);
    let a = trail.register_table("trades", TableSpec::Database);
    let b = trail.register_table("trades", TableSpec::Database);
    assert_eq!(a, b);
    assert_eq!(trail.schema.tables().len(), 1);
}

#[test]
fn test_column_registration_is_idempotent() {
    let mut trail = Trail::new("run", None);
    let t1 = trail.register_table("trades", TableSpec::Database);
    let a = trail.register_column(t1, "amount", ColumnSpec::Field).unwrap();
    let b = trail.register_column(t1, "amount", ColumnSpec::Field).unwrap();
    assert_eq!(a.column, b.column);
    assert!(a.created);
    assert!(!b.created);
    assert_eq!(trail.schema.columns().len(), 1);
}

#[test]
fn test_derived_table_records_source_edges() {
    let mut trail = Trail::new("run", None);
    let t1 = trail.register_table("trades", TableSpec::Database);
    let t2 = trail.register_table(
        "agg",
        TableSpec::Derived {
            source_text: Some("group trades by desk".into()),
            source_tables: vec!["trades".into(), "never_registered".into()],
        },
    );

    let table = trail.schema.table(t2).unwrap();
    match &table.kind {
        TableKind::Derived(creation) => {
            // The dangling source was dropped, the real one kept.
            assert_eq!(creation.source_tables, vec![t1]);
            assert_eq!(creation.source_text.as_deref(), Some("group trades by desk"));
        }
        TableKind::Database => panic!("expected derived table"),
    }
}

#[test]
fn test_row_kind_follows_table_kind() {
    let mut trail = Trail::new("run", None);
    let t1 = trail.register_table("trades", TableSpec::Database);
    let t2 = trail.register_table(
        "agg",
        TableSpec::Derived {
            source_text: None,
            source_tables: vec!["trades".into()],
        },
    );
    let r1 = trail
        .record_row(t1, "r1", vec![("amount".into(), Payload::Number(5.0))], &[])
        .unwrap();
    let d1 = trail.record_row(t2, "d1", Vec::new(), &[r1]).unwrap();

    assert_eq!(trail.row(r1).unwrap().kind, RowKind::Database);
    assert_eq!(trail.row(d1).unwrap().kind, RowKind::Derived);
}

#[test]
fn test_values_are_typed_by_columns_of_the_rows_table() {
    let mut trail = Trail::new("run", None);
    let t1 = trail.register_table("trades", TableSpec::Database);
    let r1 = trail
        .record_row(t1, "r1", vec![("amount".into(), Payload::Number(5.0))], &[])
        .unwrap();

    let row = trail.row(r1).unwrap();
    for &value_id in &row.values {
        let value = trail.value(value_id).unwrap();
        let column = trail.schema.column(value.column).unwrap();
        assert_eq!(column.table, t1);
        assert_eq!(value.row, r1);
    }
}

#[test]
fn test_recorded_trail_is_a_dag() {
    let mut trail = Trail::new("run", None);
    let t1 = trail.register_table("trades", TableSpec::Database);
    let r1 = trail
        .record_row(t1, "r1", vec![("amount".into(), Payload::Number(5.0))], &[])
        .unwrap();
    let t2 = trail.register_table(
        "agg",
        TableSpec::Derived {
            source_text: None,
            source_tables: vec!["trades".into()],
        },
    );
    let d1 = trail.record_row(t2, "d1", Vec::new(), &[r1]).unwrap();
    let reg = trail
        .register_column(
            t2,
            "total",
            ColumnSpec::Function {
                source_text: "sum(amount)".into(),
                references: vec!["trades.amount".into()],
            },
        )
        .unwrap();
    let amount = trail.row(r1).unwrap().values[0];
    trail
        .record_computed_value(d1, reg.column, Payload::Number(5.0), &[amount])
        .unwrap();

    assert!(validate_acyclic(&trail).is_ok());
}

#[test]
fn test_trail_serialization_round_trip() {
    let mut trail = Trail::new("run", None);
    let t1 = trail.register_table("trades", TableSpec::Database);
    trail
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

    let json = serde_json::to_string(&trail).unwrap();
    let mut restored: Trail = serde_json::from_str(&json).unwrap();
    restored.reindex();

    assert_eq!(restored.id, trail.id);
    assert_eq!(restored.rows().len(), 1);
    assert_eq!(restored.values().len(), 2);
    let t1_restored = restored.schema.table_by_name("trades").unwrap().id;
    assert_eq!(t1_restored, t1);
}
