//! Unified error types for provenance tracking and querying.
//!
//! Tracking-path errors are deliberately split from query-path errors in
//! severity, not in type: a single enum keeps call sites simple, while the
//! tracker decides locally which variants are recoverable (logged, edge
//! dropped) and which are hard failures (unknown trail, unknown node).

use crate::model::{ColumnId, RowId, TableId, TrailId, ValueId};
use thiserror::Error;

/// Result type for trail operations.
pub type TrailResult<T> = Result<T, TrailError>;

/// Errors raised by the tracker, usage recorder, and query engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrailError {
    /// The addressed trail does not exist in the store.
    #[error("unknown trail: {0}")]
    UnknownTrail(TrailId),

    /// The addressed table does not exist in the trail.
    #[error("unknown table: {0}")]
    UnknownTable(TableId),

    /// A table was addressed by a name never registered in the trail.
    #[error("unknown table name: '{0}'")]
    UnknownTableName(String),

    /// The addressed column does not exist in the trail.
    #[error("unknown column: {0}")]
    UnknownColumn(ColumnId),

    /// The addressed row does not exist in the trail.
    #[error("unknown row: {0}")]
    UnknownRow(RowId),

    /// The addressed value does not exist in the trail.
    #[error("unknown value: {0}")]
    UnknownValue(ValueId),

    /// A bare column name matched more than one candidate during
    /// reference resolution. Fails that reference only; the candidates
    /// are reported as qualified `table.column` names.
    #[error("ambiguous column reference '{name}' - matches: {}. Qualify it.", candidates.join(", "))]
    AmbiguousReference {
        name: String,
        candidates: Vec<String>,
    },

    /// A lineage edge named a node not present in the trail. The edge is
    /// dropped; upstream computation may legitimately reference rows that
    /// were filtered out before tracking saw them.
    #[error("dangling {kind} reference '{target}' - edge dropped")]
    DanglingReference { kind: &'static str, target: String },

    /// A value was typed by a column belonging to a different table than
    /// its row's.
    #[error("column {column} does not belong to the table of row {row}")]
    ColumnTableMismatch { column: ColumnId, row: RowId },

    /// A filtered-lineage query named a calculation that never reported
    /// any usage against this trail.
    #[error("unknown calculation '{0}' for this trail")]
    UnknownCalculation(String),

    /// Lineage edges form a cycle. Each cycle is reported as a list of
    /// node descriptions.
    #[error("cycle detected in lineage references: {}", describe_cycles(cycles))]
    CycleDetected { cycles: Vec<Vec<String>> },
}

fn describe_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|cycle| cycle.join(" -> "))
        .collect::<Vec<_>>()
        .join("; ")
}
