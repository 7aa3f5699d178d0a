//! Instrumentation hooks for the computation engine.
//!
//! A [`Tracker`] is a handle bound to one trail, called inline on the
//! computation's own thread. Every operation is an append-only graph
//! write; none alters or blocks the caller's computed result. The
//! `observe_*` variants implement the non-fatal contract directly: any
//! failure is logged at warn level and swallowed, because the business
//! result takes priority over completeness of its lineage.

mod usage;

pub use usage::UsageRecorder;

use tracing::warn;

use crate::error::TrailResult;
use crate::model::{
    ColumnId, ColumnRegistration, ColumnSpec, Payload, RowId, TableId, TableSpec, ValueId,
};
use crate::store::SharedTrail;

/// Recorder of tables, columns, rows, and computed values for one trail.
#[derive(Debug, Clone)]
pub struct Tracker {
    trail: SharedTrail,
}

impl Tracker {
    pub(crate) fn new(trail: SharedTrail) -> Self {
        Self { trail }
    }

    /// Register a table by name. Idempotent: re-registration returns the
    /// existing node.
    pub fn register_table(&self, name: &str, spec: TableSpec) -> TableId {
        let mut trail = self.trail.write().unwrap_or_else(|e| e.into_inner());
        trail.register_table(name, spec)
    }

    /// Register a column on a table. Idempotent per (table, name).
    /// Function-column references that fail to resolve are surfaced in
    /// [`ColumnRegistration::dropped`] without failing the registration.
    pub fn register_column(
        &self,
        table: TableId,
        name: &str,
        spec: ColumnSpec,
    ) -> TrailResult<ColumnRegistration> {
        let mut trail = self.trail.write().unwrap_or_else(|e| e.into_inner());
        trail.register_column(table, name, spec)
    }

    /// Record a row observation with its field values and, for derived
    /// tables, the upstream rows it was derived from.
    pub fn record_row(
        &self,
        table: TableId,
        key: &str,
        fields: Vec<(String, Payload)>,
        sources: &[RowId],
    ) -> TrailResult<RowId> {
        let mut trail = self.trail.write().unwrap_or_else(|e| e.into_inner());
        trail.record_row(table, key, fields, sources)
    }

    /// Record a computed value with the upstream values it was computed
    /// from.
    pub fn record_computed_value(
        &self,
        row: RowId,
        column: ColumnId,
        payload: Payload,
        sources: &[ValueId],
    ) -> TrailResult<ValueId> {
        let mut trail = self.trail.write().unwrap_or_else(|e| e.into_inner());
        trail.record_computed_value(row, column, payload, sources)
    }

    // =========================================================================
    // Non-fatal variants
    // =========================================================================

    /// Like [`Tracker::register_column`], but logs failures and returns
    /// `None` instead of propagating them into the computation.
    pub fn observe_column(
        &self,
        table: TableId,
        name: &str,
        spec: ColumnSpec,
    ) -> Option<ColumnId> {
        match self.register_column(table, name, spec) {
            Ok(reg) => Some(reg.column),
            Err(err) => {
                warn!(column = name, error = %err, "column registration failed; lineage incomplete");
                None
            }
        }
    }

    /// Like [`Tracker::record_row`], but logs failures and returns `None`.
    pub fn observe_row(
        &self,
        table: TableId,
        key: &str,
        fields: Vec<(String, Payload)>,
        sources: &[RowId],
    ) -> Option<RowId> {
        match self.record_row(table, key, fields, sources) {
            Ok(row) => Some(row),
            Err(err) => {
                warn!(row = key, error = %err, "row recording failed; lineage incomplete");
                None
            }
        }
    }

    /// Like [`Tracker::record_computed_value`], but logs failures and
    /// returns `None`.
    pub fn observe_computed_value(
        &self,
        row: RowId,
        column: ColumnId,
        payload: Payload,
        sources: &[ValueId],
    ) -> Option<ValueId> {
        match self.record_computed_value(row, column, payload, sources) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(row = %row, column = %column, error = %err, "value recording failed; lineage incomplete");
                None
            }
        }
    }
}
