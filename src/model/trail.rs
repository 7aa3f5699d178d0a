//! The trail: one execution run's complete provenance graph.
//!
//! A trail owns its entire graph: schema subgraph, populated tables,
//! rows, values, and usage log. All lineage edges are points-to
//! relations into the trail's own arenas; deleting the trail deletes
//! everything. The trail is append-only during its run and read-only
//! once sealed.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::data::{Payload, PopulatedTable, Row, RowKind, Value, ValueKind};
use super::schema::{ColumnKind, ColumnTarget, MetaDataTrail, TableCreationFunction, TableKind};
use super::usage::UsageLog;
use super::{ColumnId, PopulatedTableId, RowId, TableId, TrailId, ValueId};
use crate::error::{TrailError, TrailResult};

/// Registration request for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSpec {
    /// A table sourced directly from storage.
    Database,
    /// A table produced by a derivation over other tables, named by the
    /// tables it reads.
    Derived {
        source_text: Option<String>,
        source_tables: Vec<String>,
    },
}

/// Registration request for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    /// A column sourced directly from storage.
    Field,
    /// A computed column with its source text and the textual references
    /// (`table.column` or bare `column`) it reads.
    Function {
        source_text: String,
        references: Vec<String>,
    },
}

/// Outcome of a column registration. Reference-resolution failures do
/// not fail the registration; they are surfaced here and the affected
/// edges dropped.
#[derive(Debug, Clone)]
pub struct ColumnRegistration {
    pub column: ColumnId,
    /// False when an existing node was reused.
    pub created: bool,
    /// Per-reference failures: ambiguity, dangling targets, self-cycles.
    pub dropped: Vec<TrailError>,
}

/// One execution run's provenance graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trail {
    pub id: TrailId,
    pub name: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Opaque execution-context blob supplied by the computation engine.
    pub context: Option<serde_json::Value>,
    pub schema: MetaDataTrail,
    populated: Vec<PopulatedTable>,
    rows: Vec<Row>,
    values: Vec<Value>,
    usage: UsageLog,
}

impl Trail {
    pub fn new(name: impl Into<String>, context: Option<serde_json::Value>) -> Self {
        Self {
            id: TrailId::generate(),
            name: name.into(),
            created_at: unix_now(),
            context,
            schema: MetaDataTrail::new(),
            populated: Vec::new(),
            rows: Vec::new(),
            values: Vec::new(),
            usage: UsageLog::new(),
        }
    }

    // =========================================================================
    // Registration (schema subgraph)
    // =========================================================================

    /// Register a table, reusing the existing node if the name is known.
    ///
    /// For derived tables, source-table names that resolve are recorded
    /// as table-source edges; names never registered are dropped with a
    /// warning (the computation engine is expected to register tables
    /// before first use).
    pub fn register_table(&mut self, name: &str, spec: TableSpec) -> TableId {
        let kind = match spec {
            TableSpec::Database => TableKind::Database,
            TableSpec::Derived {
                source_text,
                source_tables,
            } => {
                let mut resolved = Vec::with_capacity(source_tables.len());
                for source in &source_tables {
                    match self.schema.table_by_name(source) {
                        Some(table) if table.name == name => {
                            warn!(table = name, "derived table lists itself as a source; edge dropped");
                        }
                        Some(table) => resolved.push(table.id),
                        None => {
                            warn!(
                                table = name,
                                source = source.as_str(),
                                "unknown source table for derived table; edge dropped"
                            );
                        }
                    }
                }
                TableKind::Derived(TableCreationFunction {
                    source_text,
                    source_tables: resolved,
                })
            }
        };
        self.schema.register_table(name, kind)
    }

    /// Register a column, reusing the existing node for the
    /// (table, name) pair. Function-column references are resolved
    /// current-table-first; each unresolvable reference fails
    /// individually without failing the registration.
    pub fn register_column(
        &mut self,
        table: TableId,
        name: &str,
        spec: ColumnSpec,
    ) -> TrailResult<ColumnRegistration> {
        let (kind, references) = match spec {
            ColumnSpec::Field => (ColumnKind::Field, Vec::new()),
            ColumnSpec::Function {
                source_text,
                references,
            } => (
                ColumnKind::Function {
                    source_text,
                    references: Vec::new(),
                },
                references,
            ),
        };

        let (column, created) = self.schema.register_column(table, name, kind)?;
        if !created {
            if !references.is_empty() {
                debug!(column = %column, "column already registered; skipping reference resolution");
            }
            return Ok(ColumnRegistration {
                column,
                created,
                dropped: Vec::new(),
            });
        }

        let mut resolved = Vec::new();
        let mut dropped = Vec::new();
        for reference in &references {
            let target = ColumnTarget::parse(reference);
            match self.schema.resolve(table, &target) {
                Ok(id) if id == column => {
                    let err = TrailError::CycleDetected {
                        cycles: vec![vec![format!("{}", column)]],
                    };
                    warn!(column = %column, reference = reference.as_str(), "column references itself; edge dropped");
                    dropped.push(err);
                }
                Ok(id) => {
                    if !resolved.contains(&id) {
                        resolved.push(id);
                    }
                }
                Err(err) => {
                    warn!(column = %column, reference = reference.as_str(), error = %err, "column reference dropped");
                    dropped.push(err);
                }
            }
        }
        self.schema.set_column_references(column, resolved);

        Ok(ColumnRegistration {
            column,
            created,
            dropped,
        })
    }

    // =========================================================================
    // Recording (data subgraph)
    // =========================================================================

    /// Record a row observation, creating the row if its key is new in
    /// the table's populated wrapper and attaching one field value per
    /// entry. Fields not yet known on the table are auto-registered.
    /// Source-row edges apply to derived tables only.
    pub fn record_row(
        &mut self,
        table: TableId,
        key: &str,
        fields: Vec<(String, Payload)>,
        sources: &[RowId],
    ) -> TrailResult<RowId> {
        let origin = self.schema.table(table)?.kind.origin();
        let populated = self.ensure_populated(table);

        let row = match self.populated[populated.index()].row_by_key(key) {
            Some(existing) => existing,
            None => {
                let id = RowId(self.rows.len() as u32);
                self.rows.push(Row {
                    id,
                    populated_table: populated,
                    key: key.to_string(),
                    kind: match origin {
                        super::TableOrigin::Database => RowKind::Database,
                        super::TableOrigin::Derived => RowKind::Derived,
                    },
                    values: Vec::new(),
                    sources: Vec::new(),
                });
                self.populated[populated.index()].insert_row(key, id);
                id
            }
        };

        for (field, payload) in fields {
            let (column, created) = self.schema.register_column(table, &field, ColumnKind::Field)?;
            if !created
                && matches!(
                    self.schema.columns()[column.index()].kind,
                    ColumnKind::Function { .. }
                )
            {
                warn!(
                    column = %column,
                    field = field.as_str(),
                    "field value recorded against a function column; keeping original kind"
                );
            }
            if self.value_of(row, column).is_some() {
                debug!(row = %row, column = %column, "field value already recorded; skipped");
                continue;
            }
            let id = ValueId(self.values.len() as u32);
            self.values.push(Value {
                id,
                row,
                column,
                kind: ValueKind::Field,
                payload,
                sources: Vec::new(),
            });
            self.rows[row.index()].values.push(id);
        }

        if !sources.is_empty() {
            if matches!(self.rows[row.index()].kind, RowKind::Database) {
                warn!(row = %row, "source rows given for a database row; edges dropped");
            } else {
                for &source in sources {
                    if source == row {
                        warn!(row = %row, "row lists itself as a source; edge dropped");
                        continue;
                    }
                    if source.index() >= self.rows.len() {
                        warn!(row = %row, source = %source, "dangling row source; edge dropped");
                        continue;
                    }
                    let row_sources = &mut self.rows[row.index()].sources;
                    if !row_sources.contains(&source) {
                        row_sources.push(source);
                    }
                }
            }
        }

        Ok(row)
    }

    /// Record a computed value on a row, typed by a function column of
    /// the row's table, with value-source edges to the values it was
    /// computed from. Re-recording the same (row, column) reuses the
    /// existing node.
    pub fn record_computed_value(
        &mut self,
        row: RowId,
        column: ColumnId,
        payload: Payload,
        sources: &[ValueId],
    ) -> TrailResult<ValueId> {
        let row_table = {
            let row = self.rows.get(row.index()).ok_or(TrailError::UnknownRow(row))?;
            self.populated[row.populated_table.index()].table
        };
        let col = self.schema.column(column)?;
        if col.table != row_table {
            return Err(TrailError::ColumnTableMismatch { column, row });
        }

        if let Some(existing) = self.value_of(row, column) {
            let value = &self.values[existing.index()];
            if value.payload != payload {
                warn!(
                    value = %existing,
                    "computed value re-recorded with a different payload; keeping original"
                );
            } else {
                debug!(value = %existing, "computed value already recorded; reused");
            }
            return Ok(existing);
        }

        let mut resolved = Vec::with_capacity(sources.len());
        for &source in sources {
            if source.index() >= self.values.len() {
                warn!(source = %source, "dangling value source; edge dropped");
                continue;
            }
            if !resolved.contains(&source) {
                resolved.push(source);
            }
        }

        let id = ValueId(self.values.len() as u32);
        self.values.push(Value {
            id,
            row,
            column,
            kind: ValueKind::Function,
            payload,
            sources: resolved,
        });
        self.rows[row.index()].values.push(id);
        Ok(id)
    }

    fn ensure_populated(&mut self, table: TableId) -> PopulatedTableId {
        if let Some(pt) = self.populated.iter().find(|pt| pt.table == table) {
            return pt.id;
        }
        let origin = self.schema.tables()[table.index()].kind.origin();
        let id = PopulatedTableId(self.populated.len() as u32);
        self.populated.push(PopulatedTable::new(id, table, origin));
        id
    }

    /// The existing value of (row, column), if any.
    fn value_of(&self, row: RowId, column: ColumnId) -> Option<ValueId> {
        self.rows.get(row.index()).and_then(|r| {
            r.values
                .iter()
                .copied()
                .find(|&v| self.values[v.index()].column == column)
        })
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn populated_tables(&self) -> &[PopulatedTable] {
        &self.populated
    }

    pub fn populated_for_table(&self, table: TableId) -> Option<&PopulatedTable> {
        self.populated.iter().find(|pt| pt.table == table)
    }

    pub fn populated_table(&self, id: PopulatedTableId) -> Option<&PopulatedTable> {
        self.populated.get(id.index())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> TrailResult<&Row> {
        self.rows.get(id.index()).ok_or(TrailError::UnknownRow(id))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, id: ValueId) -> TrailResult<&Value> {
        self.values
            .get(id.index())
            .ok_or(TrailError::UnknownValue(id))
    }

    pub fn usage(&self) -> &UsageLog {
        &self.usage
    }

    pub fn usage_mut(&mut self) -> &mut UsageLog {
        &mut self.usage
    }

    /// Rebuild the lookup indexes after deserialization.
    pub fn reindex(&mut self) {
        self.schema.reindex();
        for pt in &mut self.populated {
            pt.reindex(&self.rows);
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
