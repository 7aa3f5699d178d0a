//! Schema-level provenance entities: tables, columns, and the metadata
//! subgraph that owns them.
//!
//! Schema nodes are immutable once created within a trail and are created
//! at most once per distinct name; re-encountering a name reuses the
//! existing node (idempotent registration).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ColumnId, TableId};
use crate::error::{TrailError, TrailResult};

/// How a table came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableOrigin {
    /// Sourced directly from storage.
    Database,
    /// Produced by a table-creation function over other tables.
    Derived,
}

/// The function that materializes a derived table: its source text and
/// references to the tables it reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCreationFunction {
    /// Source text of the derivation, if the computation engine supplied it.
    pub source_text: Option<String>,
    /// Tables read by the derivation.
    pub source_tables: Vec<TableId>,
}

/// Table kind. Database tables carry field columns; derived tables carry
/// a creation function and computed columns. Both kinds may accumulate
/// both column variants as rows are recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableKind {
    Database,
    Derived(TableCreationFunction),
}

impl TableKind {
    pub fn origin(&self) -> TableOrigin {
        match self {
            TableKind::Database => TableOrigin::Database,
            TableKind::Derived(_) => TableOrigin::Derived,
        }
    }
}

/// A schema-level table node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub kind: TableKind,
    /// Columns in creation order.
    pub columns: Vec<ColumnId>,
}

/// Column kind. Field columns come straight from storage; function
/// columns own their source text and reference the columns they read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnKind {
    Field,
    Function {
        source_text: String,
        /// Column-reference lineage edges, in resolution order.
        references: Vec<ColumnId>,
    },
}

/// A schema-level column node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub table: TableId,
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    /// Columns this one reads (empty for field columns).
    pub fn references(&self) -> &[ColumnId] {
        match &self.kind {
            ColumnKind::Field => &[],
            ColumnKind::Function { references, .. } => references,
        }
    }
}

/// A textual column reference, either table-qualified (`table.column`)
/// or bare (`column`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    Qualified { table: String, column: String },
    Bare(String),
}

impl ColumnTarget {
    /// Parse from `table.column` or bare `column` form.
    pub fn parse(s: &str) -> Self {
        match s.split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                ColumnTarget::Qualified {
                    table: table.to_string(),
                    column: column.to_string(),
                }
            }
            _ => ColumnTarget::Bare(s.to_string()),
        }
    }
}

impl std::fmt::Display for ColumnTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnTarget::Qualified { table, column } => write!(f, "{}.{}", table, column),
            ColumnTarget::Bare(column) => write!(f, "{}", column),
        }
    }
}

/// The schema-level subgraph of a trail: all table and column nodes plus
/// name indexes for idempotent registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaDataTrail {
    tables: Vec<Table>,
    columns: Vec<Column>,
    /// Rebuilt on load; tuple keys do not survive JSON.
    #[serde(skip)]
    table_names: HashMap<String, TableId>,
    #[serde(skip)]
    column_names: HashMap<(TableId, String), ColumnId>,
}

impl MetaDataTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, reusing the existing node if the name is known.
    ///
    /// A kind mismatch on reuse is logged and the existing node wins; the
    /// schema subgraph is append-only and first registration is
    /// authoritative.
    pub fn register_table(&mut self, name: &str, kind: TableKind) -> TableId {
        if let Some(&id) = self.table_names.get(name) {
            if self.tables[id.index()].kind.origin() != kind.origin() {
                tracing::warn!(
                    table = name,
                    "table re-registered with a different kind; keeping original"
                );
            }
            return id;
        }
        let id = TableId(self.tables.len() as u32);
        self.tables.push(Table {
            id,
            name: name.to_string(),
            kind,
            columns: Vec::new(),
        });
        self.table_names.insert(name.to_string(), id);
        id
    }

    /// Register a column on a table, reusing the existing node if the
    /// (table, name) pair is known. References for function columns are
    /// resolved by the caller; this only stores the node.
    pub fn register_column(
        &mut self,
        table: TableId,
        name: &str,
        kind: ColumnKind,
    ) -> TrailResult<(ColumnId, bool)> {
        if table.index() >= self.tables.len() {
            return Err(TrailError::UnknownTable(table));
        }
        if let Some(&id) = self.column_names.get(&(table, name.to_string())) {
            return Ok((id, false));
        }
        let id = ColumnId(self.columns.len() as u32);
        self.columns.push(Column {
            id,
            table,
            name: name.to_string(),
            kind,
        });
        self.column_names.insert((table, name.to_string()), id);
        self.tables[table.index()].columns.push(id);
        Ok((id, true))
    }

    /// Attach resolved references to an already-registered function column.
    pub(crate) fn set_column_references(&mut self, column: ColumnId, refs: Vec<ColumnId>) {
        if let Some(col) = self.columns.get_mut(column.index()) {
            if let ColumnKind::Function { references, .. } = &mut col.kind {
                *references = refs;
            }
        }
    }

    pub fn table(&self, id: TableId) -> TrailResult<&Table> {
        self.tables
            .get(id.index())
            .ok_or(TrailError::UnknownTable(id))
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.table_names
            .get(name)
            .map(|id| &self.tables[id.index()])
    }

    pub fn column(&self, id: ColumnId) -> TrailResult<&Column> {
        self.columns
            .get(id.index())
            .ok_or(TrailError::UnknownColumn(id))
    }

    pub fn column_by_name(&self, table: TableId, name: &str) -> Option<ColumnId> {
        self.column_names.get(&(table, name.to_string())).copied()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Resolve a column reference relative to `current` table.
    ///
    /// Qualified references look up exactly that table and column. Bare
    /// references prefer an exact match on the current table; otherwise
    /// all sibling tables are searched, and a tie is an
    /// [`TrailError::AmbiguousReference`] rather than an arbitrary pick.
    pub fn resolve(&self, current: TableId, target: &ColumnTarget) -> TrailResult<ColumnId> {
        match target {
            ColumnTarget::Qualified { table, column } => {
                let table = self
                    .table_by_name(table)
                    .ok_or_else(|| TrailError::UnknownTableName(table.clone()))?;
                self.column_by_name(table.id, column)
                    .ok_or_else(|| TrailError::DanglingReference {
                        kind: "column",
                        target: format!("{}.{}", table.name, column),
                    })
            }
            ColumnTarget::Bare(name) => {
                if let Some(id) = self.column_by_name(current, name) {
                    return Ok(id);
                }
                let matches: Vec<ColumnId> = self
                    .columns
                    .iter()
                    .filter(|c| c.table != current && c.name == *name)
                    .map(|c| c.id)
                    .collect();
                match matches.as_slice() {
                    [] => Err(TrailError::DanglingReference {
                        kind: "column",
                        target: name.clone(),
                    }),
                    [only] => Ok(*only),
                    many => Err(TrailError::AmbiguousReference {
                        name: name.clone(),
                        candidates: many
                            .iter()
                            .map(|id| {
                                let col = &self.columns[id.index()];
                                let table = &self.tables[col.table.index()];
                                format!("{}.{}", table.name, col.name)
                            })
                            .collect(),
                    }),
                }
            }
        }
    }

    /// Rebuild the name indexes after deserialization.
    pub(crate) fn reindex(&mut self) {
        self.table_names = self
            .tables
            .iter()
            .map(|t| (t.name.clone(), t.id))
            .collect();
        self.column_names = self
            .columns
            .iter()
            .map(|c| ((c.table, c.name.clone()), c.id))
            .collect();
    }
}
