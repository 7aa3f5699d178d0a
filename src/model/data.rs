//! Data-level provenance entities: populated tables, rows, and values.
//!
//! One populated wrapper exists per schema table actually touched during
//! a run. Rows and values are created as they are observed and carry
//! their lineage edges (row sources, value sources) inline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ColumnId, PopulatedTableId, RowId, TableId, TableOrigin, ValueId};

/// A per-trail instance of a schema table, owning the rows observed for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulatedTable {
    pub id: PopulatedTableId,
    pub table: TableId,
    /// Database instance or evaluated derived instance, mirroring the
    /// schema table's kind at population time.
    pub origin: TableOrigin,
    /// Rows in creation order.
    pub rows: Vec<RowId>,
    /// Rebuilt on load.
    #[serde(skip)]
    row_keys: HashMap<String, RowId>,
}

impl PopulatedTable {
    pub(crate) fn new(id: PopulatedTableId, table: TableId, origin: TableOrigin) -> Self {
        Self {
            id,
            table,
            origin,
            rows: Vec::new(),
            row_keys: HashMap::new(),
        }
    }

    /// Look up a row by its stable key.
    pub fn row_by_key(&self, key: &str) -> Option<RowId> {
        self.row_keys.get(key).copied()
    }

    pub(crate) fn insert_row(&mut self, key: &str, row: RowId) {
        self.rows.push(row);
        self.row_keys.insert(key.to_string(), row);
    }

    pub(crate) fn reindex(&mut self, rows: &[Row]) {
        self.row_keys = self
            .rows
            .iter()
            .map(|&id| (rows[id.index()].key.clone(), id))
            .collect();
    }
}

/// Row kind tag. Derived rows carry source references to the upstream
/// rows they were computed from; database rows never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    Database,
    Derived,
}

/// A row observed during the run, with a key unique within its populated
/// table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub populated_table: PopulatedTableId,
    pub key: String,
    pub kind: RowKind,
    /// Values in creation order.
    pub values: Vec<ValueId>,
    /// Row-source lineage edges (derived rows only).
    pub sources: Vec<RowId>,
}

/// Value kind tag. Field values come from storage via row recording;
/// evaluated function values carry source references to the values they
/// were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Field,
    Function,
}

/// The payload of a value cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Number(f64),
    Text(String),
    Null,
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Payload::Number(n)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Number(n as f64)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Number(n) => write!(f, "{}", n),
            Payload::Text(s) => write!(f, "{}", s),
            Payload::Null => write!(f, "null"),
        }
    }
}

/// A value cell, belonging to exactly one row and typed by exactly one
/// column of that row's table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    pub id: ValueId,
    pub row: RowId,
    pub column: ColumnId,
    pub kind: ValueKind,
    pub payload: Payload,
    /// Value-source lineage edges (function values only).
    pub sources: Vec<ValueId>,
}
