//! Usage entities: which rows and fields a named calculation actually
//! relied on after applying its filters.
//!
//! A calculation that reported nothing is still distinguishable from one
//! that never ran: the former has its name in the known set with empty
//! row/field sets, the latter is absent entirely.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{ColumnId, RowId};

/// Per-trail usage log, keyed by calculation name.
///
/// BTree containers keep summaries and set iteration deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageLog {
    rows: BTreeMap<String, BTreeSet<RowId>>,
    fields: BTreeMap<String, BTreeSet<ColumnId>>,
    /// Every calculation that reported anything, including empty reports.
    known: BTreeSet<String>,
}

/// One entry of the per-calculation summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub calculation: String,
    pub used_row_count: usize,
    pub used_field_count: usize,
}

impl UsageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a calculation name without marking anything used.
    pub fn begin(&mut self, calculation: &str) {
        self.known.insert(calculation.to_string());
    }

    /// Record a used row. Idempotent: repeats are no-ops.
    pub fn mark_row(&mut self, calculation: &str, row: RowId) {
        self.known.insert(calculation.to_string());
        self.rows
            .entry(calculation.to_string())
            .or_default()
            .insert(row);
    }

    /// Record a used field. Idempotent: repeats are no-ops.
    pub fn mark_field(&mut self, calculation: &str, column: ColumnId) {
        self.known.insert(calculation.to_string());
        self.fields
            .entry(calculation.to_string())
            .or_default()
            .insert(column);
    }

    /// True if the calculation ever reported against this trail.
    pub fn is_known(&self, calculation: &str) -> bool {
        self.known.contains(calculation)
    }

    /// All calculations that ever reported, including empty ones.
    pub fn known_calculations(&self) -> impl Iterator<Item = &str> {
        self.known.iter().map(String::as_str)
    }

    /// Rows used by one calculation. Empty for unknown or empty reports.
    pub fn rows(&self, calculation: &str) -> BTreeSet<RowId> {
        self.rows.get(calculation).cloned().unwrap_or_default()
    }

    /// Fields used by one calculation.
    pub fn fields(&self, calculation: &str) -> BTreeSet<ColumnId> {
        self.fields.get(calculation).cloned().unwrap_or_default()
    }

    /// Union of used rows across all calculations.
    pub fn all_rows(&self) -> BTreeSet<RowId> {
        self.rows.values().flatten().copied().collect()
    }

    /// Union of used fields across all calculations.
    pub fn all_fields(&self) -> BTreeSet<ColumnId> {
        self.fields.values().flatten().copied().collect()
    }

    /// One entry per calculation with at least one used row or field,
    /// sorted by name. Known-but-empty calculations are excluded here;
    /// list them via [`UsageLog::known_calculations`].
    pub fn summaries(&self) -> Vec<CalculationSummary> {
        self.known
            .iter()
            .filter_map(|name| {
                let used_row_count = self.rows.get(name).map_or(0, BTreeSet::len);
                let used_field_count = self.fields.get(name).map_or(0, BTreeSet::len);
                if used_row_count == 0 && used_field_count == 0 {
                    None
                } else {
                    Some(CalculationSummary {
                        calculation: name.clone(),
                        used_row_count,
                        used_field_count,
                    })
                }
            })
            .collect()
    }
}
