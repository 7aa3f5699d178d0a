//! Usage recorder: the narrow channel through which a calculation
//! declares, after applying its filters, exactly which rows and fields
//! it relied on.
//!
//! This is strictly a subset of what the tracker observed and seeds the
//! pruned lineage view. Marking is idempotent; usage may only reference
//! nodes already present in the trail.

use std::collections::BTreeSet;

use crate::error::TrailResult;
use crate::model::{ColumnId, RowId};
use crate::store::SharedTrail;

/// Per-trail recorder of used rows and fields, keyed by calculation name.
#[derive(Debug, Clone)]
pub struct UsageRecorder {
    trail: SharedTrail,
}

impl UsageRecorder {
    pub(crate) fn new(trail: SharedTrail) -> Self {
        Self { trail }
    }

    /// Register a calculation before it reports, so "ran but used
    /// nothing" is distinguishable from "never ran".
    pub fn begin_calculation(&self, calculation: &str) {
        let mut trail = self.trail.write().unwrap_or_else(|e| e.into_inner());
        trail.usage_mut().begin(calculation);
    }

    /// Record that a row passed the calculation's filters and
    /// contributed to its result. Idempotent.
    pub fn mark_row_used(&self, calculation: &str, row: RowId) -> TrailResult<()> {
        let mut trail = self.trail.write().unwrap_or_else(|e| e.into_inner());
        trail.row(row)?;
        trail.usage_mut().mark_row(calculation, row);
        Ok(())
    }

    /// Record that a column was accessed by the calculation. Idempotent.
    pub fn mark_field_used(&self, calculation: &str, column: ColumnId) -> TrailResult<()> {
        let mut trail = self.trail.write().unwrap_or_else(|e| e.into_inner());
        trail.schema.column(column)?;
        trail.usage_mut().mark_field(calculation, column);
        Ok(())
    }

    /// Rows used by a calculation. Empty for unknown calculations; use
    /// [`UsageRecorder::is_known`] to tell the two apart.
    pub fn used_rows(&self, calculation: &str) -> BTreeSet<RowId> {
        let trail = self.trail.read().unwrap_or_else(|e| e.into_inner());
        trail.usage().rows(calculation)
    }

    /// Fields used by a calculation.
    pub fn used_fields(&self, calculation: &str) -> BTreeSet<ColumnId> {
        let trail = self.trail.read().unwrap_or_else(|e| e.into_inner());
        trail.usage().fields(calculation)
    }

    /// True if the calculation ever reported against this trail.
    pub fn is_known(&self, calculation: &str) -> bool {
        let trail = self.trail.read().unwrap_or_else(|e| e.into_inner());
        trail.usage().is_known(calculation)
    }

    /// All calculations that ever reported, including empty ones.
    pub fn known_calculations(&self) -> Vec<String> {
        let trail = self.trail.read().unwrap_or_else(|e| e.into_inner());
        trail
            .usage()
            .known_calculations()
            .map(str::to_string)
            .collect()
    }
}
