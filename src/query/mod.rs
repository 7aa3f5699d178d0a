//! Query engine over sealed trails.
//!
//! Two query shapes: the complete graph ("show me everything") and the
//! reachability-pruned subgraph ("show me only what this calculation
//! actually used"), plus per-calculation usage summaries. Queries run
//! against the store under the trail's read lock and never mutate the
//! graph.

mod cycles;
mod filter;
mod graph;

pub use cycles::{detect_reference_cycles, validate_acyclic};
pub use filter::LineageFilter;
pub use graph::{EdgeKind, GraphNode, GraphStats, LineageEdge, LineageGraph, NodeRef};

use crate::error::TrailResult;
use crate::model::{CalculationSummary, TrailId};
use crate::store::TrailStore;

impl TrailStore {
    /// The complete graph of a trail: every node and every edge,
    /// deterministically ordered.
    pub fn full_lineage(&self, trail: &TrailId) -> TrailResult<LineageGraph> {
        self.with_trail(trail, LineageGraph::full)
    }

    /// The pruned graph of a trail: only nodes backward-reachable from
    /// the used rows/fields selected by the filter, plus their owners.
    pub fn filtered_lineage(
        &self,
        trail: &TrailId,
        filter: &LineageFilter,
    ) -> TrailResult<LineageGraph> {
        self.with_trail(trail, |t| filter::filtered(t, filter))?
    }

    /// One summary entry per calculation that reported at least one used
    /// row or field against the trail, sorted by name.
    pub fn calculation_summary(&self, trail: &TrailId) -> TrailResult<Vec<CalculationSummary>> {
        self.with_trail(trail, |t| t.usage().summaries())
    }

    /// Validate that a trail's lineage references form a DAG.
    pub fn validate_trail(&self, trail: &TrailId) -> TrailResult<()> {
        self.with_trail(trail, cycles::validate_acyclic)?
    }
}
