//! # Trailgraph
//!
//! Queryable provenance tracking for computed regulatory reports.
//!
//! As a computation engine derives report cells from raw source data, it
//! calls trailgraph's tracker hooks inline. Trailgraph builds a directed,
//! acyclic provenance graph (tables, columns, rows, values, and the
//! lineage edges between them) scoped to one run ("trail"), and later
//! answers two query shapes against it: the complete graph, or the
//! subgraph a specific named calculation actually used.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Computation Engine (out of scope, upstream)       │
//! └─────────────────────────────────────────────────────────┘
//!              │ register/record              │ mark used
//!              ▼ [tracker]                    ▼ [usage recorder]
//! ┌─────────────────────────────────────────────────────────┐
//! │          TrailStore (one locked Trail per run)           │
//! │   schema subgraph + populated tables + rows + values     │
//! └─────────────────────────────────────────────────────────┘
//!              │                              │
//!              ▼ [query]                      ▼ [archive]
//! ┌───────────────────────────────┐  ┌────────────────────────┐
//! │  full / filtered LineageGraph │  │  SQLite trail archive   │
//! │  + calculation summaries      │  │  (sealed trails)        │
//! └───────────────────────────────┘  └────────────────────────┘
//! ```
//!
//! Tracking is deliberately forgiving: a failed hook is logged and
//! dropped rather than failing the computation it observes. Queries are
//! strict: unknown trails and unknown calculations are errors, never
//! silent empty results.

pub mod archive;
pub mod error;
pub mod model;
pub mod query;
pub mod store;
pub mod tracker;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::archive::{ArchiveError, ArchiveResult, ArchivedTrail, TrailArchive};
    pub use crate::error::{TrailError, TrailResult};
    pub use crate::model::{
        CalculationSummary, ColumnId, ColumnSpec, Payload, PopulatedTableId, RowId, TableId,
        TableSpec, Trail, TrailId, ValueId,
    };
    pub use crate::query::{
        EdgeKind, GraphNode, GraphStats, LineageEdge, LineageFilter, LineageGraph, NodeRef,
    };
    pub use crate::store::TrailStore;
    pub use crate::tracker::{Tracker, UsageRecorder};
}

// Also export the main entry points at crate root for convenience
pub use error::{TrailError, TrailResult};
pub use model::{ColumnSpec, Payload, TableSpec, Trail, TrailId};
pub use query::{LineageFilter, LineageGraph};
pub use store::TrailStore;
pub use tracker::{Tracker, UsageRecorder};
