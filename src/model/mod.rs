//! Provenance data model: trails, schema entities, data entities, and
//! usage entities.
//!
//! Every entity belongs to exactly one [`Trail`]. Schema nodes (tables,
//! columns) live in the trail's [`MetaDataTrail`]; data nodes (populated
//! tables, rows, values) live in trail-owned arenas and carry their
//! lineage edges inline as typed id lists.

mod data;
mod ids;
mod schema;
mod trail;
mod usage;

pub use data::{Payload, PopulatedTable, Row, RowKind, Value, ValueKind};
pub use ids::{ColumnId, PopulatedTableId, RowId, TableId, TrailId, ValueId};
pub use schema::{
    Column, ColumnKind, ColumnTarget, MetaDataTrail, Table, TableCreationFunction, TableKind,
    TableOrigin,
};
pub use trail::{ColumnRegistration, ColumnSpec, TableSpec, Trail};
pub use usage::{CalculationSummary, UsageLog};
