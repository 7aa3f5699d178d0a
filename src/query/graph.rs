//! Read-only lineage graph structures returned by queries.
//!
//! The output is a node list plus an edge list with stable, serializable
//! identifiers, suitable for rendering downstream. Node order is
//! deterministic: entity kind first, creation order within a kind.
//! Edges are only ever emitted when both endpoints are present in the
//! same result, so query output can never dangle.

use serde::{Deserialize, Serialize};

use crate::model::{
    Column, ColumnId, PopulatedTable, PopulatedTableId, Row, RowId, Table, TableId, TableKind,
    Trail, TrailId, Value, ValueId,
};

/// A typed reference to any node in a trail's graph.
///
/// Variant order doubles as the kind rank for deterministic output, and
/// the derived `Ord` therefore sorts by (kind, creation order).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum NodeRef {
    Table(TableId),
    Column(ColumnId),
    PopulatedTable(PopulatedTableId),
    Row(RowId),
    Value(ValueId),
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRef::Table(id) => write!(f, "{}", id),
            NodeRef::Column(id) => write!(f, "{}", id),
            NodeRef::PopulatedTable(id) => write!(f, "{}", id),
            NodeRef::Row(id) => write!(f, "{}", id),
            NodeRef::Value(id) => write!(f, "{}", id),
        }
    }
}

/// The relation an edge records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EdgeKind {
    /// Column -> owning table.
    BelongsTo,
    /// Populated table -> schema table.
    Populates,
    /// Row -> owning populated table.
    RowOf,
    /// Value -> owning row.
    ValueOf,
    /// Value -> typing column.
    TypedBy,
    /// Derived table -> source table read by its creation function.
    TableSource,
    /// Function column -> column it reads.
    ColumnReference,
    /// Derived row -> upstream row it was derived from.
    RowSource,
    /// Evaluated value -> upstream value it was computed from.
    ValueSource,
}

impl EdgeKind {
    /// True for the lineage relations the backward closure follows.
    pub fn is_lineage(self) -> bool {
        matches!(
            self,
            EdgeKind::ColumnReference | EdgeKind::RowSource | EdgeKind::ValueSource
        )
    }
}

/// A directed edge; `from` depends on / belongs to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub kind: EdgeKind,
    pub from: NodeRef,
    pub to: NodeRef,
}

/// A node with its full payload, for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GraphNode {
    Table(Table),
    Column(Column),
    PopulatedTable(PopulatedTable),
    Row(Row),
    Value(Value),
}

impl GraphNode {
    pub fn node_ref(&self) -> NodeRef {
        match self {
            GraphNode::Table(t) => NodeRef::Table(t.id),
            GraphNode::Column(c) => NodeRef::Column(c.id),
            GraphNode::PopulatedTable(pt) => NodeRef::PopulatedTable(pt.id),
            GraphNode::Row(r) => NodeRef::Row(r.id),
            GraphNode::Value(v) => NodeRef::Value(v.id),
        }
    }
}

/// Node and edge counts by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub tables: usize,
    pub columns: usize,
    pub populated_tables: usize,
    pub rows: usize,
    pub values: usize,
    pub edges: usize,
}

/// A complete or pruned view of one trail's provenance graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageGraph {
    pub trail: TrailId,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<LineageEdge>,
}

impl LineageGraph {
    /// The complete, unfiltered graph of a trail.
    pub fn full(trail: &Trail) -> Self {
        let mut nodes = Vec::new();
        for table in trail.schema.tables() {
            nodes.push(GraphNode::Table(table.clone()));
        }
        for column in trail.schema.columns() {
            nodes.push(GraphNode::Column(column.clone()));
        }
        for pt in trail.populated_tables() {
            nodes.push(GraphNode::PopulatedTable(pt.clone()));
        }
        for row in trail.rows() {
            nodes.push(GraphNode::Row(row.clone()));
        }
        for value in trail.values() {
            nodes.push(GraphNode::Value(value.clone()));
        }

        let edges = edges_for(trail, |_| true);
        Self {
            trail: trail.id.clone(),
            nodes,
            edges,
        }
    }

    pub fn node_refs(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.nodes.iter().map(GraphNode::node_ref)
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.nodes.iter().any(|n| n.node_ref() == node)
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            edges: self.edges.len(),
            ..GraphStats::default()
        };
        for node in &self.nodes {
            match node {
                GraphNode::Table(_) => stats.tables += 1,
                GraphNode::Column(_) => stats.columns += 1,
                GraphNode::PopulatedTable(_) => stats.populated_tables += 1,
                GraphNode::Row(_) => stats.rows += 1,
                GraphNode::Value(_) => stats.values += 1,
            }
        }
        stats
    }
}

/// Emit every edge of the trail whose endpoints both satisfy `include`,
/// in deterministic (owner kind, creation) order.
pub(crate) fn edges_for(trail: &Trail, include: impl Fn(NodeRef) -> bool) -> Vec<LineageEdge> {
    let mut edges = Vec::new();
    let mut push = |kind: EdgeKind, from: NodeRef, to: NodeRef| {
        if include(from) && include(to) {
            edges.push(LineageEdge { kind, from, to });
        }
    };

    for table in trail.schema.tables() {
        if let TableKind::Derived(creation) = &table.kind {
            for &source in &creation.source_tables {
                push(
                    EdgeKind::TableSource,
                    NodeRef::Table(table.id),
                    NodeRef::Table(source),
                );
            }
        }
    }
    for column in trail.schema.columns() {
        push(
            EdgeKind::BelongsTo,
            NodeRef::Column(column.id),
            NodeRef::Table(column.table),
        );
        for &reference in column.references() {
            push(
                EdgeKind::ColumnReference,
                NodeRef::Column(column.id),
                NodeRef::Column(reference),
            );
        }
    }
    for pt in trail.populated_tables() {
        push(
            EdgeKind::Populates,
            NodeRef::PopulatedTable(pt.id),
            NodeRef::Table(pt.table),
        );
    }
    for row in trail.rows() {
        push(
            EdgeKind::RowOf,
            NodeRef::Row(row.id),
            NodeRef::PopulatedTable(row.populated_table),
        );
        for &source in &row.sources {
            push(EdgeKind::RowSource, NodeRef::Row(row.id), NodeRef::Row(source));
        }
    }
    for value in trail.values() {
        push(
            EdgeKind::ValueOf,
            NodeRef::Value(value.id),
            NodeRef::Row(value.row),
        );
        push(
            EdgeKind::TypedBy,
            NodeRef::Value(value.id),
            NodeRef::Column(value.column),
        );
        for &source in &value.sources {
            push(
                EdgeKind::ValueSource,
                NodeRef::Value(value.id),
                NodeRef::Value(source),
            );
        }
    }
    edges
}
