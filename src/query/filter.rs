//! Backward-reachable closure over lineage edges.
//!
//! Starting from the rows and fields a calculation reported as used, the
//! traversal follows source and reference edges toward their origins and
//! keeps every node visited. Owners of included nodes (populated tables,
//! schema tables) are pulled in alongside, and the values owned by an
//! included row are included so their own sources can be followed; the
//! used row's cells are part of what the calculation saw. A populated
//! table with no included rows never enters the result: an empty table
//! carries no lineage information.
//!
//! The graph is a DAG by construction (edges may only point at
//! already-created nodes), but the traversal still dedupes through a
//! visited set and warns on self-loops rather than trusting that
//! blindly.

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::warn;

use super::graph::{edges_for, GraphNode, LineageGraph, NodeRef};
use crate::error::{TrailError, TrailResult};
use crate::model::{ColumnId, RowId, TableKind, Trail};

/// Selection of which part of a trail's graph to return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageFilter {
    /// Restrict the seed set to one calculation; `None` unions the used
    /// rows/fields of every calculation recorded against the trail.
    pub calculation: Option<String>,
    /// Return the complete graph, bypassing pruning entirely.
    pub include_unused: bool,
}

impl LineageFilter {
    /// Prune to what one named calculation used.
    pub fn for_calculation(name: impl Into<String>) -> Self {
        Self {
            calculation: Some(name.into()),
            include_unused: false,
        }
    }

    /// Prune to what any calculation used.
    pub fn used_only() -> Self {
        Self::default()
    }

    /// Everything, unpruned.
    pub fn everything() -> Self {
        Self {
            calculation: None,
            include_unused: true,
        }
    }
}

/// Apply a filter to a trail's graph.
pub(crate) fn filtered(trail: &Trail, filter: &LineageFilter) -> TrailResult<LineageGraph> {
    if filter.include_unused {
        return Ok(LineageGraph::full(trail));
    }

    let (seed_rows, seed_fields) = match &filter.calculation {
        Some(name) => {
            if !trail.usage().is_known(name) {
                return Err(TrailError::UnknownCalculation(name.clone()));
            }
            (trail.usage().rows(name), trail.usage().fields(name))
        }
        None => (trail.usage().all_rows(), trail.usage().all_fields()),
    };

    let included = closure(trail, &seed_rows, &seed_fields);

    let mut refs: Vec<NodeRef> = included.iter().copied().collect();
    refs.sort();

    let mut nodes = Vec::with_capacity(refs.len());
    for node in refs {
        nodes.push(materialize(trail, node));
    }
    let edges = edges_for(trail, |node| included.contains(&node));

    Ok(LineageGraph {
        trail: trail.id.clone(),
        nodes,
        edges,
    })
}

/// Backward closure from the seed rows and fields.
fn closure(
    trail: &Trail,
    seed_rows: &BTreeSet<RowId>,
    seed_fields: &BTreeSet<ColumnId>,
) -> HashSet<NodeRef> {
    let mut visited: HashSet<NodeRef> = HashSet::new();
    let mut queue: VecDeque<NodeRef> = VecDeque::new();

    // Seeds and edges may dangle on trails produced outside the recording
    // API (e.g. loaded from an archive); such nodes are dropped with a
    // warning, never included.
    let mut enqueue = |node: NodeRef, visited: &mut HashSet<NodeRef>, queue: &mut VecDeque<NodeRef>| {
        if !exists(trail, node) {
            warn!(node = %node, "dangling lineage reference; dropped from filtered view");
            return;
        }
        if visited.insert(node) {
            queue.push_back(node);
        }
    };

    for &row in seed_rows {
        enqueue(NodeRef::Row(row), &mut visited, &mut queue);
    }
    for &field in seed_fields {
        enqueue(NodeRef::Column(field), &mut visited, &mut queue);
    }

    while let Some(node) = queue.pop_front() {
        match node {
            NodeRef::Row(id) => {
                let Ok(row) = trail.row(id) else { continue };
                enqueue(
                    NodeRef::PopulatedTable(row.populated_table),
                    &mut visited,
                    &mut queue,
                );
                for &source in &row.sources {
                    if source == id {
                        warn!(row = %id, "row source cycle detected; ignoring self-loop");
                        continue;
                    }
                    enqueue(NodeRef::Row(source), &mut visited, &mut queue);
                }
                // A used row's cells are part of what the calculation saw;
                // include them so their value sources can be followed.
                for &value in &row.values {
                    enqueue(NodeRef::Value(value), &mut visited, &mut queue);
                }
            }
            NodeRef::Value(id) => {
                let Ok(value) = trail.value(id) else { continue };
                enqueue(NodeRef::Row(value.row), &mut visited, &mut queue);
                enqueue(NodeRef::Column(value.column), &mut visited, &mut queue);
                for &source in &value.sources {
                    if source == id {
                        warn!(value = %id, "value source cycle detected; ignoring self-loop");
                        continue;
                    }
                    enqueue(NodeRef::Value(source), &mut visited, &mut queue);
                }
            }
            NodeRef::Column(id) => {
                let Ok(column) = trail.schema.column(id) else { continue };
                enqueue(NodeRef::Table(column.table), &mut visited, &mut queue);
                for &reference in column.references() {
                    if reference == id {
                        warn!(column = %id, "column reference cycle detected; ignoring self-loop");
                        continue;
                    }
                    enqueue(NodeRef::Column(reference), &mut visited, &mut queue);
                }
            }
            NodeRef::PopulatedTable(id) => {
                if let Some(pt) = trail.populated_table(id) {
                    enqueue(NodeRef::Table(pt.table), &mut visited, &mut queue);
                }
            }
            NodeRef::Table(id) => {
                if let Ok(table) = trail.schema.table(id) {
                    if let TableKind::Derived(creation) = &table.kind {
                        for &source in &creation.source_tables {
                            enqueue(NodeRef::Table(source), &mut visited, &mut queue);
                        }
                    }
                }
            }
        }
    }

    visited
}

/// True when the referenced node is present in the trail's arenas.
fn exists(trail: &Trail, node: NodeRef) -> bool {
    match node {
        NodeRef::Table(id) => id.index() < trail.schema.tables().len(),
        NodeRef::Column(id) => id.index() < trail.schema.columns().len(),
        NodeRef::PopulatedTable(id) => id.index() < trail.populated_tables().len(),
        NodeRef::Row(id) => id.index() < trail.rows().len(),
        NodeRef::Value(id) => id.index() < trail.values().len(),
    }
}

/// Clone a node's payload out of the trail. Only called for nodes that
/// passed the `exists` check during the closure.
fn materialize(trail: &Trail, node: NodeRef) -> GraphNode {
    match node {
        NodeRef::Table(id) => GraphNode::Table(trail.schema.tables()[id.index()].clone()),
        NodeRef::Column(id) => GraphNode::Column(trail.schema.columns()[id.index()].clone()),
        NodeRef::PopulatedTable(id) => {
            GraphNode::PopulatedTable(trail.populated_tables()[id.index()].clone())
        }
        NodeRef::Row(id) => GraphNode::Row(trail.rows()[id.index()].clone()),
        NodeRef::Value(id) => GraphNode::Value(trail.values()[id.index()].clone()),
    }
}
