//! Whole-trail DAG validation over lineage references.
//!
//! The append-only recording API only lets edges point at nodes that
//! already exist, so cycles cannot normally be constructed. This check
//! exists for trails that arrive from outside that API, e.g. one
//! deserialized from an archive written by a buggy producer. It runs
//! Tarjan's strongly
//! connected components over the three lineage edge kinds.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::graph::NodeRef;
use crate::error::{TrailError, TrailResult};
use crate::model::Trail;

/// Find all cycles among column-reference, row-source, and value-source
/// edges. Each cycle is the list of nodes in one strongly connected
/// component; single nodes only count when they have a self-loop.
pub fn detect_reference_cycles(trail: &Trail) -> Vec<Vec<NodeRef>> {
    let mut graph: DiGraph<NodeRef, ()> = DiGraph::new();
    let mut index: HashMap<NodeRef, NodeIndex> = HashMap::new();

    let mut node = |graph: &mut DiGraph<NodeRef, ()>,
                    index: &mut HashMap<NodeRef, NodeIndex>,
                    node: NodeRef| {
        *index.entry(node).or_insert_with(|| graph.add_node(node))
    };

    for column in trail.schema.columns() {
        for &reference in column.references() {
            let from = node(&mut graph, &mut index, NodeRef::Column(column.id));
            let to = node(&mut graph, &mut index, NodeRef::Column(reference));
            graph.add_edge(from, to, ());
        }
    }
    for row in trail.rows() {
        for &source in &row.sources {
            let from = node(&mut graph, &mut index, NodeRef::Row(row.id));
            let to = node(&mut graph, &mut index, NodeRef::Row(source));
            graph.add_edge(from, to, ());
        }
    }
    for value in trail.values() {
        for &source in &value.sources {
            let from = node(&mut graph, &mut index, NodeRef::Value(value.id));
            let to = node(&mut graph, &mut index, NodeRef::Value(source));
            graph.add_edge(from, to, ());
        }
    }

    tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| {
            if scc.len() == 1 {
                graph.edges_connecting(scc[0], scc[0]).next().is_some()
            } else {
                true
            }
        })
        .map(|scc| scc.into_iter().map(|idx| graph[idx]).collect())
        .collect()
}

/// Validate the trail's lineage references form a DAG.
pub fn validate_acyclic(trail: &Trail) -> TrailResult<()> {
    let cycles = detect_reference_cycles(trail);
    if cycles.is_empty() {
        Ok(())
    } else {
        Err(TrailError::CycleDetected {
            cycles: cycles
                .into_iter()
                .map(|cycle| cycle.into_iter().map(|n| n.to_string()).collect())
                .collect(),
        })
    }
}
