//! Reference cycle analysis
//!
//! Strongly connected components of the compiled graph. Cycles are legal in
//! JSON Schema and the walker handles them; this report exists so a run can
//! log which schemas take part in one.

use petgraph::algo::kosaraju_scc;

use super::SchemaGraph;

/// Groups of mutually reachable schemas, as sorted location lists
///
/// Only groups of two or more nodes are returned. A schema that references
/// itself directly forms a one-node component and is not reported.
pub fn reference_cycles(graph: &SchemaGraph) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = kosaraju_scc(&graph.graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut locations: Vec<String> = scc
                .into_iter()
                .map(|idx| graph[idx].location.to_string())
                .collect();
            locations.sort();
            locations
        })
        .collect();
    groups.sort();
    groups
}
