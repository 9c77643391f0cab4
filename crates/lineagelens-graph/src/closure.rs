//! Column-level lineage closures
//!
//! For every column that takes part in a lineage edge, the full set of
//! columns reachable upstream and downstream (each including the column
//! itself). Built once per loaded graph and used for highlighting and
//! impact summaries only, never for layout.

use std::collections::{BTreeSet, HashMap};

use lineagelens_core::{Edge, EdgeKind};

/// Transitive upstream/downstream column sets
#[derive(Debug, Clone, Default)]
pub struct LineageClosure {
    upstream: HashMap<String, BTreeSet<String>>,
    downstream: HashMap<String, BTreeSet<String>>,
}

impl LineageClosure {
    /// Build closures from the lineage edges of a graph
    pub fn build(edges: &[Edge]) -> Self {
        let mut direct_upstream: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut direct_downstream: HashMap<&str, Vec<&str>> = HashMap::new();

        for edge in edges.iter().filter(|e| e.kind == EdgeKind::Lineage) {
            direct_upstream
                .entry(edge.target_id.as_str())
                .or_default()
                .push(edge.source_id.as_str());
            direct_downstream
                .entry(edge.source_id.as_str())
                .or_default()
                .push(edge.target_id.as_str());
        }

        Self {
            upstream: close_over(&direct_upstream),
            downstream: close_over(&direct_downstream),
        }
    }

    /// Upstream closure of a column, including itself
    pub fn upstream_of(&self, column_id: &str) -> Option<&BTreeSet<String>> {
        self.upstream.get(column_id)
    }

    /// Downstream closure of a column, including itself
    pub fn downstream_of(&self, column_id: &str) -> Option<&BTreeSet<String>> {
        self.downstream.get(column_id)
    }

    /// Union of both closures; just the column when it has no lineage
    pub fn related(&self, column_id: &str) -> BTreeSet<String> {
        let mut related = BTreeSet::new();
        related.insert(column_id.to_string());

        for closure in [self.upstream_of(column_id), self.downstream_of(column_id)]
            .into_iter()
            .flatten()
        {
            related.extend(closure.iter().cloned());
        }

        related
    }

    /// Number of columns with an upstream closure
    pub fn upstream_len(&self) -> usize {
        self.upstream.len()
    }

    /// Number of columns with a downstream closure
    pub fn downstream_len(&self) -> usize {
        self.downstream.len()
    }
}

/// Reachability for every key of a direct-adjacency map
fn close_over(direct: &HashMap<&str, Vec<&str>>) -> HashMap<String, BTreeSet<String>> {
    // Upper bound on distinct columns any walk can visit
    let limit = direct.len() + direct.values().map(Vec::len).sum::<usize>();

    direct
        .keys()
        .map(|&start| (start.to_string(), reachable(direct, start, limit)))
        .collect()
}

/// Depth-first walk with a visited set; stops after `limit` columns
fn reachable(direct: &HashMap<&str, Vec<&str>>, start: &str, limit: usize) -> BTreeSet<String> {
    let mut visited = BTreeSet::new();
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        if visited.len() >= limit {
            break;
        }
        if !visited.insert(current.to_string()) {
            continue;
        }

        if let Some(next) = direct.get(current) {
            for &column in next.iter().rev() {
                if !visited.contains(column) {
                    stack.push(column);
                }
            }
        }
    }

    visited
}
