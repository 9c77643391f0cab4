//! Entity dependency graph and layer assignment
//!
//! Projects column edges that cross entity boundaries onto direct
//! entity-level adjacency, and assigns every entity a topological layer
//! for left-to-right placement.

use std::collections::{HashMap, HashSet};

use crate::index::GraphIndex;

/// Entity name
pub type EntityName = String;

/// Direct (one-hop) entity adjacency with forward and reverse edges
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    /// Entities in index order
    order: Vec<EntityName>,

    /// Forward edges: entity -> entities consuming its columns
    downstream: HashMap<EntityName, Vec<EntityName>>,

    /// Reverse edges: entity -> entities it reads from
    upstream: HashMap<EntityName, Vec<EntityName>>,

    /// Number of crossing column edges arriving at each entity
    in_degree: HashMap<EntityName, usize>,

    /// Number of crossing column edges leaving each entity
    out_degree: HashMap<EntityName, usize>,
}

impl EntityGraph {
    /// Build entity adjacency from the lineage and exposure edges of a graph
    pub fn from_index(index: &GraphIndex) -> Self {
        let order: Vec<EntityName> = index.entities().iter().map(|e| e.name.clone()).collect();

        let mut graph = Self {
            downstream: order.iter().map(|n| (n.clone(), Vec::new())).collect(),
            upstream: order.iter().map(|n| (n.clone(), Vec::new())).collect(),
            in_degree: order.iter().map(|n| (n.clone(), 0)).collect(),
            out_degree: order.iter().map(|n| (n.clone(), 0)).collect(),
            order,
        };

        for edge in index.edges() {
            let (Some(source), Some(target)) =
                (index.entity_of(&edge.source_id), index.entity_of(&edge.target_id))
            else {
                continue;
            };

            if source == target {
                continue;
            }

            graph.add_edge(source, target);
        }

        graph
    }

    fn add_edge(&mut self, source: &str, target: &str) {
        if !self.downstream.contains_key(source) || !self.upstream.contains_key(target) {
            return;
        }

        // Degrees count every crossing column edge; adjacency is deduplicated
        if let Some(degree) = self.out_degree.get_mut(source) {
            *degree += 1;
        }
        if let Some(degree) = self.in_degree.get_mut(target) {
            *degree += 1;
        }

        let children = self.downstream.entry(source.to_string()).or_default();
        if !children.iter().any(|c| c == target) {
            children.push(target.to_string());
        }

        let parents = self.upstream.entry(target.to_string()).or_default();
        if !parents.iter().any(|p| p == source) {
            parents.push(source.to_string());
        }
    }

    /// All entities in index order
    pub fn entities(&self) -> &[EntityName] {
        &self.order
    }

    /// Check if an entity is part of the graph
    pub fn contains(&self, entity: &str) -> bool {
        self.downstream.contains_key(entity)
    }

    /// Immediate downstream entities
    pub fn downstream(&self, entity: &str) -> &[EntityName] {
        self.downstream.get(entity).map(Vec::as_slice).unwrap_or_default()
    }

    /// Immediate upstream entities
    pub fn upstream(&self, entity: &str) -> &[EntityName] {
        self.upstream.get(entity).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn in_degree(&self, entity: &str) -> usize {
        self.in_degree.get(entity).copied().unwrap_or(0)
    }

    pub fn out_degree(&self, entity: &str) -> usize {
        self.out_degree.get(entity).copied().unwrap_or(0)
    }

    /// All downstream entities (transitive closure of children)
    ///
    /// Everything that has to be hidden when `entity` collapses its
    /// downstream side. The entity itself is never included, even when it
    /// sits on a cycle.
    pub fn transitive_downstream(&self, entity: &str) -> Vec<EntityName> {
        self.walk(entity, &self.downstream)
    }

    /// All upstream entities (transitive closure of parents)
    pub fn transitive_upstream(&self, entity: &str) -> Vec<EntityName> {
        self.walk(entity, &self.upstream)
    }

    /// Depth-first walk with a visited set, bounded by the entity count
    fn walk(&self, start: &str, adjacency: &HashMap<EntityName, Vec<EntityName>>) -> Vec<EntityName> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        let mut stack: Vec<&str> = Vec::new();

        visited.insert(start);
        if let Some(children) = adjacency.get(start) {
            stack.extend(children.iter().rev().map(String::as_str));
        }

        while let Some(current) = stack.pop() {
            if result.len() >= self.order.len() {
                break;
            }
            if !visited.insert(current) {
                continue;
            }

            result.push(current.to_string());

            if let Some(children) = adjacency.get(current) {
                for child in children.iter().rev() {
                    if !visited.contains(child.as_str()) {
                        stack.push(child);
                    }
                }
            }
        }

        result
    }

    /// Assign every entity a layer by breadth-first topological leveling
    ///
    /// Entities with no incoming edges form layer 0 (or, when every entity
    /// has incoming edges, those sharing the minimum in-degree). Each
    /// following layer holds the successors whose predecessors have all
    /// been placed. Entities never reached this way (cycles, or anything
    /// downstream of one) each get their own layer after the flow, in
    /// discovery order.
    pub fn assign_layers(&self) -> Leveling {
        let mut layers: HashMap<EntityName, usize> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current_layer = 0;

        let mut frontier: Vec<&str> = self
            .order
            .iter()
            .filter(|name| self.in_degree(name) == 0)
            .map(String::as_str)
            .collect();

        if frontier.is_empty() {
            if let Some(min) = self.order.iter().map(|name| self.in_degree(name)).min() {
                frontier = self
                    .order
                    .iter()
                    .filter(|name| self.in_degree(name) == min)
                    .map(String::as_str)
                    .collect();
            }
        }

        let mut rounds = 0;
        while !frontier.is_empty() && rounds <= self.order.len() {
            let mut next: Vec<&str> = Vec::new();

            for &name in &frontier {
                if !visited.insert(name) {
                    continue;
                }
                layers.insert(name.to_string(), current_layer);

                for child in self.downstream(name) {
                    if visited.contains(child.as_str()) || next.contains(&child.as_str()) {
                        continue;
                    }
                    let ready = self
                        .upstream(child)
                        .iter()
                        .all(|parent| visited.contains(parent.as_str()));
                    if ready {
                        next.push(child);
                    }
                }
            }

            frontier = next;
            current_layer += 1;
            rounds += 1;
        }

        let reached: HashSet<EntityName> = visited.iter().map(|s| s.to_string()).collect();

        for name in self.fallback_order(&visited) {
            layers.insert(name.to_string(), current_layer);
            current_layer += 1;
        }

        Leveling { layers, reached }
    }

    /// Unreached entities in discovery order: depth-first along downstream
    /// adjacency from each unreached entity in index order, reversed on
    /// finish. Any edge between them that is not part of a cycle points
    /// forward in the result.
    fn fallback_order<'a>(&'a self, reached: &HashSet<&str>) -> Vec<&'a str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut finished: Vec<&str> = Vec::new();

        for root in &self.order {
            if reached.contains(root.as_str()) || !seen.insert(root.as_str()) {
                continue;
            }

            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
            while let Some(top) = stack.last_mut() {
                let (name, next) = *top;
                top.1 += 1;

                match self.downstream(name).get(next) {
                    Some(child) => {
                        if !reached.contains(child.as_str()) && seen.insert(child.as_str()) {
                            stack.push((child.as_str(), 0));
                        }
                    }
                    None => {
                        finished.push(name);
                        stack.pop();
                    }
                }
            }
        }

        finished.reverse();
        finished
    }
}

/// Result of layer assignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leveling {
    /// Layer of every entity
    layers: HashMap<EntityName, usize>,

    /// Entities placed by the breadth-first flow (not by the fallback)
    reached: HashSet<EntityName>,
}

impl Leveling {
    pub fn layer(&self, entity: &str) -> Option<usize> {
        self.layers.get(entity).copied()
    }

    /// Whether the entity was placed by the main flow
    pub fn is_reached(&self, entity: &str) -> bool {
        self.reached.contains(entity)
    }

    /// Highest assigned layer
    pub fn max_layer(&self) -> Option<usize> {
        self.layers.values().copied().max()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
